use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use super::*;

const FPS: f64 = 10.0;

/// In-memory decoder: frame `k` (1-based) is filled with the byte `k`.
#[derive(Clone)]
struct FakeDecoder {
    total: u64,
    starts: Rc<RefCell<Vec<Time>>>,
}

impl DecoderLauncher for FakeDecoder {
    fn launch(&mut self, start: Time) -> MontageResult<Box<dyn Read>> {
        self.starts.borrow_mut().push(start);
        let first = FrameIndex::at(start, FPS).0;
        let bytes: Vec<u8> = (first..=self.total)
            .flat_map(|k| std::iter::repeat_n(k as u8, 6))
            .collect();
        Ok(Box::new(Cursor::new(bytes)))
    }
}

fn reader(total: u64) -> (VideoReader, Rc<RefCell<Vec<Time>>>) {
    let starts = Rc::new(RefCell::new(Vec::new()));
    let launcher = FakeDecoder {
        total,
        starts: starts.clone(),
    };
    let info = StreamInfo {
        size: Size::new(2, 1),
        pix_fmt: PixelFormat::Rgb24,
        fps: FPS,
        nframes: total,
        duration: Some(total as f64 / FPS),
        rotation: 0,
    };
    let r = VideoReader::with_launcher(Box::new(launcher), info, "fake").unwrap();
    (r, starts)
}

fn value(frame: &Raster<u8>) -> u8 {
    frame.pixel(0, 0)[0]
}

#[test]
fn opening_reads_the_first_frame() {
    let (r, starts) = reader(10);
    assert_eq!(r.pos(), FrameIndex(1));
    assert_eq!(value(r.last_read().unwrap()), 1);
    assert_eq!(*starts.borrow(), vec![0.0]);
}

#[test]
fn same_frame_is_served_from_the_last_read() {
    let (mut r, starts) = reader(10);
    assert_eq!(value(&r.get_frame(0.0).unwrap()), 1);
    assert_eq!(value(&r.get_frame(0.05).unwrap()), 1);
    assert_eq!(starts.borrow().len(), 1);
}

#[test]
fn short_forward_seek_discards_frames_from_the_open_stream() {
    let (mut r, starts) = reader(200);
    assert_eq!(value(&r.get_frame(0.4).unwrap()), 5);
    assert_eq!(r.pos(), FrameIndex(5));
    assert_eq!(value(&r.get_frame(0.5).unwrap()), 6);
    // 100 frames ahead is still inside the window.
    assert_eq!(value(&r.get_frame(10.5).unwrap()), 106);
    assert_eq!(starts.borrow().len(), 1);
}

#[test]
fn far_forward_seek_restarts_the_decoder() {
    let (mut r, starts) = reader(200);
    assert_eq!(value(&r.get_frame(10.1).unwrap()), 102);
    assert_eq!(*starts.borrow(), vec![0.0, 10.1]);
    assert_eq!(r.pos(), FrameIndex(102));
}

#[test]
fn backward_seek_restarts_the_decoder() {
    let (mut r, starts) = reader(50);
    r.get_frame(2.0).unwrap();
    assert_eq!(value(&r.get_frame(1.0).unwrap()), 11);
    assert_eq!(*starts.borrow(), vec![0.0, 1.0]);
}

#[test]
fn short_read_falls_back_to_the_last_frame() {
    let (mut r, _) = reader(3);
    assert_eq!(value(&r.get_frame(0.1).unwrap()), 2);
    assert_eq!(value(&r.get_frame(0.6).unwrap()), 2);
}

#[test]
fn empty_stream_is_an_underrun() {
    let launcher = FakeDecoder {
        total: 0,
        starts: Rc::default(),
    };
    let info = StreamInfo {
        size: Size::new(2, 1),
        pix_fmt: PixelFormat::Rgb24,
        fps: FPS,
        nframes: 0,
        duration: None,
        rotation: 0,
    };
    assert!(matches!(
        VideoReader::with_launcher(Box::new(launcher), info, "empty"),
        Err(MontageError::StreamUnderrun(_))
    ));
}

#[test]
fn close_is_idempotent_and_reading_reopens() {
    let (mut r, starts) = reader(20);
    r.close();
    r.close();
    assert!(!r.is_open());
    assert!(r.last_read().is_none());
    assert_eq!(value(&r.get_frame(0.3).unwrap()), 4);
    assert!(r.is_open());
    assert_eq!(*starts.borrow(), vec![0.0, 0.3]);
}

#[test]
fn decoder_arguments_seek_in_two_steps() {
    let dec = FfmpegDecoder::new(
        MediaConfig::default(),
        "in.mp4",
        Size::new(64, 48),
        PixelFormat::Rgba,
        "bilinear",
    );
    let args: Vec<String> = dec
        .args(5.5)
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        &args[..6],
        &["-ss", "4.500000", "-i", "in.mp4", "-ss", "1.000000"]
    );
    assert!(args.windows(2).any(|w| w == ["-vf", "scale=64:48"]));
    assert!(args.windows(2).any(|w| w == ["-sws_flags", "bilinear"]));
    assert!(args.windows(2).any(|w| w == ["-pix_fmt", "rgba"]));
    assert_eq!(args.last().map(String::as_str), Some("-"));

    let from_zero = dec.args(0.0);
    assert_eq!(from_zero[0], "-i");
    let near_start: Vec<String> = dec
        .args(0.25)
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(&near_start[..2], &["-ss", "0.000000"]);
    assert_eq!(&near_start[4..6], &["-ss", "0.250000"]);
}

#[test]
fn target_resolution_keeps_aspect_when_one_side_is_missing() {
    let native = Size::new(1280, 720);
    let width_only = TargetResolution {
        width: Some(640),
        height: None,
    };
    assert_eq!(width_only.apply(native), Size::new(640, 360));
    let height_only = TargetResolution {
        width: None,
        height: Some(360),
    };
    assert_eq!(height_only.apply(native), Size::new(640, 360));
    let both = TargetResolution {
        width: Some(10),
        height: Some(10),
    };
    assert_eq!(both.apply(native), Size::new(10, 10));
    assert_eq!(TargetResolution::default().apply(native), native);
}

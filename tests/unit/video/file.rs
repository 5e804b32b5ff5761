use std::io::{Cursor, Read};

use super::*;
use crate::clip::Clip;
use crate::foundation::core::{FrameIndex, Size};
use crate::media::reader::{DecoderLauncher, StreamInfo};

/// 2x1 frames; frame `k` has colour `k` and alpha `255 - k`.
struct Frames {
    depth: u8,
    total: u64,
    fps: f64,
}

impl DecoderLauncher for Frames {
    fn launch(&mut self, start: Time) -> MontageResult<Box<dyn Read>> {
        let first = FrameIndex::at(start, self.fps).0;
        let mut bytes = Vec::new();
        for k in first..=self.total {
            for _ in 0..2 {
                bytes.extend([k as u8; 3]);
                if self.depth == 4 {
                    bytes.push(255 - k as u8);
                }
            }
        }
        Ok(Box::new(Cursor::new(bytes)))
    }
}

fn reader(depth: u8) -> VideoReader {
    let info = StreamInfo {
        size: Size::new(2, 1),
        pix_fmt: if depth == 4 {
            PixelFormat::Rgba
        } else {
            PixelFormat::Rgb24
        },
        fps: 5.0,
        nframes: 10,
        duration: Some(2.0),
        rotation: 0,
    };
    let launcher = Frames {
        depth,
        total: 10,
        fps: 5.0,
    };
    VideoReader::with_launcher(Box::new(launcher), info, "frames").unwrap()
}

#[test]
fn reader_clip_takes_timing_from_the_stream() {
    let mut clip = VideoClip::from_reader(reader(3)).unwrap();
    assert_eq!(clip.size(), Size::new(2, 1));
    assert_eq!(clip.fps(), Some(5.0));
    assert_eq!(clip.duration(), Some(2.0));
    assert!(clip.mask().is_none());
    assert_eq!(clip.get_frame(0.0).unwrap().pixel(1, 0), &[1, 1, 1]);
    assert_eq!(clip.get_frame(1.0).unwrap().pixel(0, 0), &[6, 6, 6]);
}

#[test]
fn rgba_stream_splits_into_image_and_mask() {
    let mut clip = VideoClip::from_reader(reader(4)).unwrap();
    let frame = clip.get_frame(0.4).unwrap();
    assert_eq!(frame.channels(), 3);
    assert_eq!(frame.pixel(0, 0), &[3, 3, 3]);

    let mut mask = clip.mask().unwrap().clone();
    assert_eq!(mask.fps(), Some(5.0));
    let m = mask.get_frame(0.4).unwrap();
    assert_eq!(m.pixel(0, 0), &[252.0 / 255.0]);
}

#[test]
fn copies_share_one_decoder() {
    let clip = VideoClip::from_reader(reader(3)).unwrap();
    let mut early = clip.clone();
    let mut late = clip.with_start(1.0, true);
    assert_eq!(late.get_frame(0.2).unwrap().pixel(0, 0), &[2, 2, 2]);
    assert_eq!(early.get_frame(0.8).unwrap().pixel(0, 0), &[5, 5, 5]);
}

#[test]
fn file_options_default_to_audio_without_mask() {
    let opts = VideoFileOpts::default();
    assert!(opts.audio);
    assert!(!opts.has_mask);
    assert_eq!(opts.resize_algorithm, "bicubic");
    assert_eq!(opts.audio_opts.fps, 44_100);
}

#[test]
fn missing_file_fails_without_panicking() {
    let cfg = MediaConfig {
        ffmpeg_binary: "/nonexistent/ffmpeg".into(),
        ..MediaConfig::default()
    };
    assert!(VideoClip::from_file("missing.mp4", &VideoFileOpts::default(), &cfg).is_err());
}

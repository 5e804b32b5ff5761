use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use super::*;
use crate::clip::Clip;

const RATE: u32 = 1000;
const TOTAL: u64 = 10_000;

/// Stereo s16 stream where sample frame `k` holds `k` on both channels.
struct Ramp {
    starts: Rc<RefCell<Vec<Time>>>,
}

impl DecoderLauncher for Ramp {
    fn launch(&mut self, start: Time) -> MontageResult<Box<dyn Read>> {
        self.starts.borrow_mut().push(start);
        let first = (start * f64::from(RATE)).round() as u64;
        let bytes: Vec<u8> = (first..TOTAL)
            .flat_map(|k| {
                let b = (k as i16).to_le_bytes();
                [b[0], b[1], b[0], b[1]]
            })
            .collect();
        Ok(Box::new(Cursor::new(bytes)))
    }
}

fn reader(buffersize: usize) -> (AudioReader, Rc<RefCell<Vec<Time>>>) {
    let starts = Rc::new(RefCell::new(Vec::new()));
    let opts = AudioReaderOpts {
        fps: RATE,
        nbytes: 2,
        nchannels: 2,
        buffersize,
    };
    let r = AudioReader::with_launcher(
        Box::new(Ramp {
            starts: starts.clone(),
        }),
        opts,
        TOTAL as f64 / f64::from(RATE),
        "ramp",
    )
    .unwrap();
    (r, starts)
}

fn sample(k: u64) -> f32 {
    k as f32 / 32_768.0
}

#[test]
fn samples_come_from_the_requested_times() {
    let (mut r, _) = reader(100);
    let out = r.get_frames(&[0.0, 0.005, 0.01]).unwrap();
    assert_eq!(out.frames(), 3);
    assert_eq!(out.frame(0), &[0.0, 0.0]);
    assert_eq!(out.frame(1), &[sample(5), sample(5)]);
    assert_eq!(out.frame(2), &[sample(10), sample(10)]);
}

#[test]
fn times_outside_the_file_are_silent() {
    let (mut r, starts) = reader(100);
    let out = r.get_frames(&[-1.0, 10.0, 11.0]).unwrap();
    assert!(out.samples().iter().all(|s| *s == 0.0));
    assert_eq!(starts.borrow().len(), 1);
}

#[test]
fn forward_requests_skip_without_relaunching() {
    let (mut r, starts) = reader(100);
    let out = r.get_frames(&[2.0]).unwrap();
    assert_eq!(out.frame(0), &[sample(2000), sample(2000)]);
    assert_eq!(r.buffered_window(), (1950, 100));

    r.get_frames(&[2.04]).unwrap();
    assert_eq!(r.buffered_window(), (1950, 100));

    let out = r.get_frames(&[2.06]).unwrap();
    assert_eq!(out.frame(0), &[sample(2060), sample(2060)]);
    assert_eq!(r.buffered_window(), (2010, 100));
    assert_eq!(*starts.borrow(), vec![0.0]);
}

#[test]
fn requests_wider_than_half_the_buffer_are_read_in_full() {
    let (mut r, starts) = reader(100);
    let tt: Vec<Time> = (2000..=2100).map(|k| k as f64 / f64::from(RATE)).collect();
    let out = r.get_frames(&tt).unwrap();
    assert_eq!(out.frames(), 101);
    for (row, k) in (2000..=2100u64).enumerate() {
        assert_eq!(out.frame(row), &[sample(k), sample(k)], "frame {k}");
    }
    assert_eq!(r.buffered_window(), (1950, 151));
    assert_eq!(*starts.borrow(), vec![0.0]);

    let out = r.get_frames(&[2.1]).unwrap();
    assert_eq!(out.frame(0), &[sample(2100), sample(2100)]);
}

#[test]
fn backward_requests_reseek_the_decoder() {
    let (mut r, starts) = reader(100);
    r.get_frames(&[5.0]).unwrap();
    let out = r.get_frames(&[0.1]).unwrap();
    assert_eq!(out.frame(0), &[sample(100), sample(100)]);
    assert_eq!(*starts.borrow(), vec![0.0, 0.05]);
}

#[test]
fn the_tail_of_the_file_is_padded_with_silence() {
    let (mut r, _) = reader(100);
    let out = r.get_frames(&[9.999]).unwrap();
    assert_eq!(out.frame(0), &[sample(9999), sample(9999)]);
    assert_eq!(r.buffered_window(), (9949, 100));
}

#[test]
fn close_then_read_reopens() {
    let (mut r, starts) = reader(100);
    r.close();
    r.close();
    let out = r.get_frames(&[1.0]).unwrap();
    assert_eq!(out.frame(0), &[sample(1000), sample(1000)]);
    assert_eq!(*starts.borrow(), vec![0.0, 0.95]);
}

#[test]
fn reader_is_an_audio_source() {
    let (r, _) = reader(100);
    let mut clip = crate::audio::clip::AudioClip::from_reader(r);
    assert_eq!(clip.nchannels(), 2);
    assert_eq!(clip.duration(), Some(10.0));
    let out = clip.get_frames(&[0.5]).unwrap();
    assert_eq!(out.frame(0), &[sample(500), sample(500)]);
}

#[test]
fn invalid_options_are_rejected() {
    let opts = AudioReaderOpts {
        nbytes: 3,
        ..AudioReaderOpts::default()
    };
    let launcher = Ramp {
        starts: Rc::default(),
    };
    assert!(AudioReader::with_launcher(Box::new(launcher), opts, 1.0, "bad").is_err());
}

#[test]
fn decoder_arguments() {
    let dec = FfmpegAudioDecoder::new(MediaConfig::default(), "a.mp3", AudioReaderOpts::default());
    let args: Vec<String> = dec
        .args(3.0)
        .unwrap()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        &args[..7],
        &["-ss", "2.000000", "-i", "a.mp3", "-vn", "-ss", "1.000000"]
    );
    assert!(args.windows(2).any(|w| w == ["-f", "s16le"]));
    assert!(args.windows(2).any(|w| w == ["-acodec", "pcm_s16le"]));
    assert!(args.windows(2).any(|w| w == ["-ar", "44100"]));
    assert!(args.windows(2).any(|w| w == ["-ac", "2"]));
}

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::audio::clip::AudioSource;
use crate::foundation::core::{Time, format_seek};
use crate::foundation::error::{MontageError, MontageResult};
use crate::frame::sound::SoundArray;
use crate::media::codecs::pcm_format;
use crate::media::config::MediaConfig;
use crate::media::probe::probe;
use crate::media::process::{FfmpegProcess, PipeMode};
use crate::media::reader::{DecoderLauncher, read_full};

/// Re-seek instead of skipping when the target is this many sample frames ahead.
const MAX_SKIP_SAMPLES: u64 = 1_000_000;

/// Options for [`AudioReader::open`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioReaderOpts {
    /// Output sample rate.
    pub fps: u32,
    /// Bytes per sample in the PCM pipe (1, 2 or 4).
    pub nbytes: u8,
    pub nchannels: u16,
    /// Sample frames kept in memory around the last request.
    pub buffersize: usize,
}

impl Default for AudioReaderOpts {
    fn default() -> Self {
        Self {
            fps: 44_100,
            nbytes: 2,
            nchannels: 2,
            buffersize: 200_000,
        }
    }
}

/// Spawns `ffmpeg` to decode the audio of a file into raw PCM.
#[derive(Clone, Debug)]
pub struct FfmpegAudioDecoder {
    cfg: MediaConfig,
    path: PathBuf,
    opts: AudioReaderOpts,
}

impl FfmpegAudioDecoder {
    pub fn new(cfg: MediaConfig, path: impl Into<PathBuf>, opts: AudioReaderOpts) -> Self {
        Self {
            cfg,
            path: path.into(),
            opts,
        }
    }

    pub fn args(&self, start: Time) -> MontageResult<Vec<OsString>> {
        let (format, codec) = pcm_format(self.opts.nbytes)?;
        let mut args: Vec<OsString> = Vec::new();
        if start != 0.0 {
            let offset = start.min(1.0);
            args.extend([
                "-ss".into(),
                format_seek(start - offset).into(),
                "-i".into(),
                self.path.clone().into(),
                "-vn".into(),
                "-ss".into(),
                format_seek(offset).into(),
            ]);
        } else {
            args.extend(["-i".into(), self.path.clone().into(), "-vn".into()]);
        }
        let fps = self.opts.fps.to_string();
        let channels = self.opts.nchannels.to_string();
        args.extend(
            [
                "-loglevel",
                "error",
                "-f",
                format,
                "-acodec",
                codec,
                "-ar",
                fps.as_str(),
                "-ac",
                channels.as_str(),
                "-",
            ]
            .map(OsString::from),
        );
        Ok(args)
    }
}

impl DecoderLauncher for FfmpegAudioDecoder {
    fn launch(&mut self, start: Time) -> MontageResult<Box<dyn Read>> {
        let process = FfmpegProcess::spawn(&self.cfg, &self.args(start)?, PipeMode::Drain)?;
        Ok(Box::new(process))
    }
}

/// Buffered random-access reader over a decoded PCM stream.
///
/// Keeps `buffersize` sample frames in memory around the most recent request and re-seeks the
/// decoder only when a request falls behind or far ahead of the stream.
pub struct AudioReader {
    label: String,
    launcher: Box<dyn DecoderLauncher>,
    stream: Option<Box<dyn Read>>,
    opts: AudioReaderOpts,
    duration: Time,
    /// Sample frame the stream will produce next.
    pos: u64,
    buffer: Vec<f32>,
    buffer_start: u64,
}

impl std::fmt::Debug for AudioReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioReader")
            .field("label", &self.label)
            .field("opts", &self.opts)
            .field("duration", &self.duration)
            .field("pos", &self.pos)
            .field("buffer_start", &self.buffer_start)
            .finish()
    }
}

impl AudioReader {
    /// Probe `path` for its duration and open the decoder at t=0.
    #[tracing::instrument(level = "debug", skip(path, opts, cfg), fields(path = %path.display()))]
    pub fn open(path: &Path, opts: AudioReaderOpts, cfg: &MediaConfig) -> MontageResult<Self> {
        let info = probe(path, true, cfg)?;
        if !info.audio_found {
            return Err(MontageError::probe(format!(
                "{}: no audio stream found",
                path.display()
            )));
        }
        let duration = info.duration.ok_or_else(|| {
            MontageError::probe(format!("{}: failed to read the duration", path.display()))
        })?;
        let launcher = FfmpegAudioDecoder::new(cfg.clone(), path, opts);
        Self::with_launcher(Box::new(launcher), opts, duration, path.display().to_string())
    }

    /// Open a reader over any launcher producing interleaved PCM at `opts`.
    pub fn with_launcher(
        launcher: Box<dyn DecoderLauncher>,
        opts: AudioReaderOpts,
        duration: Time,
        label: impl Into<String>,
    ) -> MontageResult<Self> {
        pcm_format(opts.nbytes)?;
        if opts.nchannels == 0 || opts.fps == 0 || opts.buffersize == 0 {
            return Err(MontageError::validation(
                "audio reader needs a non-zero sample rate, channel count and buffer size",
            ));
        }
        let mut reader = Self {
            label: label.into(),
            launcher,
            stream: None,
            opts,
            duration,
            pos: 0,
            buffer: Vec::new(),
            buffer_start: 0,
        };
        reader.initialize(0.0)?;
        Ok(reader)
    }

    pub fn duration(&self) -> Time {
        self.duration
    }

    pub fn fps(&self) -> u32 {
        self.opts.fps
    }

    pub fn nchannels(&self) -> u16 {
        self.opts.nchannels
    }

    pub fn buffersize(&self) -> usize {
        self.opts.buffersize
    }

    /// Number of sample frames in the file.
    pub fn nframes(&self) -> u64 {
        (self.duration * f64::from(self.opts.fps)) as u64
    }

    /// First sample frame held in memory and the number held.
    pub fn buffered_window(&self) -> (u64, u64) {
        (self.buffer_start, self.buffered_frames())
    }

    /// Samples at times `tt` (seconds), one row per time.
    ///
    /// Times outside `[0, duration)` are silent.
    pub fn get_frames(&mut self, tt: &[Time]) -> MontageResult<SoundArray> {
        let nch = usize::from(self.opts.nchannels);
        let fps = f64::from(self.opts.fps);
        let indices: Vec<Option<u64>> = tt
            .iter()
            .map(|&t| (t >= 0.0 && t < self.duration).then(|| (fps * t).round() as u64))
            .collect();

        let mut out = vec![0.0f32; tt.len() * nch];
        let Some(lo) = indices.iter().flatten().min().copied() else {
            return SoundArray::new(self.opts.nchannels, out);
        };
        let hi = indices.iter().flatten().max().copied().unwrap_or(lo);

        let end = self.buffer_start + self.buffered_frames();
        if self.buffer.is_empty() || lo < self.buffer_start || hi >= end {
            self.buffer_around(lo, hi)?;
        }

        let available = self.buffered_frames();
        for (row, ind) in indices.iter().enumerate() {
            let Some(ind) = ind else { continue };
            let offset = ind - self.buffer_start;
            if offset < available {
                let src = offset as usize * nch;
                out[row * nch..(row + 1) * nch].copy_from_slice(&self.buffer[src..src + nch]);
            }
        }
        SoundArray::new(self.opts.nchannels, out)
    }

    /// Fill the buffer with the window that starts half a buffer before `lo`.
    ///
    /// The window grows past `buffersize` when needed so that it still reaches `hi`. Overlap
    /// with the current buffer is kept and only the missing tail is decoded.
    fn buffer_around(&mut self, lo: u64, hi: u64) -> MontageResult<()> {
        let new_start = lo.saturating_sub(self.opts.buffersize as u64 / 2);
        let size = (self.opts.buffersize as u64).max(hi + 1 - new_start);
        let current_end = self.buffer_start + self.buffered_frames();
        let nch = usize::from(self.opts.nchannels);

        if !self.buffer.is_empty()
            && new_start >= self.buffer_start
            && new_start < current_end
            && current_end == self.pos
        {
            let conserved = current_end - new_start;
            let keep_from = (new_start - self.buffer_start) as usize * nch;
            self.buffer.drain(..keep_from);
            let tail = self.read_chunk(size - conserved)?;
            self.buffer.extend(tail);
        } else {
            self.seek(new_start)?;
            self.buffer = self.read_chunk(size)?;
        }
        self.buffer_start = new_start;
        Ok(())
    }

    /// Position the stream so the next sample frame read is `frame`.
    fn seek(&mut self, frame: u64) -> MontageResult<()> {
        if self.stream.is_none() || frame < self.pos || frame - self.pos > MAX_SKIP_SAMPLES {
            self.initialize(frame as f64 / f64::from(self.opts.fps))?;
            self.pos = frame;
        } else {
            self.skip(frame - self.pos)?;
        }
        Ok(())
    }

    fn initialize(&mut self, start: Time) -> MontageResult<()> {
        self.stream = None;
        self.stream = Some(self.launcher.launch(start)?);
        self.pos = (start * f64::from(self.opts.fps)).round() as u64;
        Ok(())
    }

    fn frame_bytes(&self) -> u64 {
        u64::from(self.opts.nchannels) * u64::from(self.opts.nbytes)
    }

    fn skip(&mut self, frames: u64) -> MontageResult<()> {
        let nbytes = frames * self.frame_bytes();
        if let Some(stream) = self.stream.as_mut() {
            std::io::copy(&mut stream.take(nbytes), &mut std::io::sink())
                .with_context(|| format!("failed to skip audio in {}", self.label))?;
        }
        self.pos += frames;
        Ok(())
    }

    /// Read `frames` sample frames, padding with silence when the stream ends early.
    fn read_chunk(&mut self, frames: u64) -> MontageResult<Vec<f32>> {
        let wanted = (frames * self.frame_bytes()) as usize;
        let mut bytes = vec![0u8; wanted];
        let got = match self.stream.as_mut() {
            Some(stream) => read_full(stream.as_mut(), &mut bytes)
                .with_context(|| format!("failed to read audio from {}", self.label))?,
            None => 0,
        };
        if got < wanted && (self.pos as f64) < self.duration * f64::from(self.opts.fps) {
            tracing::debug!(
                file = %self.label,
                wanted,
                read = got,
                "audio stream ended early; padding with silence"
            );
        }
        let whole = got - got % self.frame_bytes() as usize;
        bytes.truncate(whole);
        let decoded = SoundArray::from_pcm_bytes(&bytes, self.opts.nbytes, self.opts.nchannels)?;
        let mut samples = decoded.samples().to_vec();
        samples.resize(frames as usize * usize::from(self.opts.nchannels), 0.0);
        self.pos += frames;
        Ok(samples)
    }

    fn buffered_frames(&self) -> u64 {
        (self.buffer.len() / usize::from(self.opts.nchannels)) as u64
    }

    /// Stop the decoder and drop the buffer. Safe to call more than once.
    pub fn close(&mut self) {
        self.stream = None;
        self.buffer.clear();
        self.buffer_start = 0;
    }
}

impl AudioSource for AudioReader {
    fn samples_at(&mut self, tt: &[Time]) -> MontageResult<SoundArray> {
        self.get_frames(tt)
    }
}

impl Drop for AudioReader {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/audio_reader.rs"]
mod tests;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::foundation::core::{FrameIndex, Size};
use crate::foundation::error::{MontageError, MontageResult};
use crate::frame::raster::Raster;
use crate::frame::sound::SoundArray;
use crate::media::codecs::{codec_for, expand_alias, pcm_format};
use crate::media::config::MediaConfig;
use crate::media::process::{FfmpegProcess, PipeMode};

/// Consumer of rendered frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink {
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Raster<u8>) -> MontageResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> MontageResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub(crate) frames: Vec<(FrameIndex, Raster<u8>)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames in timeline order.
    pub fn frames(&self) -> &[(FrameIndex, Raster<u8>)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn push_frame(&mut self, idx: FrameIndex, frame: &Raster<u8>) -> MontageResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> MontageResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Encoder settings for [`VideoWriter`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoWriterOpts {
    /// Video codec; inferred from the output extension when `None`.
    pub codec: Option<String>,
    /// Target bitrate such as `"5000k"`.
    pub bitrate: Option<String>,
    /// x264-style speed/size preset.
    pub preset: String,
    pub threads: Option<u32>,
    /// Extra arguments placed right before the output path.
    pub ffmpeg_params: Vec<String>,
    /// Stream `rgba` frames instead of `rgb24`.
    pub with_mask: bool,
    /// Audio file muxed into the output without re-encoding.
    pub audio_file: Option<PathBuf>,
    /// Replace an existing output file.
    pub overwrite: bool,
}

impl Default for VideoWriterOpts {
    fn default() -> Self {
        Self {
            codec: None,
            bitrate: None,
            preset: "medium".to_owned(),
            threads: None,
            ffmpeg_params: Vec::new(),
            with_mask: false,
            audio_file: None,
            overwrite: true,
        }
    }
}

/// Command-line arguments (after the binary) for encoding raw frames read from stdin.
pub fn video_writer_args(
    path: &Path,
    size: Size,
    fps: f64,
    opts: &VideoWriterOpts,
) -> MontageResult<Vec<OsString>> {
    if size.width == 0 || size.height == 0 {
        return Err(MontageError::validation("video size must be non-zero"));
    }
    if !(fps.is_finite() && fps > 0.0) {
        return Err(MontageError::validation(format!("invalid frame rate {fps}")));
    }
    let codec = codec_for(path, opts.codec.as_deref())?;
    let pix_fmt = if opts.with_mask { "rgba" } else { "rgb24" };

    let mut args: Vec<OsString> = Vec::new();
    let mut push = |a: &str| args.push(OsString::from(a));
    push(if opts.overwrite { "-y" } else { "-n" });
    for a in ["-loglevel", "error", "-f", "rawvideo", "-vcodec", "rawvideo", "-s"] {
        push(a);
    }
    push(&format!("{}x{}", size.width, size.height));
    push("-pix_fmt");
    push(pix_fmt);
    push("-r");
    push(&format!("{fps:.2}"));
    push("-an");
    push("-i");
    push("-");

    if let Some(audio) = &opts.audio_file {
        args.push("-i".into());
        args.push(audio.into());
        args.extend(["-acodec", "copy"].map(OsString::from));
    }
    args.extend(["-vcodec", codec.as_str(), "-preset", opts.preset.as_str()].map(OsString::from));
    args.extend(opts.ffmpeg_params.iter().map(OsString::from));
    if let Some(bitrate) = &opts.bitrate {
        args.extend(["-b", bitrate.as_str()].map(OsString::from));
    }
    if let Some(threads) = opts.threads {
        args.push("-threads".into());
        args.push(threads.to_string().into());
    }
    if codec == "libx264" && size.is_even() {
        args.extend(["-pix_fmt", "yuv420p"].map(OsString::from));
    }
    args.push(path.into());
    Ok(args)
}

/// Streams raw frames into an `ffmpeg` encoder writing a video file.
pub struct VideoWriter {
    path: PathBuf,
    size: Size,
    depth: u8,
    process: Option<FfmpegProcess>,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for VideoWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoWriter")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("depth", &self.depth)
            .field("open", &self.process.is_some())
            .finish()
    }
}

impl VideoWriter {
    /// Spawn the encoder.
    pub fn open(
        path: impl Into<PathBuf>,
        size: Size,
        fps: f64,
        opts: &VideoWriterOpts,
        cfg: &MediaConfig,
    ) -> MontageResult<Self> {
        let path = path.into();
        let args = video_writer_args(&path, size, fps, opts)?;
        ensure_parent_dir(&path)?;
        if !opts.overwrite && path.exists() {
            return Err(MontageError::validation(format!(
                "output file '{}' already exists",
                path.display()
            )));
        }
        let process = FfmpegProcess::spawn(cfg, &args, PipeMode::Feed)?;
        Ok(Self {
            path,
            size,
            depth: if opts.with_mask { 4 } else { 3 },
            process: Some(process),
            last_idx: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for VideoWriter {
    fn push_frame(&mut self, idx: FrameIndex, frame: &Raster<u8>) -> MontageResult<()> {
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(MontageError::encode(
                "video writer received an out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.size() != self.size || frame.channels() != self.depth {
            return Err(MontageError::validation(format!(
                "frame mismatch: got {}x{}x{}, expected {}x{}x{}",
                frame.width(),
                frame.height(),
                frame.channels(),
                self.size.width,
                self.size.height,
                self.depth
            )));
        }
        let Some(process) = self.process.as_mut() else {
            return Err(MontageError::encode("video writer is already finalized"));
        };
        process.write_all(frame.data())
    }

    fn end(&mut self) -> MontageResult<()> {
        let process = self
            .process
            .take()
            .ok_or_else(|| MontageError::encode("video writer is already finalized"))?;
        process.finish()
    }
}

/// Encoder settings for [`AudioWriter`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioWriterOpts {
    /// Audio codec; inferred from the output extension when `None`.
    pub codec: Option<String>,
    pub bitrate: Option<String>,
    pub ffmpeg_params: Vec<String>,
}

/// Command-line arguments (after the binary) for encoding PCM read from stdin.
pub fn audio_writer_args(
    path: &Path,
    fps: u32,
    nbytes: u8,
    nchannels: u16,
    opts: &AudioWriterOpts,
) -> MontageResult<Vec<OsString>> {
    if fps == 0 || nchannels == 0 {
        return Err(MontageError::validation(
            "audio sample rate and channel count must be non-zero",
        ));
    }
    let (format, pcm) = pcm_format(nbytes)?;
    let codec = match &opts.codec {
        Some(c) => expand_alias(c).to_owned(),
        None => codec_for(path, None)?,
    };
    let fps = fps.to_string();
    let nchannels = nchannels.to_string();
    let mut args: Vec<OsString> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        format,
        "-acodec",
        pcm,
        "-ar",
        fps.as_str(),
        "-ac",
        nchannels.as_str(),
        "-i",
        "-",
        "-vn",
        "-acodec",
        codec.as_str(),
        "-ar",
        fps.as_str(),
        "-strict",
        "-2",
    ]
    .map(OsString::from)
    .to_vec();
    if let Some(bitrate) = &opts.bitrate {
        args.extend(["-ab", bitrate.as_str()].map(OsString::from));
    }
    args.extend(opts.ffmpeg_params.iter().map(OsString::from));
    args.push(path.into());
    Ok(args)
}

/// Streams PCM blocks into an `ffmpeg` encoder writing an audio file.
pub struct AudioWriter {
    path: PathBuf,
    nbytes: u8,
    nchannels: u16,
    process: Option<FfmpegProcess>,
}

impl std::fmt::Debug for AudioWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioWriter")
            .field("path", &self.path)
            .field("nbytes", &self.nbytes)
            .field("nchannels", &self.nchannels)
            .field("open", &self.process.is_some())
            .finish()
    }
}

impl AudioWriter {
    /// Spawn the encoder.
    pub fn open(
        path: impl Into<PathBuf>,
        fps: u32,
        nbytes: u8,
        nchannels: u16,
        opts: &AudioWriterOpts,
        cfg: &MediaConfig,
    ) -> MontageResult<Self> {
        let path = path.into();
        let args = audio_writer_args(&path, fps, nbytes, nchannels, opts)?;
        ensure_parent_dir(&path)?;
        let process = FfmpegProcess::spawn(cfg, &args, PipeMode::Feed)?;
        Ok(Self {
            path,
            nbytes,
            nchannels,
            process: Some(process),
        })
    }

    /// Quantize and write one block of samples.
    pub fn write_chunk(&mut self, chunk: &SoundArray) -> MontageResult<()> {
        if chunk.channels() != self.nchannels {
            return Err(MontageError::validation(format!(
                "audio block has {} channels, writer expects {}",
                chunk.channels(),
                self.nchannels
            )));
        }
        let bytes = chunk.to_pcm_bytes(self.nbytes)?;
        let Some(process) = self.process.as_mut() else {
            return Err(MontageError::encode("audio writer is already finalized"));
        };
        process.write_all(&bytes)
    }

    /// Close the pipe and wait for the encoder.
    pub fn end(&mut self) -> MontageResult<()> {
        let process = self
            .process
            .take()
            .ok_or_else(|| MontageError::encode("audio writer is already finalized"))?;
        process.finish()
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MontageResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/media/writer.rs"]
mod tests;

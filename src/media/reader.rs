use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::{FrameIndex, Size, Time, format_seek};
use crate::foundation::error::{MontageError, MontageResult};
use crate::frame::raster::Raster;
use crate::media::config::{FpsSource, MediaConfig};
use crate::media::probe::{ProbeInfo, probe};
use crate::media::process::{FfmpegProcess, PipeMode};

/// Forward seeks up to this many frames are served by discarding frames from the open stream.
pub const MAX_SKIP_FRAMES: u64 = 100;

/// Opens a raw frame stream positioned at a given time.
///
/// The ffmpeg implementation is [`FfmpegDecoder`]; tests substitute in-memory streams.
pub trait DecoderLauncher {
    /// Start a new stream whose first frame is the one displayed at `start`.
    fn launch(&mut self, start: Time) -> MontageResult<Box<dyn Read>>;
}

/// Pixel layout of the decoded stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Three bytes per pixel.
    #[default]
    Rgb24,
    /// Four bytes per pixel, alpha last.
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn depth(self) -> u8 {
        match self {
            Self::Rgb24 => 3,
            Self::Rgba => 4,
        }
    }

    /// Name understood by ffmpeg's `-pix_fmt`.
    pub fn as_ffmpeg(self) -> &'static str {
        match self {
            Self::Rgb24 => "rgb24",
            Self::Rgba => "rgba",
        }
    }
}

/// Requested output resolution; a missing dimension keeps the aspect ratio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TargetResolution {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetResolution {
    /// Size of the decoded frames for a source of size `native`.
    pub fn apply(self, native: Size) -> Size {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Size::new(w, h),
            (Some(w), None) => {
                let ratio = w as f64 / native.width as f64;
                Size::new(w, (native.height as f64 * ratio) as u32)
            }
            (None, Some(h)) => {
                let ratio = h as f64 / native.height as f64;
                Size::new((native.width as f64 * ratio) as u32, h)
            }
            (None, None) => native,
        }
    }
}

/// Options for [`VideoReader::open`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoReaderOpts {
    pub pix_fmt: PixelFormat,
    pub check_duration: bool,
    pub target_resolution: Option<TargetResolution>,
    /// ffmpeg `-sws_flags` scaler name.
    pub resize_algorithm: String,
    /// Overrides [`MediaConfig::fps_source`] for this file.
    pub fps_source: Option<FpsSource>,
}

impl Default for VideoReaderOpts {
    fn default() -> Self {
        Self {
            pix_fmt: PixelFormat::Rgb24,
            check_duration: true,
            target_resolution: None,
            resize_algorithm: "bicubic".to_owned(),
            fps_source: None,
        }
    }
}

/// Spawns `ffmpeg` to decode a file into a raw `rgb24`/`rgba` pipe.
#[derive(Clone, Debug)]
pub struct FfmpegDecoder {
    cfg: MediaConfig,
    path: PathBuf,
    size: Size,
    pix_fmt: PixelFormat,
    resize_algorithm: String,
}

impl FfmpegDecoder {
    pub fn new(
        cfg: MediaConfig,
        path: impl Into<PathBuf>,
        size: Size,
        pix_fmt: PixelFormat,
        resize_algorithm: impl Into<String>,
    ) -> Self {
        Self {
            cfg,
            path: path.into(),
            size,
            pix_fmt,
            resize_algorithm: resize_algorithm.into(),
        }
    }

    /// Arguments after the binary name for a stream starting at `start`.
    ///
    /// Seeks coarsely before the input and decodes at most the last second after it.
    pub fn args(&self, start: Time) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if start != 0.0 {
            let offset = start.min(1.0);
            args.push("-ss".into());
            args.push(format_seek(start - offset).into());
            args.push("-i".into());
            args.push(self.path.clone().into());
            args.push("-ss".into());
            args.push(format_seek(offset).into());
        } else {
            args.push("-i".into());
            args.push(self.path.clone().into());
        }
        let scale = format!("scale={}:{}", self.size.width, self.size.height);
        args.extend(
            [
                "-loglevel",
                "error",
                "-f",
                "image2pipe",
                "-vf",
                scale.as_str(),
                "-sws_flags",
                self.resize_algorithm.as_str(),
                "-pix_fmt",
                self.pix_fmt.as_ffmpeg(),
                "-vcodec",
                "rawvideo",
                "-",
            ]
            .map(OsString::from),
        );
        args
    }
}

impl DecoderLauncher for FfmpegDecoder {
    fn launch(&mut self, start: Time) -> MontageResult<Box<dyn Read>> {
        let process = FfmpegProcess::spawn(&self.cfg, &self.args(start), PipeMode::Drain)?;
        Ok(Box::new(process))
    }
}

/// Frame geometry and timing of a decoded stream.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub size: Size,
    pub pix_fmt: PixelFormat,
    pub fps: f64,
    pub nframes: u64,
    pub duration: Option<Time>,
    pub rotation: i32,
}

/// Random-access frame reader over one long-lived decoder stream.
///
/// Requests at the current frame are served from the last read frame, short forward seeks
/// discard frames from the open stream, and anything else restarts the decoder at the
/// requested time.
pub struct VideoReader {
    label: String,
    launcher: Box<dyn DecoderLauncher>,
    stream: Option<Box<dyn Read>>,
    info: StreamInfo,
    probe: Option<ProbeInfo>,
    pos: FrameIndex,
    last_read: Option<Raster<u8>>,
}

impl std::fmt::Debug for VideoReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoReader")
            .field("label", &self.label)
            .field("info", &self.info)
            .field("pos", &self.pos)
            .field("open", &self.stream.is_some())
            .finish()
    }
}

impl VideoReader {
    /// Probe `path` and open a decoder at t=0.
    #[tracing::instrument(level = "debug", skip(path, opts, cfg), fields(path = %path.display()))]
    pub fn open(path: &Path, opts: &VideoReaderOpts, cfg: &MediaConfig) -> MontageResult<Self> {
        let mut cfg = cfg.clone();
        if let Some(source) = opts.fps_source {
            cfg.fps_source = source;
        }
        let probed = probe(path, opts.check_duration, &cfg)?;
        let native = probed.video_size.ok_or_else(|| {
            MontageError::probe(format!("{}: no video stream found", path.display()))
        })?;
        let fps = probed
            .video_fps
            .ok_or_else(|| MontageError::probe(format!("{}: no frame rate", path.display())))?;
        let size = opts
            .target_resolution
            .map_or(native, |target| target.apply(native));

        let info = StreamInfo {
            size,
            pix_fmt: opts.pix_fmt,
            fps,
            nframes: probed.video_nframes.unwrap_or(1),
            duration: probed.video_duration,
            rotation: probed.video_rotation,
        };
        let launcher = FfmpegDecoder::new(
            cfg,
            path,
            size,
            opts.pix_fmt,
            opts.resize_algorithm.clone(),
        );
        let mut reader = Self::with_launcher(Box::new(launcher), info, path.display().to_string())?;
        reader.probe = Some(probed);
        Ok(reader)
    }

    /// Open a reader over any launcher and read the first frame.
    ///
    /// Fails with [`MontageError::StreamUnderrun`] when the first frame cannot be read.
    pub fn with_launcher(
        launcher: Box<dyn DecoderLauncher>,
        info: StreamInfo,
        label: impl Into<String>,
    ) -> MontageResult<Self> {
        let mut reader = Self {
            label: label.into(),
            launcher,
            stream: None,
            info,
            probe: None,
            pos: FrameIndex(1),
            last_read: None,
        };
        reader.initialize(0.0)?;
        reader.pos = FrameIndex(1);
        reader.read_frame()?;
        Ok(reader)
    }

    pub fn size(&self) -> Size {
        self.info.size
    }

    pub fn fps(&self) -> f64 {
        self.info.fps
    }

    pub fn duration(&self) -> Option<Time> {
        self.info.duration
    }

    pub fn nframes(&self) -> u64 {
        self.info.nframes
    }

    pub fn rotation(&self) -> i32 {
        self.info.rotation
    }

    pub fn depth(&self) -> u8 {
        self.info.pix_fmt.depth()
    }

    /// Metadata parsed when the reader was opened from a file.
    pub fn probe_info(&self) -> Option<&ProbeInfo> {
        self.probe.as_ref()
    }

    /// Index of the frame most recently read.
    pub fn pos(&self) -> FrameIndex {
        self.pos
    }

    /// The frame most recently read, if any.
    pub fn last_read(&self) -> Option<&Raster<u8>> {
        self.last_read.as_ref()
    }

    /// `true` while a decoder stream is open.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Frame displayed at time `t`.
    pub fn get_frame(&mut self, t: Time) -> MontageResult<Raster<u8>> {
        let pos = FrameIndex::at(t, self.info.fps);

        if self.stream.is_none() {
            self.initialize(t)?;
            self.pos = pos;
            return self.read_frame();
        }

        if pos == self.pos
            && let Some(frame) = &self.last_read
        {
            return Ok(frame.clone());
        }

        if pos < self.pos || self.pos.frames_until(pos) > MAX_SKIP_FRAMES {
            self.initialize(t)?;
        } else {
            self.skip_frames(self.pos.frames_until(pos).saturating_sub(1))?;
        }
        self.pos = pos;
        self.read_frame()
    }

    /// Restart the decoder at `start`.
    ///
    /// The last read frame survives so a short first read after a seek still has a fallback.
    fn initialize(&mut self, start: Time) -> MontageResult<()> {
        self.stream = None;
        self.stream = Some(self.launcher.launch(start)?);
        Ok(())
    }

    fn frame_bytes(&self) -> usize {
        self.info.size.area() * self.depth() as usize
    }

    fn skip_frames(&mut self, n: u64) -> MontageResult<()> {
        if n == 0 {
            return Ok(());
        }
        let nbytes = self.frame_bytes() as u64 * n;
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };
        std::io::copy(&mut stream.take(nbytes), &mut std::io::sink())
            .with_context(|| format!("failed to skip frames in {}", self.label))?;
        self.pos = FrameIndex(self.pos.0 + n);
        Ok(())
    }

    fn read_frame(&mut self) -> MontageResult<Raster<u8>> {
        let nbytes = self.frame_bytes();
        let mut buf = vec![0u8; nbytes];
        let got = match self.stream.as_mut() {
            Some(stream) => read_full(stream.as_mut(), &mut buf)
                .with_context(|| format!("failed to read a frame from {}", self.label))?,
            None => 0,
        };

        if got != nbytes {
            let Some(last) = &self.last_read else {
                return Err(MontageError::underrun(format!(
                    "failed to read the first frame of {}; the file may be corrupted or \
                     unsupported by this ffmpeg build",
                    self.label
                )));
            };
            tracing::warn!(
                file = %self.label,
                wanted = nbytes,
                read = got,
                frame = self.pos.0,
                nframes = self.info.nframes,
                time = self.pos.0 as f64 / self.info.fps,
                "short read from decoder; using the last valid frame instead"
            );
            return Ok(last.clone());
        }

        let frame = Raster::from_bytes(self.info.size, self.depth(), buf)?;
        self.last_read = Some(frame.clone());
        Ok(frame)
    }

    /// Stop the decoder and forget the last frame. Safe to call more than once.
    pub fn close(&mut self) {
        self.stream = None;
        self.last_read = None;
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        self.close();
    }
}

/// Read until `buf` is full or the stream ends; returns the number of bytes read.
pub(crate) fn read_full(stream: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[path = "../../tests/unit/media/reader.rs"]
mod tests;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;

use crate::audio::clip::{AudioClip, DEFAULT_AUDIO_FPS};
use crate::clip::{Clip, resolve_fps};
use crate::foundation::core::{FrameIndex, Size};
use crate::foundation::error::{MontageError, MontageResult};
use crate::frame::raster::Raster;
use crate::media::codecs::{codec_for, default_audio_codec, extension_of, find_extension};
use crate::media::config::MediaConfig;
use crate::media::writer::{
    AudioWriter, AudioWriterOpts, FrameSink, VideoWriter, VideoWriterOpts, ensure_parent_dir,
};
use crate::video::clip::{VideoClip, save_raster};

/// Counters reported by the render entry points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStats {
    /// Video frames pushed to the sink.
    pub frames_total: u64,
    /// Audio blocks written.
    pub audio_chunks: u64,
    /// Audio sample frames written.
    pub audio_samples: u64,
}

/// Where the soundtrack of a rendered video comes from.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioOutput {
    /// Silent output.
    None,
    /// Render the clip's own audio track (if any) and mux it in.
    #[default]
    FromClip,
    /// Mux an existing audio file without re-encoding.
    File(PathBuf),
}

/// Options for [`write_videofile`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WriteVideoOpts {
    /// Output frame rate; defaults to the clip's.
    pub fps: Option<f64>,
    pub writer: VideoWriterOpts,
    pub audio: AudioOutput,
    /// Settings for the temporary soundtrack rendered from the clip.
    pub audio_opts: WriteAudioOpts,
    /// Where to put the temporary soundtrack; next to the output by default.
    pub temp_audiofile: Option<PathBuf>,
    /// Delete the temporary soundtrack once the video is written.
    pub remove_temp: bool,
}

impl Default for WriteVideoOpts {
    fn default() -> Self {
        Self {
            fps: None,
            writer: VideoWriterOpts::default(),
            audio: AudioOutput::FromClip,
            audio_opts: WriteAudioOpts::default(),
            temp_audiofile: None,
            remove_temp: true,
        }
    }
}

/// Options for [`write_audiofile`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WriteAudioOpts {
    /// Sample rate; defaults to the clip's, else 44100 Hz.
    pub fps: Option<u32>,
    /// Bytes per PCM sample sent to the encoder.
    pub nbytes: u8,
    /// Sample frames evaluated and written per block.
    pub buffersize: usize,
    pub codec: Option<String>,
    pub bitrate: Option<String>,
    pub ffmpeg_params: Vec<String>,
}

impl Default for WriteAudioOpts {
    fn default() -> Self {
        Self {
            fps: None,
            nbytes: 2,
            buffersize: 2000,
            codec: None,
            bitrate: None,
            ffmpeg_params: Vec::new(),
        }
    }
}

/// Push every frame of `clip` at `fps` into `sink`, in time order, then end the sink.
///
/// With `with_mask`, frames carry the mask as a fourth channel (opaque when there is no mask).
pub fn render_frames(
    clip: &mut VideoClip,
    fps: Option<f64>,
    with_mask: bool,
    sink: &mut dyn FrameSink,
) -> MontageResult<RenderStats> {
    let mut stats = RenderStats::default();
    let mut mask = clip.mask().cloned();
    for (i, item) in clip.iter_frames(fps)?.enumerate() {
        let (t, frame) = item?;
        let frame = if with_mask {
            let alpha = match mask.as_mut() {
                Some(m) => m.get_frame(t)?,
                None => Raster::filled(frame.size(), &[1.0f32])?,
            };
            frame.with_alpha(&alpha)?
        } else {
            frame
        };
        sink.push_frame(FrameIndex(i as u64 + 1), &frame)?;
        stats.frames_total += 1;
    }
    sink.end()?;
    Ok(stats)
}

/// Encode `clip` into a video file.
///
/// A soundtrack taken from the clip is first rendered to a temporary audio file, which the video
/// encoder then muxes in without re-encoding.
#[tracing::instrument(level = "info", skip(clip, path, opts, cfg), fields(path = %path.as_ref().display()))]
pub fn write_videofile(
    clip: &VideoClip,
    path: impl AsRef<Path>,
    opts: &WriteVideoOpts,
    cfg: &MediaConfig,
) -> MontageResult<RenderStats> {
    let path = path.as_ref();
    let started = Instant::now();
    let ext = extension_of(path)?;
    let codec = codec_for(path, opts.writer.codec.as_deref())?;
    let fps = resolve_fps(opts.fps, clip.fps())?;
    let duration = clip.duration().ok_or_else(MontageError::missing_duration)?;
    ensure_parent_dir(path)?;

    let mut writer_opts = opts.writer.clone();
    writer_opts.codec = Some(codec);
    let mut temp_audio = TempFileGuard(None);
    let mut stats = RenderStats::default();

    match &opts.audio {
        AudioOutput::None => writer_opts.audio_file = None,
        AudioOutput::File(file) => writer_opts.audio_file = Some(file.clone()),
        AudioOutput::FromClip => match clip.audio() {
            Some(audio) => {
                let audio_codec = opts
                    .audio_opts
                    .codec
                    .clone()
                    .unwrap_or_else(|| default_audio_codec(&ext).to_owned());
                let audio_path = match &opts.temp_audiofile {
                    Some(p) => p.clone(),
                    None => temp_audio_path(path, find_extension(&audio_codec)?),
                };
                let audio_opts = WriteAudioOpts {
                    codec: Some(audio_codec),
                    ..opts.audio_opts.clone()
                };
                if opts.remove_temp {
                    temp_audio.0 = Some(audio_path.clone());
                }
                let audio_stats = write_audiofile(audio, &audio_path, &audio_opts, cfg)?;
                stats.audio_chunks = audio_stats.audio_chunks;
                stats.audio_samples = audio_stats.audio_samples;
                writer_opts.audio_file = Some(audio_path);
            }
            None => writer_opts.audio_file = None,
        },
    }

    tracing::info!(
        size = %format_size(clip.size()),
        fps,
        duration,
        audio = writer_opts.audio_file.is_some(),
        "writing video"
    );
    let mut writer = VideoWriter::open(path, clip.size(), fps, &writer_opts, cfg)?;
    let mut clip = clip.clone();
    let video_stats = render_frames(&mut clip, Some(fps), writer_opts.with_mask, &mut writer)?;
    stats.frames_total = video_stats.frames_total;
    drop(temp_audio);

    tracing::info!(
        frames = stats.frames_total,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "video ready"
    );
    Ok(stats)
}

/// Encode `clip` into an audio file, streaming blocks of `opts.buffersize` samples.
#[tracing::instrument(level = "info", skip(clip, path, opts, cfg), fields(path = %path.as_ref().display()))]
pub fn write_audiofile(
    clip: &AudioClip,
    path: impl AsRef<Path>,
    opts: &WriteAudioOpts,
    cfg: &MediaConfig,
) -> MontageResult<RenderStats> {
    let path = path.as_ref();
    let fps = match opts.fps {
        Some(f) => f,
        None => clip.fps().unwrap_or(DEFAULT_AUDIO_FPS).round() as u32,
    };
    let writer_opts = AudioWriterOpts {
        codec: opts.codec.clone(),
        bitrate: opts.bitrate.clone(),
        ffmpeg_params: opts.ffmpeg_params.clone(),
    };
    let mut clip = clip.clone();
    let mut writer = AudioWriter::open(
        path,
        fps,
        opts.nbytes,
        clip.nchannels(),
        &writer_opts,
        cfg,
    )?;
    tracing::info!(fps, nchannels = clip.nchannels(), "writing audio");

    let mut stats = RenderStats::default();
    for chunk in clip.iter_chunks(opts.buffersize, Some(f64::from(fps)))? {
        let chunk = chunk?;
        writer.write_chunk(&chunk)?;
        stats.audio_chunks += 1;
        stats.audio_samples += chunk.frames() as u64;
    }
    writer.end()?;
    tracing::info!(samples = stats.audio_samples, "audio ready");
    Ok(stats)
}

/// Save every frame at `fps` as a numbered PNG in `dir` (`frame000001.png`, ...).
///
/// Returns the written paths in order.
#[tracing::instrument(level = "info", skip(clip, dir), fields(dir = %dir.as_ref().display()))]
pub fn write_image_sequence(
    clip: &VideoClip,
    dir: impl AsRef<Path>,
    fps: Option<f64>,
    with_mask: bool,
) -> MontageResult<Vec<PathBuf>> {
    let mut sink = ImageSequenceSink {
        dir: dir.as_ref().to_path_buf(),
        written: Vec::new(),
    };
    std::fs::create_dir_all(&sink.dir).with_context(|| {
        format!("failed to create output directory '{}'", sink.dir.display())
    })?;
    let mut clip = clip.clone();
    render_frames(&mut clip, fps, with_mask, &mut sink)?;
    Ok(sink.written)
}

struct ImageSequenceSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl FrameSink for ImageSequenceSink {
    fn push_frame(&mut self, idx: FrameIndex, frame: &Raster<u8>) -> MontageResult<()> {
        let path = self.dir.join(format!("frame{:06}.png", idx.0));
        save_raster(frame, &path)?;
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> MontageResult<()> {
        Ok(())
    }
}

fn temp_audio_path(video: &Path, ext: &str) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "montage".to_owned());
    video.with_file_name(format!("{stem}.montage-audio.{ext}"))
}

fn format_size(size: Size) -> String {
    format!("{}x{}", size.width, size.height)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take()
            && let Err(e) = std::fs::remove_file(&path)
        {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary file");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;

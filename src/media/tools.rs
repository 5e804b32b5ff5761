//! One-shot `ffmpeg` invocations that work on files directly, without decoding into clips.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::foundation::core::{Size, Time};
use crate::foundation::error::{MontageError, MontageResult};
use crate::media::config::MediaConfig;
use crate::media::process::run_to_completion;
use crate::media::writer::ensure_parent_dir;

fn os_args<const N: usize>(args: [&str; N]) -> Vec<OsString> {
    args.map(OsString::from).to_vec()
}

/// Default output name for [`extract_subclip`]: `name_SUB<t1 ms>_<t2 ms>.ext` next to the input.
pub fn subclip_target_name(input: &Path, t1: Time, t2: Time) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!(
            "{stem}_SUB{}_{}.{}",
            (t1 * 1000.0).round() as i64,
            (t2 * 1000.0).round() as i64,
            ext.to_string_lossy()
        ),
        None => format!(
            "{stem}_SUB{}_{}",
            (t1 * 1000.0).round() as i64,
            (t2 * 1000.0).round() as i64
        ),
    };
    input.with_file_name(name)
}

pub fn extract_subclip_args(input: &Path, t1: Time, t2: Time, output: &Path) -> Vec<OsString> {
    let mut args = os_args(["-y", "-ss"]);
    args.push(format!("{t1:.2}").into());
    args.push("-i".into());
    args.push(input.into());
    args.push("-t".into());
    args.push(format!("{:.2}", t2 - t1).into());
    args.extend(os_args(["-map", "0", "-vcodec", "copy", "-acodec", "copy"]));
    args.push(output.into());
    args
}

/// Copy the `[t1, t2)` section of a media file without re-encoding.
///
/// Cuts land on the nearest keyframes.
#[tracing::instrument(level = "debug", skip(cfg))]
pub fn extract_subclip(
    input: &Path,
    t1: Time,
    t2: Time,
    output: &Path,
    cfg: &MediaConfig,
) -> MontageResult<()> {
    if !(t1 >= 0.0 && t2 > t1) {
        return Err(MontageError::validation(format!(
            "invalid subclip range [{t1}, {t2})"
        )));
    }
    ensure_parent_dir(output)?;
    run_to_completion(cfg, &extract_subclip_args(input, t1, t2, output))?;
    Ok(())
}

pub fn merge_video_audio_args(
    video: &Path,
    audio: &Path,
    output: &Path,
    vcodec: &str,
    acodec: &str,
) -> Vec<OsString> {
    let mut args = os_args(["-y", "-i"]);
    args.push(audio.into());
    args.push("-i".into());
    args.push(video.into());
    args.extend(os_args(["-vcodec", vcodec, "-acodec", acodec]));
    args.push(output.into());
    args
}

/// Mux a video file and an audio file into `output` (`"copy"` keeps the streams as they are).
#[tracing::instrument(level = "debug", skip(cfg))]
pub fn merge_video_audio(
    video: &Path,
    audio: &Path,
    output: &Path,
    vcodec: &str,
    acodec: &str,
    cfg: &MediaConfig,
) -> MontageResult<()> {
    ensure_parent_dir(output)?;
    run_to_completion(
        cfg,
        &merge_video_audio_args(video, audio, output, vcodec, acodec),
    )?;
    Ok(())
}

pub fn extract_audio_args(
    input: &Path,
    output: &Path,
    bitrate_kbps: u32,
    fps: u32,
) -> Vec<OsString> {
    let mut args = os_args(["-y", "-i"]);
    args.push(input.into());
    args.push("-ab".into());
    args.push(format!("{bitrate_kbps}k").into());
    args.push("-ar".into());
    args.push(fps.to_string().into());
    args.push(output.into());
    args
}

/// Write the audio stream of `input` to `output`, encoded for the output's extension.
#[tracing::instrument(level = "debug", skip(cfg))]
pub fn extract_audio(
    input: &Path,
    output: &Path,
    bitrate_kbps: u32,
    fps: u32,
    cfg: &MediaConfig,
) -> MontageResult<()> {
    ensure_parent_dir(output)?;
    run_to_completion(cfg, &extract_audio_args(input, output, bitrate_kbps, fps))?;
    Ok(())
}

pub fn resize_video_args(input: &Path, output: &Path, size: Size) -> Vec<OsString> {
    let mut args = os_args(["-y", "-i"]);
    args.push(input.into());
    args.push("-vf".into());
    args.push(format!("scale={}:{}", size.width, size.height).into());
    args.push(output.into());
    args
}

/// Re-encode `input` scaled to `size`.
#[tracing::instrument(level = "debug", skip(cfg))]
pub fn resize_video(
    input: &Path,
    output: &Path,
    size: Size,
    cfg: &MediaConfig,
) -> MontageResult<()> {
    if size.width == 0 || size.height == 0 {
        return Err(MontageError::validation("target size must be non-zero"));
    }
    ensure_parent_dir(output)?;
    run_to_completion(cfg, &resize_video_args(input, output, size))?;
    Ok(())
}

pub fn movie_from_frames_args(
    folder: &Path,
    fps: f64,
    digits: usize,
    bitrate_kbps: u32,
    output: &Path,
) -> Vec<OsString> {
    let fps = format!("{fps}");
    let mut args = os_args(["-y", "-f", "image2", "-r", &fps, "-i"]);
    args.push(folder.join(format!("%0{digits}d.png")).into());
    args.push("-b".into());
    args.push(format!("{bitrate_kbps}k").into());
    args.extend(os_args(["-r", &fps]));
    args.push(output.into());
    args
}

/// Encode the numbered PNGs `000001.png`, `000002.png`, ... in `folder` into a movie.
#[tracing::instrument(level = "debug", skip(cfg))]
pub fn movie_from_frames(
    folder: &Path,
    fps: f64,
    digits: usize,
    bitrate_kbps: u32,
    output: &Path,
    cfg: &MediaConfig,
) -> MontageResult<()> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(MontageError::validation(format!("invalid frame rate {fps}")));
    }
    ensure_parent_dir(output)?;
    run_to_completion(
        cfg,
        &movie_from_frames_args(folder, fps, digits, bitrate_kbps, output),
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/media/tools.rs"]
mod tests;

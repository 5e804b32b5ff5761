use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use anyhow::Context;

use crate::foundation::core::{Size, parse_timestamp};
use crate::foundation::error::{MontageError, MontageResult};
use crate::media::config::{FpsSource, MediaConfig};
use crate::media::process::render_command_line;

/// Stream metadata read from the `ffmpeg -i` banner.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProbeInfo {
    /// Container duration in seconds.
    pub duration: Option<f64>,
    /// Whether a video stream was found.
    pub video_found: bool,
    /// Frame size of the first video stream.
    pub video_size: Option<Size>,
    /// Frame rate of the first video stream.
    pub video_fps: Option<f64>,
    /// `floor(duration * fps) + 1`, or 1 when the duration was not read.
    pub video_nframes: Option<u64>,
    /// Duration of the video stream.
    pub video_duration: Option<f64>,
    /// Display rotation in degrees.
    pub video_rotation: i32,
    /// Whether an audio stream was found.
    pub audio_found: bool,
    /// Sample rate of the first audio stream, when it could be read.
    pub audio_fps: Option<u32>,
}

/// Probe a media file by running `ffmpeg -i` and parsing its diagnostic output.
///
/// GIF durations come from decoding the whole file, since the container does not declare one.
#[tracing::instrument(level = "debug", skip(path, cfg), fields(path = %path.display()))]
pub fn probe(path: &Path, check_duration: bool, cfg: &MediaConfig) -> MontageResult<ProbeInfo> {
    let is_gif = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"));
    let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-i".into(), path.into()];
    if is_gif {
        args.extend(["-f", "null", "-"].map(OsString::from));
    }
    tracing::debug!(command = %render_command_line(cfg, &args), "probing");

    // `ffmpeg -i` without an output always exits non-zero; only stderr matters.
    let output = cfg
        .command()
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| {
            format!(
                "failed to spawn '{}' (is it installed and on PATH?)",
                cfg.ffmpeg_binary.display()
            )
        })?;
    let infos = String::from_utf8_lossy(&output.stderr);
    parse_infos(&infos, check_duration, cfg.fps_source, is_gif).map_err(|e| match e {
        MontageError::Probe(msg) => MontageError::probe(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Parse the diagnostic text printed by `ffmpeg -i`.
///
/// Lines may come in any order; the first matching line wins for each field (the last one for
/// GIF progress lines).
pub fn parse_infos(
    infos: &str,
    check_duration: bool,
    fps_source: FpsSource,
    is_gif: bool,
) -> MontageResult<ProbeInfo> {
    let lines: Vec<&str> = infos.lines().collect();
    if lines
        .last()
        .is_some_and(|l| l.contains("No such file or directory"))
    {
        return Err(MontageError::probe("file not found"));
    }

    let mut info = ProbeInfo::default();

    if check_duration {
        let keyword = if is_gif { "frame=" } else { "Duration: " };
        let mut candidates = lines.iter().filter(|l| l.contains(keyword));
        let line = if is_gif {
            candidates.next_back()
        } else {
            candidates.next()
        };
        let duration = line
            .and_then(|l| find_clock(l))
            .and_then(|c| parse_timestamp(c).ok())
            .ok_or_else(|| {
                MontageError::probe(format!("failed to read the duration\n\n{infos}"))
            })?;
        info.duration = Some(duration);
    }

    let video_line = lines
        .iter()
        .find(|l| l.contains(" Video: ") && find_frame_size(l).is_some());
    info.video_found = video_line.is_some();

    if let Some(line) = video_line {
        info.video_size = find_frame_size(line);

        let tbr = number_before(line, "tbr");
        let fps = number_before(line, "fps");
        let raw = match fps_source {
            FpsSource::Tbr => tbr.or(fps),
            FpsSource::Fps => fps.or(tbr),
        }
        .ok_or_else(|| MontageError::probe(format!("failed to read the frame rate\n\n{infos}")))?;
        let rate = snap_ntsc(raw);
        info.video_fps = Some(rate);

        match info.duration {
            Some(d) if check_duration => {
                info.video_nframes = Some((d * rate) as u64 + 1);
                info.video_duration = Some(d);
            }
            _ => info.video_nframes = Some(1),
        }

        info.video_rotation = lines
            .iter()
            .filter(|l| l.contains("rotate          :"))
            .find_map(|l| trailing_integer(l))
            .unwrap_or(0);
    }

    if let Some(line) = lines.iter().find(|l| l.contains(" Audio: ")) {
        info.audio_found = true;
        info.audio_fps = number_before(line, "Hz").map(|hz| hz as u32);
        if info.audio_fps.is_none() {
            tracing::warn!(line = %line.trim(), "audio stream without a readable sample rate");
        }
    }

    Ok(info)
}

/// First `HH:MM:SS.xx` clock in `line`.
fn find_clock(line: &str) -> Option<&str> {
    const LEN: usize = 11;
    let b = line.as_bytes();
    (0..b.len().saturating_sub(LEN - 1))
        .find(|&i| {
            let w = &b[i..i + LEN];
            [0, 1, 3, 4, 6, 7, 9, 10]
                .iter()
                .all(|&k| w[k].is_ascii_digit())
                && w[2] == b':'
                && w[5] == b':'
        })
        .and_then(|i| line.get(i..i + LEN))
}

/// First `WxH` token that is followed by a comma or a space.
fn find_frame_size(line: &str) -> Option<Size> {
    line.split(' ').skip(1).find_map(|token| {
        let token = token.strip_suffix(',').unwrap_or(token);
        let (w, h) = token.split_once('x')?;
        if w.is_empty() || h.is_empty() {
            return None;
        }
        Some(Size::new(w.parse().ok()?, h.parse().ok()?))
    })
}

/// The number printed right before the `unit` word, e.g. `25 tbr` or `44100 Hz`.
///
/// A `k` suffix multiplies by 1000.
fn number_before(line: &str, unit: &str) -> Option<f64> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.windows(2).find_map(|w| {
        let word = w[1].trim_end_matches(',');
        if word != unit {
            return None;
        }
        match w[0].strip_suffix('k') {
            Some(v) => v.parse::<f64>().ok().map(|v| v * 1000.0),
            None => w[0].parse::<f64>().ok(),
        }
    })
}

/// NTSC rates like 29.97 are printed rounded; restore the exact `x * 1000 / 1001` value.
fn snap_ntsc(fps: f64) -> f64 {
    let coef = 1000.0 / 1001.0;
    [23.0, 24.0, 25.0, 30.0, 50.0]
        .into_iter()
        .find(|&x| fps != x && (fps - x * coef).abs() < 0.01)
        .map_or(fps, |x| x * coef)
}

fn trailing_integer(line: &str) -> Option<i32> {
    let line = line.trim_end();
    let digits = line.len() - line.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    line[line.len() - digits..].parse().ok()
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;

use std::path::Path;

use crate::foundation::error::{MontageError, MontageResult};

/// Whether a container extension holds video or audio only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

/// One known output extension and the codecs it accepts; the first codec is the default.
#[derive(Clone, Copy, Debug)]
pub struct ExtensionInfo {
    pub extension: &'static str,
    pub kind: MediaKind,
    pub codecs: &'static [&'static str],
}

pub const EXTENSIONS: &[ExtensionInfo] = &[
    ExtensionInfo {
        extension: "mp4",
        kind: MediaKind::Video,
        codecs: &["libx264", "libmpeg4", "aac"],
    },
    ExtensionInfo {
        extension: "ogv",
        kind: MediaKind::Video,
        codecs: &["libtheora"],
    },
    ExtensionInfo {
        extension: "webm",
        kind: MediaKind::Video,
        codecs: &["libvpx"],
    },
    ExtensionInfo {
        extension: "avi",
        kind: MediaKind::Video,
        codecs: &[],
    },
    ExtensionInfo {
        extension: "mov",
        kind: MediaKind::Video,
        codecs: &[],
    },
    ExtensionInfo {
        extension: "ogg",
        kind: MediaKind::Audio,
        codecs: &["libvorbis"],
    },
    ExtensionInfo {
        extension: "mp3",
        kind: MediaKind::Audio,
        codecs: &["libmp3lame"],
    },
    ExtensionInfo {
        extension: "wav",
        kind: MediaKind::Audio,
        codecs: &["pcm_s16le", "pcm_s24le", "pcm_s32le"],
    },
    ExtensionInfo {
        extension: "m4a",
        kind: MediaKind::Audio,
        codecs: &["libfdk_aac"],
    },
];

/// Table entry for `ext` (case-insensitive, without the dot).
pub fn extension_info(ext: &str) -> Option<&'static ExtensionInfo> {
    EXTENSIONS
        .iter()
        .find(|info| info.extension.eq_ignore_ascii_case(ext))
}

/// Extension of `path` in lower case.
pub fn extension_of(path: &Path) -> MontageResult<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            MontageError::validation(format!(
                "cannot infer the format of '{}': the file has no extension",
                path.display()
            ))
        })
}

/// Codec to use for `path`: `explicit` wins, otherwise the default for the file extension.
pub fn codec_for(path: &Path, explicit: Option<&str>) -> MontageResult<String> {
    if let Some(codec) = explicit {
        return Ok(expand_alias(codec).to_owned());
    }
    let ext = extension_of(path)?;
    match extension_info(&ext).and_then(|info| info.codecs.first()) {
        Some(codec) => Ok((*codec).to_owned()),
        None => Err(MontageError::validation(format!(
            "no default codec for extension '.{ext}'; pass a codec explicitly"
        ))),
    }
}

/// Audio codec muxed into a video file with extension `ext` when none is given.
pub fn default_audio_codec(video_ext: &str) -> &'static str {
    match video_ext.to_ascii_lowercase().as_str() {
        "ogv" | "webm" => "libvorbis",
        _ => "libmp3lame",
    }
}

/// Short names accepted for raw PCM codecs.
pub fn expand_alias(codec: &str) -> &str {
    match codec {
        "raw16" => "pcm_s16le",
        "raw32" => "pcm_s32le",
        other => other,
    }
}

/// Extension of a file that can hold `codec`, used to name temporary audio tracks.
pub fn find_extension(codec: &str) -> MontageResult<&'static str> {
    let codec = expand_alias(codec);
    if codec.starts_with("pcm_") {
        return Ok("wav");
    }
    EXTENSIONS
        .iter()
        .find(|info| info.codecs.iter().any(|c| *c == codec))
        .map(|info| info.extension)
        .ok_or_else(|| {
            MontageError::validation(format!(
                "codec '{codec}' has no known file extension; name the output file explicitly"
            ))
        })
}

/// ffmpeg raw format and PCM codec names for `nbytes`-wide signed little-endian samples.
pub(crate) fn pcm_format(nbytes: u8) -> MontageResult<(&'static str, &'static str)> {
    match nbytes {
        1 => Ok(("s8", "pcm_s8")),
        2 => Ok(("s16le", "pcm_s16le")),
        4 => Ok(("s32le", "pcm_s32le")),
        other => Err(MontageError::validation(format!(
            "unsupported PCM sample width {other} (expected 1, 2 or 4 bytes)"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/codecs.rs"]
mod tests;

use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Which probe field gives the frame rate of a video stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FpsSource {
    /// The `tbr` value (real base frame rate guessed by the decoder).
    #[default]
    Tbr,
    /// The declared `fps` value.
    Fps,
}

impl std::str::FromStr for FpsSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tbr" => Ok(Self::Tbr),
            "fps" => Ok(Self::Fps),
            other => Err(format!("unknown fps source '{other}' (expected 'tbr' or 'fps')")),
        }
    }
}

/// Settings shared by every probe, reader, writer and tool invocation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path or name of the `ffmpeg` executable.
    pub ffmpeg_binary: PathBuf,
    /// Frame-rate field used when probing videos.
    pub fps_source: FpsSource,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: PathBuf::from("ffmpeg"),
            fps_source: FpsSource::Tbr,
        }
    }
}

impl MediaConfig {
    /// Defaults overridden by `MONTAGE_FFMPEG_BINARY` (or `FFMPEG_BINARY`) and
    /// `MONTAGE_FPS_SOURCE`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(bin) = std::env::var_os("MONTAGE_FFMPEG_BINARY")
            .or_else(|| std::env::var_os("FFMPEG_BINARY"))
            .filter(|v| !v.is_empty())
        {
            cfg.ffmpeg_binary = PathBuf::from(bin);
        }
        if let Some(source) = std::env::var("MONTAGE_FPS_SOURCE")
            .ok()
            .and_then(|v| v.parse::<FpsSource>().ok())
        {
            cfg.fps_source = source;
        }
        cfg
    }

    pub(crate) fn command(&self) -> Command {
        Command::new(&self.ffmpeg_binary)
    }
}

/// Return `true` when the configured `ffmpeg` binary can be invoked.
pub fn is_ffmpeg_available(cfg: &MediaConfig) -> bool {
    cfg.command()
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/media/config.rs"]
mod tests;

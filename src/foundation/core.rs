use crate::foundation::error::{MontageError, MontageResult};

/// Time in seconds, measured from the start of the owning clip.
pub type Time = f64;

/// Tolerance added before flooring `fps * t` so that `t = k / fps` lands on frame `k`.
pub const FRAME_EPSILON: f64 = 0.00001;

/// 1-based index of a frame in a decoded stream.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Index of the frame displayed at time `t` for a stream running at `fps`.
    pub fn at(t: Time, fps: f64) -> Self {
        let raw = (fps * t + FRAME_EPSILON).floor();
        Self(raw.max(0.0) as u64 + 1)
    }

    /// Number of frames from `self` forward to `other` (zero when `other` is not ahead).
    pub fn frames_until(self, other: FrameIndex) -> u64 {
        other.0.saturating_sub(self.0)
    }
}

/// Frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a size from width and height.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels.
    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Component-wise maximum of two sizes.
    pub fn max(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// `true` when both dimensions are even (required by yuv420p output).
    pub fn is_even(self) -> bool {
        self.width.is_multiple_of(2) && self.height.is_multiple_of(2)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Parse a timestamp such as `"12.5"`, `"01:30"`, `"00:01:02.25"` or `"00:01:02,25"` into seconds.
///
/// Fields are read right-to-left as seconds, minutes and hours.
pub fn parse_timestamp(text: &str) -> MontageResult<Time> {
    let text = text.trim();
    if text.is_empty() {
        return Err(MontageError::validation("empty timestamp"));
    }
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return Err(MontageError::validation(format!(
            "timestamp '{text}' has more than three fields"
        )));
    }

    let mut secs = 0.0;
    for (part, factor) in parts.iter().rev().zip([1.0, 60.0, 3600.0]) {
        let value: f64 = part.replace(',', ".").parse().map_err(|_| {
            MontageError::validation(format!("invalid timestamp field '{part}' in '{text}'"))
        })?;
        secs += value * factor;
    }
    Ok(secs)
}

/// Format seconds the way ffmpeg seek arguments expect them.
pub(crate) fn format_seek(t: Time) -> String {
    format!("{t:.6}")
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

use crate::foundation::core::Time;
use crate::foundation::error::{MontageError, MontageResult};

/// Placement of a clip on its parent's time axis.
///
/// Invariant: `end == start + duration` whenever both `end` and `duration` are known.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    /// Time at which the clip starts playing.
    pub start: Time,
    /// Exclusive end time; `None` for an unbounded clip.
    pub end: Option<Time>,
    /// Length of the clip; `None` when unknown.
    pub duration: Option<Time>,
}

impl Span {
    /// A span starting at 0 with the given duration.
    pub fn with_duration(duration: Option<Time>) -> Self {
        Self {
            start: 0.0,
            end: duration,
            duration,
        }
    }

    /// Move the start. With `change_end` the duration is kept and the end moves along;
    /// otherwise the end is kept and the duration absorbs the change.
    pub fn set_start(&mut self, t: Time, change_end: bool) {
        self.start = t;
        if let Some(d) = self.duration
            && change_end
        {
            self.end = Some(t + d);
        } else if let Some(end) = self.end {
            self.duration = Some(end - self.start);
        }
    }

    /// Set the end; the duration follows from the (known) start.
    pub fn set_end(&mut self, t: Option<Time>) {
        self.end = t;
        if let Some(end) = t {
            self.duration = Some(end - self.start);
        }
    }

    /// Set the duration. With `change_end` the end moves (or becomes unbounded);
    /// otherwise the end is kept and the start moves back.
    pub fn set_duration(&mut self, t: Option<Time>, change_end: bool) -> MontageResult<()> {
        if change_end {
            self.duration = t;
            self.end = t.map(|d| self.start + d);
            return Ok(());
        }
        let Some(d) = t else {
            return Err(MontageError::configuration(
                "cannot keep the end fixed when the new duration is unset",
            ));
        };
        let Some(end) = self.end else {
            return Err(MontageError::configuration(
                "cannot keep the end fixed on a clip without an end",
            ));
        };
        self.duration = Some(d);
        self.start = end - d;
        Ok(())
    }

    /// `true` iff `t` lies in `[start, end)` (or `[start, inf)` when unbounded).
    pub fn is_playing(&self, t: Time) -> bool {
        t >= self.start && self.end.is_none_or(|end| t < end)
    }

    /// Element-wise [`Span::is_playing`].
    ///
    /// Returns `None` without visiting every element when the whole batch lies outside the span.
    pub fn is_playing_many(&self, tt: &[Time]) -> Option<Vec<bool>> {
        let (tmin, tmax) = tt
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
                (lo.min(t), hi.max(t))
            });
        if tt.is_empty() || tmax < self.start {
            return None;
        }
        if let Some(end) = self.end
            && tmin >= end
        {
            return None;
        }
        Some(tt.iter().map(|&t| self.is_playing(t)).collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clip/span.rs"]
mod tests;

//! Lazy, time-indexed frame sources.
//!
//! A clip is a function of time with a [`Span`] on its parent's time axis. Every timing edit
//! returns a new clip; derived children (mask, audio) are re-timed together with their parent.

pub(crate) mod span;

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::core::Time;
use crate::foundation::error::{MontageError, MontageResult};

pub use span::Span;

/// Produces the frame of a clip at clip-local time `t`.
pub trait FrameSource<F> {
    /// Compute the frame at time `t`.
    fn frame_at(&mut self, t: Time) -> MontageResult<F>;
}

impl<F, T> FrameSource<F> for T
where
    T: FnMut(Time) -> MontageResult<F>,
{
    fn frame_at(&mut self, t: Time) -> MontageResult<F> {
        self(t)
    }
}

/// Frame source shared between a clip and its copies.
pub type SharedSource<F> = Rc<RefCell<dyn FrameSource<F>>>;

pub(crate) fn share_source<F, S>(source: S) -> SharedSource<F>
where
    S: FrameSource<F> + 'static,
{
    Rc::new(RefCell::new(source))
}

pub(crate) fn pull_frame<F>(source: &SharedSource<F>, t: Time) -> MontageResult<F> {
    let mut source = source.try_borrow_mut().map_err(|_| {
        MontageError::validation("frame source re-entered while producing a frame")
    })?;
    source.frame_at(t)
}

/// Single-slot `(t, frame)` cache.
///
/// Hits require exact equality of `t`; times that differ by rounding noise are recomputed.
#[derive(Clone, Debug)]
pub struct FrameCache<F> {
    enabled: bool,
    slot: Option<(Time, F)>,
}

impl<F> Default for FrameCache<F> {
    fn default() -> Self {
        Self {
            enabled: false,
            slot: None,
        }
    }
}

impl<F: Clone> FrameCache<F> {
    /// Turn memoization on or off; turning it off drops the cached frame.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.slot = None;
        }
    }

    /// Whether memoization is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn lookup(&self, t: Time) -> Option<F> {
        if !self.enabled {
            return None;
        }
        match &self.slot {
            Some((cached_t, frame)) if *cached_t == t => Some(frame.clone()),
            _ => None,
        }
    }

    fn store(&mut self, t: Time, frame: &F) {
        if self.enabled {
            self.slot = Some((t, frame.clone()));
        }
    }
}

/// Behaviour shared by every clip type.
pub trait Clip: Clone {
    /// What `get_frame` returns.
    type Frame: Clone;

    /// Timing of this clip.
    fn span(&self) -> &Span;

    /// The clip's own frame rate, used when none is passed explicitly.
    fn fps(&self) -> Option<f64>;

    /// The memoization slot.
    fn cache(&mut self) -> &mut FrameCache<Self::Frame>;

    /// Compute the frame at clip-local time `t`, bypassing the cache.
    fn make_frame(&mut self, t: Time) -> MontageResult<Self::Frame>;

    /// Apply `edit` to this clip's span and to the spans of its derived children.
    fn for_each_span(&mut self, edit: &mut dyn FnMut(&mut Span));

    /// Start time on the parent's axis.
    fn start(&self) -> Time {
        self.span().start
    }

    /// End time, `None` when unbounded.
    fn end(&self) -> Option<Time> {
        self.span().end
    }

    /// Duration, `None` when unknown.
    fn duration(&self) -> Option<Time> {
        self.span().duration
    }

    /// See [`Span::is_playing`].
    fn is_playing(&self, t: Time) -> bool {
        self.span().is_playing(t)
    }

    /// See [`Span::is_playing_many`].
    fn is_playing_many(&self, tt: &[Time]) -> Option<Vec<bool>> {
        self.span().is_playing_many(tt)
    }

    /// Copy of this clip starting at `t`. See [`Span::set_start`].
    fn with_start(&self, t: Time, change_end: bool) -> Self {
        let mut out = self.clone();
        out.for_each_span(&mut |s| s.set_start(t, change_end));
        out
    }

    /// Copy of this clip ending at `t`. See [`Span::set_end`].
    fn with_end(&self, t: Option<Time>) -> Self {
        let mut out = self.clone();
        out.for_each_span(&mut |s| s.set_end(t));
        out
    }

    /// Copy of this clip lasting `t`. See [`Span::set_duration`].
    fn with_duration(&self, t: Option<Time>, change_end: bool) -> MontageResult<Self> {
        let mut out = self.clone();
        let mut failure = None;
        out.for_each_span(&mut |s| {
            if failure.is_none()
                && let Err(e) = s.set_duration(t, change_end)
            {
                failure = Some(e);
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }

    /// Copy of this clip with memoization switched on or off.
    fn with_memoize(&self, enabled: bool) -> Self {
        let mut out = self.clone();
        out.cache().set_enabled(enabled);
        out
    }

    /// Frame at time `t`, served from the memoization slot when `t` matches exactly.
    fn get_frame(&mut self, t: Time) -> MontageResult<Self::Frame> {
        if let Some(frame) = self.cache().lookup(t) {
            return Ok(frame);
        }
        let frame = self.make_frame(t)?;
        self.cache().store(t, &frame);
        Ok(frame)
    }

    /// Iterate `(t, frame)` for `t = 0, 1/fps, 2/fps, ...` strictly below the duration.
    ///
    /// `fps` falls back to the clip's own rate. Each call starts a fresh iteration.
    fn iter_frames(&mut self, fps: Option<f64>) -> MontageResult<FrameIter<'_, Self>> {
        let duration = self.duration().ok_or_else(MontageError::missing_duration)?;
        let fps = resolve_fps(fps, self.fps())?;
        Ok(FrameIter {
            clip: self,
            fps,
            duration,
            index: 0,
        })
    }
}

/// Explicit fps, else the clip's own, else a configuration error.
pub(crate) fn resolve_fps(explicit: Option<f64>, own: Option<f64>) -> MontageResult<f64> {
    let fps = explicit.or(own).ok_or_else(|| {
        MontageError::configuration(
            "no fps given and the clip has no fps of its own; pass an explicit fps",
        )
    })?;
    if !fps.is_finite() || fps <= 0.0 {
        return Err(MontageError::validation(format!(
            "fps must be positive, got {fps}"
        )));
    }
    Ok(fps)
}

/// Lazy iterator returned by [`Clip::iter_frames`].
pub struct FrameIter<'a, C: Clip> {
    clip: &'a mut C,
    fps: f64,
    duration: Time,
    index: u64,
}

impl<C: Clip> FrameIter<'_, C> {
    /// Rate at which frames are sampled.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Number of frames the full iteration yields.
    pub fn total_frames(&self) -> u64 {
        let mut n = (self.duration * self.fps).ceil().max(0.0) as u64;
        while n > 0 && (n - 1) as f64 / self.fps >= self.duration {
            n -= 1;
        }
        while (n as f64) / self.fps < self.duration {
            n += 1;
        }
        n
    }
}

impl<C: Clip> Iterator for FrameIter<'_, C> {
    type Item = MontageResult<(Time, C::Frame)>;

    fn next(&mut self) -> Option<Self::Item> {
        let t = self.index as f64 / self.fps;
        if t >= self.duration {
            return None;
        }
        self.index += 1;
        Some(self.clip.get_frame(t).map(|frame| (t, frame)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clip/clip.rs"]
mod tests;

use std::fmt;
use std::rc::Rc;

use crate::foundation::core::{Size, Time};

/// Horizontal placement of a clip on its canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XPos {
    /// Offset in pixels (or a fraction of the canvas width when relative).
    Px(f64),
    /// Flush with the left edge.
    Left,
    /// Horizontally centered.
    Center,
    /// Flush with the right edge.
    Right,
}

/// Vertical placement of a clip on its canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YPos {
    /// Offset in pixels (or a fraction of the canvas height when relative).
    Px(f64),
    /// Flush with the top edge.
    Top,
    /// Vertically centered.
    Center,
    /// Flush with the bottom edge.
    Bottom,
}

/// Named single-word positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Centered on both axes.
    Center,
    /// Left edge, vertically centered.
    Left,
    /// Right edge, vertically centered.
    Right,
    /// Top edge, horizontally centered.
    Top,
    /// Bottom edge, horizontally centered.
    Bottom,
}

/// Top-left corner of a clip on a canvas, one rule per axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    /// Horizontal rule.
    pub x: XPos,
    /// Vertical rule.
    pub y: YPos,
}

impl Placement {
    /// Absolute offset `(x, y)`.
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x: XPos::Px(x),
            y: YPos::Px(y),
        }
    }

    /// Resolve to integer pixel offsets for a clip of `clip` size on a canvas of `canvas` size.
    ///
    /// With `relative`, pixel values are fractions of the canvas dimensions. Offsets are
    /// truncated toward zero.
    pub fn resolve(self, canvas: Size, clip: Size, relative: bool) -> (i64, i64) {
        let (wf, hf) = (f64::from(canvas.width), f64::from(canvas.height));
        let (wi, hi) = (f64::from(clip.width), f64::from(clip.height));
        let x = match self.x {
            XPos::Px(v) if relative => v * wf,
            XPos::Px(v) => v,
            XPos::Left => 0.0,
            XPos::Center => (wf - wi) / 2.0,
            XPos::Right => wf - wi,
        };
        let y = match self.y {
            YPos::Px(v) if relative => v * hf,
            YPos::Px(v) => v,
            YPos::Top => 0.0,
            YPos::Center => (hf - hi) / 2.0,
            YPos::Bottom => hf - hi,
        };
        (x as i64, y as i64)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::xy(0.0, 0.0)
    }
}

impl From<Anchor> for Placement {
    fn from(anchor: Anchor) -> Self {
        let (x, y) = match anchor {
            Anchor::Center => (XPos::Center, YPos::Center),
            Anchor::Left => (XPos::Left, YPos::Center),
            Anchor::Right => (XPos::Right, YPos::Center),
            Anchor::Top => (XPos::Center, YPos::Top),
            Anchor::Bottom => (XPos::Center, YPos::Bottom),
        };
        Self { x, y }
    }
}

impl From<(f64, f64)> for Placement {
    fn from((x, y): (f64, f64)) -> Self {
        Self::xy(x, y)
    }
}

/// Position of a clip as a function of clip-local time.
#[derive(Clone)]
pub enum Position {
    /// Same placement at every time.
    Fixed(Placement),
    /// Placement computed per frame.
    Animated(Rc<dyn Fn(Time) -> Placement>),
}

impl Position {
    /// Animated position from a closure.
    pub fn animated(f: impl Fn(Time) -> Placement + 'static) -> Self {
        Self::Animated(Rc::new(f))
    }

    /// Placement at clip-local time `t`.
    pub fn at(&self, t: Time) -> Placement {
        match self {
            Self::Fixed(p) => *p,
            Self::Animated(f) => f(t),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::Fixed(Placement::default())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(p) => f.debug_tuple("Fixed").field(p).finish(),
            Self::Animated(_) => f.write_str("Animated(..)"),
        }
    }
}

impl From<Placement> for Position {
    fn from(p: Placement) -> Self {
        Self::Fixed(p)
    }
}

impl From<Anchor> for Position {
    fn from(a: Anchor) -> Self {
        Self::Fixed(a.into())
    }
}

impl From<(f64, f64)> for Position {
    fn from(xy: (f64, f64)) -> Self {
        Self::Fixed(xy.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/position.rs"]
mod tests;

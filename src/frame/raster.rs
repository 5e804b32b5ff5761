use std::fmt::Debug;

use crate::foundation::core::Size;
use crate::foundation::error::{MontageError, MontageResult};

/// Pixel sample type stored in a [`Raster`].
///
/// `u8` is used for regular video frames, `f32` in `[0, 1]` for mask frames.
pub trait Sample: Copy + Default + PartialEq + Debug + 'static {
    /// `true` for opacity samples (mask clips).
    const IS_MASK: bool;
    /// Channel count of a default background frame.
    const DEFAULT_CHANNELS: u8;

    /// Widen to `f32` for blending.
    fn to_f32(self) -> f32;
    /// Narrow from `f32`; 8-bit samples truncate toward zero and saturate.
    fn from_f32(v: f32) -> Self;
}

impl Sample for u8 {
    const IS_MASK: bool = false;
    const DEFAULT_CHANNELS: u8 = 3;

    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    fn from_f32(v: f32) -> Self {
        v as u8
    }
}

impl Sample for f32 {
    const IS_MASK: bool = true;
    const DEFAULT_CHANNELS: u8 = 1;

    fn to_f32(self) -> f32 {
        self
    }

    fn from_f32(v: f32) -> Self {
        v
    }
}

/// Row-major `height x width x channels` pixel buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster<P> {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<P>,
}

/// 8-bit video frame.
pub type Frame = Raster<u8>;
/// Floating-point opacity frame.
pub type MaskFrame = Raster<f32>;

impl<P: Sample> Raster<P> {
    /// Wrap `data` as a raster, validating its length.
    pub fn new(size: Size, channels: u8, data: Vec<P>) -> MontageResult<Self> {
        if channels == 0 {
            return Err(MontageError::validation("raster channel count must be > 0"));
        }
        let expected = size.area() * usize::from(channels);
        if data.len() != expected {
            return Err(MontageError::validation(format!(
                "raster data length {} does not match {}x{}x{channels}",
                data.len(),
                size.width,
                size.height
            )));
        }
        Ok(Self {
            width: size.width,
            height: size.height,
            channels,
            data,
        })
    }

    /// A raster where every pixel equals `color` (one value per channel).
    pub fn filled(size: Size, color: &[P]) -> MontageResult<Self> {
        let channels = u8::try_from(color.len())
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| MontageError::validation("fill color must have 1..=255 channels"))?;
        let data = color.repeat(size.area());
        Self::new(size, channels, data)
    }

    /// A raster of default (zero) samples.
    pub fn zeros(size: Size, channels: u8) -> Self {
        Self {
            width: size.width,
            height: size.height,
            channels: channels.max(1),
            data: vec![P::default(); size.area() * usize::from(channels.max(1))],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frame dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Samples per pixel.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw row-major samples.
    pub fn data(&self) -> &[P] {
        &self.data
    }

    /// Consume the raster and return its samples.
    pub fn into_data(self) -> Vec<P> {
        self.data
    }

    /// Samples of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> &[P] {
        let idx = self.offset(x, y);
        &self.data[idx..idx + usize::from(self.channels)]
    }

    pub(crate) fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [P] {
        let idx = self.offset(x, y);
        let ch = usize::from(self.channels);
        &mut self.data[idx..idx + ch]
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * usize::from(self.channels)
    }

    /// Largest sample value, or 0 for an empty raster.
    pub fn max_value(&self) -> f32 {
        self.data
            .iter()
            .map(|s| s.to_f32())
            .fold(0.0f32, f32::max)
    }

    /// Convert every sample to another sample type.
    pub fn convert<Q: Sample>(&self) -> Raster<Q> {
        Raster {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: self.data.iter().map(|s| Q::from_f32(s.to_f32())).collect(),
        }
    }

    /// Pad (with `fill`) or cut the raster so that it has exactly `size`.
    ///
    /// Existing pixels keep their coordinates; new rows/columns are appended at the bottom/right.
    pub fn fit_to(&self, size: Size, fill: P) -> Self {
        if size == self.size() {
            return self.clone();
        }
        let mut out = Self {
            width: size.width,
            height: size.height,
            channels: self.channels,
            data: vec![fill; size.area() * usize::from(self.channels)],
        };
        let w = self.width.min(size.width);
        let h = self.height.min(size.height);
        let row_len = w as usize * usize::from(self.channels);
        for y in 0..h {
            let src = self.offset(0, y);
            let dst = out.offset(0, y);
            out.data[dst..dst + row_len].copy_from_slice(&self.data[src..src + row_len]);
        }
        out
    }

    /// The sub-rectangle `[x1, x2) x [y1, y2)`, clamped to the raster bounds.
    pub fn crop(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        let x2 = x2.min(self.width);
        let y2 = y2.min(self.height);
        let x1 = x1.min(x2);
        let y1 = y1.min(y2);
        let size = Size::new(x2 - x1, y2 - y1);
        let ch = usize::from(self.channels);
        let row_len = size.width as usize * ch;
        let mut data = Vec::with_capacity(size.area() * ch);
        for y in y1..y2 {
            let src = self.offset(x1, y);
            data.extend_from_slice(&self.data[src..src + row_len]);
        }
        Self {
            width: size.width,
            height: size.height,
            channels: self.channels,
            data,
        }
    }

    /// Element-wise `min(1, self + other)`, used to accumulate mask layers.
    pub(crate) fn add_clamped(&self, other: &Self) -> MontageResult<Self> {
        if self.size() != other.size() || self.channels != other.channels {
            return Err(MontageError::validation(
                "add_clamped expects rasters of equal shape",
            ));
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| P::from_f32((a.to_f32() + b.to_f32()).min(1.0)))
            .collect();
        Ok(Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data,
        })
    }
}

impl Raster<u8> {
    /// Build a frame from a raw decoder buffer of `depth` bytes per pixel.
    pub fn from_bytes(size: Size, depth: u8, bytes: Vec<u8>) -> MontageResult<Self> {
        Self::new(size, depth, bytes)
    }

    /// Split an RGBA frame into its RGB part and an opacity mask in `[0, 1]`.
    pub fn split_alpha(&self) -> MontageResult<(Raster<u8>, Raster<f32>)> {
        if self.channels != 4 {
            return Err(MontageError::validation(format!(
                "split_alpha expects 4 channels, got {}",
                self.channels
            )));
        }
        let mut rgb = Vec::with_capacity(self.size().area() * 3);
        let mut alpha = Vec::with_capacity(self.size().area());
        for px in self.data.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(f32::from(px[3]) / 255.0);
        }
        Ok((
            Raster::new(self.size(), 3, rgb)?,
            Raster::new(self.size(), 1, alpha)?,
        ))
    }

    /// Append `mask` (scaled to 0..=255) as an alpha channel.
    pub fn with_alpha(&self, mask: &Raster<f32>) -> MontageResult<Raster<u8>> {
        if mask.size() != self.size() || mask.channels != 1 || self.channels != 3 {
            return Err(MontageError::validation(
                "with_alpha expects an RGB frame and a single-channel mask of equal size",
            ));
        }
        let mut data = Vec::with_capacity(self.size().area() * 4);
        for (px, a) in self.data.chunks_exact(3).zip(&mask.data) {
            data.extend_from_slice(px);
            data.push((255.0 * a.clamp(0.0, 1.0)) as u8);
        }
        Raster::new(self.size(), 4, data)
    }
}

impl Raster<f32> {
    /// Render the mask as a grey RGB frame (`255 * m` on every channel).
    pub fn to_rgb(&self) -> Raster<u8> {
        let mut data = Vec::with_capacity(self.size().area() * 3);
        for px in self.data.chunks_exact(usize::from(self.channels)) {
            let v = (255.0 * px[0]) as u8;
            data.extend_from_slice(&[v, v, v]);
        }
        Raster {
            width: self.width,
            height: self.height,
            channels: 3,
            data,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/raster.rs"]
mod tests;

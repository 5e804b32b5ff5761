use std::fmt;
use std::path::Path;

use anyhow::Context;

use crate::audio::clip::AudioClip;
use crate::clip::{Clip, FrameCache, FrameSource, SharedSource, Span, pull_frame, share_source};
use crate::foundation::core::{Size, Time};
use crate::foundation::error::{MontageError, MontageResult};
use crate::frame::raster::{Raster, Sample};
use crate::video::blit::blit;
use crate::video::position::Position;

/// Lazy sequence of images.
///
/// `P = u8` is a regular video clip; `P = f32` is a mask clip whose single-channel frames give
/// per-pixel opacity in `[0, 1]`. A clip may carry a mask and an audio track, both of which are
/// re-timed together with it.
#[derive(Clone)]
pub struct VideoClip<P: Sample = u8> {
    span: Span,
    source: SharedSource<Raster<P>>,
    cache: FrameCache<Raster<P>>,
    size: Size,
    fps: Option<f64>,
    position: Position,
    relative_pos: bool,
    has_constant_size: bool,
    mask: Option<Box<VideoClip<f32>>>,
    audio: Option<AudioClip>,
}

/// Mask clip: single-channel opacity frames.
pub type MaskClip = VideoClip<f32>;

impl<P: Sample> fmt::Debug for VideoClip<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoClip")
            .field("span", &self.span)
            .field("size", &self.size)
            .field("fps", &self.fps)
            .field("is_mask", &P::IS_MASK)
            .field("position", &self.position)
            .field("relative_pos", &self.relative_pos)
            .field("has_mask", &self.mask.is_some())
            .field("has_audio", &self.audio.is_some())
            .finish_non_exhaustive()
    }
}

impl<P: Sample> VideoClip<P> {
    pub(crate) fn from_source<S>(source: S, size: Size, duration: Option<Time>) -> Self
    where
        S: FrameSource<Raster<P>> + 'static,
    {
        Self {
            span: Span::with_duration(duration),
            source: share_source(source),
            cache: FrameCache::default(),
            size,
            fps: None,
            position: Position::default(),
            relative_pos: false,
            has_constant_size: true,
            mask: None,
            audio: None,
        }
    }

    /// Clip whose frames are computed by `make_frame` at clip-local time.
    ///
    /// The clip size is taken from the frame at `t = 0`.
    pub fn from_fn<F>(mut make_frame: F, duration: Option<Time>) -> MontageResult<Self>
    where
        F: FnMut(Time) -> MontageResult<Raster<P>> + 'static,
    {
        let size = make_frame(0.0)?.size();
        Ok(Self::from_source(make_frame, size, duration))
    }

    /// Clip showing the same image at every time.
    pub fn image(image: Raster<P>, duration: Option<Time>) -> Self {
        let size = image.size();
        let source = move |_t: Time| -> MontageResult<Raster<P>> { Ok(image.clone()) };
        Self::from_source(source, size, duration)
    }

    /// Clip of a single solid color, one value per channel.
    pub fn color(size: Size, color: &[P], duration: Option<Time>) -> MontageResult<Self> {
        Ok(Self::image(Raster::filled(size, color)?, duration))
    }

    /// Frame dimensions.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Frame width.
    pub fn w(&self) -> u32 {
        self.size.width
    }

    /// Frame height.
    pub fn h(&self) -> u32 {
        self.size.height
    }

    /// `width / height`.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.size.width) / f64::from(self.size.height)
    }

    /// Position used when the clip is composited.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Whether pixel positions are fractions of the canvas size.
    pub fn relative_pos(&self) -> bool {
        self.relative_pos
    }

    /// Whether every frame has [`VideoClip::size`].
    pub fn has_constant_size(&self) -> bool {
        self.has_constant_size
    }

    /// The opacity mask, if any.
    pub fn mask(&self) -> Option<&MaskClip> {
        self.mask.as_deref()
    }

    /// The audio track, if any.
    pub fn audio(&self) -> Option<&AudioClip> {
        self.audio.as_ref()
    }

    /// Copy with a different frame rate.
    pub fn with_fps(&self, fps: Option<f64>) -> Self {
        let mut out = self.clone();
        out.fps = fps;
        out
    }

    /// Copy whose frames may vary in size over time.
    pub fn with_variable_size(&self) -> Self {
        let mut out = self.clone();
        out.has_constant_size = false;
        out
    }

    /// Copy placed at `pos`; the mask follows.
    pub fn set_position(&self, pos: impl Into<Position>, relative: bool) -> Self {
        let mut out = self.clone();
        out.place(pos.into(), relative);
        out
    }

    fn place(&mut self, pos: Position, relative: bool) {
        if let Some(mask) = self.mask.as_mut() {
            mask.place(pos.clone(), relative);
        }
        self.position = pos;
        self.relative_pos = relative;
    }

    /// Copy with `mask` as opacity mask.
    pub fn set_mask(&self, mask: Option<MaskClip>) -> Self {
        let mut out = self.clone();
        out.mask = mask.map(Box::new);
        out
    }

    /// Copy with `audio` as sound track.
    pub fn set_audio(&self, audio: Option<AudioClip>) -> Self {
        let mut out = self.clone();
        out.audio = audio;
        out
    }

    /// Copy without sound track.
    pub fn without_audio(&self) -> Self {
        self.set_audio(None)
    }

    /// Copy with a fully opaque mask matching this clip.
    ///
    /// Constant-size clips get a solid mask; variable-size clips get a mask computed from the
    /// shape of each frame.
    pub fn add_mask(&self) -> MontageResult<Self> {
        let mut mask = if self.has_constant_size {
            MaskClip::color(self.size, &[1.0], None)?
        } else {
            let source = self.source.clone();
            MaskClip::from_source(
                move |t: Time| Raster::filled(pull_frame(&source, t)?.size(), &[1.0f32]),
                self.size,
                None,
            )
            .with_variable_size()
        };
        mask.span = self.span;
        mask.position = self.position.clone();
        mask.relative_pos = self.relative_pos;
        Ok(self.set_mask(Some(mask)))
    }

    /// Clip whose frames are `f` applied to this clip's frames.
    ///
    /// Timing, position, mask and audio are kept; the size is recomputed from the new frame at
    /// `t = 0`.
    pub fn map_frames<Q, F>(&self, mut f: F) -> MontageResult<VideoClip<Q>>
    where
        Q: Sample,
        F: FnMut(Raster<P>) -> MontageResult<Raster<Q>> + 'static,
    {
        let inner = self.source.clone();
        let source = share_source::<Raster<Q>, _>(move |t: Time| f(pull_frame(&inner, t)?));
        let size = pull_frame(&source, 0.0)?.size();
        let mut cache = FrameCache::default();
        cache.set_enabled(self.cache.is_enabled());
        Ok(VideoClip {
            span: self.span,
            source,
            cache,
            size,
            fps: self.fps,
            position: self.position.clone(),
            relative_pos: self.relative_pos,
            has_constant_size: self.has_constant_size,
            mask: self.mask.clone(),
            audio: self.audio.clone(),
        })
    }

    /// Same-type frame transform. The mask is left untouched.
    pub fn fl_image<F>(&self, f: F) -> MontageResult<Self>
    where
        F: FnMut(Raster<P>) -> MontageResult<Raster<P>> + 'static,
    {
        self.map_frames(f)
    }

    /// Frame transform applied to the mask only; a clip without mask is returned as is.
    pub fn fl_mask<F>(&self, f: F) -> MontageResult<Self>
    where
        F: FnMut(Raster<f32>) -> MontageResult<Raster<f32>> + 'static,
    {
        let mut out = self.clone();
        if let Some(mask) = self.mask.as_deref() {
            out.mask = Some(Box::new(mask.fl_image(f)?));
        }
        Ok(out)
    }

    /// Cut a rectangular region out of the clip and of its mask.
    pub fn crop(&self, rect: CropRect) -> MontageResult<Self> {
        let (x1, y1, x2, y2) = rect.resolve(self.size)?;
        let mut out = self.fl_image(move |frame| Ok(frame.crop(x1, y1, x2, y2)))?;
        if let Some(mask) = self.mask.as_deref() {
            let cropped = mask.fl_image(move |frame| Ok(frame.crop(x1, y1, x2, y2)))?;
            out.mask = Some(Box::new(cropped));
        }
        Ok(out)
    }

    /// Frames converted to another sample type, at `t = 0, 1/fps, ...` below the duration.
    pub fn iter_frames_as<Q: Sample>(
        &mut self,
        fps: Option<f64>,
    ) -> MontageResult<impl Iterator<Item = MontageResult<(Time, Raster<Q>)>> + '_> {
        Ok(self
            .iter_frames(fps)?
            .map(|r| r.map(|(t, frame)| (t, frame.convert::<Q>()))))
    }

    /// Draw this clip's frame at parent time `t` onto `canvas`.
    ///
    /// On a mask canvas that already holds opacity, the clip is drawn onto an empty canvas
    /// first and the two layers are added, saturating at 1.
    pub(crate) fn blit_on(&mut self, canvas: &Raster<P>, t: Time) -> MontageResult<Raster<P>> {
        if P::IS_MASK && canvas.max_value() > 0.0 {
            let layer = self.blit_on(&Raster::zeros(canvas.size(), canvas.channels()), t)?;
            return canvas.add_clamped(&layer);
        }

        let ct = t - self.start();
        let mut img = self.get_frame(ct)?;
        let mask = match self.mask.as_deref_mut() {
            Some(m) => Some(m.get_frame(ct)?),
            None => None,
        };
        if let Some(m) = &mask
            && m.size() != img.size()
        {
            img = img.fit_to(m.size(), P::from_f32(1.0));
        }

        let pos = self
            .position
            .at(ct)
            .resolve(canvas.size(), img.size(), self.relative_pos);
        blit(&img, canvas, pos, mask.as_ref())
    }
}

impl VideoClip<u8> {
    /// Clip from an image file decoded with the `image` crate.
    ///
    /// With `transparent`, the alpha channel of an RGBA image becomes the clip's mask.
    pub fn image_file(
        path: impl AsRef<Path>,
        transparent: bool,
        duration: Option<Time>,
    ) -> MontageResult<Self> {
        let path = path.as_ref();
        let decoded = image::open(path)
            .with_context(|| format!("decode image '{}'", path.display()))?;
        if transparent && decoded.color().has_alpha() {
            let rgba = decoded.to_rgba8();
            let size = Size::new(rgba.width(), rgba.height());
            let (rgb, alpha) = Raster::from_bytes(size, 4, rgba.into_raw())?.split_alpha()?;
            let mask = MaskClip::image(alpha, duration);
            return Ok(Self::image(rgb, duration).set_mask(Some(mask)));
        }
        let rgb = decoded.to_rgb8();
        let size = Size::new(rgb.width(), rgb.height());
        Ok(Self::image(Raster::from_bytes(size, 3, rgb.into_raw())?, duration))
    }

    /// Write the frame at clip-local time `t` to an image file.
    ///
    /// With `with_mask`, the mask frame is stored as alpha channel.
    pub fn save_frame(
        &mut self,
        path: impl AsRef<Path>,
        t: Time,
        with_mask: bool,
    ) -> MontageResult<()> {
        let path = path.as_ref();
        let mut frame = self.get_frame(t)?;
        if with_mask && let Some(mask) = self.mask.as_deref_mut() {
            frame = frame.with_alpha(&mask.get_frame(t)?)?;
        }
        save_raster(&frame, path)
    }
}

impl VideoClip<f32> {
    /// Grey 8-bit rendering of the mask (`255 * m` on every channel).
    pub fn to_rgb(&self) -> MontageResult<VideoClip<u8>> {
        self.map_frames(|frame| Ok(frame.to_rgb()))
    }
}

pub(crate) fn save_raster(frame: &Raster<u8>, path: &Path) -> MontageResult<()> {
    let (w, h) = (frame.width(), frame.height());
    let data = frame.data().to_vec();
    let saved = match frame.channels() {
        3 => image::RgbImage::from_raw(w, h, data)
            .ok_or_else(|| MontageError::validation("frame buffer does not match its size"))?
            .save(path),
        4 => image::RgbaImage::from_raw(w, h, data)
            .ok_or_else(|| MontageError::validation("frame buffer does not match its size"))?
            .save(path),
        1 => image::GrayImage::from_raw(w, h, data)
            .ok_or_else(|| MontageError::validation("frame buffer does not match its size"))?
            .save(path),
        n => {
            return Err(MontageError::validation(format!(
                "cannot save a {n}-channel frame as an image"
            )));
        }
    };
    saved.with_context(|| format!("write image '{}'", path.display()))?;
    Ok(())
}

impl<P: Sample> Clip for VideoClip<P> {
    type Frame = Raster<P>;

    fn span(&self) -> &Span {
        &self.span
    }

    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn cache(&mut self) -> &mut FrameCache<Raster<P>> {
        &mut self.cache
    }

    fn make_frame(&mut self, t: Time) -> MontageResult<Raster<P>> {
        pull_frame(&self.source, t)
    }

    fn for_each_span(&mut self, edit: &mut dyn FnMut(&mut Span)) {
        edit(&mut self.span);
        if let Some(mask) = self.mask.as_deref_mut() {
            mask.for_each_span(edit);
        }
        if let Some(audio) = self.audio.as_mut() {
            audio.for_each_span(edit);
        }
    }
}

/// Region for [`VideoClip::crop`].
///
/// Any combination of corners, size and center may be given. A width (height) together with one
/// horizontal (vertical) corner fixes the other corner; a center with a size fixes both. Missing
/// corners default to the frame edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CropRect {
    pub x1: Option<f64>,
    pub y1: Option<f64>,
    pub x2: Option<f64>,
    pub y2: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub x_center: Option<f64>,
    pub y_center: Option<f64>,
}

impl CropRect {
    /// Corner-based rectangle `[x1, x2) x [y1, y2)`.
    pub fn corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: Some(x1),
            y1: Some(y1),
            x2: Some(x2),
            y2: Some(y2),
            ..Self::default()
        }
    }

    /// Rectangle of `width x height` centered on `(x_center, y_center)`.
    pub fn centered(x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            x_center: Some(x_center),
            y_center: Some(y_center),
            ..Self::default()
        }
    }

    /// Integer corners inside a frame of `size`.
    pub fn resolve(&self, size: Size) -> MontageResult<(u32, u32, u32, u32)> {
        let (x1, x2) = resolve_axis(self.x1, self.x2, self.width, self.x_center, "width")?;
        let (y1, y2) = resolve_axis(self.y1, self.y2, self.height, self.y_center, "height")?;
        let px = |v: Option<f64>, default: u32| {
            v.filter(|v| *v != 0.0)
                .map_or(default, |v| (v as i64).clamp(0, i64::from(u32::MAX)) as u32)
        };
        Ok((
            px(x1, 0),
            px(y1, 0),
            px(x2, size.width),
            px(y2, size.height),
        ))
    }
}

fn resolve_axis(
    lo: Option<f64>,
    hi: Option<f64>,
    extent: Option<f64>,
    center: Option<f64>,
    extent_name: &str,
) -> MontageResult<(Option<f64>, Option<f64>)> {
    let extent = extent.filter(|e| *e != 0.0);
    let (mut lo, mut hi) = (lo, hi);
    match (extent, lo, hi) {
        (Some(e), Some(l), _) => hi = Some(l + e),
        (Some(e), None, Some(h)) => lo = Some(h - e),
        _ => {}
    }
    if let Some(c) = center.filter(|c| *c != 0.0) {
        let e = extent.ok_or_else(|| {
            MontageError::validation(format!("crop center requires a {extent_name}"))
        })?;
        lo = Some(c - e / 2.0);
        hi = Some(c + e / 2.0);
    }
    Ok((lo, hi))
}

#[cfg(test)]
#[path = "../../tests/unit/video/clip.rs"]
mod tests;

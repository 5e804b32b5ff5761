use crate::audio::composite::CompositeAudioClip;
use crate::clip::Clip;
use crate::foundation::core::{Size, Time};
use crate::foundation::error::{MontageError, MontageResult};
use crate::frame::raster::{Raster, Sample};
use crate::video::clip::{MaskClip, VideoClip};

/// Builder for a clip that layers several clips on one canvas.
///
/// Clips are drawn in input order on top of a background, later clips covering earlier ones.
/// The background is a solid color (default: black, or 0 for masks) or, with
/// [`CompositeVideoClip::use_bgclip`], the first input clip.
///
/// When no background color is given and the background is not an opaque clip, the composite
/// gets a mask built from the masks of its children, so that it can itself be layered.
#[derive(Clone, Debug)]
pub struct CompositeVideoClip<P: Sample = u8> {
    clips: Vec<VideoClip<P>>,
    size: Option<Size>,
    bg_color: Option<Vec<P>>,
    use_bgclip: bool,
}

impl<P: Sample> CompositeVideoClip<P> {
    /// Layer `clips`, bottom first.
    pub fn new(clips: Vec<VideoClip<P>>) -> Self {
        Self {
            clips,
            size: None,
            bg_color: None,
            use_bgclip: false,
        }
    }

    /// Canvas size; defaults to the size of the first clip.
    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Solid background color, one value per channel.
    pub fn bg_color(mut self, color: Vec<P>) -> Self {
        self.bg_color = Some(color);
        self
    }

    /// Use the first clip as background instead of a solid color.
    pub fn use_bgclip(mut self, use_bgclip: bool) -> Self {
        self.use_bgclip = use_bgclip;
        self
    }

    /// Build the composite clip.
    pub fn build(self) -> MontageResult<VideoClip<P>> {
        let Some(first) = self.clips.first() else {
            return Err(MontageError::validation(
                "composite video needs at least one clip",
            ));
        };
        let size = self.size.unwrap_or_else(|| first.size());
        let transparent = if self.use_bgclip && first.mask().is_none() {
            false
        } else {
            self.bg_color.is_none()
        };
        let fps = self.clips.iter().filter_map(|c| c.fps()).reduce(f64::max);

        let mut clips = self.clips;
        let mut bg = if self.use_bgclip {
            clips.remove(0)
        } else {
            let color = self
                .bg_color
                .unwrap_or_else(|| vec![P::default(); usize::from(P::DEFAULT_CHANNELS)]);
            VideoClip::color(size, &color, None)?
        };

        let duration = if clips.is_empty() {
            bg.end()
        } else {
            clips
                .iter()
                .map(|c| c.end())
                .collect::<Option<Vec<_>>>()
                .and_then(|ends| ends.into_iter().reduce(f64::max))
        };

        let audio_tracks: Vec<_> = clips.iter().filter_map(|c| c.audio().cloned()).collect();
        let audio = if audio_tracks.is_empty() {
            None
        } else {
            Some(CompositeAudioClip::new(audio_tracks).build()?)
        };

        let mask = if transparent {
            Some(composite_mask(&clips, size)?)
        } else {
            None
        };

        let render = move |t: Time| -> MontageResult<Raster<P>> {
            let mut frame = bg.get_frame(t)?;
            for layer in clips.iter_mut() {
                if layer.is_playing(t) {
                    frame = layer.blit_on(&frame, t)?;
                }
            }
            Ok(frame)
        };

        Ok(VideoClip::from_source(render, size, duration)
            .with_fps(fps)
            .set_audio(audio)
            .set_mask(mask))
    }
}

/// Opacity of a composite: every child's mask (opaque when it has none), placed and timed like
/// the child, layered on a transparent canvas.
fn composite_mask<P: Sample>(clips: &[VideoClip<P>], size: Size) -> MontageResult<MaskClip> {
    let mut masks = Vec::with_capacity(clips.len());
    for clip in clips {
        let mask = match clip.mask() {
            Some(m) => m.clone(),
            None => match clip.add_mask()?.mask() {
                Some(m) => m.clone(),
                None => return Err(MontageError::validation("add_mask produced no mask")),
            },
        };
        masks.push(
            mask.set_position(clip.position().clone(), clip.relative_pos())
                .with_end(clip.end())
                .with_start(clip.start(), false),
        );
    }
    CompositeVideoClip::new(masks)
        .size(size)
        .bg_color(vec![0.0])
        .build()
}

#[cfg(test)]
#[path = "../../tests/unit/video/composite.rs"]
mod tests;

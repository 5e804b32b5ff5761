use crate::audio::clip::AudioClip;
use crate::clip::Clip;
use crate::foundation::core::Time;
use crate::foundation::error::{MontageError, MontageResult};
use crate::foundation::math::shift_times;
use crate::frame::sound::SoundArray;

/// Mix of several audio clips, each playing on its own time window.
///
/// Channel count is the largest among the inputs; mono inputs are spread on every channel. The
/// result has a duration only when every input has a bounded end.
#[derive(Clone, Debug)]
pub struct CompositeAudioClip {
    clips: Vec<AudioClip>,
}

impl CompositeAudioClip {
    /// Start a mix of `clips`, in mix order.
    pub fn new(clips: Vec<AudioClip>) -> Self {
        Self { clips }
    }

    /// Build the mixed clip.
    pub fn build(self) -> MontageResult<AudioClip> {
        if self.clips.is_empty() {
            return Err(MontageError::validation(
                "composite audio needs at least one clip",
            ));
        }
        let nchannels = self
            .clips
            .iter()
            .map(AudioClip::nchannels)
            .max()
            .unwrap_or(1);
        let end = self
            .clips
            .iter()
            .map(|c| c.end())
            .collect::<Option<Vec<_>>>()
            .and_then(|ends| ends.into_iter().reduce(f64::max));
        let fps = self
            .clips
            .iter()
            .filter_map(|c| c.fps())
            .reduce(f64::max);

        let mut clips = self.clips;
        let mix = move |tt: &[Time]| -> MontageResult<SoundArray> {
            let mut out = SoundArray::silence(tt.len(), nchannels);
            for clip in clips.iter_mut() {
                let Some(playing) = clip.is_playing_many(tt) else {
                    continue;
                };
                let sound = clip.get_frames(&shift_times(tt, clip.start()))?;
                out.mix_in(&sound, &playing)?;
            }
            Ok(out)
        };
        Ok(AudioClip::from_fn(mix, nchannels, end, fps))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/composite.rs"]
mod tests;

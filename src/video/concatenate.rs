use crate::audio::composite::CompositeAudioClip;
use crate::clip::Clip;
use crate::foundation::core::{Size, Time};
use crate::foundation::error::{MontageError, MontageResult};
use crate::frame::raster::Sample;
use crate::video::clip::VideoClip;
use crate::video::composite::CompositeVideoClip;
use crate::video::position::Anchor;

/// Result of [`concatenate_videoclips`].
#[derive(Clone, Debug)]
pub struct Concatenated<P: Sample = u8> {
    /// The sequence as a single clip.
    pub clip: VideoClip<P>,
    /// Start time of each input clip in the sequence.
    pub start_times: Vec<Time>,
}

/// Start offsets of clips with the given durations played one after the other, with `padding`
/// seconds between consecutive clips (negative padding makes them overlap).
///
/// Returns one more value than there are durations; the last one is the total length, which
/// ends with the last clip (no trailing padding). Offsets never go below zero.
pub fn concatenation_offsets(durations: &[Time], padding: Time) -> Vec<Time> {
    let last = durations.len().saturating_sub(1);
    let mut acc = 0.0;
    let mut out = Vec::with_capacity(durations.len() + 1);
    out.push(0.0);
    for d in durations {
        acc += d;
        out.push(acc);
    }
    out.iter()
        .enumerate()
        .map(|(i, t)| (t + padding * i.min(last) as f64).max(0.0))
        .collect()
}

/// Play `clips` one after the other.
///
/// The canvas is as large as the largest clip in each dimension and smaller clips are centered.
/// Every clip must have a duration.
#[tracing::instrument(level = "debug", skip(clips, bg_color), fields(clips = clips.len()))]
pub fn concatenate_videoclips<P: Sample>(
    clips: &[VideoClip<P>],
    bg_color: Option<Vec<P>>,
    padding: Time,
) -> MontageResult<Concatenated<P>> {
    if clips.is_empty() {
        return Err(MontageError::validation("nothing to concatenate"));
    }
    let durations = clips
        .iter()
        .map(|c| c.duration().ok_or_else(MontageError::missing_duration))
        .collect::<MontageResult<Vec<_>>>()?;
    let tt = concatenation_offsets(&durations, padding);
    let size = clips
        .iter()
        .fold(Size::new(0, 0), |acc, c| acc.max(c.size()));

    let placed: Vec<_> = clips
        .iter()
        .zip(&tt)
        .map(|(c, t)| c.with_start(*t, true).set_position(Anchor::Center, false))
        .collect();
    let mut builder = CompositeVideoClip::new(placed).size(size);
    if let Some(color) = bg_color {
        builder = builder.bg_color(color);
    }
    let total = tt[tt.len() - 1];
    let mut clip = builder.build()?.with_start(0.0, true).with_end(Some(total));

    let audio_tracks: Vec<_> = clips
        .iter()
        .zip(&tt)
        .filter_map(|(c, t)| c.audio().map(|a| a.with_start(*t, true)))
        .collect();
    if !audio_tracks.is_empty() {
        clip = clip.set_audio(Some(CompositeAudioClip::new(audio_tracks).build()?));
    }

    Ok(Concatenated {
        clip,
        start_times: tt[..tt.len() - 1].to_vec(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/video/concatenate.rs"]
mod tests;

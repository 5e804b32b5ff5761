use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::clip::{Clip, FrameCache, Span, resolve_fps};
use crate::foundation::core::Time;
use crate::foundation::error::{MontageError, MontageResult};
use crate::foundation::math::{chunk_bounds, sample_times};
use crate::frame::sound::SoundArray;

/// Sample rate used when neither the caller nor the clip provides one.
pub const DEFAULT_AUDIO_FPS: f64 = 44_100.0;

/// Largest block of samples evaluated in one call by [`AudioClip::to_soundarray`].
pub const DEFAULT_AUDIO_BUFFER: usize = 50_000;

/// Produces one sample frame per requested clip-local time.
pub trait AudioSource {
    /// Samples at every time in `tt`, as a `tt.len() x nchannels` array.
    fn samples_at(&mut self, tt: &[Time]) -> MontageResult<SoundArray>;
}

impl<T> AudioSource for T
where
    T: FnMut(&[Time]) -> MontageResult<SoundArray>,
{
    fn samples_at(&mut self, tt: &[Time]) -> MontageResult<SoundArray> {
        self(tt)
    }
}

pub(crate) type SharedAudioSource = Rc<RefCell<dyn AudioSource>>;

/// Lazy audio track.
///
/// Besides the scalar [`Clip::get_frame`], audio clips are evaluated on whole vectors of times
/// with [`AudioClip::get_frames`].
#[derive(Clone)]
pub struct AudioClip {
    span: Span,
    source: SharedAudioSource,
    cache: FrameCache<SoundArray>,
    nchannels: u16,
    fps: Option<f64>,
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("span", &self.span)
            .field("nchannels", &self.nchannels)
            .field("fps", &self.fps)
            .finish_non_exhaustive()
    }
}

impl AudioClip {
    /// Audio clip computed by `make_frames`, which maps clip-local times to samples.
    pub fn from_fn<F>(
        make_frames: F,
        nchannels: u16,
        duration: Option<Time>,
        fps: Option<f64>,
    ) -> Self
    where
        F: FnMut(&[Time]) -> MontageResult<SoundArray> + 'static,
    {
        Self::from_source(make_frames, nchannels, duration, fps)
    }

    pub(crate) fn from_source<S>(
        source: S,
        nchannels: u16,
        duration: Option<Time>,
        fps: Option<f64>,
    ) -> Self
    where
        S: AudioSource + 'static,
    {
        Self {
            span: Span::with_duration(duration),
            source: Rc::new(RefCell::new(source)),
            cache: FrameCache::default(),
            nchannels: nchannels.max(1),
            fps,
        }
    }

    /// Number of output channels.
    pub fn nchannels(&self) -> u16 {
        self.nchannels
    }

    /// Copy with a different sample rate.
    pub fn with_fps(&self, fps: Option<f64>) -> Self {
        let mut out = self.clone();
        out.fps = fps;
        out
    }

    /// Samples at each clip-local time in `tt`. Bypasses the memoization slot.
    pub fn get_frames(&mut self, tt: &[Time]) -> MontageResult<SoundArray> {
        let mut source = self.source.try_borrow_mut().map_err(|_| {
            MontageError::validation("audio source re-entered while producing samples")
        })?;
        let out = source.samples_at(tt)?;
        if out.frames() != tt.len() {
            return Err(MontageError::validation(format!(
                "audio source returned {} frames for {} times",
                out.frames(),
                tt.len()
            )));
        }
        Ok(out)
    }

    /// The whole clip sampled at `fps` (default: the clip's rate, else 44100 Hz).
    pub fn to_soundarray(&mut self, fps: Option<f64>) -> MontageResult<SoundArray> {
        let duration = self.duration().ok_or_else(MontageError::missing_duration)?;
        let fps = resolve_fps(fps, self.fps.or(Some(DEFAULT_AUDIO_FPS)))?;
        let total = (fps * duration) as usize;
        let mut samples = Vec::with_capacity(total * usize::from(self.nchannels));
        let mut channels = self.nchannels;
        for w in chunk_bounds(total, DEFAULT_AUDIO_BUFFER).windows(2) {
            let block = self.get_frames(&sample_times(w[0], w[1], fps))?;
            channels = block.channels();
            samples.extend_from_slice(block.samples());
        }
        SoundArray::new(channels, samples)
    }

    /// [`to_soundarray`](Self::to_soundarray) quantized to `nbytes`-wide little-endian PCM.
    pub fn to_pcm(&mut self, fps: Option<f64>, nbytes: u8) -> MontageResult<Vec<u8>> {
        self.to_soundarray(fps)?.to_pcm_bytes(nbytes)
    }

    /// Iterate the clip in consecutive blocks of at most `chunk_size` samples.
    ///
    /// The `fps * duration` samples are split evenly into `fps * duration / chunk_size + 1`
    /// blocks.
    pub fn iter_chunks(
        &mut self,
        chunk_size: usize,
        fps: Option<f64>,
    ) -> MontageResult<AudioChunks<'_>> {
        if chunk_size == 0 {
            return Err(MontageError::validation("audio chunk size must be > 0"));
        }
        let duration = self.duration().ok_or_else(MontageError::missing_duration)?;
        let fps = resolve_fps(fps, self.fps.or(Some(DEFAULT_AUDIO_FPS)))?;
        let total = (fps * duration) as usize;
        Ok(AudioChunks {
            clip: self,
            fps,
            bounds: chunk_bounds(total, chunk_size),
            next: 0,
        })
    }
}

impl Clip for AudioClip {
    type Frame = SoundArray;

    fn span(&self) -> &Span {
        &self.span
    }

    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn cache(&mut self) -> &mut FrameCache<SoundArray> {
        &mut self.cache
    }

    fn make_frame(&mut self, t: Time) -> MontageResult<SoundArray> {
        self.get_frames(&[t])
    }

    fn for_each_span(&mut self, edit: &mut dyn FnMut(&mut Span)) {
        edit(&mut self.span);
    }
}

/// Iterator returned by [`AudioClip::iter_chunks`].
pub struct AudioChunks<'a> {
    clip: &'a mut AudioClip,
    fps: f64,
    bounds: Vec<usize>,
    next: usize,
}

impl AudioChunks<'_> {
    /// Sample rate of the produced blocks.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Number of blocks the iteration yields.
    pub fn chunk_count(&self) -> usize {
        self.bounds.len().saturating_sub(1)
    }
}

impl Iterator for AudioChunks<'_> {
    type Item = MontageResult<SoundArray>;

    fn next(&mut self) -> Option<Self::Item> {
        let (from, to) = (*self.bounds.get(self.next)?, *self.bounds.get(self.next + 1)?);
        self.next += 1;
        Some(self.clip.get_frames(&sample_times(from, to, self.fps)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/clip.rs"]
mod tests;

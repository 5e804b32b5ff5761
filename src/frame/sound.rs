use crate::foundation::error::{MontageError, MontageResult};

/// Block of audio: `frames x channels` interleaved `f32` samples, nominally in `[-1, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SoundArray {
    channels: u16,
    samples: Vec<f32>,
}

impl SoundArray {
    /// Wrap interleaved samples, validating that they divide evenly into frames.
    pub fn new(channels: u16, samples: Vec<f32>) -> MontageResult<Self> {
        if channels == 0 {
            return Err(MontageError::validation("sound array needs at least one channel"));
        }
        if !samples.len().is_multiple_of(usize::from(channels)) {
            return Err(MontageError::validation(format!(
                "{} samples do not divide into {channels} channels",
                samples.len()
            )));
        }
        Ok(Self { channels, samples })
    }

    /// `frames` frames of silence.
    pub fn silence(frames: usize, channels: u16) -> Self {
        let channels = channels.max(1);
        Self {
            channels,
            samples: vec![0.0; frames * usize::from(channels)],
        }
    }

    /// Number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Samples of frame `i`, one per channel.
    pub fn frame(&self, i: usize) -> &[f32] {
        let ch = usize::from(self.channels);
        &self.samples[i * ch..(i + 1) * ch]
    }

    /// Add `other` into `self`, frame by frame, counting only frames where `playing` is set.
    ///
    /// A mono `other` is broadcast onto every channel; extra channels of `other` are dropped.
    pub(crate) fn mix_in(&mut self, other: &SoundArray, playing: &[bool]) -> MontageResult<()> {
        if other.frames() != self.frames() || playing.len() != self.frames() {
            return Err(MontageError::validation(format!(
                "cannot mix {} frames into {} frames",
                other.frames(),
                self.frames()
            )));
        }
        let ch = usize::from(self.channels);
        for (i, on) in playing.iter().enumerate() {
            if !*on {
                continue;
            }
            let src = other.frame(i);
            for c in 0..ch {
                let v = if src.len() == 1 {
                    src[0]
                } else {
                    src.get(c).copied().unwrap_or(0.0)
                };
                self.samples[i * ch + c] += v;
            }
        }
        Ok(())
    }

    /// Quantize to signed little-endian PCM with `nbytes` bytes per sample (1, 2 or 4).
    ///
    /// Samples are clipped to `[-0.99, 0.99]` first.
    pub fn to_pcm_bytes(&self, nbytes: u8) -> MontageResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.samples.len() * usize::from(nbytes));
        let clip = |s: f32| f64::from(s.clamp(-0.99, 0.99));
        match nbytes {
            1 => {
                for &s in &self.samples {
                    out.push(((clip(s) * 128.0) as i8) as u8);
                }
            }
            2 => {
                for &s in &self.samples {
                    out.extend_from_slice(&((clip(s) * 32_768.0) as i16).to_le_bytes());
                }
            }
            4 => {
                for &s in &self.samples {
                    out.extend_from_slice(&((clip(s) * 2_147_483_648.0) as i32).to_le_bytes());
                }
            }
            other => {
                return Err(MontageError::validation(format!(
                    "unsupported PCM sample width {other} (expected 1, 2 or 4 bytes)"
                )));
            }
        }
        Ok(out)
    }

    /// Decode signed little-endian PCM produced by the decoder.
    pub fn from_pcm_bytes(bytes: &[u8], nbytes: u8, channels: u16) -> MontageResult<Self> {
        let samples: Vec<f32> = match nbytes {
            1 => bytes.iter().map(|b| f32::from(*b as i8) / 128.0).collect(),
            2 => bytes
                .chunks_exact(2)
                .map(|c| f32::from(i16::from_le_bytes([c[0], c[1]])) / 32_768.0)
                .collect(),
            4 => bytes
                .chunks_exact(4)
                .map(|c| {
                    let v = i32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                    (f64::from(v) / 2_147_483_648.0) as f32
                })
                .collect(),
            other => {
                return Err(MontageError::validation(format!(
                    "unsupported PCM sample width {other} (expected 1, 2 or 4 bytes)"
                )));
            }
        };
        Self::new(channels, samples)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/sound.rs"]
mod tests;

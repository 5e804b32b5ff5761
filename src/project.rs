//! JSON project files.
//!
//! A project lists layers (solid colors, images, video files, audio files) and says whether they
//! are layered on one canvas or played one after the other. [`Project::build`] turns it into a
//! single lazy [`VideoClip`] that the render entry points can write out.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::audio::clip::AudioClip;
use crate::audio::composite::CompositeAudioClip;
use crate::audio::file::AudioFileOpts;
use crate::clip::Clip;
use crate::foundation::core::{Size, Time};
use crate::foundation::error::{MontageError, MontageResult};
use crate::media::config::MediaConfig;
use crate::media::reader::TargetResolution;
use crate::video::clip::VideoClip;
use crate::video::composite::CompositeVideoClip;
use crate::video::concatenate::concatenate_videoclips;
use crate::video::file::VideoFileOpts;
use crate::video::position::Placement;

/// How the visual layers of a project are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectMode {
    /// Layers share one canvas; later layers are drawn on top.
    #[default]
    Composite,
    /// Layers play one after the other, centered on a canvas fitting the largest.
    Concatenate,
}

/// Media behind a layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSource {
    /// Solid RGB color.
    Color { color: [u8; 3], size: Size },
    /// Still image decoded with the `image` crate.
    Image {
        path: PathBuf,
        /// Use the image's alpha channel as mask.
        #[serde(default)]
        transparent: bool,
    },
    /// Video file decoded through `ffmpeg`.
    Video {
        path: PathBuf,
        #[serde(default)]
        has_mask: bool,
        #[serde(default = "default_true")]
        audio: bool,
        #[serde(default)]
        target_resolution: Option<TargetResolution>,
    },
    /// Audio file mixed into the soundtrack.
    Audio { path: PathBuf },
}

fn default_true() -> bool {
    true
}

/// One entry of [`Project::layers`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    #[serde(flatten)]
    pub source: LayerSource,
    /// Start on the project timeline, in seconds. Ignored for visual layers in
    /// [`ProjectMode::Concatenate`].
    #[serde(default)]
    pub start: Time,
    /// Cut the layer to this many seconds.
    #[serde(default)]
    pub duration: Option<Time>,
    #[serde(default)]
    pub position: Option<Placement>,
    /// Read `position` as fractions of the canvas.
    #[serde(default)]
    pub relative: bool,
}

/// A montage described as JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    #[serde(default)]
    pub mode: ProjectMode,
    /// Canvas size; composite mode defaults to the first layer's size.
    #[serde(default)]
    pub size: Option<Size>,
    /// Frame rate given to the result.
    #[serde(default)]
    pub fps: Option<f64>,
    /// Background color. Without one, a composite stays transparent where no layer covers it.
    #[serde(default)]
    pub bg_color: Option<[u8; 3]>,
    /// Seconds between consecutive clips in concatenate mode.
    #[serde(default)]
    pub padding: Time,
    /// Cut the result to this many seconds.
    #[serde(default)]
    pub duration: Option<Time>,
    pub layers: Vec<Layer>,
    /// Directory that relative layer paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Project {
    /// Parse a project from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> MontageResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| MontageError::validation(format!("parse project JSON: {e}")))
    }

    /// Parse a project file; relative layer paths resolve against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> MontageResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MontageError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        let mut project = Self::from_reader(BufReader::new(f))?;
        project.base_dir = path.parent().map(Path::to_path_buf);
        Ok(project)
    }

    /// Check the parts that need no media access.
    pub fn validate(&self) -> MontageResult<()> {
        if !self
            .layers
            .iter()
            .any(|l| !matches!(l.source, LayerSource::Audio { .. }))
        {
            return Err(MontageError::validation(
                "project needs at least one visual layer",
            ));
        }
        if let Some(fps) = self.fps
            && !(fps.is_finite() && fps > 0.0)
        {
            return Err(MontageError::validation(format!(
                "project fps must be positive, got {fps}"
            )));
        }
        if let Some(size) = self.size
            && size.area() == 0
        {
            return Err(MontageError::validation("project size must be non-zero"));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if !(layer.start.is_finite() && layer.start >= 0.0) {
                return Err(MontageError::validation(format!(
                    "layer {i}: start must be >= 0, got {}",
                    layer.start
                )));
            }
            if let Some(d) = layer.duration
                && !(d.is_finite() && d > 0.0)
            {
                return Err(MontageError::validation(format!(
                    "layer {i}: duration must be positive, got {d}"
                )));
            }
            if let LayerSource::Color { size, .. } = &layer.source
                && size.area() == 0
            {
                return Err(MontageError::validation(format!(
                    "layer {i}: color size must be non-zero"
                )));
            }
        }
        Ok(())
    }

    /// Build the project into one clip.
    #[tracing::instrument(level = "debug", skip(self, cfg), fields(layers = self.layers.len()))]
    pub fn build(&self, cfg: &MediaConfig) -> MontageResult<VideoClip> {
        self.validate()?;
        let mut visuals = Vec::new();
        let mut sounds = Vec::new();
        for layer in &self.layers {
            match &layer.source {
                LayerSource::Audio { path } => {
                    let path = self.resolve(path);
                    let mut audio = AudioClip::from_file(&path, &AudioFileOpts::default(), cfg)?;
                    if let Some(d) = layer.duration {
                        audio = audio.with_duration(Some(d), true)?;
                    }
                    sounds.push(audio.with_start(layer.start, true));
                }
                _ => visuals.push(self.visual_layer(layer, cfg)?),
            }
        }

        let mut clip = match self.mode {
            ProjectMode::Composite => {
                let mut builder = CompositeVideoClip::new(visuals);
                if let Some(size) = self.size {
                    builder = builder.size(size);
                }
                if let Some(color) = self.bg_color {
                    builder = builder.bg_color(color.to_vec());
                }
                builder.build()?
            }
            ProjectMode::Concatenate => {
                let visuals: Vec<_> = visuals.iter().map(|c| c.with_start(0.0, true)).collect();
                let bg = self.bg_color.map(|c| c.to_vec());
                concatenate_videoclips(&visuals, bg, self.padding)?.clip
            }
        };

        if !sounds.is_empty() {
            if let Some(own) = clip.audio() {
                sounds.insert(0, own.clone());
            }
            clip = clip.set_audio(Some(CompositeAudioClip::new(sounds).build()?));
        }
        if let Some(d) = self.duration {
            clip = clip.with_duration(Some(d), true)?;
        }
        if self.fps.is_some() {
            clip = clip.with_fps(self.fps);
        }
        tracing::debug!(size = ?clip.size(), duration = ?clip.duration(), "project built");
        Ok(clip)
    }

    fn visual_layer(&self, layer: &Layer, cfg: &MediaConfig) -> MontageResult<VideoClip> {
        let mut clip = match &layer.source {
            LayerSource::Color { color, size } => VideoClip::color(*size, color, None)?,
            LayerSource::Image { path, transparent } => {
                VideoClip::image_file(self.resolve(path), *transparent, None)?
            }
            LayerSource::Video {
                path,
                has_mask,
                audio,
                target_resolution,
            } => {
                let opts = VideoFileOpts {
                    has_mask: *has_mask,
                    audio: *audio,
                    target_resolution: *target_resolution,
                    ..VideoFileOpts::default()
                };
                VideoClip::from_file(self.resolve(path), &opts, cfg)?
            }
            LayerSource::Audio { .. } => {
                return Err(MontageError::validation("audio layer has no frames"));
            }
        };
        if let Some(d) = layer.duration {
            clip = clip.with_duration(Some(d), true)?;
        }
        if let Some(pos) = layer.position {
            clip = clip.set_position(pos, layer.relative);
        }
        Ok(clip.with_start(layer.start, true))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/project/project.rs"]
mod tests;

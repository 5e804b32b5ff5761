use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::audio::clip::AudioClip;
use crate::audio::file::AudioFileOpts;
use crate::foundation::core::Time;
use crate::foundation::error::{MontageError, MontageResult};
use crate::frame::raster::Raster;
use crate::media::config::{FpsSource, MediaConfig};
use crate::media::reader::{PixelFormat, TargetResolution, VideoReader, VideoReaderOpts};
use crate::video::clip::{MaskClip, VideoClip};

/// Options for [`VideoClip::from_file`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoFileOpts {
    /// Decode `rgba` and turn the alpha channel into a mask.
    pub has_mask: bool,
    /// Attach the file's audio track when it has one.
    pub audio: bool,
    pub audio_opts: AudioFileOpts,
    pub target_resolution: Option<TargetResolution>,
    /// ffmpeg scaler used when resizing.
    pub resize_algorithm: String,
    pub fps_source: Option<FpsSource>,
}

impl Default for VideoFileOpts {
    fn default() -> Self {
        Self {
            has_mask: false,
            audio: true,
            audio_opts: AudioFileOpts::default(),
            target_resolution: None,
            resize_algorithm: "bicubic".to_owned(),
            fps_source: None,
        }
    }
}

type SharedReader = Rc<RefCell<VideoReader>>;

fn read_at(reader: &SharedReader, t: Time) -> MontageResult<Raster<u8>> {
    reader
        .try_borrow_mut()
        .map_err(|_| MontageError::validation("video reader re-entered while decoding"))?
        .get_frame(t)
}

impl VideoClip<u8> {
    /// Video file decoded lazily by `ffmpeg`.
    ///
    /// The clip takes size, frame rate and duration from the file.
    #[tracing::instrument(level = "debug", skip(path, opts, cfg), fields(path = %path.as_ref().display()))]
    pub fn from_file(
        path: impl AsRef<Path>,
        opts: &VideoFileOpts,
        cfg: &MediaConfig,
    ) -> MontageResult<Self> {
        let path = path.as_ref();
        let reader_opts = VideoReaderOpts {
            pix_fmt: if opts.has_mask {
                PixelFormat::Rgba
            } else {
                PixelFormat::Rgb24
            },
            check_duration: true,
            target_resolution: opts.target_resolution,
            resize_algorithm: opts.resize_algorithm.clone(),
            fps_source: opts.fps_source,
        };
        let reader = VideoReader::open(path, &reader_opts, cfg)?;
        let audio_found = reader.probe_info().is_some_and(|p| p.audio_found);
        if reader.rotation() != 0 {
            tracing::debug!(rotation = reader.rotation(), "frames are not rotated");
        }

        let clip = Self::from_reader(reader)?;
        if opts.audio && audio_found {
            let audio = AudioClip::from_file(path, &opts.audio_opts, cfg)?;
            return Ok(clip.set_audio(Some(audio)));
        }
        Ok(clip)
    }

    /// Clip over an open reader. An `rgba` reader yields an RGB clip with an alpha mask.
    pub fn from_reader(reader: VideoReader) -> MontageResult<Self> {
        let size = reader.size();
        let fps = reader.fps();
        let duration = reader.duration();
        let has_mask = reader.depth() == 4;
        let reader: SharedReader = Rc::new(RefCell::new(reader));

        if !has_mask {
            let shared = reader.clone();
            let source = move |t: Time| read_at(&shared, t);
            return Ok(Self::from_source(source, size, duration).with_fps(Some(fps)));
        }

        let shared = reader.clone();
        let image = move |t: Time| -> MontageResult<Raster<u8>> {
            Ok(read_at(&shared, t)?.split_alpha()?.0)
        };
        let alpha = move |t: Time| -> MontageResult<Raster<f32>> {
            Ok(read_at(&reader, t)?.split_alpha()?.1)
        };
        let mask = MaskClip::from_source(alpha, size, duration).with_fps(Some(fps));
        Ok(Self::from_source(image, size, duration)
            .with_fps(Some(fps))
            .set_mask(Some(mask)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/file.rs"]
mod tests;

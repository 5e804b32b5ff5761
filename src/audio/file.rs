use std::path::Path;

use crate::audio::clip::AudioClip;
use crate::foundation::error::MontageResult;
use crate::media::audio_reader::{AudioReader, AudioReaderOpts};
use crate::media::config::MediaConfig;

/// Options for [`AudioClip::from_file`]: sample rate, PCM width, channels and buffer size.
pub type AudioFileOpts = AudioReaderOpts;

impl AudioClip {
    /// Audio track of a media file, decoded lazily by `ffmpeg`.
    ///
    /// The clip lasts as long as the file; its sample rate is `opts.fps`.
    pub fn from_file(
        path: impl AsRef<Path>,
        opts: &AudioFileOpts,
        cfg: &MediaConfig,
    ) -> MontageResult<Self> {
        let reader = AudioReader::open(path.as_ref(), *opts, cfg)?;
        Ok(Self::from_reader(reader))
    }

    /// Clip over an already open reader.
    pub fn from_reader(reader: AudioReader) -> Self {
        let nchannels = reader.nchannels();
        let duration = reader.duration();
        let fps = f64::from(reader.fps());
        Self::from_source(reader, nchannels, Some(duration), Some(fps))
    }
}

//! Montage is a lazy clip composition engine.
//!
//! Clips are functions of time. Timing edits, positioning, masks and compositing build new
//! clips without computing any pixels; frames are only produced when something asks for them:
//!
//! - Build clips from colors, images, closures or media files ([`VideoClip`], [`AudioClip`])
//! - Layer them with [`CompositeVideoClip`] or chain them with [`concatenate_videoclips`]
//! - Stream the result into an `ffmpeg` encoder with [`write_videofile`], or into any
//!   [`FrameSink`] with [`render_frames`]
//!
//! Decoding and encoding go through `ffmpeg` subprocess pipes configured by [`MediaConfig`].
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod audio;
pub(crate) mod clip;
pub(crate) mod frame;
pub(crate) mod media;
/// Render drivers and file-writing entry points.
pub mod render;
pub(crate) mod video;

/// JSON project files.
pub mod project;

pub use crate::foundation::core::{FRAME_EPSILON, FrameIndex, Size, Time, parse_timestamp};
pub use crate::foundation::error::{MontageError, MontageResult};

pub use crate::clip::{Clip, FrameCache, FrameIter, FrameSource, Span};
pub use crate::frame::raster::{Frame, MaskFrame, Raster, Sample};
pub use crate::frame::sound::SoundArray;

pub use crate::audio::clip::{
    AudioChunks, AudioClip, AudioSource, DEFAULT_AUDIO_BUFFER, DEFAULT_AUDIO_FPS,
};
pub use crate::audio::composite::CompositeAudioClip;
pub use crate::audio::file::AudioFileOpts;

pub use crate::video::blit::blit;
pub use crate::video::clip::{CropRect, MaskClip, VideoClip};
pub use crate::video::composite::CompositeVideoClip;
pub use crate::video::concatenate::{Concatenated, concatenate_videoclips, concatenation_offsets};
pub use crate::video::file::VideoFileOpts;
pub use crate::video::position::{Anchor, Placement, Position, XPos, YPos};

pub use crate::media::audio_reader::{AudioReader, AudioReaderOpts, FfmpegAudioDecoder};
pub use crate::media::codecs::{
    EXTENSIONS, ExtensionInfo, MediaKind, codec_for, default_audio_codec, expand_alias,
    extension_info, find_extension,
};
pub use crate::media::config::{FpsSource, MediaConfig, is_ffmpeg_available};
pub use crate::media::probe::{ProbeInfo, parse_infos, probe};
pub use crate::media::reader::{
    DecoderLauncher, FfmpegDecoder, MAX_SKIP_FRAMES, PixelFormat, StreamInfo, TargetResolution,
    VideoReader, VideoReaderOpts,
};
pub use crate::media::tools::{
    extract_audio, extract_subclip, merge_video_audio, movie_from_frames, resize_video,
    subclip_target_name,
};
pub use crate::media::writer::{
    AudioWriter, AudioWriterOpts, FrameSink, InMemorySink, VideoWriter, VideoWriterOpts,
    audio_writer_args, video_writer_args,
};

pub use crate::project::{Layer, LayerSource, Project, ProjectMode};
pub use crate::render::pipeline::{
    AudioOutput, RenderStats, WriteAudioOpts, WriteVideoOpts, render_frames, write_audiofile,
    write_image_sequence, write_videofile,
};

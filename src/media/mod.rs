//! External media I/O: probing, decoding and encoding through `ffmpeg` subprocess pipes.

pub(crate) mod audio_reader;
pub(crate) mod codecs;
pub(crate) mod config;
pub(crate) mod probe;
pub(crate) mod process;
pub(crate) mod reader;
pub(crate) mod tools;
pub(crate) mod writer;

//! Render drivers.
//!
//! Drivers walk a clip in time order and push frames into a [`FrameSink`](crate::FrameSink) or
//! stream audio blocks into an encoder.

/// Frame and audio render loops plus the file-writing entry points.
pub mod pipeline;

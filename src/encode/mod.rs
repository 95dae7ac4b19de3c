//! Frame sinks: the encoder seam and the `ffmpeg` implementation.

pub mod ffmpeg;
pub mod sink;

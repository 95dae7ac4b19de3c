//! Media probing and decoding through the system `ffmpeg`/`ffprobe` binaries.

pub mod media;

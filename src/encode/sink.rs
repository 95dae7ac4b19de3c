//! Frame sinks: where composited frames go.

use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex, Resolution};
use crate::foundation::error::{NarrationError, NarrationResult};
use crate::render::frame::FrameRGBA;

/// Parameters handed to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Output frame size.
    pub resolution: Resolution,
    /// Output frame rate.
    pub fps: Fps,
    /// Number of frames that will be pushed.
    pub frame_count: u64,
    /// Narration track, when present.
    pub audio: Option<AudioInputConfig>,
}

/// Raw interleaved `f32le` PCM file muxed alongside the video.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInputConfig {
    /// Path to the PCM file.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Consumer of composited frames in output order.
///
/// `push_frame` is called with strictly increasing indices between one `begin` and one `end`.
pub trait FrameSink {
    /// Called once before any frame.
    fn begin(&mut self, cfg: SinkConfig) -> NarrationResult<()>;
    /// Accept the next frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> NarrationResult<()>;
    /// Called once after the last frame; the output is complete when this returns `Ok`.
    fn end(&mut self) -> NarrationResult<()>;
}

/// Sink that keeps frames in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured by `begin`.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` has been called.
    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> NarrationResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> NarrationResult<()> {
        if self.cfg.is_none() {
            return Err(NarrationError::render("sink not started"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(NarrationError::render("out-of-order frame index"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> NarrationResult<()> {
        self.ended = true;
        Ok(())
    }
}

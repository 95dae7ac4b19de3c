//! Voxreel turns a block of text into a narrated, captioned video.
//!
//! A run goes through these steps:
//!
//! - Split the text into bounded [`Segment`]s
//! - Synthesize each segment with a [`SpeechClient`] (retrying only on rate limits)
//! - Rasterize one caption per segment
//! - Lay the segments on a contiguous [`Timeline`] using the measured audio durations
//! - Loop and trim a background video to the narration length
//! - Composite and encode everything with system `ffmpeg`
//!
//! [`NarrationPipeline`] drives the whole sequence; every temporary artifact is tracked by a
//! [`ResourceManager`] and released on every exit path.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub mod assets;
pub mod audio;
pub mod background;
pub mod caption;
pub mod config;
pub mod encode;
pub mod mux;
pub mod pipeline;
pub mod render;
pub mod resources;
pub mod text;
pub mod timeline;
pub mod tts;
pub mod voice;

pub use crate::foundation::core::{Fps, FrameIndex, Resolution, Rgba8};
pub use crate::foundation::error::{ErrorKind, NarrationError, NarrationResult};

pub use crate::background::{
    BackgroundCompositor, BackgroundProber, BackgroundSource, BackgroundTrack,
};
pub use crate::caption::render::{CaptionImage, CaptionRenderer};
pub use crate::config::{
    CaptionLayout, CaptionStyle, Credentials, PipelineConfig, ResizePolicy, SpeechServiceConfig,
};
pub use crate::encode::ffmpeg::{EncoderSettings, FfmpegSink};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::mux::{RenderJob, VideoMuxer};
pub use crate::pipeline::{
    CancellationToken, GenerateOutcome, GenerateRequest, NarrationPipeline,
};
pub use crate::resources::{ClipHandle, ResourceId, ResourceManager};
pub use crate::text::segment::{Segment, segment};
pub use crate::timeline::{Timeline, TimelineEntry};
pub use crate::tts::client::{SpeechClient, SynthesisRequest};
pub use crate::tts::google::GoogleTtsClient;
pub use crate::tts::synth::{AudioDecoder, RetryPolicy, Sleeper, SpeechSynthesizer};
pub use crate::voice::VoiceProfile;

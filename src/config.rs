//! Pipeline configuration.
//!
//! Every option has a default, so an empty JSON object (`{}`) is a valid configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::{Fps, Resolution, Rgba8};
use crate::foundation::error::{NarrationError, NarrationResult};

/// Where captions are placed on the output frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionLayout {
    /// Caption spans the output frame width and its text block is centered on the frame.
    #[default]
    CenteredFrame,
    /// Caption width matches the source video width and the text sits at the bottom of the frame.
    BottomAnchored,
}

/// How the background is brought to `target_resolution`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Scale to the exact target size, ignoring aspect ratio.
    #[default]
    Stretch,
    /// Fit inside the target size keeping aspect ratio, padding with black.
    Letterbox,
}

/// Caption text and box styling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Font file to use; system fonts are searched when unset.
    pub font_path: Option<PathBuf>,
    /// Font size in pixels.
    pub font_size_px: f32,
    /// Fixed distance between consecutive baselines.
    pub line_height_px: f32,
    /// Total horizontal margin (both sides) subtracted from the caption width when wrapping.
    pub wrap_margin_px: f32,
    /// Padding between the text block and the background box edges.
    pub box_padding_px: f32,
    /// Background box color (straight alpha).
    pub box_rgba: Rgba8,
    /// Text color (straight alpha).
    pub text_rgba: Rgba8,
    /// Caption image height; grows when wrapped text does not fit.
    pub height_hint_px: u32,
    /// Gap between the text block and the image bottom for bottom-anchored captions.
    pub bottom_margin_px: f32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size_px: 40.0,
            line_height_px: 50.0,
            wrap_margin_px: 60.0,
            box_padding_px: 10.0,
            box_rgba: Rgba8::new(0, 0, 0, 128),
            text_rgba: Rgba8::new(255, 255, 255, 255),
            height_hint_px: 360,
            bottom_margin_px: 40.0,
        }
    }
}

/// Options recognized by [`crate::NarrationPipeline`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound (exclusive of a lone oversized sentence) on segment length in characters.
    pub max_segment_chars: usize,
    /// Rate-limit retries after the first attempt.
    pub max_retries: u32,
    /// Base of the exponential backoff; retry `k` waits `backoff_base_secs^k` seconds.
    pub backoff_base_secs: f64,
    /// Pause after each successful synthesis call.
    pub inter_segment_pause_secs: f64,
    /// Output frames per second.
    pub frame_rate: u32,
    /// ffmpeg video encoder name.
    pub video_codec: String,
    /// ffmpeg audio encoder name.
    pub audio_codec: String,
    /// ffmpeg encoder speed preset.
    pub encoder_preset: String,
    /// ffmpeg encoder thread count; `None` lets ffmpeg decide.
    pub encoder_threads: Option<u32>,
    /// Output resolution; `None` keeps the background's native size.
    pub target_resolution: Option<Resolution>,
    /// Resize policy used when `target_resolution` is set.
    pub resize_policy: ResizePolicy,
    /// Caption placement.
    pub caption_layout: CaptionLayout,
    /// Caption styling.
    pub caption: CaptionStyle,
    /// Root for run-scoped temporary directories; defaults to the OS temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_segment_chars: 300,
            max_retries: 3,
            backoff_base_secs: 2.0,
            inter_segment_pause_secs: 0.2,
            frame_rate: 24,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            encoder_preset: "ultrafast".to_string(),
            encoder_threads: Some(4),
            target_resolution: Some(Resolution {
                width: 1280,
                height: 720,
            }),
            resize_policy: ResizePolicy::Stretch,
            caption_layout: CaptionLayout::CenteredFrame,
            caption: CaptionStyle::default(),
            temp_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> NarrationResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes).map_err(|e| {
            NarrationError::config(format!("parse config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check ranges and encoder constraints.
    pub fn validate(&self) -> NarrationResult<()> {
        if self.max_segment_chars == 0 {
            return Err(NarrationError::config("max_segment_chars must be > 0"));
        }
        if !self.backoff_base_secs.is_finite() || self.backoff_base_secs < 0.0 {
            return Err(NarrationError::config(
                "backoff_base_secs must be finite and >= 0",
            ));
        }
        if !self.inter_segment_pause_secs.is_finite() || self.inter_segment_pause_secs < 0.0 {
            return Err(NarrationError::config(
                "inter_segment_pause_secs must be finite and >= 0",
            ));
        }
        if Duration::try_from_secs_f64(self.inter_segment_pause_secs).is_err() {
            return Err(NarrationError::config(format!(
                "inter_segment_pause_secs {} does not fit in a duration",
                self.inter_segment_pause_secs
            )));
        }
        let exp = i32::try_from(self.max_retries).unwrap_or(i32::MAX);
        let longest_backoff = self.backoff_base_secs.powi(exp);
        if self.max_retries > 0 && Duration::try_from_secs_f64(longest_backoff).is_err() {
            return Err(NarrationError::config(format!(
                "backoff_base_secs^max_retries ({}^{}) does not fit in a duration",
                self.backoff_base_secs, self.max_retries
            )));
        }
        Fps::new(self.frame_rate, 1)?;
        if let Some(r) = self.target_resolution {
            r.validate()?;
        }
        for (name, v) in [
            ("video_codec", &self.video_codec),
            ("audio_codec", &self.audio_codec),
            ("encoder_preset", &self.encoder_preset),
        ] {
            if v.trim().is_empty() {
                return Err(NarrationError::config(format!("{name} must be non-empty")));
            }
        }
        if self.encoder_threads == Some(0) {
            return Err(NarrationError::config("encoder_threads must be > 0 when set"));
        }

        let c = &self.caption;
        if !c.font_size_px.is_finite() || c.font_size_px <= 0.0 {
            return Err(NarrationError::config(
                "caption font_size_px must be finite and > 0",
            ));
        }
        if !c.line_height_px.is_finite() || c.line_height_px <= 0.0 {
            return Err(NarrationError::config(
                "caption line_height_px must be finite and > 0",
            ));
        }
        for (name, v) in [
            ("wrap_margin_px", c.wrap_margin_px),
            ("box_padding_px", c.box_padding_px),
            ("bottom_margin_px", c.bottom_margin_px),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(NarrationError::config(format!(
                    "caption {name} must be finite and >= 0"
                )));
            }
        }
        if c.height_hint_px == 0 {
            return Err(NarrationError::config("caption height_hint_px must be > 0"));
        }
        Ok(())
    }

    /// Output frame rate.
    pub fn fps(&self) -> NarrationResult<Fps> {
        Fps::new(self.frame_rate, 1)
    }

    /// Pause applied after each successful synthesis call.
    ///
    /// Saturates to [`Duration::MAX`] for values [`Self::validate`] would reject.
    pub fn inter_segment_pause(&self) -> Duration {
        Duration::try_from_secs_f64(self.inter_segment_pause_secs).unwrap_or(Duration::MAX)
    }
}

/// Credentials for the speech service.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// API key sent as the `key` query parameter.
    ApiKey(String),
    /// OAuth2 access token sent as a bearer `Authorization` header.
    BearerToken(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::BearerToken(_) => f.write_str("BearerToken(<redacted>)"),
        }
    }
}

/// Connection settings for the remote speech service.
///
/// Passed explicitly to the client at construction; its lifetime is the pipeline run.
#[derive(Clone, Debug)]
pub struct SpeechServiceConfig {
    /// Full URL of the `text:synthesize` endpoint.
    pub endpoint: String,
    /// Credentials attached to each request.
    pub credentials: Credentials,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SpeechServiceConfig {
    /// Default Google Cloud Text-to-Speech v1 endpoint.
    pub const DEFAULT_ENDPOINT: &'static str =
        "https://texttospeech.googleapis.com/v1/text:synthesize";

    /// Build settings for the default endpoint.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            credentials,
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;

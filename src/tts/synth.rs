//! Retrying, paced speech synthesis and persisted segment audio.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::assets::media::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
use crate::config::PipelineConfig;
use crate::foundation::error::{NarrationError, NarrationResult};
use crate::resources::ResourceManager;
use crate::text::segment::Segment;
use crate::tts::client::{SpeechClient, SynthesisRequest};
use crate::voice::VoiceProfile;

/// Exponential backoff for rate-limited synthesis calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Retry `k` (1-based) waits `backoff_base_secs^k` seconds.
    pub backoff_base_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_secs: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy taken from pipeline configuration.
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            backoff_base_secs: cfg.backoff_base_secs,
        }
    }

    /// Total attempts including the first.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `retry` (1-based), saturating at [`Duration::MAX`].
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exp = i32::try_from(retry).unwrap_or(i32::MAX);
        Duration::try_from_secs_f64(self.backoff_base_secs.powi(exp)).unwrap_or(Duration::MAX)
    }
}

/// Blocking wait used for backoff and pacing.
pub trait Sleeper: Send + Sync {
    /// Block for `d`.
    fn sleep(&self, d: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

/// Decodes persisted narration audio to mixable PCM.
pub trait AudioDecoder: Send + Sync {
    /// Decode `path` to interleaved stereo f32 at [`MIX_SAMPLE_RATE`].
    fn decode(&self, path: &Path) -> NarrationResult<AudioPcm>;
}

impl<T: AudioDecoder + ?Sized> AudioDecoder for &T {
    fn decode(&self, path: &Path) -> NarrationResult<AudioPcm> {
        (**self).decode(path)
    }
}

/// [`AudioDecoder`] that shells out to `ffmpeg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegAudioDecoder;

impl AudioDecoder for FfmpegAudioDecoder {
    fn decode(&self, path: &Path) -> NarrationResult<AudioPcm> {
        decode_audio_f32_stereo(path, MIX_SAMPLE_RATE).map_err(|e| {
            NarrationError::synthesis(format!("decode '{}': {e:#}", path.display()))
        })
    }
}

/// Narration audio for one segment.
#[derive(Clone, Debug)]
pub struct SynthesizedAudio {
    /// Segment this audio speaks.
    pub segment_index: usize,
    /// Persisted encoded audio.
    pub path: PathBuf,
    /// Encoded size in bytes.
    pub byte_len: usize,
    /// Measured playback length.
    pub duration_secs: f64,
    /// Decoded samples for mixing.
    pub pcm: AudioPcm,
}

/// Turns segments into persisted, measured narration audio.
pub struct SpeechSynthesizer<'a> {
    client: Box<dyn SpeechClient + 'a>,
    sleeper: Arc<dyn Sleeper>,
    decoder: Box<dyn AudioDecoder + 'a>,
    policy: RetryPolicy,
    pause: Duration,
}

impl std::fmt::Debug for SpeechSynthesizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSynthesizer")
            .field("policy", &self.policy)
            .field("pause", &self.pause)
            .finish_non_exhaustive()
    }
}

impl<'a> SpeechSynthesizer<'a> {
    /// Assemble a synthesizer.
    pub fn new(
        client: Box<dyn SpeechClient + 'a>,
        sleeper: Arc<dyn Sleeper>,
        decoder: Box<dyn AudioDecoder + 'a>,
        policy: RetryPolicy,
        pause: Duration,
    ) -> Self {
        Self {
            client,
            sleeper,
            decoder,
            policy,
            pause,
        }
    }

    /// Call the client, retrying only on rate limiting.
    ///
    /// Non-rate-limit failures propagate immediately. When every attempt is rate limited the
    /// result is `RetryExhausted`; no sleep follows the last attempt.
    pub fn request_with_retry(&mut self, request: &SynthesisRequest) -> NarrationResult<Vec<u8>> {
        let attempts = self.policy.attempts();
        for attempt in 1..=attempts {
            match self.client.synthesize(request) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() => {
                    if attempt == attempts {
                        tracing::warn!(attempt, error = %e, "rate limited on final attempt");
                        break;
                    }
                    let delay = self.policy.delay_for_retry(attempt);
                    tracing::warn!(
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        error = %e,
                        "rate limited, backing off"
                    );
                    self.sleeper.sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
        Err(NarrationError::RetryExhausted { attempts })
    }

    /// Synthesize `segment`, persist it as `<run_dir>/seg-<index>.<ext>` and measure it.
    ///
    /// The file is registered with `resources` before it is written.
    pub fn synthesize(
        &mut self,
        segment: &Segment,
        voice: VoiceProfile,
        run_dir: &Path,
        resources: &mut ResourceManager,
    ) -> NarrationResult<SynthesizedAudio> {
        let request = SynthesisRequest::mp3(segment.text.clone(), voice);
        let bytes = self.request_with_retry(&request)?;
        if bytes.is_empty() {
            return Err(NarrationError::synthesis(format!(
                "segment {} produced no audio",
                segment.index
            )));
        }

        let path = run_dir.join(format!(
            "seg-{}.{}",
            segment.index,
            request.encoding.extension()
        ));
        resources.register_file(format!("segment {} audio", segment.index), &path);
        std::fs::write(&path, &bytes).map_err(|e| {
            NarrationError::synthesis(format!("write '{}': {e}", path.display()))
        })?;

        let pcm = self.decoder.decode(&path)?;
        let duration_secs = pcm.duration_secs();
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(NarrationError::synthesis(format!(
                "segment {} audio has no playable duration",
                segment.index
            )));
        }

        tracing::info!(
            segment = segment.index,
            bytes = bytes.len(),
            duration_secs,
            "segment synthesized"
        );
        self.sleeper.sleep(self.pause);

        Ok(SynthesizedAudio {
            segment_index: segment.index,
            path,
            byte_len: bytes.len(),
            duration_secs,
            pcm,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tts/synth.rs"]
mod tests;

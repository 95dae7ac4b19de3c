//! End-to-end narration run: text in, captioned video out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::background::{BackgroundCompositor, BackgroundProber, FfprobeBackgroundProber};
use crate::caption::layout::caption_width;
use crate::caption::render::CaptionRenderer;
use crate::config::{PipelineConfig, SpeechServiceConfig};
use crate::encode::ffmpeg::EncoderSettings;
use crate::foundation::error::{ErrorKind, NarrationError, NarrationResult};
use crate::mux::{RenderJob, VideoMuxer};
use crate::resources::ResourceManager;
use crate::text::segment::segment;
use crate::timeline::Timeline;
use crate::tts::client::SpeechClient;
use crate::tts::google::GoogleTtsClient;
use crate::tts::synth::{
    AudioDecoder, FfmpegAudioDecoder, RetryPolicy, Sleeper, SpeechSynthesizer, ThreadSleeper,
};
use crate::voice::VoiceProfile;

/// Shared flag checked between segments and before encoding.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self, stage: &str) -> NarrationResult<()> {
        if self.is_cancelled() {
            return Err(NarrationError::cancelled(format!("cancelled before {stage}")));
        }
        Ok(())
    }
}

/// Inputs of one run.
#[derive(Clone, Debug)]
pub struct GenerateRequest {
    /// Narration text.
    pub text: String,
    /// Voice id, e.g. `es-ES-Standard-A`.
    pub voice_id: String,
    /// Background video.
    pub background_path: PathBuf,
    /// Output video; never created when the run fails.
    pub output_path: PathBuf,
}

/// Structured result handed to callers instead of a raw error.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateOutcome {
    /// Whether the output was written.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Written output, on success.
    pub output_path: Option<PathBuf>,
    /// Failure kind, on failure.
    pub error_kind: Option<ErrorKind>,
}

/// Sequential narration pipeline.
///
/// Segments are synthesized one at a time, in order; the background is validated before the
/// first synthesis request.
pub struct NarrationPipeline {
    config: PipelineConfig,
    client: Box<dyn SpeechClient>,
    sleeper: Arc<dyn Sleeper>,
    decoder: Box<dyn AudioDecoder>,
    prober: Box<dyn BackgroundProber>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for NarrationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationPipeline")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl NarrationPipeline {
    /// Pipeline using `client`, real sleeps, ffmpeg audio decoding and ffprobe.
    pub fn new(config: PipelineConfig, client: Box<dyn SpeechClient>) -> Self {
        Self {
            config,
            client,
            sleeper: Arc::new(ThreadSleeper),
            decoder: Box::new(FfmpegAudioDecoder),
            prober: Box::new(FfprobeBackgroundProber),
            cancel: CancellationToken::new(),
        }
    }

    /// Pipeline backed by the Google Cloud Text-to-Speech REST API.
    pub fn google(config: PipelineConfig, service: SpeechServiceConfig) -> NarrationResult<Self> {
        let client = GoogleTtsClient::new(service)?;
        Ok(Self::new(config, Box::new(client)))
    }

    /// Replace the backoff/pause sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the audio decoder used to measure synthesized segments.
    pub fn with_decoder(mut self, decoder: Box<dyn AudioDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replace the background prober.
    pub fn with_prober(mut self, prober: Box<dyn BackgroundProber>) -> Self {
        self.prober = prober;
        self
    }

    /// Observe `token` between stages.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run and fold the result into a [`GenerateOutcome`].
    pub fn generate_video(&mut self, request: &GenerateRequest) -> GenerateOutcome {
        match self.run(request) {
            Ok(path) => GenerateOutcome {
                success: true,
                message: format!("video written to {}", path.display()),
                output_path: Some(path),
                error_kind: None,
            },
            Err(e) => {
                tracing::error!(error = %e, kind = ?e.kind(), "narration run failed");
                GenerateOutcome {
                    success: false,
                    message: e.to_string(),
                    output_path: None,
                    error_kind: Some(e.kind()),
                }
            }
        }
    }

    /// Run the pipeline, returning the output path.
    ///
    /// Every temporary resource is released before this returns, on success and on failure.
    #[tracing::instrument(skip_all, fields(voice = %request.voice_id, output = %request.output_path.display()))]
    pub fn run(&mut self, request: &GenerateRequest) -> NarrationResult<PathBuf> {
        let mut resources = ResourceManager::new();
        let result = self.run_with(request, &mut resources);
        let failures = resources.release_all();
        if !failures.is_empty() {
            tracing::warn!(count = failures.len(), "some temporary resources were not released");
        }
        result
    }

    fn run_with(
        &mut self,
        request: &GenerateRequest,
        resources: &mut ResourceManager,
    ) -> NarrationResult<PathBuf> {
        self.config.validate()?;
        let voice = VoiceProfile::from_id(&request.voice_id)?;
        let segments = segment(&request.text, self.config.max_segment_chars)?;
        tracing::info!(segments = segments.len(), voice = %voice, "text segmented");

        let source = self.prober.probe(&request.background_path)?;
        let fps = self.config.fps()?;
        let compositor = BackgroundCompositor {
            target_resolution: self.config.target_resolution,
            resize_policy: self.config.resize_policy,
            fps,
        };
        let frame_res = compositor.output_resolution(&source);
        let layout = self.config.caption_layout;
        let cap_width = caption_width(frame_res.width, source.info.width, layout);

        let run_dir = create_run_dir(self.config.temp_dir.as_deref())?;
        resources.register_dir("run directory", &run_dir);
        tracing::debug!(run_dir = %run_dir.display(), "run directory created");

        let mut captions = CaptionRenderer::from_style(self.config.caption.clone())?;
        let height_hint = self.config.caption.height_hint_px;

        let mut synth = SpeechSynthesizer::new(
            Box::new(&mut *self.client),
            Arc::clone(&self.sleeper),
            Box::new(&*self.decoder),
            RetryPolicy::from_config(&self.config),
            self.config.inter_segment_pause(),
        );

        let mut audios = Vec::with_capacity(segments.len());
        let mut images = Vec::with_capacity(segments.len());
        for seg in &segments {
            self.cancel.check(&format!("segment {}", seg.index))?;
            tracing::info!(segment = seg.index, chars = seg.char_len(), "synthesizing segment");
            audios.push(synth.synthesize(seg, voice, &run_dir, resources)?);
            images.push(captions.render(seg.index, &seg.text, cap_width, height_hint, layout)?);
        }
        drop(synth);

        let timeline = Timeline::build(&segments, audios, images)?;
        tracing::info!(
            entries = timeline.entries.len(),
            total_secs = timeline.total_duration_secs,
            "timeline built"
        );

        let track = compositor.prepare(&source, timeline.total_duration_secs)?;
        self.cancel.check("encoding")?;

        VideoMuxer::render(
            RenderJob {
                timeline: &timeline,
                background: &track,
                output_path: request.output_path.clone(),
                caption_layout: layout,
                encoder: EncoderSettings {
                    video_codec: self.config.video_codec.clone(),
                    audio_codec: self.config.audio_codec.clone(),
                    preset: self.config.encoder_preset.clone(),
                    threads: self.config.encoder_threads,
                },
                work_dir: run_dir,
            },
            resources,
        )
    }
}

/// Create `<root>/voxreel-<uuid>`; `root` defaults to the OS temp directory.
pub fn create_run_dir(root: Option<&Path>) -> NarrationResult<PathBuf> {
    let root = root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    let dir = root.join(format!("voxreel-{}", uuid::Uuid::new_v4().simple()));
    std::fs::create_dir_all(&dir).map_err(|e| {
        NarrationError::config(format!("create run directory '{}': {e}", dir.display()))
    })?;
    Ok(dir)
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;

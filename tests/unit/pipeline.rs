use super::*;
use crate::tts::client::SynthesisRequest;
use std::sync::atomic::AtomicUsize;

struct CountingClient(Arc<AtomicUsize>);

impl SpeechClient for CountingClient {
    fn synthesize(&mut self, _request: &SynthesisRequest) -> NarrationResult<Vec<u8>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(b"ID3".to_vec())
    }
}

fn pipeline() -> (NarrationPipeline, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let p = NarrationPipeline::new(
        PipelineConfig::default(),
        Box::new(CountingClient(calls.clone())),
    );
    (p, calls)
}

fn request(text: &str, voice: &str, out: &str) -> GenerateRequest {
    GenerateRequest {
        text: text.to_string(),
        voice_id: voice.to_string(),
        background_path: PathBuf::from("target/unit_pipeline/does-not-exist.mp4"),
        output_path: PathBuf::from("target/unit_pipeline").join(out),
    }
}

#[test]
fn cancellation_token_is_shared_between_clones() {
    let a = CancellationToken::new();
    let b = a.clone();
    assert!(!b.is_cancelled());
    assert!(a.check("segment 0").is_ok());
    a.cancel();
    assert!(b.is_cancelled());
    let err = b.check("encoding").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[test]
fn missing_background_fails_before_any_synthesis() {
    let (mut p, calls) = pipeline();
    let req = request("Hola. Mundo.", "es-ES-Standard-A", "missing-bg.mp4");
    let outcome = p.generate_video(&req);

    assert!(!outcome.success);
    assert_eq!(outcome.error_kind, Some(ErrorKind::BackgroundLoad));
    assert!(outcome.output_path.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!req.output_path.exists());
}

#[test]
fn unsupported_voice_is_input_error() {
    let (mut p, calls) = pipeline();
    let err = p
        .run(&request("Hola.", "en-US-Wavenet-D", "voice.mp4"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn blank_text_is_input_error() {
    let (mut p, _) = pipeline();
    let outcome = p.generate_video(&request("  \n ", "es-ES-Standard-B", "blank.mp4"));
    assert_eq!(outcome.error_kind, Some(ErrorKind::Input));
}

#[test]
fn invalid_config_is_reported_first() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = PipelineConfig {
        frame_rate: 0,
        ..PipelineConfig::default()
    };
    let mut p = NarrationPipeline::new(config, Box::new(CountingClient(calls)));
    let err = p
        .run(&request("Hola.", "es-ES-Standard-A", "cfg.mp4"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn run_dirs_are_unique_under_root() {
    let root = PathBuf::from("target/unit_pipeline/runs");
    let a = create_run_dir(Some(&root)).unwrap();
    let b = create_run_dir(Some(&root)).unwrap();
    assert_ne!(a, b);
    assert!(a.is_dir() && b.is_dir());
    assert!(a.starts_with(&root));
    let _ = std::fs::remove_dir_all(&a);
    let _ = std::fs::remove_dir_all(&b);
}

#[test]
fn out_of_range_pause_is_reported_not_panicked() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = PipelineConfig {
        inter_segment_pause_secs: 1e20,
        ..PipelineConfig::default()
    };
    let mut p = NarrationPipeline::new(config, Box::new(CountingClient(calls.clone())));
    let outcome = p.generate_video(&request("Hola.", "es-ES-Standard-A", "pause.mp4"));
    assert!(!outcome.success);
    assert_eq!(outcome.error_kind, Some(ErrorKind::Config));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const API_KEY_ENV: &str = "VOXREEL_TTS_API_KEY";

#[derive(Parser, Debug)]
#[command(name = "voxreel", version, about = "Narrated caption videos from plain text")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a narrated MP4 (requires `ffmpeg`/`ffprobe` on PATH).
    Render(RenderArgs),
    /// List supported voices.
    Voices,
    /// Print the segments a text would be split into.
    Segment(SegmentArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// UTF-8 text file to narrate.
    #[arg(long)]
    text: PathBuf,

    /// Voice id (see `voxreel voices`).
    #[arg(long, default_value = "es-ES-Standard-A")]
    voice: String,

    /// Background video.
    #[arg(long)]
    background: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Pipeline configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Speech service API key (falls back to $VOXREEL_TTS_API_KEY).
    #[arg(long, conflicts_with = "bearer_token")]
    api_key: Option<String>,

    /// OAuth bearer token for the speech service.
    #[arg(long)]
    bearer_token: Option<String>,

    /// Override the speech service endpoint.
    #[arg(long)]
    endpoint: Option<String>,
}

#[derive(Parser, Debug)]
struct SegmentArgs {
    /// UTF-8 text file to split.
    #[arg(long)]
    text: PathBuf,

    /// Maximum characters per segment.
    #[arg(long, default_value_t = voxreel::text::segment::DEFAULT_MAX_SEGMENT_CHARS)]
    max_chars: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Voices => cmd_voices(),
        Command::Segment(args) => cmd_segment(args),
    }
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read text '{}'", path.display()))
}

fn credentials(args: &RenderArgs) -> anyhow::Result<voxreel::Credentials> {
    if let Some(token) = args.bearer_token.as_ref() {
        return Ok(voxreel::Credentials::BearerToken(token.clone()));
    }
    let key = match args.api_key.as_ref() {
        Some(k) => k.clone(),
        None => std::env::var(API_KEY_ENV).with_context(|| {
            format!("no credentials: pass --api-key/--bearer-token or set {API_KEY_ENV}")
        })?,
    };
    Ok(voxreel::Credentials::ApiKey(key))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let text = read_text(&args.text)?;
    let config = match args.config.as_deref() {
        Some(p) => voxreel::PipelineConfig::from_json_file(p)?,
        None => voxreel::PipelineConfig::default(),
    };

    let mut service = voxreel::SpeechServiceConfig::new(credentials(&args)?);
    if let Some(endpoint) = args.endpoint.as_ref() {
        service = service.with_endpoint(endpoint.clone());
    }

    let mut pipeline = voxreel::NarrationPipeline::google(config, service)?;
    let outcome = pipeline.generate_video(&voxreel::GenerateRequest {
        text,
        voice_id: args.voice,
        background_path: args.background,
        output_path: args.out,
    });

    let json = serde_json::json!({
        "success": outcome.success,
        "message": outcome.message,
        "output_path": outcome.output_path,
        "error_kind": outcome.error_kind.map(|k| format!("{k:?}")),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);

    if !outcome.success {
        anyhow::bail!("render failed: {}", outcome.message);
    }
    Ok(())
}

fn cmd_voices() -> anyhow::Result<()> {
    for v in voxreel::VoiceProfile::ALL {
        println!("{}\t{}\t{}", v.id(), v.language_code(), v.gender().as_str());
    }
    Ok(())
}

fn cmd_segment(args: SegmentArgs) -> anyhow::Result<()> {
    let text = read_text(&args.text)?;
    let segments = voxreel::segment(&text, args.max_chars)?;
    for s in &segments {
        println!("[{}] ({} chars) {}", s.index, s.char_len(), s.text);
    }
    Ok(())
}

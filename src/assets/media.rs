//! ffprobe/ffmpeg helpers: video probing, audio decoding and raw frame streaming.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{ChildStdout, Command, Stdio};

use anyhow::{Context as _, anyhow, bail};

use crate::foundation::core::Resolution;
use crate::resources::ClipHandle;

/// Sample rate of every PCM buffer the pipeline mixes.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Stream facts reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    /// Probed file.
    pub source_path: PathBuf,
    /// Native width.
    pub width: u32,
    /// Native height.
    pub height: u32,
    /// Frame rate numerator.
    pub fps_num: u32,
    /// Frame rate denominator.
    pub fps_den: u32,
    /// Container duration in seconds.
    pub duration_sec: f64,
    /// Whether an audio stream is present (ignored by the pipeline).
    pub has_audio: bool,
}

impl VideoSourceInfo {
    /// Native frame rate as a float; zero when unknown.
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

/// Interleaved f32 PCM.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioPcm {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// `frames * channels` samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved_f32.len() / usize::from(self.channels)
        }
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / f64::from(self.sample_rate)
        }
    }
}

/// Probe a video file with `ffprobe`.
pub fn probe_video(source_path: &Path) -> anyhow::Result<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .context("failed to run ffprobe")?;
    if !out.status.success() {
        bail!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }

    let parsed: ProbeOut =
        serde_json::from_slice(&out.stdout).context("ffprobe json parse failed")?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| anyhow!("no video stream found in '{}'", source_path.display()))?;
    let width = video.width.context("missing video width from ffprobe")?;
    let height = video.height.context("missing video height from ffprobe")?;
    let (fps_num, fps_den) =
        parse_ff_ratio(video.r_frame_rate.as_deref().unwrap_or("0/1")).unwrap_or((0, 1));

    let parse_secs = |s: &Option<String>| s.as_deref().and_then(|v| v.parse::<f64>().ok());
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| parse_secs(&f.duration))
        .or_else(|| parse_secs(&video.duration))
        .unwrap_or(0.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
        has_audio,
    })
}

/// Decode any audio file to interleaved stereo f32 at `sample_rate`.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> anyhow::Result<AudioPcm> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .context("failed to run ffmpeg for audio decode")?;

    if !out.status.success() {
        bail!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    if !out.stdout.len().is_multiple_of(4) {
        bail!("decoded audio byte length is not aligned to f32 samples");
    }

    let interleaved_f32 = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32,
    })
}

/// `-vf` filter chain bringing a source to `out` at `fps`.
///
/// `letterbox` keeps the aspect ratio and pads with black; otherwise the source is stretched.
pub fn scale_filter(out: Resolution, letterbox: bool, fps: u32) -> String {
    let (w, h) = (out.width, out.height);
    if letterbox {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black,setsar=1,fps={fps}"
        )
    } else {
        format!("scale={w}:{h},setsar=1,fps={fps}")
    }
}

/// Streaming reader of raw RGBA frames from an `ffmpeg` child process.
///
/// The process is owned through a [`ClipHandle`] so the caller can also register it for
/// cleanup; dropping the reader does not kill the process.
pub struct VideoFrameReader {
    clip: ClipHandle,
    stdout: ChildStdout,
    frame_len: usize,
}

impl std::fmt::Debug for VideoFrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrameReader")
            .field("clip", &self.clip.label())
            .field("frame_len", &self.frame_len)
            .finish()
    }
}

impl VideoFrameReader {
    /// Start decoding `frame_count` frames of `source` from its beginning, filtered by `filter`.
    pub fn spawn(
        source: &Path,
        out: Resolution,
        filter: &str,
        frame_count: u64,
        label: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin", "-i"])
            .arg(source)
            .args(["-an", "-vf", filter])
            .args(["-frames:v", &frame_count.to_string()])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        tracing::debug!(command = ?cmd, "spawning ffmpeg frame decoder");

        let mut child = cmd
            .spawn()
            .context("failed to spawn ffmpeg (is it installed and on PATH?)")?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stdout unavailable"))?;
        Ok(Self {
            clip: ClipHandle::new(label, child),
            stdout,
            frame_len: out.rgba8_len(),
        })
    }

    /// Handle to the decoder process.
    pub fn clip(&self) -> &ClipHandle {
        &self.clip
    }

    /// Read the next frame into `dst`; `Ok(false)` at end of stream.
    pub fn read_frame(&mut self, dst: &mut [u8]) -> anyhow::Result<bool> {
        if dst.len() != self.frame_len {
            bail!(
                "frame buffer is {} bytes, decoder produces {}",
                dst.len(),
                self.frame_len
            );
        }
        let mut filled = 0usize;
        while filled < dst.len() {
            let n = self
                .stdout
                .read(&mut dst[filled..])
                .context("read decoded frame from ffmpeg")?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled == dst.len())
    }
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

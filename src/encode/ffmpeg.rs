//! `ffmpeg` encoder sink fed raw RGBA over stdin.

use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{NarrationError, NarrationResult};
use crate::render::frame::FrameRGBA;

/// Encoder choices passed through to `ffmpeg`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Video encoder (`-c:v`).
    pub video_codec: String,
    /// Audio encoder (`-c:a`).
    pub audio_codec: String,
    /// Speed preset (`-preset`).
    pub preset: String,
    /// Encoder threads (`-threads`); `None` leaves the choice to ffmpeg.
    pub threads: Option<u32>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "ultrafast".to_string(),
            threads: Some(4),
        }
    }
}

/// Sink that pipes raw RGBA frames into a system `ffmpeg` process.
///
/// The container format is inferred by ffmpeg from the output path's extension.
pub struct FfmpegSink {
    out_path: PathBuf,
    settings: EncoderSettings,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for FfmpegSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSink")
            .field("out_path", &self.out_path)
            .field("settings", &self.settings)
            .field("running", &self.child.is_some())
            .finish()
    }
}

impl FfmpegSink {
    /// Sink writing to `out_path` (overwritten if present).
    pub fn new(out_path: impl Into<PathBuf>, settings: EncoderSettings) -> Self {
        Self {
            out_path: out_path.into(),
            settings,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Command line for `cfg`, without spawning.
    pub fn command(&self, cfg: &SinkConfig) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-hide_banner", "-loglevel", "error"]);
        cmd.args([
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &cfg.resolution.to_string(),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        if let Some(audio) = cfg.audio.as_ref() {
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path);
            cmd.args(["-map", "0:v:0", "-map", "1:a:0", "-c:a", &self.settings.audio_codec]);
        } else {
            cmd.arg("-an");
        }

        cmd.args([
            "-c:v",
            &self.settings.video_codec,
            "-preset",
            &self.settings.preset,
            "-pix_fmt",
            "yuv420p",
        ]);
        if let Some(t) = self.settings.threads {
            cmd.args(["-threads", &t.to_string()]);
        }
        cmd.args(["-frames:v", &cfg.frame_count.to_string()]);
        cmd.args(["-movflags", "+faststart"]);
        cmd.arg(&self.out_path);
        cmd
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> NarrationResult<()> {
        cfg.resolution.validate()?;
        if let Some(audio) = cfg.audio.as_ref()
            && (audio.sample_rate == 0 || audio.channels == 0)
        {
            return Err(NarrationError::render(
                "audio sample_rate and channels must be non-zero",
            ));
        }
        ensure_parent_dir(&self.out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(NarrationError::render(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let mut cmd = self.command(&cfg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        tracing::debug!(command = ?cmd, "spawning ffmpeg encoder");

        let mut child = cmd.spawn().map_err(|e| {
            NarrationError::render(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| NarrationError::render("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| NarrationError::render("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        self.scratch = vec![0u8; cfg.resolution.rgba8_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> NarrationResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| NarrationError::render("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(NarrationError::render(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.resolution() != cfg.resolution || frame.data.len() != self.scratch.len() {
            return Err(NarrationError::render(format!(
                "frame size mismatch: got {}x{}, expected {}",
                frame.width, frame.height, cfg.resolution
            )));
        }

        if frame.premultiplied {
            flatten_premul_over_black(&mut self.scratch, &frame.data);
        } else {
            self.scratch.copy_from_slice(&frame.data);
            for px in self.scratch.chunks_exact_mut(4) {
                px[3] = 255;
            }
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(NarrationError::render("ffmpeg sink is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            NarrationError::render(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn end(&mut self) -> NarrationResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| NarrationError::render("ffmpeg sink not started"))?;
        let status = child
            .wait()
            .map_err(|e| NarrationError::render(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| NarrationError::render("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| NarrationError::render(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        self.cfg = None;

        if !status.success() {
            return Err(NarrationError::render(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // `-r` before `-i` sets the rawvideo input rate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Composite premultiplied pixels over opaque black.
fn flatten_premul_over_black(dst: &mut [u8], src_premul: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        // Over black, premultiplied color channels are already the result.
        d[..3].copy_from_slice(&s[..3]);
        d[3] = 255;
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> NarrationResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;

//! Background track: probe, loop/trim arithmetic and streamed frame decoding.
//!
//! A source shorter than the narration is repeated `ceil(total / native)` times and the
//! repetition is cut at exactly `total`. The source's own audio is never decoded.

use std::path::{Path, PathBuf};

use crate::assets::media::{VideoFrameReader, VideoSourceInfo, probe_video, scale_filter};
use crate::config::ResizePolicy;
use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{NarrationError, NarrationResult};
use crate::resources::{ResourceId, ResourceManager};

/// Number of source repetitions needed to cover `total_secs`; at least one.
pub fn loop_count(native_secs: f64, total_secs: f64) -> u32 {
    if native_secs <= 0.0 || total_secs <= native_secs {
        return 1;
    }
    let n = (total_secs / native_secs).ceil();
    // Absorb float noise such as 12.000000001 / 4.0.
    let n = if (n - 1.0) * native_secs >= total_secs - 1e-9 {
        n - 1.0
    } else {
        n
    };
    n.max(1.0) as u32
}

/// Source-time length of each repetition: full loops plus a final remainder, summing to
/// `total_secs`.
pub fn loop_pieces(native_secs: f64, total_secs: f64) -> Vec<f64> {
    if total_secs <= 0.0 {
        return Vec::new();
    }
    let n = loop_count(native_secs, total_secs);
    let mut pieces = Vec::with_capacity(n as usize);
    let mut remaining = total_secs;
    for _ in 0..n {
        let d = remaining.min(native_secs.max(0.0));
        let d = if d <= 0.0 { remaining } else { d };
        pieces.push(d);
        remaining -= d;
    }
    if let Some(last) = pieces.last_mut() {
        *last += remaining;
    }
    pieces
}

/// Output frames produced by each piece; the counts sum to `total_frames`.
///
/// Piece `k` covers frames `[round(start_k * fps), round(end_k * fps))`, with the last piece
/// running to `total_frames`.
pub fn piece_frame_counts(pieces: &[f64], fps: Fps, total_frames: u64) -> Vec<u64> {
    let mut out = Vec::with_capacity(pieces.len());
    let mut start_secs = 0.0f64;
    let mut start_frame = 0u64;
    for (i, &d) in pieces.iter().enumerate() {
        let end_secs = start_secs + d;
        let end_frame = if i + 1 == pieces.len() {
            total_frames
        } else {
            ((end_secs * fps.as_f64()).round() as u64).min(total_frames)
        };
        out.push(end_frame.saturating_sub(start_frame));
        start_frame = end_frame.max(start_frame);
        start_secs = end_secs;
    }
    out
}

/// A probed, usable background video.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundSource {
    /// Probe results.
    pub info: VideoSourceInfo,
}

impl BackgroundSource {
    /// Validate and probe `path`; every failure is a background-load error.
    pub fn probe(path: &Path) -> NarrationResult<Self> {
        if !path.is_file() {
            return Err(NarrationError::background(format!(
                "background video '{}' does not exist or is not a file",
                path.display()
            )));
        }
        let info = probe_video(path).map_err(|e| {
            NarrationError::background(format!("'{}': {e:#}", path.display()))
        })?;
        if !info.duration_sec.is_finite() || info.duration_sec <= 0.0 {
            return Err(NarrationError::background(format!(
                "'{}' has no positive duration",
                path.display()
            )));
        }
        if info.width == 0 || info.height == 0 {
            return Err(NarrationError::background(format!(
                "'{}' has empty video dimensions",
                path.display()
            )));
        }
        tracing::info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            duration_secs = info.duration_sec,
            "background probed"
        );
        Ok(Self { info })
    }

    /// Native duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.info.duration_sec
    }

    /// Native frame size.
    pub fn native_resolution(&self) -> Resolution {
        Resolution {
            width: self.info.width,
            height: self.info.height,
        }
    }
}

/// Turns a background path into a validated [`BackgroundSource`].
pub trait BackgroundProber: Send + Sync {
    /// Validate and probe `path`; failures are background-load errors.
    fn probe(&self, path: &Path) -> NarrationResult<BackgroundSource>;
}

/// [`BackgroundProber`] that runs `ffprobe`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfprobeBackgroundProber;

impl BackgroundProber for FfprobeBackgroundProber {
    fn probe(&self, path: &Path) -> NarrationResult<BackgroundSource> {
        BackgroundSource::probe(path)
    }
}

/// Background plan for one render: which source, how many loops, and at what size.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundTrack {
    /// Source file.
    pub source_path: PathBuf,
    /// Source duration.
    pub native_duration_secs: f64,
    /// Source frame size.
    pub native_resolution: Resolution,
    /// Output frame size.
    pub resolution: Resolution,
    /// Source repetitions.
    pub loop_count: u32,
    /// Track length after trimming; equals the narration length.
    pub trimmed_duration_secs: f64,
    /// Per-repetition source durations.
    pub pieces: Vec<f64>,
    /// Output frame rate.
    pub fps: Fps,
    /// ffmpeg filter chain for resizing.
    pub filter: String,
}

impl BackgroundTrack {
    /// Frames needed to cover the trimmed track.
    pub fn frame_count(&self) -> u64 {
        self.fps.frames_to_cover(self.trimmed_duration_secs)
    }

    /// Open a streamed frame source over the looped, trimmed track.
    pub fn open_frames<'a>(&'a self, resources: &'a mut ResourceManager) -> LoopedFrameSource<'a> {
        let counts = piece_frame_counts(&self.pieces, self.fps, self.frame_count());
        LoopedFrameSource {
            track: self,
            resources,
            counts,
            piece: 0,
            left_in_piece: 0,
            reader: None,
            last_frame: None,
        }
    }
}

/// Prepares [`BackgroundTrack`]s for a fixed output geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundCompositor {
    /// Output size; `None` keeps the source size (rounded down to even).
    pub target_resolution: Option<Resolution>,
    /// Resize policy when a target is set.
    pub resize_policy: ResizePolicy,
    /// Output frame rate.
    pub fps: Fps,
}

impl BackgroundCompositor {
    /// Output size for `source`.
    pub fn output_resolution(&self, source: &BackgroundSource) -> Resolution {
        self.target_resolution
            .unwrap_or_else(|| Resolution::even_floor(source.info.width, source.info.height))
    }

    /// Plan a track of exactly `total_secs` from `source`.
    pub fn prepare(
        &self,
        source: &BackgroundSource,
        total_secs: f64,
    ) -> NarrationResult<BackgroundTrack> {
        if !total_secs.is_finite() || total_secs <= 0.0 {
            return Err(NarrationError::invariant(format!(
                "background requested for non-positive duration {total_secs}"
            )));
        }
        let native = source.duration_secs();
        let resolution = self.output_resolution(source);
        let letterbox =
            self.target_resolution.is_some() && self.resize_policy == ResizePolicy::Letterbox;
        let pieces = loop_pieces(native, total_secs);
        let loops = pieces.len() as u32;

        tracing::info!(
            native_secs = native,
            total_secs,
            loop_count = loops,
            resolution = %resolution,
            "background prepared"
        );

        Ok(BackgroundTrack {
            source_path: source.info.source_path.clone(),
            native_duration_secs: native,
            native_resolution: source.native_resolution(),
            resolution,
            loop_count: loops,
            trimmed_duration_secs: total_secs,
            pieces,
            fps: self.fps,
            filter: scale_filter(resolution, letterbox, self.fps.num / self.fps.den.max(1)),
        })
    }
}

/// Sequential producer of background frames in output order.
pub trait FrameSource {
    /// Output frame size.
    fn resolution(&self) -> Resolution;
    /// Fill `dst` (straight RGBA8, `resolution().rgba8_len()` bytes) with the next frame.
    fn next_frame(&mut self, dst: &mut [u8]) -> NarrationResult<()>;
}

/// Frames of a [`BackgroundTrack`], decoded one repetition at a time.
///
/// Each repetition runs its own `ffmpeg` process, registered with the resource manager and
/// released as soon as the repetition is consumed. A decoder that ends early repeats its last
/// frame.
pub struct LoopedFrameSource<'a> {
    track: &'a BackgroundTrack,
    resources: &'a mut ResourceManager,
    counts: Vec<u64>,
    piece: usize,
    left_in_piece: u64,
    reader: Option<(VideoFrameReader, ResourceId)>,
    last_frame: Option<Vec<u8>>,
}

impl std::fmt::Debug for LoopedFrameSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopedFrameSource")
            .field("source", &self.track.source_path)
            .field("piece", &self.piece)
            .field("left_in_piece", &self.left_in_piece)
            .finish()
    }
}

impl LoopedFrameSource<'_> {
    fn advance_piece(&mut self) -> NarrationResult<()> {
        self.close_reader()?;
        while self.left_in_piece == 0 {
            let Some(&count) = self.counts.get(self.piece) else {
                return Err(NarrationError::render(
                    "background frames requested past the end of the track",
                ));
            };
            self.piece += 1;
            self.left_in_piece = count;
        }

        let label = format!("background decoder (loop {})", self.piece);
        let reader = VideoFrameReader::spawn(
            &self.track.source_path,
            self.track.resolution,
            &self.track.filter,
            self.left_in_piece,
            label,
        )
        .map_err(|e| NarrationError::render(format!("{e:#}")))?;
        let id = self.resources.register_clip(reader.clip());
        self.reader = Some((reader, id));
        Ok(())
    }

    fn close_reader(&mut self) -> NarrationResult<()> {
        if let Some((_, id)) = self.reader.take() {
            self.resources.release(id)?;
        }
        Ok(())
    }
}

impl FrameSource for LoopedFrameSource<'_> {
    fn resolution(&self) -> Resolution {
        self.track.resolution
    }

    fn next_frame(&mut self, dst: &mut [u8]) -> NarrationResult<()> {
        if self.left_in_piece == 0 || self.reader.is_none() {
            self.advance_piece()?;
        }
        self.left_in_piece -= 1;

        let got = match &mut self.reader {
            Some((reader, _)) => reader
                .read_frame(dst)
                .map_err(|e| NarrationError::render(format!("{e:#}")))?,
            None => false,
        };

        if got {
            match &mut self.last_frame {
                Some(last) => last.copy_from_slice(dst),
                None => self.last_frame = Some(dst.to_vec()),
            }
        } else {
            let last = self.last_frame.as_ref().ok_or_else(|| {
                NarrationError::render(format!(
                    "background '{}' produced no frames",
                    self.track.source_path.display()
                ))
            })?;
            dst.copy_from_slice(last);
        }

        if self.left_in_piece == 0 {
            self.close_reader()?;
        }
        Ok(())
    }
}

impl Drop for LoopedFrameSource<'_> {
    fn drop(&mut self) {
        let _ = self.close_reader();
    }
}

/// Constant-color frames; useful when no decoding is wanted.
#[derive(Clone, Debug)]
pub struct SolidFrameSource {
    resolution: Resolution,
    rgba: [u8; 4],
    /// Frames handed out so far.
    pub frames_served: u64,
}

impl SolidFrameSource {
    /// Source of `rgba` frames at `resolution`.
    pub fn new(resolution: Resolution, rgba: [u8; 4]) -> Self {
        Self {
            resolution,
            rgba,
            frames_served: 0,
        }
    }
}

impl FrameSource for SolidFrameSource {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn next_frame(&mut self, dst: &mut [u8]) -> NarrationResult<()> {
        if dst.len() != self.resolution.rgba8_len() {
            return Err(NarrationError::render("frame buffer size mismatch"));
        }
        for px in dst.chunks_exact_mut(4) {
            px.copy_from_slice(&self.rgba);
        }
        self.frames_served += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/background.rs"]
mod tests;

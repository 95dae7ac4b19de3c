//! Final composition and encode.
//!
//! Background frames form the base layer; the caption of whichever timeline entry covers a
//! frame's start time is blended on top, and the mixed narration is the only audio track.

use std::path::{Path, PathBuf};

use crate::assets::media::MIX_SAMPLE_RATE;
use crate::audio::mix::{MixInput, mix_narration, write_f32le};
use crate::background::{BackgroundTrack, FrameSource};
use crate::caption::layout::placement_on_frame;
use crate::config::CaptionLayout;
use crate::encode::ffmpeg::{EncoderSettings, FfmpegSink};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{NarrationError, NarrationResult};
use crate::render::composite::blit_over;
use crate::render::frame::FrameRGBA;
use crate::resources::{ResourceId, ResourceManager};
use crate::timeline::Timeline;

/// Everything needed to produce the output file.
#[derive(Debug)]
pub struct RenderJob<'a> {
    /// Narration timeline.
    pub timeline: &'a Timeline,
    /// Prepared background.
    pub background: &'a BackgroundTrack,
    /// Final output location.
    pub output_path: PathBuf,
    /// Caption placement.
    pub caption_layout: CaptionLayout,
    /// Encoder choices.
    pub encoder: EncoderSettings,
    /// Directory for intermediate files (the mixed narration track).
    pub work_dir: PathBuf,
}

/// Hidden sibling of `output` used while encoding; keeps the extension so the container format
/// is unchanged.
pub fn partial_output_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match output.extension() {
        Some(ext) => format!(
            ".{stem}.partial-{}.{}",
            uuid::Uuid::new_v4().simple(),
            ext.to_string_lossy()
        ),
        None => format!(".{stem}.partial-{}", uuid::Uuid::new_v4().simple()),
    };
    output.with_file_name(name)
}

/// Create the missing ancestors of `output`, registering each new directory for removal.
///
/// Directories that already existed are left alone. The removal only succeeds on empty
/// directories, so nothing written there by others is lost.
pub fn create_output_dirs(
    output: &Path,
    resources: &mut ResourceManager,
) -> NarrationResult<Vec<ResourceId>> {
    let mut missing = Vec::new();
    let mut cur = output.parent();
    while let Some(dir) = cur {
        if dir.as_os_str().is_empty() || dir.exists() {
            break;
        }
        missing.push(dir.to_path_buf());
        cur = dir.parent();
    }

    let mut ids = Vec::with_capacity(missing.len());
    for dir in missing.into_iter().rev() {
        match std::fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(NarrationError::render(format!(
                    "create output directory '{}': {e}",
                    dir.display()
                )));
            }
        }
        let label = format!("output directory '{}'", dir.display());
        ids.push(resources.register_fn(label, move || match std::fs::remove_dir(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NarrationError::render(format!(
                "remove output directory '{}': {e}",
                dir.display()
            ))),
        }));
    }
    Ok(ids)
}

/// Composites and encodes render jobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct VideoMuxer;

impl VideoMuxer {
    /// Push `frame_count` composited frames to `sink`, between `begin` and `end`.
    ///
    /// Frame `i` shows the entry whose `[start, start + duration)` contains `i / fps`.
    pub fn compose_frames(
        timeline: &Timeline,
        background: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        fps: Fps,
        frame_count: u64,
        layout: CaptionLayout,
        audio: Option<AudioInputConfig>,
    ) -> NarrationResult<u64> {
        let resolution = background.resolution();
        let placements = timeline
            .entries
            .iter()
            .map(|e| {
                placement_on_frame(
                    e.caption.width,
                    e.caption.height,
                    resolution.width,
                    resolution.height,
                    layout,
                )
            })
            .collect::<Vec<_>>();

        sink.begin(SinkConfig {
            resolution,
            fps,
            frame_count,
            audio,
        })?;

        let mut frame = FrameRGBA::new(resolution);
        let mut cursor = 0usize;
        for i in 0..frame_count {
            let idx = FrameIndex(i);
            let t = fps.frame_start_secs(idx);
            background.next_frame(&mut frame.data)?;
            for px in frame.data.chunks_exact_mut(4) {
                px[3] = 255;
            }

            while cursor < timeline.entries.len() && t >= timeline.entries[cursor].end_secs() {
                cursor += 1;
            }
            if let Some(entry) = timeline.entries.get(cursor)
                && entry.contains(t)
            {
                let (x, y) = placements[cursor];
                let c = &entry.caption;
                blit_over(&mut frame, &c.rgba8_premul, c.width, c.height, x, y)?;
            }

            sink.push_frame(idx, &frame)?;
        }

        sink.end()?;
        Ok(frame_count)
    }

    /// Encode `job` to its output path.
    ///
    /// Encoding goes to a hidden partial file next to the output, registered with `resources`;
    /// the output path only ever sees a finished file.
    #[tracing::instrument(skip_all, fields(output = %job.output_path.display()))]
    pub fn render(job: RenderJob<'_>, resources: &mut ResourceManager) -> NarrationResult<PathBuf> {
        if job.timeline.is_empty() {
            return Err(NarrationError::render("nothing to render: empty timeline"));
        }
        let created_dirs = create_output_dirs(&job.output_path, resources)?;

        let inputs = job
            .timeline
            .entries
            .iter()
            .map(|e| MixInput {
                start_secs: e.start_secs,
                pcm: &e.audio.pcm,
            })
            .collect::<Vec<_>>();
        let mixed = mix_narration(&inputs, job.timeline.total_duration_secs, MIX_SAMPLE_RATE);
        let audio_path = job.work_dir.join("narration.f32le");
        resources.register_file("narration mix", &audio_path);
        write_f32le(&mixed, &audio_path)?;
        drop(mixed);

        let partial = partial_output_path(&job.output_path);
        resources.register_file("partial output", &partial);

        let frame_count = job.background.frame_count();
        tracing::info!(
            frames = frame_count,
            fps = job.background.fps.as_f64(),
            resolution = %job.background.resolution,
            "encoding"
        );

        let mut sink = FfmpegSink::new(&partial, job.encoder.clone());
        {
            let mut frames = job.background.open_frames(resources);
            Self::compose_frames(
                job.timeline,
                &mut frames,
                &mut sink,
                job.background.fps,
                frame_count,
                job.caption_layout,
                Some(AudioInputConfig {
                    path: audio_path.clone(),
                    sample_rate: MIX_SAMPLE_RATE,
                    channels: 2,
                }),
            )?;
        }

        std::fs::rename(&partial, &job.output_path).map_err(|e| {
            NarrationError::render(format!(
                "move '{}' to '{}': {e}",
                partial.display(),
                job.output_path.display()
            ))
        })?;
        for id in created_dirs {
            resources.dismiss(id);
        }
        tracing::info!(output = %job.output_path.display(), "video written");
        Ok(job.output_path)
    }
}

#[cfg(test)]
#[path = "../tests/unit/mux.rs"]
mod tests;

//! Contiguous narration timeline built from measured audio durations.

use crate::caption::render::CaptionImage;
use crate::foundation::error::{NarrationError, NarrationResult};
use crate::text::segment::Segment;
use crate::tts::synth::SynthesizedAudio;

/// One segment's slot on the output timeline.
#[derive(Clone, Debug)]
pub struct TimelineEntry {
    /// Segment index; equals the entry's position.
    pub segment_index: usize,
    /// Start time in seconds.
    pub start_secs: f64,
    /// Length in seconds (the audio duration).
    pub duration_secs: f64,
    /// Narration audio played over the slot.
    pub audio: SynthesizedAudio,
    /// Caption shown over the slot.
    pub caption: CaptionImage,
}

impl TimelineEntry {
    /// Exclusive end time.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// Whether `t` falls in `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs()
    }
}

/// Ordered, gap-free sequence of entries.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    /// Entries in segment order.
    pub entries: Vec<TimelineEntry>,
    /// Sum of every entry duration.
    pub total_duration_secs: f64,
}

impl Timeline {
    /// Accumulate entries: entry `i` starts at the sum of durations before it.
    ///
    /// Counts must match, and audio and caption `i` must both belong to segment `i`; anything
    /// else is an invariant violation, as is a non-positive or non-finite duration.
    pub fn build(
        segments: &[Segment],
        audios: Vec<SynthesizedAudio>,
        captions: Vec<CaptionImage>,
    ) -> NarrationResult<Self> {
        if segments.len() != audios.len() || segments.len() != captions.len() {
            return Err(NarrationError::invariant(format!(
                "timeline inputs disagree: {} segments, {} audios, {} captions",
                segments.len(),
                audios.len(),
                captions.len()
            )));
        }

        let mut entries = Vec::with_capacity(segments.len());
        let mut cursor = 0.0f64;
        for ((seg, audio), caption) in segments.iter().zip(audios).zip(captions) {
            if audio.segment_index != seg.index || caption.segment_index != seg.index {
                return Err(NarrationError::invariant(format!(
                    "segment {} paired with audio {} and caption {}",
                    seg.index, audio.segment_index, caption.segment_index
                )));
            }
            let d = audio.duration_secs;
            if !d.is_finite() || d <= 0.0 {
                return Err(NarrationError::invariant(format!(
                    "segment {} has invalid duration {d}",
                    seg.index
                )));
            }
            entries.push(TimelineEntry {
                segment_index: seg.index,
                start_secs: cursor,
                duration_secs: d,
                audio,
                caption,
            });
            cursor += d;
        }

        Ok(Self {
            entries,
            total_duration_secs: cursor,
        })
    }

    /// Entry active at time `t`, if any.
    pub fn entry_at(&self, t: f64) -> Option<&TimelineEntry> {
        let i = self.entries.partition_point(|e| e.start_secs <= t);
        let e = self.entries.get(i.checked_sub(1)?)?;
        e.contains(t).then_some(e)
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/unit/timeline.rs"]
mod tests;

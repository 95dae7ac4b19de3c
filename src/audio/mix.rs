//! Narration mixdown.
//!
//! Segments are placed at their timeline offsets, summed and clamped to `[-1, 1]`.

use std::path::Path;

use crate::assets::media::AudioPcm;
use crate::foundation::error::{NarrationError, NarrationResult};

/// One narration clip placed on the output timeline.
#[derive(Clone, Copy, Debug)]
pub struct MixInput<'a> {
    /// Timeline position of the clip's first sample.
    pub start_secs: f64,
    /// Decoded clip.
    pub pcm: &'a AudioPcm,
}

/// Mix clips into one interleaved stereo buffer `total_secs` long at `sample_rate`.
///
/// Each clip starts at sample `round(start_secs * sample_rate)`. Sources at another rate are
/// linearly resampled, mono sources are duplicated to both channels, and anything past the end
/// of the buffer is dropped. The result is clamped to `[-1, 1]`.
pub fn mix_narration(inputs: &[MixInput<'_>], total_secs: f64, sample_rate: u32) -> Vec<f32> {
    let total_frames = if total_secs.is_finite() && total_secs > 0.0 {
        (total_secs * f64::from(sample_rate)).round() as usize
    } else {
        0
    };
    let mut out = vec![0.0f32; total_frames * 2];

    for input in inputs {
        mix_clip(&mut out, input, sample_rate);
    }
    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

fn mix_clip(out: &mut [f32], input: &MixInput<'_>, sample_rate: u32) {
    let pcm = input.pcm;
    let channels = usize::from(pcm.channels);
    let src_frames = pcm.frames();
    if src_frames == 0 || pcm.sample_rate == 0 || !input.start_secs.is_finite() {
        return;
    }

    let out_frames = out.len() / 2;
    let start = (input.start_secs.max(0.0) * f64::from(sample_rate)).round() as usize;
    let ratio = f64::from(pcm.sample_rate) / f64::from(sample_rate);
    let len = ((src_frames as f64) / ratio).round() as usize;
    let src = &pcm.interleaved_f32;

    for rel in 0..len {
        let dst = start + rel;
        if dst >= out_frames {
            break;
        }
        let pos = rel as f64 * ratio;
        let f0 = (pos.floor() as usize).min(src_frames - 1);
        let f1 = (f0 + 1).min(src_frames - 1);
        let frac = (pos - f0 as f64) as f32;

        let (l, r) = if channels == 1 {
            let v = src[f0] + (src[f1] - src[f0]) * frac;
            (v, v)
        } else {
            let (i0, i1) = (f0 * channels, f1 * channels);
            (
                src[i0] + (src[i1] - src[i0]) * frac,
                src[i0 + 1] + (src[i1 + 1] - src[i0 + 1]) * frac,
            )
        };
        out[dst * 2] += l;
        out[dst * 2 + 1] += r;
    }
}

/// Write interleaved `f32` samples as raw little-endian `.f32le`.
pub fn write_f32le(samples_interleaved: &[f32], out_path: &Path) -> NarrationResult<()> {
    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        NarrationError::render(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;

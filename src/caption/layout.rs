//! Caption geometry, independent of any font or rasterizer.
//!
//! Given measured line advances and font vertical metrics, [`plan_caption`] decides the image
//! size, where each line's baseline starts, and the translucent box behind the text block.

use crate::config::{CaptionLayout, CaptionStyle};

/// Vertical font metrics at the caption font size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontVMetrics {
    /// Distance from baseline to the top of the tallest glyphs (positive).
    pub ascent: f32,
    /// Distance from baseline to the bottom of descenders (positive).
    pub descent: f32,
}

/// Origin of one rendered line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePlacement {
    /// Left edge of the line's first glyph.
    pub x: f32,
    /// Baseline y.
    pub baseline: f32,
}

/// Result of caption planning, in image pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionGeometry {
    /// Image width.
    pub width: u32,
    /// Image height; at least the height hint, more when the text block needs it.
    pub height: u32,
    /// Background box covering every line, clamped to the image.
    pub text_box: kurbo::Rect,
    /// One placement per line, top to bottom.
    pub lines: Vec<LinePlacement>,
}

/// Maximum line width used for wrapping at a given image width.
pub fn wrap_width(image_width: u32, style: &CaptionStyle) -> f32 {
    (image_width as f32 - style.wrap_margin_px).max(1.0)
}

/// Lay out `line_advances.len()` lines inside an image `image_width` pixels wide and at least
/// `height_hint` pixels tall.
///
/// Lines are centered horizontally and stacked at a fixed `line_height_px`; the block is
/// centered vertically for [`CaptionLayout::CenteredFrame`] or sits `bottom_margin_px` above the
/// image bottom for [`CaptionLayout::BottomAnchored`].
pub fn plan_caption(
    line_advances: &[f32],
    metrics: FontVMetrics,
    image_width: u32,
    height_hint: u32,
    style: &CaptionStyle,
    layout: CaptionLayout,
) -> CaptionGeometry {
    let w = image_width as f32;
    let pad = style.box_padding_px;
    let lh = style.line_height_px;
    let block_h = lh * line_advances.len() as f32;

    let needed = match layout {
        CaptionLayout::CenteredFrame => block_h + 2.0 * pad,
        CaptionLayout::BottomAnchored => block_h + 2.0 * pad + style.bottom_margin_px,
    };
    let height = height_hint.max(1).max(needed.ceil() as u32);
    let h = height as f32;

    let block_top = match layout {
        CaptionLayout::CenteredFrame => (h - block_h) / 2.0,
        CaptionLayout::BottomAnchored => h - style.bottom_margin_px - block_h,
    };

    // Glyph box centered inside each line slot.
    let glyph_h = metrics.ascent + metrics.descent;
    let slot_offset = (lh - glyph_h) / 2.0 + metrics.ascent;

    let lines = line_advances
        .iter()
        .enumerate()
        .map(|(i, &adv)| LinePlacement {
            x: ((w - adv) / 2.0).max(0.0),
            baseline: block_top + i as f32 * lh + slot_offset,
        })
        .collect::<Vec<_>>();

    let widest = line_advances.iter().copied().fold(0.0f32, f32::max);
    let text_box = if line_advances.is_empty() {
        kurbo::Rect::ZERO
    } else {
        let x0 = (w - widest) / 2.0 - pad;
        let y0 = block_top - pad;
        kurbo::Rect::new(
            f64::from(x0.max(0.0)),
            f64::from(y0.max(0.0)),
            f64::from((x0 + widest + 2.0 * pad).min(w)),
            f64::from((y0 + block_h + 2.0 * pad).min(h)),
        )
    };

    CaptionGeometry {
        width: image_width,
        height,
        text_box,
        lines,
    }
}

/// Top-left position of a caption image on the output frame.
///
/// Both modes center horizontally; centered captions sit at the vertical center and
/// bottom-anchored captions sit flush with the frame bottom.
pub fn placement_on_frame(
    caption_w: u32,
    caption_h: u32,
    frame_w: u32,
    frame_h: u32,
    layout: CaptionLayout,
) -> (i64, i64) {
    let x = (i64::from(frame_w) - i64::from(caption_w)) / 2;
    let y = match layout {
        CaptionLayout::CenteredFrame => (i64::from(frame_h) - i64::from(caption_h)) / 2,
        CaptionLayout::BottomAnchored => i64::from(frame_h) - i64::from(caption_h),
    };
    (x, y)
}

/// Caption image width for a layout mode.
pub fn caption_width(frame_w: u32, source_w: u32, layout: CaptionLayout) -> u32 {
    match layout {
        CaptionLayout::CenteredFrame => frame_w,
        CaptionLayout::BottomAnchored => source_w.min(frame_w).max(1),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/caption/layout.rs"]
mod tests;

//! Caption rasterization with parley and vello_cpu.

use std::path::Path;

use crate::caption::font::{CaptionFont, load_caption_font};
use crate::caption::layout::{FontVMetrics, plan_caption, wrap_width};
use crate::config::{CaptionLayout, CaptionStyle};
use crate::foundation::error::{NarrationError, NarrationResult};
use crate::foundation::math::unpremul_u8;

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct CaptionBrush {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// Rasterized caption for one segment, premultiplied RGBA8, transparent outside the box.
#[derive(Clone, Debug)]
pub struct CaptionImage {
    /// Segment this caption belongs to.
    pub segment_index: usize,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` premultiplied bytes, row-major.
    pub rgba8_premul: Vec<u8>,
}

impl CaptionImage {
    /// Straight-alpha copy of the pixels.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3];
            px[0] = unpremul_u8(px[0], a);
            px[1] = unpremul_u8(px[1], a);
            px[2] = unpremul_u8(px[2], a);
        }
        out
    }

    /// Alpha of the pixel at `(x, y)`; zero outside the image.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4 + 3;
        self.rgba8_premul[i]
    }

    /// Write a straight-alpha PNG.
    pub fn save_png(&self, path: &Path) -> NarrationResult<()> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_straight_rgba8())
            .ok_or_else(|| NarrationError::render("caption buffer size mismatch"))?;
        img.save(path).map_err(|e| {
            NarrationError::render(format!("write caption png '{}': {e}", path.display()))
        })
    }
}

/// Shapes, wraps and rasterizes caption text with one font and style.
pub struct CaptionRenderer {
    style: CaptionStyle,
    font: CaptionFont,
    font_data: vello_cpu::peniko::FontData,
    family_name: String,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<CaptionBrush>,
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for CaptionRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionRenderer")
            .field("font", &self.font)
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl CaptionRenderer {
    /// Resolve the style's font and build a renderer.
    pub fn from_style(style: CaptionStyle) -> NarrationResult<Self> {
        let font = load_caption_font(&style)?;
        Self::new(style, font)
    }

    /// Build a renderer for an already loaded font.
    pub fn new(style: CaptionStyle, font: CaptionFont) -> NarrationResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            NarrationError::config(format!("no font families in '{}'", font.source))
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| {
                NarrationError::config(format!("font family in '{}' has no name", font.source))
            })?
            .to_string();

        let font_data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
            font.index,
        );

        tracing::debug!(source = %font.source, family = %family_name, "caption font loaded");

        Ok(Self {
            style,
            font,
            font_data,
            family_name,
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            ctx: None,
        })
    }

    /// Style in use.
    pub fn style(&self) -> &CaptionStyle {
        &self.style
    }

    /// Render `text` into a caption `width` pixels wide and at least `height_hint` tall.
    pub fn render(
        &mut self,
        segment_index: usize,
        text: &str,
        width: u32,
        height_hint: u32,
        layout_mode: CaptionLayout,
    ) -> NarrationResult<CaptionImage> {
        if width == 0 {
            return Err(NarrationError::render("caption width must be > 0"));
        }
        let text = text.trim();
        let style = self.style.clone();

        let layout = self.shape(text, wrap_width(width, &style));

        let lines = layout.lines().collect::<Vec<_>>();
        let advances = lines
            .iter()
            .map(|l| {
                let m = l.metrics();
                (m.advance - m.trailing_whitespace).max(0.0)
            })
            .collect::<Vec<_>>();
        let vmetrics = lines
            .first()
            .map(|l| FontVMetrics {
                ascent: l.metrics().ascent,
                descent: l.metrics().descent,
            })
            .unwrap_or(FontVMetrics {
                ascent: style.font_size_px * 0.8,
                descent: style.font_size_px * 0.2,
            });

        let geom = plan_caption(&advances, vmetrics, width, height_hint, &style, layout_mode);
        let (w16, h16) = match (u16::try_from(geom.width), u16::try_from(geom.height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(NarrationError::render(format!(
                    "caption {}x{} exceeds rasterizer limits",
                    geom.width, geom.height
                )));
            }
        };

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w16 && ctx.height() == h16 => ctx,
            _ => vello_cpu::RenderContext::new(w16, h16),
        };
        ctx.reset();

        if !lines.is_empty() {
            let b = style.box_rgba;
            let r = geom.text_box;
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1));
        }

        for (line, place) in lines.iter().zip(&geom.lines) {
            let m = line.metrics();
            let dx = f64::from(place.x - m.offset);
            let dy = f64::from(place.baseline - m.baseline);
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((dx, dy)));

            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font_data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        Ok(CaptionImage {
            segment_index,
            width: geom.width,
            height: geom.height,
            rgba8_premul: pixmap.data_as_u8_slice().to_vec(),
        })
    }

    fn shape(&mut self, text: &str, max_width: f32) -> parley::Layout<CaptionBrush> {
        let c = self.style.text_rgba;
        let brush = CaptionBrush {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(
            self.style.font_size_px,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<CaptionBrush> = builder.build(text);
        layout.break_all_lines(Some(max_width));
        layout.align(
            Some(max_width),
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        layout
    }
}

#[cfg(test)]
#[path = "../../tests/unit/caption/render.rs"]
mod tests;

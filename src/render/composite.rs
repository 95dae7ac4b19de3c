//! Premultiplied source-over blending.

use crate::foundation::error::{NarrationError, NarrationResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::frame::FrameRGBA;

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }
    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Blend a premultiplied `src_w x src_h` image over `dst` with its top-left at `(x, y)`.
///
/// Parts falling outside `dst` are clipped.
pub fn blit_over(
    dst: &mut FrameRGBA,
    src: &[u8],
    src_w: u32,
    src_h: u32,
    x: i64,
    y: i64,
) -> NarrationResult<()> {
    if src.len() != src_w as usize * src_h as usize * 4 {
        return Err(NarrationError::render(
            "blit source buffer does not match its dimensions",
        ));
    }

    let dw = i64::from(dst.width);
    let dh = i64::from(dst.height);
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src_w)).min(dw);
    let y1 = (y + i64::from(src_h)).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let run = (x1 - x0) as usize * 4;
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        let sx = (x0 - x) as usize;
        let s_off = (sy * src_w as usize + sx) * 4;
        let d_off = (dy as usize * dst.width as usize + x0 as usize) * 4;
        let s_row = &src[s_off..s_off + run];
        let d_row = &mut dst.data[d_off..d_off + run];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            if s[3] == 0 {
                continue;
            }
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;

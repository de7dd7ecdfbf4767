use image::{Rgb, Rgba};

use crate::foundation::{
    core::{Frame, RgbaFrame},
    math::mul_div255,
};

/// Straight-alpha `src` over opaque `dst`, with `src` alpha scaled by `opacity`.
pub fn over(dst: Rgb<u8>, src: Rgba<u8>, opacity: f64) -> Rgb<u8> {
    let op = (opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
    let a = mul_div255(u16::from(src[3]), op);
    if a == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(a);
    let mut out = [0u8; 3];
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), u16::from(a));
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    Rgb(out)
}

/// Overlapping region of an overlay placed with its top-left at `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clip {
    pub dst_x: u32,
    pub dst_y: u32,
    pub src_x: u32,
    pub src_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clip a `lw x lh` overlay at `(x, y)` against a `fw x fh` frame. `None` when they do not
/// overlap.
pub fn clip(frame: (u32, u32), overlay: (u32, u32), x: i64, y: i64) -> Option<Clip> {
    let (fw, fh) = (i64::from(frame.0), i64::from(frame.1));
    let (lw, lh) = (i64::from(overlay.0), i64::from(overlay.1));
    let (x2, y2) = (x + lw, y + lh);
    if x >= fw || y >= fh || x2 <= 0 || y2 <= 0 {
        return None;
    }
    let (cx1, cy1) = (x.max(0), y.max(0));
    let (cx2, cy2) = (x2.min(fw), y2.min(fh));
    Some(Clip {
        dst_x: cx1 as u32,
        dst_y: cy1 as u32,
        src_x: (cx1 - x) as u32,
        src_y: (cy1 - y) as u32,
        width: (cx2 - cx1) as u32,
        height: (cy2 - cy1) as u32,
    })
}

/// Blend `overlay` onto `frame` in place. Returns `false` if nothing was covered.
pub fn composite_at(frame: &mut Frame, overlay: &RgbaFrame, x: i64, y: i64, opacity: f64) -> bool {
    let Some(c) = clip(frame.dimensions(), overlay.dimensions(), x, y) else {
        return false;
    };
    for j in 0..c.height {
        for i in 0..c.width {
            let src = *overlay.get_pixel(c.src_x + i, c.src_y + j);
            let dst = frame.get_pixel_mut(c.dst_x + i, c.dst_y + j);
            *dst = over(*dst, src, opacity);
        }
    }
    true
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/composite.rs"]
mod tests;

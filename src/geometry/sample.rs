//! Sub-pixel resampling primitives shared by the viewport and layer compositing.
//!
//! Coordinates are continuous: pixel `(i, j)` covers `[i, i+1) x [j, j+1)` and its center sits
//! at `(i + 0.5, j + 0.5)`. A box of width `w` centered at `cx` therefore starts at `cx - w/2`,
//! which makes an integer-centered, even-sized extraction an exact copy.

use image::{ImageBuffer, Pixel};
use imageproc::geometric_transformations::{Interpolation, warp_into_with};

use crate::foundation::{
    core::{Affine, Point},
    math::saturate_u8,
};

/// Owned 8-bit image of any pixel layout.
pub type Image8<P> = ImageBuffer<P, Vec<u8>>;

/// Bilinear sample at index-space coordinates (pixel `k` sits at `k`); taps outside the source
/// clamp to the nearest edge pixel.
fn sample_replicate<P>(src: &Image8<P>, x: f64, y: f64) -> P
where
    P: Pixel<Subpixel = u8>,
{
    let channels = usize::from(P::CHANNEL_COUNT);
    let (w, h) = (i64::from(src.width()), i64::from(src.height()));
    let x0f = x.floor();
    let y0f = y.floor();
    let fx = x - x0f;
    let fy = y - y0f;
    let (x0, y0) = (x0f as i64, y0f as i64);

    let fetch = |ix: i64, iy: i64| -> P {
        *src.get_pixel(ix.clamp(0, w - 1) as u32, iy.clamp(0, h - 1) as u32)
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for c in 0..channels {
        let top = f64::from(p00.channels()[c]) * (1.0 - fx) + f64::from(p10.channels()[c]) * fx;
        let bottom =
            f64::from(p01.channels()[c]) * (1.0 - fx) + f64::from(p11.channels()[c]) * fx;
        out[c] = saturate_u8(top * (1.0 - fy) + bottom * fy);
    }
    *P::from_slice(&out[..channels])
}

/// Extract a `width x height` box centered at `center` with bilinear sampling and replicated
/// borders. The center is never rounded.
pub fn rect_sub_pix<P>(src: &Image8<P>, width: u32, height: u32, center: Point) -> Image8<P>
where
    P: Pixel<Subpixel = u8>,
{
    let width = width.max(1);
    let height = height.max(1);
    if src.width() == 0 || src.height() == 0 {
        return ImageBuffer::new(width, height);
    }
    let ox = center.x - f64::from(width) / 2.0;
    let oy = center.y - f64::from(height) / 2.0;
    ImageBuffer::from_fn(width, height, |i, j| {
        sample_replicate(src, ox + f64::from(i), oy + f64::from(j))
    })
}

/// Rotation by `angle_deg` about `center`; positive angles turn image content
/// counter-clockwise on screen (y axis pointing down).
pub fn rotation_about(center: Point, angle_deg: f64) -> Affine {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let tx = (1.0 - cos) * center.x - sin * center.y;
    let ty = sin * center.x + (1.0 - cos) * center.y;
    Affine::new([cos, -sin, sin, cos, tx, ty])
}

/// Warp `src` into a `width x height` canvas so that `dst(transform * p) = src(p)`, with
/// bilinear sampling. Samples near or past the source edge blend toward `fill`.
pub fn warp_affine<P>(
    src: &Image8<P>,
    transform: Affine,
    width: u32,
    height: u32,
    fill: P,
) -> Image8<P>
where
    P: Pixel<Subpixel = u8> + Send + Sync,
{
    let width = width.max(1);
    let height = height.max(1);
    let mut out = ImageBuffer::from_pixel(width, height, fill);
    if src.width() == 0 || src.height() == 0 || transform.determinant().abs() < 1e-12 {
        return out;
    }

    // imageproc only blends when all four taps are inside the image, so a one-pixel `fill`
    // ring keeps the outermost source pixels and fades them into `fill`.
    let mut padded = ImageBuffer::from_pixel(src.width() + 2, src.height() + 2, fill);
    image::imageops::replace(&mut padded, src, 1, 1);

    // Output index (i, j) is centered at (i + 0.5, j + 0.5); the ring shifts source indices by 1.
    let inv = transform.inverse();
    let pre_image = move |i: f32, j: f32| {
        let q = inv * Point::new(f64::from(i) + 0.5, f64::from(j) + 0.5);
        (snap_to_grid(q.x + 0.5), snap_to_grid(q.y + 0.5))
    };
    warp_into_with(&padded, pre_image, Interpolation::Bilinear, fill, &mut out);
    out
}

/// Trig noise below 1e-6 px lands on the integer grid, keeping quarter turns lossless.
fn snap_to_grid(v: f64) -> f32 {
    let r = v.round();
    if (v - r).abs() < 1e-6 { r as f32 } else { v as f32 }
}

/// Swap rows and columns.
pub fn transpose<P>(src: &Image8<P>) -> Image8<P>
where
    P: Pixel<Subpixel = u8>,
{
    ImageBuffer::from_fn(src.height(), src.width(), |x, y| *src.get_pixel(y, x))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/sample.rs"]
mod tests;

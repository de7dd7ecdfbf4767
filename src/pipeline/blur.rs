//! Gaussian blur with a fixed odd `ksize x ksize` kernel and a sigma that defaults from it.
//!
//! Channels are filtered as separate `f32` planes through `imageproc` and rounded once at the
//! end, so flat regions come back unchanged.

use image::{ImageBuffer, Luma, Rgb};
use imageproc::filter::separable_filter_equal;

use crate::foundation::{
    core::Frame,
    error::{ViewfxError, ViewfxResult},
    math::saturate_u8,
};

type Plane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Sigma implied by an odd kernel size when none is given.
pub fn sigma_for_ksize(ksize: u32) -> f64 {
    0.3 * ((f64::from(ksize) - 1.0) * 0.5 - 1.0) + 0.8
}

/// Blur an RGB8 frame with a separable `ksize`-tap Gaussian. Edges replicate the border pixel.
pub fn gaussian_blur(frame: &Frame, ksize: u32, sigma: f64) -> ViewfxResult<Frame> {
    if ksize % 2 == 0 {
        return Err(ViewfxError::validation(format!(
            "gaussian kernel size must be odd, got {ksize}"
        )));
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ViewfxError::validation(format!("blur sigma must be > 0, got {sigma}")));
    }
    let (w, h) = frame.dimensions();
    if ksize == 1 || w == 0 || h == 0 {
        return Ok(frame.clone());
    }

    let kernel = gaussian_taps(ksize, sigma);
    let planes: [Plane; 3] = std::array::from_fn(|c| {
        let plane = Plane::from_fn(w, h, |x, y| Luma([f32::from(frame.get_pixel(x, y)[c])]));
        separable_filter_equal(&plane, &kernel)
    });
    Ok(Frame::from_fn(w, h, |x, y| {
        Rgb(std::array::from_fn(|c| {
            saturate_u8(f64::from(planes[c].get_pixel(x, y)[0]))
        }))
    }))
}

/// `ksize` normalized taps centered on the middle one.
fn gaussian_taps(ksize: u32, sigma: f64) -> Vec<f32> {
    let radius = f64::from(ksize / 2);
    let denom = 2.0 * sigma * sigma;
    let taps: Vec<f64> = (0..ksize)
        .map(|i| {
            let x = f64::from(i) - radius;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = taps.iter().sum();
    taps.iter().map(|t| (t / sum) as f32).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/blur.rs"]
mod tests;

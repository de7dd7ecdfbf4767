pub use kurbo::{Affine, Point, Rect, Vec2};

/// A frame flowing through the pipeline: tightly packed 3-channel RGB8.
pub type Frame = image::RgbImage;

/// Overlay images keep their alpha channel.
pub type RgbaFrame = image::RgbaImage;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Width/height of the axis-aligned box that encloses a `w x h` rectangle rotated by
/// `angle_deg`: `rw = |w cos| + |h sin|`, `rh = |w sin| + |h cos|`.
pub fn rotated_extent(w: f64, h: f64, angle_deg: f64) -> (f64, f64) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let rw = (w * cos).abs() + (h * sin).abs();
    let rh = (w * sin).abs() + (h * cos).abs();
    (rw, rh)
}

/// Whole-pixel buffer size for a fractional extent, never below 1.
///
/// Trig noise (e.g. `cos(90deg) = 6e-17`) must not add a spurious column, so values within
/// `1e-6` of an integer snap down to it before rounding up.
pub fn extent_px(v: f64) -> u32 {
    if !v.is_finite() || v <= 1.0 {
        return 1;
    }
    let snapped = (v - 1e-6).ceil();
    snapped.clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs.
    if a >= 360.0 { 0.0 } else { a }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

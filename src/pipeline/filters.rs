//! Built-in per-frame filter steps.

use image::{Rgb, imageops::FilterType};

use crate::{
    foundation::{
        core::Frame,
        error::{ViewfxError, ViewfxResult},
        math::saturate_u8,
    },
    params::value::ParamValue,
    pipeline::{
        blur::{gaussian_blur, sigma_for_ksize},
        step::{Step, StepCore},
    },
};

macro_rules! step_core {
    () => {
        fn core(&self) -> &StepCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut StepCore {
            &mut self.core
        }
    };
}

/// Rec.601 luma.
pub fn luma(px: &Rgb<u8>) -> u8 {
    saturate_u8(0.299 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.114 * f64::from(px[2]))
}

fn color_param(core: &StepCore, name: &str) -> ViewfxResult<Rgb<u8>> {
    match core.params().get_list(name) {
        Some([r, g, b]) => Ok(Rgb([saturate_u8(*r), saturate_u8(*g), saturate_u8(*b)])),
        Some(other) => Err(ViewfxError::validation(format!(
            "{}: '{name}' must be [r, g, b], got {} values",
            core.type_name(),
            other.len()
        ))),
        None => Err(ViewfxError::validation(format!(
            "{}: '{name}' must be a list",
            core.type_name()
        ))),
    }
}

/// Gaussian blur with an odd `ksize` (default 5).
pub struct BlurStep {
    core: StepCore,
}

impl BlurStep {
    pub fn build(mut core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        core.default_param("ksize", 5);
        Ok(Box::new(Self { core }))
    }
}

impl Step for BlurStep {
    step_core!();

    fn apply(&mut self, frame: Frame) -> ViewfxResult<Frame> {
        let k = self.core.i64_param("ksize", 5);
        if k < 1 || k % 2 == 0 {
            return Err(ViewfxError::validation(format!(
                "Blur: ksize must be a positive odd number, got {k}"
            )));
        }
        let k = u32::try_from(k).map_err(|_| ViewfxError::validation("Blur: ksize too large"))?;
        gaussian_blur(&frame, k, sigma_for_ksize(k))
    }
}

/// Gaussian blur that rounds even kernel sizes up to the next odd one.
pub struct GaussianBlurStep {
    core: StepCore,
}

impl GaussianBlurStep {
    pub fn build(mut core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        core.default_param("ksize", 5);
        core.default_param("sigma", 0.0);
        Ok(Box::new(Self { core }))
    }
}

impl Step for GaussianBlurStep {
    step_core!();

    fn apply(&mut self, frame: Frame) -> ViewfxResult<Frame> {
        let mut k = self.core.i64_param("ksize", 5).clamp(1, 1 << 15) as u32;
        if k % 2 == 0 {
            k += 1;
        }
        let sigma = self.core.f64_param("sigma", 0.0);
        let sigma = if sigma > 0.0 { sigma } else { sigma_for_ksize(k) };
        gaussian_blur(&frame, k, sigma)
    }
}

/// Binary threshold on luma; output stays three-channel.
pub struct ThresholdStep {
    core: StepCore,
}

impl ThresholdStep {
    pub fn build(mut core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        core.default_param("thresh", 128);
        core.default_param("max_val", 255);
        Ok(Box::new(Self { core }))
    }
}

impl Step for ThresholdStep {
    step_core!();

    fn apply(&mut self, mut frame: Frame) -> ViewfxResult<Frame> {
        let thresh = self.core.f64_param("thresh", 128.0);
        let hi = saturate_u8(self.core.f64_param("max_val", 255.0));
        for px in frame.pixels_mut() {
            let v = if f64::from(luma(px)) > thresh { hi } else { 0 };
            *px = Rgb([v, v, v]);
        }
        Ok(frame)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Colormap {
    Jet,
    Hot,
    Bone,
    Gray,
    Cool,
    Autumn,
    Winter,
    Spring,
    Summer,
}

impl Colormap {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "JET" => Self::Jet,
            "HOT" => Self::Hot,
            "BONE" => Self::Bone,
            "GRAY" | "GREY" => Self::Gray,
            "COOL" => Self::Cool,
            "AUTUMN" => Self::Autumn,
            "WINTER" => Self::Winter,
            "SPRING" => Self::Spring,
            "SUMMER" => Self::Summer,
            _ => return None,
        })
    }

    /// RGB in `[0, 1]` for intensity `t` in `[0, 1]`.
    fn eval(self, t: f64) -> [f64; 3] {
        let c = |v: f64| v.clamp(0.0, 1.0);
        match self {
            Self::Jet => [
                c(1.5 - (4.0 * t - 3.0).abs()),
                c(1.5 - (4.0 * t - 2.0).abs()),
                c(1.5 - (4.0 * t - 1.0).abs()),
            ],
            Self::Hot => [c(3.0 * t), c(3.0 * t - 1.0), c(3.0 * t - 2.0)],
            Self::Bone => {
                let [hr, hg, hb] = Self::Hot.eval(t);
                [
                    (7.0 * t + hb) / 8.0,
                    (7.0 * t + hg) / 8.0,
                    (7.0 * t + hr) / 8.0,
                ]
            }
            Self::Gray => [t, t, t],
            Self::Cool => [t, 1.0 - t, 1.0],
            Self::Autumn => [1.0, t, 0.0],
            Self::Winter => [0.0, t, 1.0 - t / 2.0],
            Self::Spring => [1.0, t, 1.0 - t],
            Self::Summer => [t, 0.5 + t / 2.0, 0.4],
        }
    }

    pub fn lut(self) -> Vec<Rgb<u8>> {
        (0..=255u8)
            .map(|i| {
                let [r, g, b] = self.eval(f64::from(i) / 255.0);
                Rgb([saturate_u8(r * 255.0), saturate_u8(g * 255.0), saturate_u8(b * 255.0)])
            })
            .collect()
    }
}

/// Map luma through a named colormap (`colormap`, default `JET`).
pub struct ColorizeStep {
    core: StepCore,
    name: String,
    lut: Vec<Rgb<u8>>,
}

impl ColorizeStep {
    pub fn build(mut core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        core.default_param("colormap", "JET");
        let mut step = Self {
            core,
            name: String::new(),
            lut: Vec::new(),
        };
        step.refresh_lut();
        Ok(Box::new(step))
    }

    fn refresh_lut(&mut self) {
        let name = self.core.params().get_str("colormap").unwrap_or("JET").to_owned();
        if name == self.name && !self.lut.is_empty() {
            return;
        }
        let map = Colormap::from_name(&name).unwrap_or_else(|| {
            tracing::warn!(colormap = %name, "unknown colormap, using JET");
            Colormap::Jet
        });
        self.lut = map.lut();
        self.name = name;
    }
}

impl Step for ColorizeStep {
    step_core!();

    fn apply(&mut self, mut frame: Frame) -> ViewfxResult<Frame> {
        self.refresh_lut();
        for px in frame.pixels_mut() {
            *px = self.lut[usize::from(luma(px))];
        }
        Ok(frame)
    }
}

/// Resize to `target`, letterboxing with `pad` when keeping the aspect ratio.
/// The result is always exactly `target`.
pub fn resize_image(frame: &Frame, target: (u32, u32), keep_aspect: bool, pad: Rgb<u8>) -> Frame {
    let (tw, th) = (target.0.max(1), target.1.max(1));
    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return Frame::from_pixel(tw, th, pad);
    }
    if !keep_aspect {
        return image::imageops::resize(frame, tw, th, FilterType::Triangle);
    }
    let scale = (f64::from(tw) / f64::from(w)).min(f64::from(th) / f64::from(h));
    let nw = ((f64::from(w) * scale) as u32).clamp(1, tw);
    let nh = ((f64::from(h) * scale) as u32).clamp(1, th);
    let resized = image::imageops::resize(frame, nw, nh, FilterType::Triangle);
    let mut out = Frame::from_pixel(tw, th, pad);
    image::imageops::replace(
        &mut out,
        &resized,
        i64::from((tw - nw) / 2),
        i64::from((th - nh) / 2),
    );
    out
}

fn size_param(core: &StepCore, name: &str) -> ViewfxResult<(u32, u32)> {
    match core.params().get_list(name) {
        Some([w, h]) if w.is_finite() && h.is_finite() => {
            Ok((w.max(1.0) as u32, h.max(1.0) as u32))
        }
        _ => Err(ViewfxError::validation(format!(
            "{}: '{name}' must be [width, height]",
            core.type_name()
        ))),
    }
}

pub struct ResizeStep {
    core: StepCore,
}

impl ResizeStep {
    pub fn build(mut core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        core.default_param("size", vec![640.0, 480.0]);
        core.default_param("keep_aspect", true);
        core.default_param("pad_color", vec![0.0, 0.0, 0.0]);
        core.default_param("output_file", ParamValue::Null);
        size_param(&core, "size")?;
        color_param(&core, "pad_color")?;
        Ok(Box::new(Self { core }))
    }
}

impl Step for ResizeStep {
    step_core!();

    fn apply(&mut self, frame: Frame) -> ViewfxResult<Frame> {
        let size = size_param(&self.core, "size")?;
        let pad = color_param(&self.core, "pad_color")?;
        let keep = self.core.bool_param("keep_aspect", true);
        Ok(resize_image(&frame, size, keep, pad))
    }
}

/// Repeat a downscaled copy `n x n` times within the original frame size.
pub struct TileStep {
    core: StepCore,
}

impl TileStep {
    pub fn build(mut core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        core.default_param("n", 2);
        Ok(Box::new(Self { core }))
    }
}

impl Step for TileStep {
    step_core!();

    fn apply(&mut self, frame: Frame) -> ViewfxResult<Frame> {
        let n = self.core.i64_param("n", 2);
        if n < 1 {
            return Err(ViewfxError::validation(format!("Tile: n must be >= 1, got {n}")));
        }
        if n == 1 {
            return Ok(frame);
        }
        let n = u32::try_from(n).unwrap_or(u32::MAX);
        let (w, h) = frame.dimensions();
        let (tw, th) = ((w / n).max(1), (h / n).max(1));
        let tile = image::imageops::resize(&frame, tw, th, FilterType::Triangle);
        Ok(Frame::from_fn(w, h, |x, y| *tile.get_pixel(x % tw, y % th)))
    }
}

/// Constant-color frame of `size` pixels around the image.
pub struct BorderStep {
    core: StepCore,
}

impl BorderStep {
    pub fn build(mut core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        core.default_param("size", 10);
        core.default_param("color", vec![0.0, 0.0, 0.0]);
        color_param(&core, "color")?;
        Ok(Box::new(Self { core }))
    }
}

impl Step for BorderStep {
    step_core!();

    fn apply(&mut self, frame: Frame) -> ViewfxResult<Frame> {
        let size = self.core.i64_param("size", 10);
        let Ok(size) = u32::try_from(size) else {
            return Err(ViewfxError::validation(format!(
                "Border: size must be >= 0, got {size}"
            )));
        };
        if size == 0 {
            return Ok(frame);
        }
        let color = color_param(&self.core, "color")?;
        let (w, h) = frame.dimensions();
        let grown = |side: u32| size.checked_mul(2).and_then(|pad| side.checked_add(pad));
        let (Some(ow), Some(oh)) = (grown(w), grown(h)) else {
            return Err(ViewfxError::validation(format!(
                "Border: size {size} is too large for a {w}x{h} frame"
            )));
        };
        let mut out = Frame::from_pixel(ow, oh, color);
        image::imageops::replace(&mut out, &frame, i64::from(size), i64::from(size));
        Ok(out)
    }
}

/// `out = alpha * px + beta`, saturated.
pub struct BrightnessContrastStep {
    core: StepCore,
}

impl BrightnessContrastStep {
    pub fn build(mut core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        core.default_param("alpha", 1.0);
        core.default_param("beta", 0.0);
        Ok(Box::new(Self { core }))
    }
}

impl Step for BrightnessContrastStep {
    step_core!();

    fn apply(&mut self, mut frame: Frame) -> ViewfxResult<Frame> {
        let alpha = self.core.f64_param("alpha", 1.0);
        let beta = self.core.f64_param("beta", 0.0);
        for v in frame.iter_mut() {
            *v = saturate_u8(alpha * f64::from(*v) + beta);
        }
        Ok(frame)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Rgb,
    Bgr,
    Gray,
}

impl ColorSpace {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rgb" => Some(Self::Rgb),
            "bgr" => Some(Self::Bgr),
            "gray" | "grey" => Some(Self::Gray),
            _ => None,
        }
    }
}

/// Channel-order and grayscale conversions between `from` and `to`.
pub struct ColorConvertStep {
    core: StepCore,
    from: ColorSpace,
    to: ColorSpace,
}

impl ColorConvertStep {
    pub fn build(mut core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        core.default_param("from", "rgb");
        core.default_param("to", "gray");
        let from_name = core.params().get_str("from").unwrap_or_default();
        let to_name = core.params().get_str("to").unwrap_or_default();
        let (Some(from), Some(to)) = (ColorSpace::parse(from_name), ColorSpace::parse(to_name)) else {
            return Err(ViewfxError::validation(format!(
                "ColorConvert: unsupported conversion '{from_name}' -> '{to_name}'"
            )));
        };
        Ok(Box::new(Self { core, from, to }))
    }
}

impl Step for ColorConvertStep {
    step_core!();

    fn apply(&mut self, mut frame: Frame) -> ViewfxResult<Frame> {
        use ColorSpace::{Bgr, Gray, Rgb as RgbSpace};
        for px in frame.pixels_mut() {
            let [a, b, c] = px.0;
            *px = match (self.from, self.to) {
                (RgbSpace, Bgr) | (Bgr, RgbSpace) => Rgb([c, b, a]),
                (RgbSpace, Gray) => {
                    let v = luma(px);
                    Rgb([v, v, v])
                }
                (Bgr, Gray) => {
                    let v = luma(&Rgb([c, b, a]));
                    Rgb([v, v, v])
                }
                (Gray, _) => Rgb([a, a, a]),
                _ => *px,
            };
        }
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/filters.rs"]
mod tests;

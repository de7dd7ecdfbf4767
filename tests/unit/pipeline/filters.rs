use std::sync::Arc;

use super::*;
use crate::{params::store::ParamStore, pipeline::config::GlobalConfig};

fn core(name: &str, params: &[(&str, ParamValue)]) -> StepCore {
    let store: ParamStore = params.iter().cloned().collect();
    StepCore::new(name, Arc::new(GlobalConfig::default()), store)
}

fn gradient(w: u32, h: u32) -> Frame {
    Frame::from_fn(w, h, |x, y| Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 90]))
}

#[test]
fn tile_with_one_is_identity() {
    let mut step = TileStep::build(core("Tile", &[("n", ParamValue::Int(1))])).unwrap();
    let src = gradient(31, 17);
    assert_eq!(step.apply(src.clone()).unwrap(), src);
}

#[test]
fn tile_keeps_frame_size_and_repeats() {
    let mut step = TileStep::build(core("Tile", &[("n", ParamValue::Int(2))])).unwrap();
    let src = gradient(40, 20);
    let out = step.apply(src).unwrap();
    assert_eq!(out.dimensions(), (40, 20));
    assert_eq!(out.get_pixel(3, 4), out.get_pixel(23, 14));

    let mut bad = TileStep::build(core("Tile", &[("n", ParamValue::Int(0))])).unwrap();
    assert!(bad.apply(Frame::new(4, 4)).is_err());
}

#[test]
fn resize_keep_aspect_returns_exact_size_with_padding() {
    let src = Frame::from_pixel(200, 100, Rgb([255, 255, 255]));
    let out = resize_image(&src, (300, 300), true, Rgb([0, 0, 255]));
    assert_eq!(out.dimensions(), (300, 300));
    // Letterboxed: 300x150 image centered vertically.
    assert_eq!(out.get_pixel(150, 10), &Rgb([0, 0, 255]));
    assert_eq!(out.get_pixel(150, 290), &Rgb([0, 0, 255]));
    assert_eq!(out.get_pixel(150, 150), &Rgb([255, 255, 255]));

    for (w, h) in [(640, 480), (17, 3), (1, 1), (3, 1000)] {
        let out = resize_image(&gradient(123, 77), (w, h), true, Rgb([9, 9, 9]));
        assert_eq!(out.dimensions(), (w, h));
    }
}

#[test]
fn resize_step_uses_defaults() {
    let mut step = ResizeStep::build(core("Resize", &[])).unwrap();
    assert_eq!(step.params().get_list("size"), Some(&[640.0, 480.0][..]));
    let out = step.apply(gradient(64, 64)).unwrap();
    assert_eq!(out.dimensions(), (640, 480));

    let mut stretch = ResizeStep::build(core(
        "Resize",
        &[
            ("size", ParamValue::List(vec![10.0, 20.0])),
            ("keep_aspect", ParamValue::Bool(false)),
        ],
    ))
    .unwrap();
    assert_eq!(stretch.apply(gradient(64, 64)).unwrap().dimensions(), (10, 20));

    assert!(ResizeStep::build(core("Resize", &[("size", ParamValue::List(vec![1.0]))])).is_err());
}

#[test]
fn blur_rejects_even_kernel_at_apply() {
    let mut step = BlurStep::build(core("Blur", &[("ksize", ParamValue::Int(4))])).unwrap();
    assert!(step.apply(gradient(8, 8)).is_err());

    let mut gauss = GaussianBlurStep::build(core("GaussianBlur", &[("ksize", ParamValue::Int(4))])).unwrap();
    let flat = Frame::from_pixel(8, 8, Rgb([40, 50, 60]));
    assert_eq!(gauss.apply(flat.clone()).unwrap(), flat);
}

#[test]
fn threshold_is_binary_and_three_channel() {
    let mut step = ThresholdStep::build(core("Threshold", &[])).unwrap();
    let mut src = Frame::new(2, 1);
    src.put_pixel(0, 0, Rgb([200, 200, 200]));
    src.put_pixel(1, 0, Rgb([100, 100, 100]));
    let out = step.apply(src).unwrap();
    assert_eq!(out.get_pixel(0, 0), &Rgb([255, 255, 255]));
    assert_eq!(out.get_pixel(1, 0), &Rgb([0, 0, 0]));
}

#[test]
fn colorize_falls_back_to_jet() {
    let src = Frame::from_pixel(1, 1, Rgb([0, 0, 0]));
    let mut jet = ColorizeStep::build(core("Colorize", &[])).unwrap();
    let mut unknown =
        ColorizeStep::build(core("Colorize", &[("colormap", ParamValue::from("NOPE"))])).unwrap();
    let a = jet.apply(src.clone()).unwrap();
    let b = unknown.apply(src).unwrap();
    assert_eq!(a, b);
    // JET starts dark blue.
    assert_eq!(a.get_pixel(0, 0)[0], 0);
    assert!(a.get_pixel(0, 0)[2] > 100);

    let gray = Colormap::Gray.lut();
    assert_eq!(gray[77], Rgb([77, 77, 77]));
}

#[test]
fn border_grows_frame() {
    let mut step = BorderStep::build(core(
        "Border",
        &[("size", ParamValue::Int(3)), ("color", ParamValue::List(vec![255.0, 0.0, 0.0]))],
    ))
    .unwrap();
    let out = step.apply(Frame::new(4, 2)).unwrap();
    assert_eq!(out.dimensions(), (10, 8));
    assert_eq!(out.get_pixel(0, 0), &Rgb([255, 0, 0]));
    assert_eq!(out.get_pixel(3, 3), &Rgb([0, 0, 0]));
}

#[test]
fn oversized_border_is_rejected() {
    let mut step =
        BorderStep::build(core("Border", &[("size", ParamValue::Int(3_000_000_000))])).unwrap();
    let err = step.apply(Frame::new(4, 2)).unwrap_err();
    assert!(matches!(err, ViewfxError::Validation(_)));
    assert!(err.to_string().contains("too large"));
}

#[test]
fn brightness_contrast_saturates() {
    let mut step = BrightnessContrastStep::build(core(
        "BrightnessContrast",
        &[("alpha", ParamValue::Float(2.0)), ("beta", ParamValue::Float(10.0))],
    ))
    .unwrap();
    let out = step.apply(Frame::from_pixel(1, 1, Rgb([10, 100, 200]))).unwrap();
    assert_eq!(out.get_pixel(0, 0), &Rgb([30, 210, 255]));
}

#[test]
fn color_convert_pairs() {
    let src = Frame::from_pixel(1, 1, Rgb([10, 20, 30]));
    let mut swap = ColorConvertStep::build(core(
        "ColorConvert",
        &[("from", ParamValue::from("rgb")), ("to", ParamValue::from("bgr"))],
    ))
    .unwrap();
    assert_eq!(swap.apply(src.clone()).unwrap().get_pixel(0, 0), &Rgb([30, 20, 10]));

    let mut gray = ColorConvertStep::build(core("ColorConvert", &[])).unwrap();
    let g = *gray.apply(src).unwrap().get_pixel(0, 0);
    assert_eq!(g[0], g[1]);
    assert_eq!(g[1], g[2]);

    let err = ColorConvertStep::build(core(
        "ColorConvert",
        &[("from", ParamValue::from("rgb")), ("to", ParamValue::from("hsv"))],
    ));
    assert!(matches!(err, Err(ViewfxError::Validation(_))));
}

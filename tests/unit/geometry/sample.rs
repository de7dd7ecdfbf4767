use super::*;
use image::{Rgb, RgbImage, Rgba, RgbaImage};

fn gradient(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, ((x + y) % 256) as u8]))
}

#[test]
fn integer_centered_even_box_is_exact_crop() {
    let src = gradient(64, 48);
    let out = rect_sub_pix(&src, 20, 10, Point::new(30.0, 20.0));
    let expected = image::imageops::crop_imm(&src, 20, 15, 20, 10).to_image();
    assert_eq!(out, expected);
}

#[test]
fn half_pixel_center_averages_neighbours() {
    let src = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([0, 0, 0]) } else { Rgb([100, 100, 100]) });
    // Box of width 1 centered on the shared edge of the two pixels.
    let out = rect_sub_pix(&src, 1, 1, Point::new(1.0, 0.5));
    assert_eq!(out.get_pixel(0, 0), &Rgb([50, 50, 50]));
}

#[test]
fn out_of_range_box_replicates_edges() {
    let src = gradient(8, 8);
    let out = rect_sub_pix(&src, 4, 4, Point::new(0.0, 0.0));
    assert_eq!(out.dimensions(), (4, 4));
    assert_eq!(out.get_pixel(0, 0), src.get_pixel(0, 0));
}

#[test]
fn zero_rotation_is_identity() {
    let m = rotation_about(Point::new(12.5, 7.0), 0.0);
    assert_eq!(m, Affine::IDENTITY);
    let src = gradient(16, 9);
    let out = warp_affine(&src, m, 16, 9, Rgb([0, 0, 0]));
    assert_eq!(out, src);
}

#[test]
fn rotation_keeps_center_fixed() {
    let c = Point::new(40.0, 25.0);
    for angle in [13.0, 90.0, 211.0] {
        let p = rotation_about(c, angle) * c;
        assert!((p - c).hypot() < 1e-9);
    }
}

#[test]
fn quarter_turn_maps_right_to_up() {
    // A point to the right of the center ends up above it.
    let c = Point::new(10.0, 10.0);
    let p = rotation_about(c, 90.0) * Point::new(15.0, 10.0);
    assert!((p.x - 10.0).abs() < 1e-9);
    assert!((p.y - 5.0).abs() < 1e-9);
}

#[test]
fn warp_fills_uncovered_pixels() {
    let src = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
    let shift = Affine::translate((100.0, 0.0));
    let out = warp_affine(&src, shift, 4, 4, Rgba([0, 0, 0, 0]));
    assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn quarter_turn_warp_is_lossless() {
    let src = gradient(8, 8);
    let out = warp_affine(&src, rotation_about(Point::new(4.0, 4.0), 90.0), 8, 8, Rgb([0, 0, 0]));
    assert_eq!(out, image::imageops::rotate270(&src));
}

#[test]
fn edge_samples_fade_into_fill() {
    let src = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
    let out = warp_affine(&src, Affine::translate((0.5, 0.0)), 5, 4, Rgba([0, 0, 0, 0]));
    let alpha = out.get_pixel(0, 1)[3];
    assert!((120..=135).contains(&alpha), "edge alpha {alpha}");
    assert_eq!(out.get_pixel(2, 1)[3], 255);
    assert_eq!(out.get_pixel(4, 1)[3], alpha);
}

#[test]
fn transpose_swaps_axes() {
    let src = gradient(5, 3);
    let t = transpose(&src);
    assert_eq!(t.dimensions(), (3, 5));
    assert_eq!(t.get_pixel(2, 4), src.get_pixel(4, 2));
}

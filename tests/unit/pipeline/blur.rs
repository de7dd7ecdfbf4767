use super::*;
use image::Rgb;

#[test]
fn ksize_one_is_identity() {
    let src = Frame::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
    assert_eq!(gaussian_blur(&src, 1, 1.0).unwrap(), src);
}

#[test]
fn constant_image_is_unchanged() {
    let src = Frame::from_pixel(6, 4, Rgb([10, 20, 30]));
    let out = gaussian_blur(&src, 5, sigma_for_ksize(5)).unwrap();
    assert_eq!(out, src);
}

#[test]
fn single_pixel_energy_spreads() {
    let mut src = Frame::new(5, 5);
    src.put_pixel(2, 2, Rgb([255, 255, 255]));
    let out = gaussian_blur(&src, 5, 1.0).unwrap();
    let center = out.get_pixel(2, 2)[0];
    let neighbour = out.get_pixel(3, 2)[0];
    assert!(center < 255);
    assert!(neighbour > 0);
    assert!(center > neighbour);
}

#[test]
fn even_kernel_is_rejected() {
    let src = Frame::new(4, 4);
    assert!(matches!(
        gaussian_blur(&src, 4, 1.0),
        Err(ViewfxError::Validation(_))
    ));
}

#[test]
fn default_sigma_matches_kernel_size() {
    assert!((sigma_for_ksize(5) - 1.1).abs() < 1e-12);
    assert!((sigma_for_ksize(3) - 0.8).abs() < 1e-12);
}

#[test]
fn taps_follow_kernel_size_and_sum_to_one() {
    let taps = gaussian_taps(7, sigma_for_ksize(7));
    assert_eq!(taps.len(), 7);
    assert_eq!(taps[0], taps[6]);
    assert!(taps[3] > taps[2]);
    assert!((taps.iter().sum::<f32>() - 1.0).abs() < 1e-5);
}

#[test]
fn kernel_wider_than_frame_replicates_edges() {
    let src = Frame::from_fn(3, 1, |x, _| Rgb([(x * 100) as u8, 0, 0]));
    let out = gaussian_blur(&src, 9, 2.0).unwrap();
    let row: Vec<u8> = (0..3).map(|x| out.get_pixel(x, 0)[0]).collect();
    assert!(row[0] < row[1] && row[1] < row[2], "{row:?}");
    assert!(row[0] > 0 && row[2] < 200);
}

#[test]
fn non_positive_sigma_is_rejected() {
    let src = Frame::new(4, 4);
    assert!(gaussian_blur(&src, 3, 0.0).is_err());
    assert!(gaussian_blur(&src, 3, f64::NAN).is_err());
}

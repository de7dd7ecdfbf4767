use super::*;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("viewfx-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn numbering_starts_at_zero() {
    let dir = scratch_dir("out-empty");
    let p = unique_output_path(&dir.join("frame.png"));
    assert_eq!(p, dir.join("frame_000000.png"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn numbering_continues_past_highest_index() {
    let dir = scratch_dir("out-scan");
    for name in ["frame_000000.png", "frame_000007.png", "frame_12.png", "frame_000009.jpg", "other_000050.png"] {
        std::fs::write(dir.join(name), b"x").unwrap();
    }
    let p = unique_output_path(&dir.join("frame.png"));
    assert_eq!(p, dir.join("frame_000008.png"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn save_frame_creates_directories_and_numbers() {
    let dir = scratch_dir("out-save");
    let frame = Frame::from_pixel(3, 2, image::Rgb([1, 2, 3]));
    let a = save_frame(&dir, Path::new("steps/blur.png"), &frame, true).unwrap();
    let b = save_frame(&dir, Path::new("steps/blur.png"), &frame, true).unwrap();
    assert_eq!(a, dir.join("steps/blur_000000.png"));
    assert_eq!(b, dir.join("steps/blur_000001.png"));

    let plain = save_frame(&dir, Path::new("plain.png"), &frame, false).unwrap();
    let decoded = image::open(&plain).unwrap().to_rgb8();
    assert_eq!(decoded, frame);
    let _ = std::fs::remove_dir_all(&dir);
}

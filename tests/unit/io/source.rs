use image::Rgb;

use super::*;

#[test]
fn image_source_defaults_to_one_frame() {
    let mut src = ImageSource::from_frame(Frame::from_pixel(3, 2, Rgb([1, 2, 3])), None);
    assert!(src.is_open());
    assert_eq!(src.read().unwrap().unwrap().dimensions(), (3, 2));
    assert!(!src.is_open());
    assert!(src.read().unwrap().is_none());
}

#[test]
fn image_source_repeats_max_frames() {
    let frame = Frame::from_pixel(2, 2, Rgb([9, 9, 9]));
    let mut src = ImageSource::from_frame(frame.clone(), Some(3));
    for _ in 0..3 {
        assert_eq!(src.read().unwrap().as_ref(), Some(&frame));
    }
    assert!(src.read().unwrap().is_none());
}

#[test]
fn released_source_is_closed() {
    let mut src = ImageSource::from_frame(Frame::new(1, 1), Some(10));
    src.release();
    assert!(!src.is_open());
    assert!(src.read().unwrap().is_none());
}

#[test]
fn missing_image_is_an_asset_error() {
    let err = ImageSource::open(Path::new("definitely/not/here.png"), None)
        .err()
        .unwrap();
    assert!(matches!(err, ViewfxError::Asset(_)));
}

#[test]
fn zero_framerate_never_sleeps() {
    let mut t = Throttle::new(0.0);
    assert!(t.interval().is_none());
    assert_eq!(t.wait(), Duration::ZERO);
    assert!(Throttle::new(-5.0).interval().is_none());
}

#[test]
fn throttle_paces_frames() {
    let mut t = Throttle::new(100.0);
    assert_eq!(t.interval(), Some(Duration::from_millis(10)));
    let start = Instant::now();
    for _ in 0..4 {
        t.wait();
    }
    // First call schedules, the next three wait roughly one interval each.
    assert!(start.elapsed() >= Duration::from_millis(25));
}

#[test]
fn throttled_wrapper_forwards() {
    let inner = ImageSource::from_frame(Frame::new(2, 2), Some(2));
    let mut src = Throttled::new(inner, Throttle::new(1000.0));
    assert!(src.read().unwrap().is_some());
    assert!(src.read().unwrap().is_some());
    assert!(src.read().unwrap().is_none());
    assert!(!src.is_open());
}

#[test]
fn open_source_reads_image_input() {
    let dir = std::env::temp_dir().join(format!("viewfx-source-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    Frame::from_pixel(5, 4, Rgb([10, 20, 30]))
        .save(dir.join("in.png"))
        .unwrap();
    let global = GlobalConfig {
        input_root: dir.clone(),
        input_source: "in.png".to_owned(),
        max_frames: Some(2),
        ..GlobalConfig::default()
    };
    let mut src = open_source(&global).unwrap();
    assert_eq!(src.read().unwrap().unwrap().get_pixel(4, 3), &Rgb([10, 20, 30]));
    assert!(src.read().unwrap().is_some());
    assert!(src.read().unwrap().is_none());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn live_input_needs_a_device_index() {
    let global = GlobalConfig {
        input_type: InputType::Live,
        input_source: "webcam".to_owned(),
        ..GlobalConfig::default()
    };
    assert!(matches!(open_source(&global), Err(ViewfxError::Validation(_))));
}

#[cfg(not(feature = "media-ffmpeg"))]
#[test]
fn video_input_without_feature_is_reported() {
    let global = GlobalConfig {
        input_type: InputType::Video,
        input_source: "clip.mp4".to_owned(),
        ..GlobalConfig::default()
    };
    assert!(matches!(open_source(&global), Err(ViewfxError::Evaluation(_))));
}

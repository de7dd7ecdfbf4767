use image::Rgb;

use super::*;
use crate::{
    animation::keyframes::{Keyframe, KeyframeMode},
    geometry::viewport::ViewportState,
    io::source::ImageSource,
    params::{store::ParamStore, value::ParamValue},
    pipeline::config::StepDecl,
};

fn gradient(w: u32, h: u32) -> Frame {
    Frame::from_fn(w, h, |x, y| Rgb([(x * 3) as u8, (y * 3) as u8, 60]))
}

fn session(
    frames: u64,
    decls: &[StepDecl],
    viewport: Option<ViewportConfig>,
    global: GlobalConfig,
) -> Session {
    let global = Arc::new(global);
    let pipeline =
        Pipeline::from_decls(&StepRegistry::with_builtin_steps(), global.clone(), decls).unwrap();
    let source = Box::new(ImageSource::from_frame(gradient(64, 48), Some(frames)));
    Session::new(global, source, pipeline, viewport)
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("viewfx-session-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn runs_until_end_of_stream() {
    let mut s = session(3, &[], None, GlobalConfig::default());
    let last = s.run(None).unwrap().unwrap();
    assert_eq!(last, gradient(64, 48));
    assert_eq!(s.frame_index(), FrameIndex(3));
    assert_eq!(s.profiler().frame_count(), 3);
    assert!(s.step_frame().unwrap().is_none());
}

#[test]
fn limit_stops_early() {
    let mut s = session(10, &[], None, GlobalConfig::default());
    s.run(Some(4)).unwrap();
    assert_eq!(s.frame_index(), FrameIndex(4));
}

#[test]
fn viewport_crops_before_pipeline() {
    let vp = ViewportConfig {
        state: Some(ViewportState::new(32.0, 24.0, 20.0, 10.0, 0.0)),
        ..ViewportConfig::default()
    };
    let decls = [StepDecl::new(
        "Border",
        [("size", ParamValue::Int(1))].into_iter().collect::<ParamStore>(),
    )];
    let mut s = session(1, &decls, Some(vp), GlobalConfig::default());
    let out = s.step_frame().unwrap().unwrap();
    assert_eq!(out.dimensions(), (22, 12));
    // View pixel (0,0) samples source pixel (22, 19).
    assert_eq!(out.get_pixel(1, 1), gradient(64, 48).get_pixel(22, 19));
    assert_eq!(s.viewport().unwrap().size(), (20, 10));
}

#[test]
fn missing_viewport_state_covers_whole_image() {
    let mut s = session(1, &[], Some(ViewportConfig::default()), GlobalConfig::default());
    let out = s.step_frame().unwrap().unwrap();
    assert_eq!(out, gradient(64, 48));
}

#[test]
fn keyframes_drive_the_viewport() {
    let a = ViewportState::new(20.0, 20.0, 10.0, 10.0, 0.0);
    let b = ViewportState::new(40.0, 20.0, 10.0, 10.0, 0.0);
    let vp = ViewportConfig {
        state: Some(a),
        mode: KeyframeMode::Interpolate,
        playing: true,
        debug: false,
        keyframes: vec![Keyframe::new(a, 2), Keyframe::new(b, 2)],
    };
    let mut s = session(3, &[], Some(vp), GlobalConfig::default());
    s.step_frame().unwrap();
    assert_eq!(s.viewport().unwrap().state().x, 20.0);
    s.step_frame().unwrap();
    assert_eq!(s.viewport().unwrap().state().x, 30.0);
    s.step_frame().unwrap();
    assert_eq!(s.viewport().unwrap().state().x, 40.0);
    assert_eq!(s.animator().current_step(), 3);
}

#[test]
fn recording_letterboxes_changing_view_sizes() {
    let a = ViewportState::new(32.0, 24.0, 20.0, 10.0, 0.0);
    let b = ViewportState::new(32.0, 24.0, 30.0, 16.0, 0.0);
    let vp = ViewportConfig {
        state: Some(a),
        mode: KeyframeMode::Interpolate,
        playing: true,
        debug: false,
        keyframes: vec![Keyframe::new(a, 2), Keyframe::new(b, 2)],
    };
    let mut s = session(4, &[], Some(vp), GlobalConfig::default());
    if crate::io::record::ffmpeg_version().is_none() {
        return;
    }
    let path = scratch("record").join("clip.mp4");
    s.record_to(&path);

    let mut sizes = Vec::new();
    while let Some(frame) = s.step_frame().unwrap() {
        sizes.push(frame.dimensions());
    }
    assert_eq!(sizes, vec![(20, 10), (25, 13), (30, 16), (25, 13)]);
    assert_eq!(s.finish().unwrap(), Some(path.clone()));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn debug_view_draws_on_the_source() {
    let vp = ViewportConfig {
        state: Some(ViewportState::new(32.0, 24.0, 20.0, 10.0, 30.0)),
        debug: true,
        ..ViewportConfig::default()
    };
    let mut s = session(1, &[], Some(vp), GlobalConfig::default());
    assert!(s.debug_view().is_none());
    let view = s.step_frame().unwrap().unwrap();
    let debug = s.debug_view().unwrap();
    assert_eq!(debug.dimensions(), (64, 48));
    assert_eq!(view.dimensions(), (20, 10));
    assert_ne!(debug, gradient(64, 48));
}

#[test]
fn screenshot_is_written_once() {
    let root = scratch("shot");
    let global = GlobalConfig {
        output_root: root.clone(),
        screenshot_label: "snap".to_owned(),
        ..GlobalConfig::default()
    };
    let mut s = session(2, &[], None, global);
    s.request_screenshot();
    s.run(None).unwrap();
    let shots: Vec<_> = std::fs::read_dir(root.join("screenshots"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(shots, ["snap_000000.png"]);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn video_input_saves_step_images_only_on_request() {
    let root = scratch("frameset");
    let global = GlobalConfig {
        input_type: InputType::Video,
        output_root: root.clone(),
        save_step_images: true,
        ..GlobalConfig::default()
    };
    let decls = [StepDecl::new(
        "Threshold",
        [("output_file", ParamValue::from("thr.png"))]
            .into_iter()
            .collect::<ParamStore>(),
    )];
    let mut s = session(3, &decls, None, global);
    s.step_frame().unwrap();
    assert!(!root.join("thr.png").exists());
    s.request_frameset_save();
    s.step_frame().unwrap();
    assert!(root.join("thr.png").exists());
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn finish_without_recording_returns_none() {
    let mut s = session(1, &[], None, GlobalConfig::default());
    s.run(None).unwrap();
    assert!(s.finish().unwrap().is_none());
}

#[test]
fn profiler_keeps_a_rolling_window() {
    let mut p = Profiler::new(0.0).with_report_every(0);
    for ms in 1..=40u64 {
        p.record_step(0, "Blur", Duration::from_millis(ms));
        assert!(!p.end_frame(Duration::from_millis(ms)));
    }
    // Window of 30 keeps 11..=40, averaging 25.5ms.
    assert_eq!(p.frame_average(), Some(Duration::from_micros(25_500)));
    assert_eq!(p.step_average(0), Some(Duration::from_micros(25_500)));
    assert_eq!(p.step_average(1), None);
    assert_eq!(p.frame_count(), 40);
    assert!(p.summary().contains("0:Blur 25.50ms"));
}

#[test]
fn profiler_flags_slow_frames() {
    let mut p = Profiler::new(100.0);
    assert!(!p.end_frame(Duration::from_millis(5)));
    assert!(p.end_frame(Duration::from_millis(15)));
    assert_eq!(p.slow_frames(), 1);
}

#[test]
fn session_runs_pipeline_with_profiling() {
    let decls = [
        StepDecl::new("Threshold", ParamStore::new()),
        StepDecl::new("Tile", ParamStore::new()),
    ];
    let mut s = session(2, &decls, None, GlobalConfig::default());
    s.run(None).unwrap();
    assert!(s.profiler().step_average(0).is_some());
    assert!(s.profiler().step_average(1).is_some());
    assert!(s.profiler().step_average(2).is_none());
}

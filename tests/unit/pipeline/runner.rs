use image::Rgb;

use super::*;
use crate::params::store::ParamStore;

fn decl(name: &str, params: &[(&str, ParamValue)]) -> StepDecl {
    StepDecl::new(name, params.iter().cloned().collect::<ParamStore>())
}

fn pipeline(decls: &[StepDecl]) -> Pipeline {
    Pipeline::from_decls(
        &StepRegistry::with_builtin_steps(),
        Arc::new(GlobalConfig::default()),
        decls,
    )
    .unwrap()
}

#[test]
fn runs_steps_in_order() {
    let mut p = pipeline(&[
        decl("Threshold", &[("thresh", ParamValue::Int(100))]),
        decl("Border", &[("size", ParamValue::Int(1))]),
    ]);
    assert_eq!(p.len(), 2);
    let out = p.run_frame(Frame::from_pixel(2, 2, Rgb([200, 200, 200])), false).unwrap();
    assert_eq!(out.dimensions(), (4, 4));
    assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
    assert_eq!(out.get_pixel(1, 1), &Rgb([255, 255, 255]));
}

#[test]
fn disabled_steps_are_skipped() {
    let mut p = pipeline(&[decl(
        "Border",
        &[("size", ParamValue::Int(2)), ("enabled", ParamValue::Bool(false))],
    )]);
    let src = Frame::from_pixel(3, 3, Rgb([7, 8, 9]));
    assert_eq!(p.run_frame(src.clone(), false).unwrap(), src);

    assert_eq!(p.toggle_selected(), Some(true));
    assert_eq!(p.run_frame(src, false).unwrap().dimensions(), (7, 7));
}

#[test]
fn unknown_step_aborts_load() {
    let res = Pipeline::from_decls(
        &StepRegistry::with_builtin_steps(),
        Arc::new(GlobalConfig::default()),
        &[decl("Threshold", &[]), decl("Nope", &[])],
    );
    assert!(res.is_err());
}

#[test]
fn empty_pipeline_passes_frames_through() {
    let mut p = pipeline(&[]);
    assert!(p.is_empty());
    let src = Frame::from_pixel(2, 3, Rgb([1, 2, 3]));
    assert_eq!(p.run_frame(src.clone(), true).unwrap(), src);
}

#[test]
fn step_errors_propagate() {
    let mut p = pipeline(&[decl("Blur", &[("ksize", ParamValue::Int(4))])]);
    assert!(p.run_frame(Frame::new(4, 4), false).is_err());
}

#[test]
fn decls_round_trip_current_params() {
    let mut p = pipeline(&[decl("Threshold", &[])]);
    p.edit_parameter(0, "thresh", EditDirection::Up, 5).unwrap();
    let decls = p.to_decls();
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].name, "Threshold");
    assert_eq!(decls[0].params.get("thresh"), Some(&ParamValue::Int(133)));

    let rebuilt = pipeline(&decls);
    assert_eq!(rebuilt.to_decls(), decls);
}

#[test]
fn failed_edits_leave_state_unchanged() {
    let mut p = pipeline(&[decl("Threshold", &[])]);
    let before = p.to_decls();
    assert!(p.edit_parameter(0, "missing", EditDirection::Up, 1).is_err());
    assert!(p.edit_parameter(3, "thresh", EditDirection::Up, 1).is_err());
    assert_eq!(p.to_decls(), before);
}

#[test]
fn selection_wraps_and_drives_edits() {
    let mut p = pipeline(&[decl("Threshold", &[]), decl("Tile", &[])]);
    assert_eq!(p.selection(), Some((0, "thresh")));
    assert_eq!(p.select_param(1).map(|(k, _)| k), Some("max_val"));
    assert_eq!(p.select_param(1).map(|(k, _)| k), Some("thresh"));
    assert_eq!(p.select_param(-1).map(|(k, _)| k), Some("max_val"));

    assert_eq!(p.select_step(-1).map(|s| s.type_name().to_owned()), Some("Tile".to_owned()));
    assert_eq!(p.selection(), Some((1, "n")));

    assert_eq!(p.multiplier(), 1);
    assert_eq!(p.cycle_multiplier(), 5);
    p.edit_selected(EditDirection::Up).unwrap();
    assert_eq!(p.steps().nth(1).unwrap().params().get_i64("n"), Some(7));

    for expected in [10, 100, 1, 5] {
        assert_eq!(p.cycle_multiplier(), expected);
    }
}

#[test]
fn move_and_remove_steps() {
    let mut p = pipeline(&[decl("Threshold", &[]), decl("Tile", &[])]);
    assert!(p.move_step(1, 0));
    let names: Vec<_> = p.steps().map(|s| s.type_name().to_owned()).collect();
    assert_eq!(names, ["Tile", "Threshold"]);
    assert!(!p.move_step(0, 5));
    assert!(p.remove(9).is_none());
    assert_eq!(p.remove(0).unwrap().type_name(), "Tile");
    assert_eq!(p.len(), 1);
    assert!(p.to_string().contains("Threshold"));
}

#[test]
fn step_outputs_are_written_when_requested() {
    let root = std::env::temp_dir().join(format!("viewfx-runner-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    let global = GlobalConfig {
        output_root: root.clone(),
        save_step_images: true,
        ..GlobalConfig::default()
    };
    let mut p = Pipeline::from_decls(
        &StepRegistry::with_builtin_steps(),
        Arc::new(global),
        &[decl("Threshold", &[("output_file", ParamValue::from("thr.png"))])],
    )
    .unwrap();

    p.run_frame(Frame::new(4, 4), false).unwrap();
    assert!(!root.join("thr.png").exists());
    p.run_frame(Frame::new(4, 4), true).unwrap();
    assert!(root.join("thr.png").exists());

    let _ = std::fs::remove_dir_all(&root);
}

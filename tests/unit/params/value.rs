use super::*;
use crate::animation::animator::AnimMode;
use serde_json::json;

#[test]
fn json_shapes_map_to_tags() {
    assert_eq!(ParamValue::from_json(json!(null)).unwrap(), ParamValue::Null);
    assert_eq!(ParamValue::from_json(json!(true)).unwrap(), ParamValue::Bool(true));
    assert_eq!(ParamValue::from_json(json!(5)).unwrap(), ParamValue::Int(5));
    assert_eq!(ParamValue::from_json(json!(5.0)).unwrap(), ParamValue::Float(5.0));
    assert_eq!(
        ParamValue::from_json(json!("HOT")).unwrap(),
        ParamValue::Text("HOT".into())
    );
    assert_eq!(
        ParamValue::from_json(json!([0, 0.5, 255])).unwrap(),
        ParamValue::List(vec![0.0, 0.5, 255.0])
    );
}

#[test]
fn objects_are_always_animator_descriptors() {
    let v = ParamValue::from_json(json!({"mode": "waypoints", "points": [0, 1]})).unwrap();
    let ParamValue::Animated(cfg) = v else {
        panic!("expected animated value");
    };
    assert_eq!(cfg.mode, AnimMode::Waypoints);

    let err = ParamValue::from_json(json!({"colour": "red"})).unwrap_err();
    assert!(matches!(err, ViewfxError::Animation(_)));
    assert!(ParamValue::from_json(json!(["a", "b"])).is_err());
}

#[test]
fn edits_dispatch_on_tag() {
    let mut b = ParamValue::Bool(false);
    b.edit(EditDirection::Down, 100).unwrap();
    assert_eq!(b, ParamValue::Bool(true));

    let mut i = ParamValue::Int(3);
    i.edit(EditDirection::Down, 5).unwrap();
    assert_eq!(i, ParamValue::Int(-2));

    let mut f = ParamValue::Float(1.0);
    f.edit(EditDirection::Up, 5).unwrap();
    assert!((f.as_f64().unwrap() - 1.5).abs() < 1e-12);

    let mut l = ParamValue::List(vec![1.0]);
    assert!(l.edit(EditDirection::Up, 1).is_err());
    assert_eq!(l, ParamValue::List(vec![1.0]));
    assert!(ParamValue::Text("x".into()).edit(EditDirection::Up, 1).is_err());
    assert!(ParamValue::Null.edit(EditDirection::Up, 1).is_err());
}

#[test]
fn repeated_integer_edits_commute() {
    let mut coarse = ParamValue::Int(7);
    for _ in 0..5 {
        coarse.edit(EditDirection::Up, 10).unwrap();
    }
    let mut fine = ParamValue::Int(7);
    for _ in 0..50 {
        fine.edit(EditDirection::Up, 1).unwrap();
    }
    assert_eq!(coarse, fine);
    assert_eq!(coarse, ParamValue::Int(57));
}

#[test]
fn serializes_back_to_plain_json() {
    let v = ParamValue::List(vec![1.0, 2.0]);
    assert_eq!(serde_json::to_string(&v).unwrap(), "[1.0,2.0]");
    assert_eq!(serde_json::to_string(&ParamValue::Int(4)).unwrap(), "4");
    let back: ParamValue = serde_json::from_str("4").unwrap();
    assert_eq!(back, ParamValue::Int(4));
}

#[test]
fn direction_parses() {
    assert_eq!("up".parse::<EditDirection>().unwrap(), EditDirection::Up);
    assert!("sideways".parse::<EditDirection>().is_err());
}

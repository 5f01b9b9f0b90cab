// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use atrium_core::{CameraSettings, ConfigurationError, FrameError, SceneConfig};
use atrium_dry_tests::driver_with;

fn parse(json: &str) -> SceneConfig {
    serde_json::from_str(json).unwrap()
}

#[test]
fn config_rejects_what_the_api_rejects() {
    let cases = [
        r#"{"door":{"width":0.0,"height":5.0}}"#,
        r#"{"door":{"width":1.0,"height":-2.0}}"#,
        r#"{"capture":{"resolution":0}}"#,
        r#"{"capture":{"near":10.0,"far":1.0}}"#,
        r#"{"camera":{"near":0.0}}"#,
        r#"{"camera":{"fov_y_degrees":0.0}}"#,
        r#"{"camera":{"fov_y_degrees":180.0}}"#,
        r#"{"controls":{"min_distance":30.0,"max_distance":20.0}}"#,
        r#"{"controls":{"damping":0.0}}"#,
    ];
    for json in cases {
        assert!(parse(json).validate().is_err(), "accepted {json}");
    }
}

#[test]
fn driver_refuses_invalid_config() {
    let cfg = parse(r#"{"capture":{"resolution":0}}"#);
    assert!(matches!(
        driver_with(&cfg),
        Err(FrameError::Configuration(
            ConfigurationError::InvalidCaptureResolution(0)
        ))
    ));
}

#[test]
fn field_of_view_must_be_open_interval() {
    for fov in [0.0, -10.0, 180.0, 240.0, f32::NAN] {
        let mut cfg = SceneConfig::default();
        cfg.camera.fov_y_degrees = fov;
        match cfg.validate() {
            Err(ConfigurationError::InvalidFieldOfView(got)) => {
                assert!(got.is_nan() || got == fov);
            }
            other => panic!("fov {fov} gave {other:?}"),
        }
    }
    let mut cfg = SceneConfig::default();
    cfg.camera.fov_y_degrees = 179.0;
    assert!(cfg.validate().is_ok());
    assert!(matches!(
        driver_with(&SceneConfig {
            camera: CameraSettings {
                fov_y_degrees: 0.0,
                ..CameraSettings::default()
            },
            ..SceneConfig::default()
        }),
        Err(FrameError::Configuration(
            ConfigurationError::InvalidFieldOfView(_)
        ))
    ));
}

#[test]
fn capture_inside_the_door_is_rejected() {
    let cfg = parse(r#"{"capture":{"position":[0.0,1.0,-1.5]}}"#);
    match driver_with(&cfg) {
        Err(FrameError::Configuration(ConfigurationError::CaptureEnclosed { node, .. })) => {
            assert_eq!(node, "slab");
        }
        other => panic!("expected CaptureEnclosed, got {:?}", other.err()),
    }
}

#[test]
fn capture_inside_a_shape_is_rejected() {
    let cfg = parse(r#"{"capture":{"position":[-1.5,0.75,0.5]}}"#);
    assert!(matches!(
        driver_with(&cfg),
        Err(FrameError::Configuration(
            ConfigurationError::CaptureEnclosed { .. }
        ))
    ));
}

#[test]
fn configured_door_is_built() {
    let cfg = parse(r#"{"door":{"width":0.9,"height":2.1}}"#);
    let (driver, _, _) = driver_with(&cfg).unwrap();
    assert_eq!(driver.door().spec().width, 0.9);
    assert_eq!(driver.door().spec().height, 2.1);
}

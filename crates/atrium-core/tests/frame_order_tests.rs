// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use approx::assert_relative_eq;
use atrium_core::{
    ConfigurationError, CubeFace, DriverState, FrameError, RenderTarget, ResourceError,
    SceneConfig, Viewport,
};
use atrium_dry_tests::{default_driver, driver_with, pump, BackendCall};

#[test]
fn six_faces_then_surface_each_tick() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    let texture = driver.capture().texture();
    driver.start().unwrap();
    backend.clear_calls();
    for _ in 0..2 {
        pump(&mut driver, &sched).unwrap().unwrap();
    }

    let targets: Vec<_> = backend.renders().iter().map(|r| r.target).collect();
    let mut expected = Vec::new();
    for _ in 0..2 {
        expected.extend(
            CubeFace::ALL.map(|face| RenderTarget::CubeFace { texture, face }),
        );
        expected.push(RenderTarget::Surface);
    }
    assert_eq!(targets, expected);
}

#[test]
fn face_cameras_sit_at_capture_point() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    pump(&mut driver, &sched).unwrap().unwrap();
    let origin = driver.capture().position();
    for call in backend.renders().iter().take(6) {
        assert_eq!(call.camera.position, origin);
        assert_relative_eq!(call.camera.fov_y.to_degrees(), 90.0, epsilon = 1e-4);
        assert_eq!(call.camera.aspect, 1.0);
    }
}

#[test]
fn binding_is_stable_across_captures() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    let texture = driver.capture().texture();
    assert_eq!(driver.shapes().environment(), Some(texture));

    driver.start().unwrap();
    let n = 5;
    for _ in 0..n {
        pump(&mut driver, &sched).unwrap().unwrap();
    }
    assert_eq!(driver.capture().generation(), n);
    assert_eq!(driver.shapes().environment(), Some(texture));
    assert!(backend
        .renders()
        .iter()
        .all(|r| r.sphere_env == Some(texture)));
    let creates = backend
        .calls()
        .iter()
        .filter(|c| matches!(c, BackendCall::CreateCubeTarget { .. }))
        .count();
    assert_eq!(creates, 1);
}

#[test]
fn clock_is_sampled_once_per_tick() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    driver.clock_mut().set(std::f64::consts::FRAC_PI_4);
    pump(&mut driver, &sched).unwrap().unwrap();

    let renders = backend.renders();
    let y = renders[0].sphere_position.y;
    assert!(renders.iter().all(|r| r.sphere_position.y == y));
    assert_relative_eq!(y, 0.75 + 0.3, epsilon = 1e-5);
}

#[test]
fn resize_lands_before_the_next_render() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    driver.resize(800, 600);
    pump(&mut driver, &sched).unwrap().unwrap();

    let surface = backend.surface_renders();
    assert_relative_eq!(surface[0].camera.aspect, 800.0 / 600.0);
    assert_eq!(driver.viewport(), Some(Viewport::new(800, 600).unwrap()));
    assert!(matches!(backend.calls()[1], BackendCall::Resize(v) if v.width == 800));
}

#[test]
fn resizes_between_ticks_coalesce() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    driver.resize(640, 480);
    driver.resize(1024, 512);
    pump(&mut driver, &sched).unwrap().unwrap();

    let resizes: Vec<_> = backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BackendCall::Resize(v) => Some(v),
            _ => None,
        })
        .collect();
    assert_eq!(resizes, vec![Viewport::new(1024, 512).unwrap()]);
    assert_relative_eq!(driver.camera().aspect, 2.0);
}

#[test]
fn zero_area_resize_is_ignored() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    driver.resize(800, 600);
    pump(&mut driver, &sched).unwrap().unwrap();
    driver.resize(0, 0);
    driver.resize(0, 300);
    pump(&mut driver, &sched).unwrap().unwrap();

    assert_eq!(driver.viewport(), Some(Viewport::new(800, 600).unwrap()));
    let surface = backend.surface_renders();
    assert_relative_eq!(surface[1].camera.aspect, 800.0 / 600.0);
}

#[test]
fn failed_resize_stops_driver() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    let aspect_before = driver.camera().aspect;
    backend.fail_next_resize(ResourceError::SurfaceLost);
    driver.resize(800, 600);
    let err = pump(&mut driver, &sched).unwrap().unwrap_err();
    assert_eq!(err, FrameError::Resource(ResourceError::SurfaceLost));
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(backend.render_count(), 0);
    assert_eq!(driver.viewport(), None);
    assert_eq!(driver.camera().aspect, aspect_before);

    driver.start().unwrap();
    pump(&mut driver, &sched).unwrap().unwrap();
    let resizes: Vec<_> = backend
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            BackendCall::Resize(viewport) => Some(viewport),
            _ => None,
        })
        .collect();
    let expected = Viewport::new(800, 600).unwrap();
    assert_eq!(resizes, vec![expected, expected]);
    assert_eq!(driver.viewport(), Some(expected));
    assert_relative_eq!(driver.camera().aspect, 800.0 / 600.0);
    assert_relative_eq!(backend.surface_renders()[0].camera.aspect, 800.0 / 600.0);
}

#[test]
fn door_update_shows_in_next_frame() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    pump(&mut driver, &sched).unwrap().unwrap();
    driver.update_door_size(2.0, 3.0).unwrap();
    pump(&mut driver, &sched).unwrap().unwrap();
    let surface = backend.surface_renders();
    assert_eq!(surface[0].door_size, (1.2, 2.4));
    assert_eq!(surface[1].door_size, (2.0, 3.0));
    assert_eq!(surface[0].mesh_count, surface[1].mesh_count);
}

#[test]
fn degenerate_door_update_keeps_current_door() {
    let (mut driver, _backend, _sched) = default_driver().unwrap();
    let before = driver.door().root().clone();
    let err = driver.update_door_size(0.0, 5.0).unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidDoorSize { .. }));
    assert_eq!(driver.door().root(), &before);
}

#[test]
fn door_that_would_enclose_capture_is_rolled_back() {
    let mut config = SceneConfig::default();
    config.capture.position = [0.0, 3.0, -1.5];
    let (mut driver, _backend, _sched) = driver_with(&config).unwrap();
    let root = driver.door().root().clone();
    let spec = driver.door().spec();
    let rebuilds = driver.door().rebuild_count();

    let err = driver.update_door_size(1.2, 4.0).unwrap_err();
    match err {
        ConfigurationError::CaptureEnclosed { node, .. } => assert_eq!(node, "slab"),
        other => panic!("expected CaptureEnclosed, got {other:?}"),
    }
    assert_eq!(driver.door().root(), &root);
    assert_eq!(driver.door().spec(), spec);
    assert_eq!(driver.door().rebuild_count(), rebuilds);
}

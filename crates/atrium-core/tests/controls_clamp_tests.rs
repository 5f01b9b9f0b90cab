// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use atrium_core::controls::Spherical;
use atrium_core::{OrbitControls, PerspectiveCamera};
use proptest::prelude::*;
use std::f32::consts::FRAC_PI_2;

#[derive(Clone, Debug)]
enum Input {
    Rotate(f32, f32),
    Dolly(f32),
    Pan(f32, f32),
    Idle,
}

fn input() -> impl Strategy<Value = Input> {
    prop_oneof![
        (-20.0f32..20.0, -20.0f32..20.0).prop_map(|(a, b)| Input::Rotate(a, b)),
        (-50.0f32..50.0).prop_map(Input::Dolly),
        (-5.0f32..5.0, -5.0f32..5.0).prop_map(|(a, b)| Input::Pan(a, b)),
        Just(Input::Idle),
    ]
}

proptest! {
    #[test]
    fn camera_stays_within_limits(inputs in prop::collection::vec(input(), 1..64)) {
        let mut controls = OrbitControls::default();
        let mut camera = PerspectiveCamera::default();
        for step in inputs {
            match step {
                Input::Rotate(l, u) => {
                    controls.rotate_left(l);
                    controls.rotate_up(u);
                }
                Input::Dolly(d) => controls.dolly(d),
                Input::Pan(x, y) => controls.pan(&camera, x, y),
                Input::Idle => {}
            }
            controls.update(&mut camera);

            let sph = Spherical::from_offset(camera.position - controls.target());
            prop_assert!(sph.radius >= 2.0 - 1e-3 && sph.radius <= 20.0 + 1e-3, "radius {}", sph.radius);
            prop_assert!(sph.phi >= -1e-3 && sph.phi <= FRAC_PI_2 + 1e-3, "phi {}", sph.phi);
            prop_assert_eq!(camera.target, controls.target());
            prop_assert!(camera.position.is_finite());
        }
    }
}

#[test]
fn pan_moves_target_and_camera_together() {
    let mut controls = OrbitControls::default();
    let mut camera = PerspectiveCamera::default();
    controls.update(&mut camera);
    let offset = camera.position - controls.target();
    controls.pan(&camera, 1.0, 0.0);
    for _ in 0..10 {
        controls.update(&mut camera);
    }
    let moved = camera.position - controls.target();
    assert!((moved - offset).length() < 1e-3);
    assert!(controls.target().x > 0.0);
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use approx::assert_relative_eq;
use atrium_core::{ReflectiveShapes, TextureHandle};
use proptest::prelude::*;
use std::f64::consts::FRAC_PI_4;

#[test]
fn sphere_peaks_at_quarter_pi() {
    let mut shapes = ReflectiveShapes::default();
    shapes.animate(FRAC_PI_4);
    let y = shapes.sphere().transform.translation.y;
    assert_relative_eq!(y, shapes.base_y() + 0.3, epsilon = 1e-6);
}

#[test]
fn cube_spins_at_fixed_rates() {
    let mut shapes = ReflectiveShapes::default();
    shapes.animate(2.0);
    let rot = shapes.cube().transform.rotation;
    assert_relative_eq!(rot.x, 0.6, epsilon = 1e-6);
    assert_relative_eq!(rot.y, 1.0, epsilon = 1e-6);
}

proptest! {
    #[test]
    fn pose_depends_only_on_last_clock(t1 in -1.0e3f64..1.0e3, t2 in -1.0e3f64..1.0e3) {
        let mut a = ReflectiveShapes::default();
        a.animate(t1);
        a.animate(t2);
        let mut b = ReflectiveShapes::default();
        b.animate(t2);
        prop_assert_eq!(a.cube().transform, b.cube().transform);
        prop_assert_eq!(a.sphere().transform, b.sphere().transform);
    }

    #[test]
    fn animation_keeps_environment_binding(t in 0.0f64..100.0) {
        let mut shapes = ReflectiveShapes::default();
        let tex = TextureHandle::new(3);
        shapes.bind_environment(tex, 1.0);
        shapes.animate(t);
        prop_assert_eq!(shapes.environment(), Some(tex));
        prop_assert!(!shapes.bind_environment(tex, 1.0));
    }
}

//! Transform tests
//!
//! Tests for:
//! - Dirty-cache correctness under interleaved writes and reads
//! - Scale-then-translate composition
//! - World-space rotation composition order
//! - Euler angle conventions
//! - Checked and unchecked inverses
//! - Persisted field layout

use std::f32::consts::FRAC_PI_2;

use strata::error::TransformError;
use strata::math::{Mat4, Quat, Transform, Vec3};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn mat4_approx(a: Mat4, b: Mat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| approx_eq(*x, *y))
}

// ============================================================================
// Dirty cache
// ============================================================================

#[test]
fn cached_matrix_tracks_every_mutator() {
    let mut t = Transform::default();
    assert!(mat4_approx(t.matrix(), Mat4::IDENTITY));

    let steps: Vec<Box<dyn Fn(&mut Transform)>> = vec![
        Box::new(|t| t.set_position(Vec3::new(1.0, 2.0, 3.0))),
        Box::new(|t| t.translate(Vec3::new(-1.0, 0.0, 0.5))),
        Box::new(|t| t.set_rotation(Quat::from_rotation_y(0.4))),
        Box::new(|t| t.rotate(Quat::from_rotation_x(0.2))),
        Box::new(|t| t.rotate_axis_angle(30.0, Vec3::Z)),
        Box::new(|t| t.set_rotation_euler(Vec3::new(10.0, 20.0, 30.0))),
        Box::new(|t| t.set_scale(Vec3::new(1.0, 2.0, 3.0))),
        Box::new(|t| t.set_uniform_scale(0.5)),
    ];

    for (i, step) in steps.iter().enumerate() {
        step(&mut t);
        assert!(t.is_dirty(), "step {i} must invalidate the cache");
        // Several reads between writes all agree with a fresh computation.
        for _ in 0..3 {
            assert!(mat4_approx(t.matrix(), t.compute_matrix()), "step {i}");
            assert!(!t.is_dirty());
        }
    }
}

#[test]
fn clone_carries_values_not_staleness() {
    let mut t = Transform::from_xyz(4.0, 0.0, 0.0);
    t.matrix();
    let mut copy = t.clone();
    copy.set_position(Vec3::ZERO);
    assert!(vec3_approx(copy.matrix().w_axis.truncate(), Vec3::ZERO));
    assert!(vec3_approx(t.matrix().w_axis.truncate(), Vec3::new(4.0, 0.0, 0.0)));
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn scale_applies_before_translation() {
    let mut t = Transform::default();
    t.set_position(Vec3::new(1.0, 0.0, 0.0));
    t.set_uniform_scale(2.0);
    let m = t.matrix();
    assert!(vec3_approx(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 0.0, 0.0)));
    assert!(vec3_approx(
        m.transform_point3(Vec3::splat(0.5)),
        Vec3::new(2.0, 1.0, 1.0)
    ));
}

#[test]
fn rotate_composes_in_world_space() {
    let a = Quat::from_rotation_x(FRAC_PI_2);
    let b = Quat::from_rotation_y(FRAC_PI_2);

    let mut rotated = Transform::default();
    rotated.rotate(a);
    rotated.rotate(b);

    let mut expected = Transform::default();
    expected.set_rotation(b * a);
    assert!(mat4_approx(rotated.matrix(), expected.matrix()));

    let mut other_order = Transform::default();
    other_order.set_rotation(a * b);
    assert!(!mat4_approx(rotated.matrix(), other_order.matrix()));
}

#[test]
fn euler_yaw_turns_forward_toward_negative_x() {
    let mut t = Transform::default();
    t.set_rotation_euler(Vec3::new(0.0, 90.0, 0.0));
    assert!(vec3_approx(t.forward(), Vec3::NEG_X));
    assert!(vec3_approx(t.right(), Vec3::NEG_Z));
    assert!(vec3_approx(t.up(), Vec3::Y));

    let back = t.rotation_euler();
    assert!((back.y - 90.0).abs() < 1e-3);
}

#[test]
fn looking_at_points_forward_at_target() {
    let t = Transform::from_xyz(0.0, 0.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y);
    assert!(vec3_approx(t.forward(), Vec3::NEG_Z));

    let side = Transform::from_xyz(3.0, 0.0, 0.0).looking_at(Vec3::ZERO, Vec3::Y);
    assert!(vec3_approx(side.forward(), Vec3::NEG_X));
}

// ============================================================================
// Inverses
// ============================================================================

#[test]
fn inverse_round_trips_points() {
    let mut t = Transform::from_xyz(1.0, -2.0, 3.0)
        .with_rotation(Quat::from_rotation_z(0.7))
        .with_uniform_scale(2.5);
    let p = Vec3::new(0.3, 0.6, -0.9);
    let world = t.matrix().transform_point3(p);
    assert!(vec3_approx(t.inverse_matrix().transform_point3(world), p));
}

#[test]
fn zero_scale_inverse_is_reported() {
    let mut t = Transform::default().with_scale(Vec3::new(1.0, 0.0, 1.0));
    assert!(matches!(
        t.try_inverse_matrix(),
        Err(TransformError::Singular { .. })
    ));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "singular")]
fn unchecked_inverse_asserts_on_zero_scale() {
    let mut t = Transform::default().with_uniform_scale(0.0);
    t.inverse_matrix();
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn transform_persists_as_named_fields() {
    let t = Transform::from_xyz(1.0, 2.0, 3.0).with_uniform_scale(2.0);
    let json: serde_json::Value = serde_json::to_value(&t).unwrap();
    assert_eq!(json["position"]["x"], 1.0);
    assert_eq!(json["position"]["z"], 3.0);
    assert_eq!(json["rotation"]["w"], 1.0);
    assert_eq!(json["scale"]["y"], 2.0);

    let mut back: Transform = serde_json::from_value(json).unwrap();
    assert!(back.is_dirty());
    assert!(mat4_approx(back.matrix(), t.compute_matrix()));
}

//! Conversions between the estimator's native coordinate conventions and the
//! render-frame conventions.
//!
//! The estimator uses a right-handed world (z up) and camera convention; the
//! render frame is y-up and of opposite handedness. The change of basis is a
//! fixed axis permutation with one negation, i.e. a reflection (determinant
//! -1). Positions and directions only need their components relabeled, but a
//! camera-to-world orientation cannot be rebased as a quaternion: quaternions
//! represent proper rotations only, so the conversion goes through the
//! rotation matrix, conjugated by the basis changes on both sides. All
//! functions here are pure and allocation-free.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};

/// Estimator world axes expressed in render world axes (y and z swap).
/// Orthogonal, so the inverse is the transpose.
#[inline]
fn world_basis() -> Matrix3<f64> {
    Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, //
        0.0, 1.0, 0.0,
    )
}

/// Estimator camera axes expressed in render camera axes (y negated).
#[inline]
fn camera_basis() -> Matrix3<f64> {
    Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, -1.0, 0.0, //
        0.0, 0.0, 1.0,
    )
}

/// Render marker (tag) axes expressed in estimator marker axes.
#[inline]
fn marker_basis() -> Matrix3<f64> {
    Matrix3::new(
        -1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, //
        0.0, -1.0, 0.0,
    )
}

/// Estimator world point to render world: pure axis relabeling.
#[inline]
pub fn world_point_to_render(p: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(p.x, p.z, p.y)
}

/// Render world point to estimator world. The swap is its own inverse.
#[inline]
pub fn render_point_to_world(p: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(p.x, p.z, p.y)
}

/// Directions transform exactly like points under a pure basis change.
#[inline]
pub fn world_direction_to_render(d: &Vector3<f64>) -> Vector3<f64> {
    world_point_to_render(d)
}

#[inline]
pub fn render_direction_to_world(d: &Vector3<f64>) -> Vector3<f64> {
    render_point_to_world(d)
}

/// Angular velocity is a pseudovector: the handedness flip negates it on top
/// of the direction rule. Not interchangeable with [`world_direction_to_render`].
#[inline]
pub fn world_angular_velocity_to_render(w: &Vector3<f64>) -> Vector3<f64> {
    -world_direction_to_render(w)
}

#[inline]
pub fn render_angular_velocity_to_world(w: &Vector3<f64>) -> Vector3<f64> {
    -render_direction_to_world(w)
}

/// Estimator camera point to render camera: y negation.
#[inline]
pub fn camera_point_to_render(p: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(p.x, -p.y, p.z)
}

#[inline]
pub fn render_point_to_camera(p: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(p.x, -p.y, p.z)
}

/// Camera-to-world orientation across the handedness flip.
///
/// render_camera -> render_world
///   = est_world -> render_world · est_camera -> est_world · render_camera -> est_camera
///
/// Conjugating by the reflections keeps the determinant at +1, so the result
/// extracts back into a quaternion.
pub fn camera_to_world_quaternion_to_render(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    let r = q.to_rotation_matrix().into_inner();
    let m = world_basis() * r * camera_basis().transpose();
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m))
}

/// Inverse of [`camera_to_world_quaternion_to_render`].
pub fn render_camera_to_world_quaternion_to_vio(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    let r = q.to_rotation_matrix().into_inner();
    let m = world_basis().transpose() * r * camera_basis();
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m))
}

/// Estimator camera-to-world pose matrix to the render frame.
pub fn camera_to_world_matrix_to_render(m: &Matrix4<f64>) -> Matrix4<f64> {
    world_basis().to_homogeneous() * m * camera_basis().transpose().to_homogeneous()
}

/// Render camera-to-world pose matrix to the estimator frame.
pub fn camera_to_world_matrix_to_vio(m: &Matrix4<f64>) -> Matrix4<f64> {
    world_basis().transpose().to_homogeneous() * m * camera_basis().to_homogeneous()
}

/// Render marker-to-world pose matrix to the estimator frame (external marker
/// path, e.g. fiducial tags placed in the render scene).
pub fn marker_to_world_matrix_to_vio(m: &Matrix4<f64>) -> Matrix4<f64> {
    world_basis().transpose().to_homogeneous() * m * marker_basis().transpose().to_homogeneous()
}

/// Inverse of [`marker_to_world_matrix_to_vio`].
pub fn marker_to_world_matrix_to_render(m: &Matrix4<f64>) -> Matrix4<f64> {
    world_basis().to_homogeneous() * m * marker_basis().to_homogeneous()
}

/// Homogeneous rigid transform from a position and orientation.
pub fn pose_matrix(position: &Vector3<f64>, orientation: &UnitQuaternion<f64>) -> Matrix4<f64> {
    let mut m = orientation.to_rotation_matrix().to_homogeneous();
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(position);
    m
}

//! Constant-velocity dead reckoning for position and orientation.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Angular speed (rad/s) below which orientation prediction is a no-op; the
/// axis `w / |w|` is numerically meaningless there.
const MIN_ANGULAR_SPEED: f64 = 1e-4;

/// First-order constant-velocity position extrapolation. Non-positive `dt`
/// returns the input unchanged; prediction never runs backward.
pub fn predict_position(position: &Vector3<f64>, velocity: &Vector3<f64>, dt: f64) -> Vector3<f64> {
    if dt <= 0.0 {
        return *position;
    }
    position + velocity * dt
}

/// Exact constant-angular-velocity orientation extrapolation.
///
/// `q` is a local-to-world rotation and `w` a constant angular velocity in
/// the world frame. The closed-form quaternion exponential assumes the
/// world-to-local convention, so the input is inverted, composed with the
/// incremental quaternion
///
/// ```text
/// p = ( cos(|w| dt / 2), -w/|w| sin(|w| dt / 2) )
/// ```
///
/// and inverted back. Non-positive `dt` and near-zero `|w|` return the input
/// unchanged.
pub fn predict_orientation(
    q: &UnitQuaternion<f64>,
    w: &Vector3<f64>,
    dt: f64,
) -> UnitQuaternion<f64> {
    if dt <= 0.0 {
        return *q;
    }
    let w_norm = w.norm();
    if w_norm < MIN_ANGULAR_SPEED {
        return *q;
    }

    // Upstream marshaling may have accumulated rounding drift; renormalize
    // before integrating.
    let q = UnitQuaternion::new_normalize(q.into_inner());

    let (s, c) = (w_norm * dt * 0.5).sin_cos();
    let axis = w / w_norm;
    // Unit by construction: cos^2 + sin^2 = 1.
    let p = UnitQuaternion::new_unchecked(Quaternion::new(c, -axis.x * s, -axis.y * s, -axis.z * s));

    (q.inverse() * p).inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_position_identity_cases() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        let v = Vector3::new(0.5, 0.0, -0.5);
        assert_relative_eq!(predict_position(&p, &v, 0.0), p);
        assert_relative_eq!(predict_position(&p, &v, -0.1), p);
    }

    #[test]
    fn test_position_linear_extrapolation() {
        let p = Vector3::new(1.0, 0.0, 0.0);
        let v = Vector3::new(0.0, 2.0, 0.0);
        assert_relative_eq!(
            predict_position(&p, &v, 0.5),
            Vector3::new(1.0, 1.0, 0.0)
        );
    }

    #[test]
    fn test_orientation_identity_cases() {
        let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let w = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(predict_orientation(&q, &w, 0.0), q);
        assert_eq!(predict_orientation(&q, &w, -0.5), q);
        assert_eq!(predict_orientation(&q, &Vector3::zeros(), 0.1), q);
        // Below the angular speed threshold the input passes through.
        assert_eq!(
            predict_orientation(&q, &Vector3::new(0.0, 5e-5, 0.0), 0.1),
            q
        );
    }

    #[test]
    fn test_orientation_matches_axis_angle_from_identity() {
        // From the identity, constant world-frame angular velocity about z
        // for dt seconds is exactly a rotation of |w| dt about z.
        let w = Vector3::new(0.0, 0.0, 2.0);
        let dt = 0.25;
        let predicted = predict_orientation(&UnitQuaternion::identity(), &w, dt);
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 2.0 * dt);
        assert!(predicted.angle_to(&expected) < 1e-12);
    }

    #[test]
    fn test_orientation_reversible_under_negated_rate() {
        let q = UnitQuaternion::from_euler_angles(0.4, -0.2, 0.9);
        let w = Vector3::new(0.3, -1.0, 0.5);
        let dt = 0.1;
        let forward = predict_orientation(&q, &w, dt);
        let back = predict_orientation(&forward, &-w, dt);
        assert!(back.angle_to(&q) < 1e-12);
    }

    #[test]
    fn test_orientation_converges_as_rate_vanishes() {
        let q = UnitQuaternion::from_euler_angles(-0.3, 0.6, 0.1);
        let dt = 0.2;
        let mut scale = 1.0;
        let mut last_angle = f64::MAX;
        for _ in 0..8 {
            let w = Vector3::new(0.2, 0.1, -0.3) * scale;
            let angle = predict_orientation(&q, &w, dt).angle_to(&q);
            assert!(angle <= last_angle);
            last_angle = angle;
            scale *= 0.5;
        }
        assert!(last_angle < 1e-3);
    }
}

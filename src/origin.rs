use nalgebra::{Matrix3, Matrix4, UnitQuaternion, Vector3};

/// Rigid transform that re-expresses smoothed world poses relative to a
/// user-chosen reference frame.
///
/// Identity by default; mutated only by [`OriginRebaser::reset`]. A reset
/// preserves just the position and yaw (heading about render-up) of both the
/// current pose and the reference, so the consumer's up axis stays
/// gravity-aligned no matter how the device is tilted at reset time. It takes
/// effect for subsequently applied poses only; already-delivered poses are
/// never altered.
#[derive(Debug, Clone)]
pub struct OriginRebaser {
    rotation: UnitQuaternion<f64>,
    translation: Vector3<f64>,
}

impl Default for OriginRebaser {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginRebaser {
    pub fn new() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Redefine "home" so that `current_pose` maps onto `reference` (identity
    /// if `None`): `origin = yaw(reference) * yaw(current)^-1`, both matrices
    /// stripped to translation plus yaw-only rotation. Idempotent for equal
    /// inputs. Both matrices are render-frame rigid transforms.
    pub fn reset(&mut self, current_pose: &Matrix4<f64>, reference: Option<&Matrix4<f64>>) {
        let current = PositionYaw::from_matrix(current_pose);
        let reference = reference.map_or_else(PositionYaw::identity, PositionYaw::from_matrix);

        self.rotation = reference.yaw * current.yaw.inverse();
        self.translation = reference.position - self.rotation * current.position;
        log::info!(
            "origin reset: translation [{:.3}, {:.3}, {:.3}], heading {:.1} deg",
            self.translation.x,
            self.translation.y,
            self.translation.z,
            self.rotation.angle().to_degrees()
        );
    }

    /// Apply the origin transform to a smoothed render-frame pose.
    pub fn apply(
        &self,
        position: &Vector3<f64>,
        orientation: &UnitQuaternion<f64>,
    ) -> (Vector3<f64>, UnitQuaternion<f64>) {
        (
            self.rotation * position + self.translation,
            self.rotation * orientation,
        )
    }
}

/// A rigid transform stripped to its translation and heading about render-up
/// (+y); pitch and roll are discarded.
struct PositionYaw {
    position: Vector3<f64>,
    yaw: UnitQuaternion<f64>,
}

impl PositionYaw {
    fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            yaw: UnitQuaternion::identity(),
        }
    }

    fn from_matrix(m: &Matrix4<f64>) -> Self {
        let position = m.fixed_view::<3, 1>(0, 3).into_owned();
        let rotation: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
        // Heading of the render-forward (+z) axis, projected on the ground
        // plane; +z maps to yaw 0.
        let forward = rotation * Vector3::z();
        let yaw_angle = forward.x.atan2(forward.z);
        Self {
            position,
            yaw: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw_angle),
        }
    }
}

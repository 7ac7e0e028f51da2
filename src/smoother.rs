use nalgebra::{UnitQuaternion, Vector3};

use crate::predict;
use crate::types::{PoseSample, TrackingStatus};

/// Exponential pose smoother driven by the estimator's tracking status.
///
/// While tracking, each sample is first dead-reckoned forward by `predict_dt`
/// and the smoothed state then blends geometrically toward the prediction
/// with factor `alpha` (1.0 = passthrough, no delay). Prediction runs before
/// smoothing; swapping the order changes observable motion characteristics.
///
/// No output is produced while the estimator is not tracking. When tracking
/// resumes, the smoothed state re-seeds from the first raw tracked pose and
/// that pose is emitted unblended, so stale state from before the loss can
/// never bleed into the new track.
#[derive(Debug)]
pub struct PoseSmoother {
    alpha: f64,
    predict_dt: f64,
    prev_status: TrackingStatus,
    position: Vector3<f64>,
    orientation: UnitQuaternion<f64>,
}

impl PoseSmoother {
    pub fn new(alpha: f64, predict_dt: f64) -> Self {
        Self {
            alpha,
            predict_dt,
            prev_status: TrackingStatus::Init,
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Feed one sample; render-frame fields are read through the sample's
    /// accessors. Returns the smoothed render-frame pose, or `None` while the
    /// estimator is not tracking.
    pub fn update(&mut self, sample: &PoseSample) -> Option<(Vector3<f64>, UnitQuaternion<f64>)> {
        if sample.status != TrackingStatus::Tracking {
            self.prev_status = sample.status;
            return None;
        }

        let raw_position = sample.render_position();
        let raw_orientation = sample.render_orientation();

        if self.prev_status != TrackingStatus::Tracking {
            self.prev_status = TrackingStatus::Tracking;
            self.position = raw_position;
            self.orientation = raw_orientation;
            return Some((self.position, self.orientation));
        }

        let predicted_position =
            predict::predict_position(&raw_position, &sample.render_velocity(), self.predict_dt);
        let predicted_orientation = predict::predict_orientation(
            &raw_orientation,
            &sample.render_angular_velocity(),
            self.predict_dt,
        );

        self.position = self.position.lerp(&predicted_position, self.alpha);
        self.orientation = self.orientation.slerp(&predicted_orientation, self.alpha);
        Some((self.position, self.orientation))
    }

    /// Last smoothed pose, if a tracked sample has been seen.
    pub fn current(&self) -> Option<(Vector3<f64>, UnitQuaternion<f64>)> {
        if self.prev_status == TrackingStatus::Tracking {
            Some((self.position, self.orientation))
        } else {
            None
        }
    }
}

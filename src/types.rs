use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use std::collections::HashMap;
use std::sync::Arc;

use crate::frames;

/// 6-DoF pose tracking status reported by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    /// Tracking is starting up and not yet accurate.
    Init,
    /// Tracking is accurate (but not globally referenced).
    Tracking,
    /// Tracking has failed. Outputs resume once the estimator recovers.
    Lost,
}

/// One estimator output sample, in the estimator's native coordinate
/// convention. Immutable after creation; ownership moves through the pipeline
/// on dequeue.
#[derive(Debug, Clone)]
pub struct PoseSample {
    /// Monotonic timestamp in seconds, in the clock used for input sensor data.
    pub timestamp: f64,
    /// Device position in the estimator world frame.
    pub position: Vector3<f64>,
    /// Camera-to-world orientation in the estimator convention.
    pub orientation: UnitQuaternion<f64>,
    /// Linear velocity (m/s) in the estimator world frame.
    pub velocity: Vector3<f64>,
    /// Angular velocity (rad/s) in the estimator world frame.
    pub angular_velocity: Vector3<f64>,
    pub status: TrackingStatus,
    /// Input frame tag. After queue drops the consumer sees gaps here.
    pub tag: i32,
}

impl PoseSample {
    /// Position in render-frame coordinates. Computed per call; the sample
    /// itself stays in the estimator convention.
    pub fn render_position(&self) -> Vector3<f64> {
        frames::world_point_to_render(&self.position)
    }

    /// Camera-to-world orientation in render-frame coordinates.
    pub fn render_orientation(&self) -> UnitQuaternion<f64> {
        frames::camera_to_world_quaternion_to_render(&self.orientation)
    }

    /// Linear velocity in render-frame coordinates.
    pub fn render_velocity(&self) -> Vector3<f64> {
        frames::world_direction_to_render(&self.velocity)
    }

    /// Angular velocity in render-frame coordinates (pseudovector rule).
    pub fn render_angular_velocity(&self) -> Vector3<f64> {
        frames::world_angular_velocity_to_render(&self.angular_velocity)
    }

    /// Camera-to-world pose as a render-frame homogeneous matrix.
    pub fn render_matrix(&self) -> Matrix4<f64> {
        frames::pose_matrix(&self.render_position(), &self.render_orientation())
    }
}

/// Fully processed pose delivered to the rendering/application layer:
/// frame-converted, predicted, smoothed and origin-rebased.
#[derive(Debug, Clone, Copy)]
pub struct WorldPose {
    pub timestamp: f64,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub tag: i32,
}

/// Keyframe identifier. Unique, assigned in strictly increasing order at
/// creation time, never reused.
pub type KeyFrameId = i64;

/// A retained landmark camera frame anchoring the sparse map. The pose may be
/// refined by later map updates referencing the same id.
#[derive(Debug, Clone)]
pub struct KeyFrame {
    pub id: KeyFrameId,
    /// Primary-frame camera position in the estimator world frame.
    pub position: Vector3<f64>,
    /// Primary-frame camera-to-world orientation, estimator convention.
    pub orientation: UnitQuaternion<f64>,
    /// Angular velocity at capture time, estimator world frame.
    pub angular_velocity: Vector3<f64>,
    pub point_cloud: Option<Arc<PointCloud>>,
}

impl KeyFrame {
    /// Keyframe position in render-frame coordinates.
    pub fn render_position(&self) -> Vector3<f64> {
        frames::world_point_to_render(&self.position)
    }

    /// Keyframe orientation in render-frame coordinates.
    pub fn render_orientation(&self) -> UnitQuaternion<f64> {
        frames::camera_to_world_quaternion_to_render(&self.orientation)
    }

    /// True when a non-empty point cloud is attached. Keyframes without one
    /// are still tracked structurally.
    pub fn has_point_cloud(&self) -> bool {
        self.point_cloud.as_ref().is_some_and(|pc| !pc.is_empty())
    }
}

/// Sparse 3-D points attached to a keyframe, in camera coordinates.
/// Immutable once attached.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub positions: Vec<Vector3<f32>>,
    pub normals: Option<Vec<Vector3<f32>>>,
    /// Per-point RGB24 colors.
    pub colors: Option<Vec<[u8; 3]>>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }
}

/// One mapper output. An id listed in `updated_key_frames` but missing from
/// `map` means the keyframe was removed.
#[derive(Debug, Clone)]
pub struct MapUpdate {
    pub map: HashMap<KeyFrameId, Arc<KeyFrame>>,
    /// Added, moved or removed keyframe ids, oldest to newest.
    pub updated_key_frames: Vec<KeyFrameId>,
    /// No further updates will arrive for this session.
    pub final_map: bool,
}

/// Result of reconciling one [`MapUpdate`] against the live map: the keyframe
/// views the consumer has to create, move or destroy.
#[derive(Debug, Clone, Default)]
pub struct MapDelta {
    pub added: Vec<Arc<KeyFrame>>,
    pub updated: Vec<Arc<KeyFrame>>,
    pub removed: Vec<KeyFrameId>,
    /// Forwarded from the update; callers may use it to trigger finalization.
    pub final_map: bool,
}

impl MapDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

use crate::{Result, VioPipeError};

/// Tuning surface for a [`crate::Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Smoothing factor in [0.001, 1.0]. The smoothed pose blends toward the
    /// predicted pose as `prev.lerp(predicted, alpha)`; 1.0 disables smoothing,
    /// lower values reduce jitter at the cost of added latency.
    pub smoothing_alpha: f64,
    /// Constant-velocity prediction horizon in seconds, [0.0, 0.2].
    pub predict_dt: f64,
    /// Capacity of the pose and map-update handoff queues.
    pub queue_capacity: usize,
    /// Reset position and yaw to the identity origin on the first tracked
    /// sample, instead of waiting for a manual reset call.
    pub reset_on_first_track: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 1.0,
            predict_dt: 0.0,
            queue_capacity: crate::queue::HandoffQueue::<()>::DEFAULT_CAPACITY,
            reset_on_first_track: false,
        }
    }
}

impl SessionConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(0.001..=1.0).contains(&self.smoothing_alpha) {
            return Err(VioPipeError::InvalidConfig(
                "smoothing_alpha must be in [0.001, 1.0]",
            ));
        }
        if !(0.0..=0.2).contains(&self.predict_dt) {
            return Err(VioPipeError::InvalidConfig(
                "predict_dt must be in [0.0, 0.2] seconds",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(VioPipeError::InvalidConfig(
                "queue_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::queue::HandoffQueue;
use crate::types::{MapUpdate, PoseSample};
use crate::Result;

/// Producer-side handle the estimation engine pushes its output through.
///
/// Clonable and thread-safe; pushes never block the engine's callback
/// threads. Under a slow consumer the oldest unconsumed output is silently
/// dropped (observable through the session's drop counters).
#[derive(Clone)]
pub struct OutputSink {
    pub(crate) poses: Arc<HandoffQueue<PoseSample>>,
    pub(crate) maps: Arc<HandoffQueue<MapUpdate>>,
    pub(crate) wakeup: Sender<()>,
}

impl OutputSink {
    pub fn push_pose(&self, sample: PoseSample) {
        self.poses.push(sample);
        // Latch-style wakeup for the blocking wait variant; a full channel
        // already means a wakeup is pending.
        let _ = self.wakeup.try_send(());
    }

    pub fn push_map_update(&self, update: MapUpdate) {
        self.maps.push(update);
    }
}

/// Boundary to the external estimation engine. Feature tracking, sensor
/// fusion and the SLAM back end are black boxes behind this trait; the
/// pipeline only sees the timestamped output they emit.
pub trait VioEngine: Send {
    /// Wire the engine's output callbacks/threads to `sink` and start
    /// producing. Must return synchronously; a configuration or device
    /// failure is reported as [`crate::VioPipeError::EngineStart`] and is
    /// fatal to that session only.
    fn start(&mut self, sink: OutputSink) -> Result<()>;

    /// Signal the engine to cease pushing. The engine must not push after
    /// this returns.
    fn stop(&mut self);
}

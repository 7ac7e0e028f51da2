use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use nalgebra::Matrix4;

use crate::config::SessionConfig;
use crate::engine::{OutputSink, VioEngine};
use crate::frames;
use crate::map::MapReconciler;
use crate::origin::OriginRebaser;
use crate::queue::HandoffQueue;
use crate::smoother::PoseSmoother;
use crate::types::{MapDelta, MapUpdate, PoseSample, WorldPose};
use crate::{Result, VioPipeError};

/// A running estimator session and its consumer-side processing state.
///
/// The engine pushes output from its own threads; every method here belongs
/// to the single consumer loop. `poll_pose` and `poll_map_delta` return
/// immediately whether or not output is buffered; absence of output is a
/// normal state, not a suspension point.
pub struct Session {
    engine: Box<dyn VioEngine>,
    poses: Arc<HandoffQueue<PoseSample>>,
    maps: Arc<HandoffQueue<MapUpdate>>,
    wakeup: Receiver<()>,
    smoother: PoseSmoother,
    rebaser: OriginRebaser,
    reconciler: MapReconciler,
    /// Outer: a rebase is pending. Inner: the reference transform, identity
    /// if `None`.
    pending_reset: Option<Option<Matrix4<f64>>>,
    stopped: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pending_reset", &self.pending_reset)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Validate `config`, wire the output sink and start `engine`.
    ///
    /// Engine-start failures surface synchronously and are fatal to this
    /// session only.
    pub fn start(mut engine: Box<dyn VioEngine>, config: SessionConfig) -> Result<Session> {
        config.validate()?;

        let poses = Arc::new(HandoffQueue::new(config.queue_capacity));
        let maps = Arc::new(HandoffQueue::new(config.queue_capacity));
        let (wakeup_tx, wakeup_rx) = crossbeam_channel::bounded(1);

        engine.start(OutputSink {
            poses: Arc::clone(&poses),
            maps: Arc::clone(&maps),
            wakeup: wakeup_tx,
        })?;
        log::info!(
            "vio session started (queue capacity {}, alpha {}, predict dt {}s)",
            config.queue_capacity,
            config.smoothing_alpha,
            config.predict_dt
        );

        Ok(Session {
            engine,
            poses,
            maps,
            wakeup: wakeup_rx,
            smoother: PoseSmoother::new(config.smoothing_alpha, config.predict_dt),
            rebaser: OriginRebaser::new(),
            reconciler: MapReconciler::new(),
            pending_reset: config.reset_on_first_track.then_some(None),
            stopped: false,
        })
    }

    /// Take the next buffered pose sample, if any, and run it through the
    /// full chain: frame conversion, prediction, smoothing, origin rebasing.
    /// Returns `None` while nothing is buffered or the estimator is not
    /// tracking. Never blocks.
    pub fn poll_pose(&mut self) -> Result<Option<WorldPose>> {
        self.check_stopped()?;
        let Some(sample) = self.poses.try_pop() else {
            return Ok(None);
        };
        Ok(self.process(sample))
    }

    /// Block until the next tracked pose is processed or `timeout` elapses.
    ///
    /// Only for callers that explicitly opt into blocking semantics, such as
    /// offline batch consumption; never call this from the real-time loop.
    pub fn wait_for_pose(&mut self, timeout: Duration) -> Result<WorldPose> {
        self.check_stopped()?;
        let deadline = Instant::now() + timeout;
        loop {
            while let Some(sample) = self.poses.try_pop() {
                if let Some(pose) = self.process(sample) {
                    return Ok(pose);
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(VioPipeError::Timeout);
            }
            match self.wakeup.recv_timeout(deadline - now) {
                Ok(()) => {}
                Err(RecvTimeoutError::Timeout) => return Err(VioPipeError::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(VioPipeError::StreamStopped),
            }
        }
    }

    /// Take the next buffered map update, if any, and reconcile it against
    /// the live map. Never blocks.
    pub fn poll_map_delta(&mut self) -> Result<Option<MapDelta>> {
        self.check_stopped()?;
        let Some(update) = self.maps.try_pop() else {
            return Ok(None);
        };
        Ok(Some(self.reconciler.apply(update)))
    }

    /// Request an origin rebase: the position and yaw of the next tracked
    /// pose are mapped onto `reference` (identity if `None`, i.e. zero
    /// position and heading), in render-frame coordinates. Takes effect from
    /// the next consumed sample; already-delivered poses are not altered.
    pub fn reset_origin(&mut self, reference: Option<Matrix4<f64>>) -> Result<()> {
        self.check_stopped()?;
        self.pending_reset = Some(reference);
        Ok(())
    }

    /// The live reconciled map.
    pub fn map(&self) -> &MapReconciler {
        &self.reconciler
    }

    /// Pose samples discarded under backpressure so far.
    pub fn dropped_poses(&self) -> u64 {
        self.poses.dropped()
    }

    /// Map updates discarded under backpressure so far.
    pub fn dropped_map_updates(&self) -> u64 {
        self.maps.dropped()
    }

    /// Stop the engine and discard all buffered output so nothing leaks into
    /// a later session. Safe to call more than once; any other use after stop
    /// fails fast with [`VioPipeError::SessionStopped`].
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.engine.stop();
        self.poses.clear();
        self.maps.clear();
        let (pose_drops, map_drops) = (self.poses.dropped(), self.maps.dropped());
        if pose_drops > 0 || map_drops > 0 {
            log::warn!(
                "vio session stopped with backpressure drops ({} poses, {} map updates)",
                pose_drops,
                map_drops
            );
        } else {
            log::info!("vio session stopped");
        }
    }

    fn process(&mut self, sample: PoseSample) -> Option<WorldPose> {
        let (position, orientation) = self.smoother.update(&sample)?;

        if let Some(reference) = self.pending_reset.take() {
            let current = frames::pose_matrix(&position, &orientation);
            self.rebaser.reset(&current, reference.as_ref());
        }

        let (position, orientation) = self.rebaser.apply(&position, &orientation);
        Some(WorldPose {
            timestamp: sample.timestamp,
            position,
            orientation,
            tag: sample.tag,
        })
    }

    fn check_stopped(&self) -> Result<()> {
        if self.stopped {
            return Err(VioPipeError::SessionStopped);
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackingStatus;
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    /// Engine stub that hands its sink back to the test.
    struct StubEngine {
        sink: Arc<std::sync::Mutex<Option<OutputSink>>>,
    }

    impl StubEngine {
        fn new() -> (Box<Self>, Arc<std::sync::Mutex<Option<OutputSink>>>) {
            let sink = Arc::new(std::sync::Mutex::new(None));
            let engine = Box::new(StubEngine {
                sink: Arc::clone(&sink),
            });
            (engine, sink)
        }
    }

    impl VioEngine for StubEngine {
        fn start(&mut self, sink: OutputSink) -> Result<()> {
            *self.sink.lock().unwrap() = Some(sink);
            Ok(())
        }

        fn stop(&mut self) {}
    }

    struct FailingEngine;

    impl VioEngine for FailingEngine {
        fn start(&mut self, _sink: OutputSink) -> Result<()> {
            Err(VioPipeError::EngineStart("no device".into()))
        }

        fn stop(&mut self) {}
    }

    fn tracked_sample(timestamp: f64, position: Vector3<f64>) -> PoseSample {
        PoseSample {
            timestamp,
            position,
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            status: TrackingStatus::Tracking,
            tag: 0,
        }
    }

    fn start_session(config: SessionConfig) -> (Session, OutputSink) {
        let (engine, sink) = StubEngine::new();
        let session = Session::start(engine, config).unwrap();
        let sink = sink.lock().unwrap().take().unwrap();
        (session, sink)
    }

    #[test]
    fn test_engine_start_failure_is_fatal() {
        let err = Session::start(Box::new(FailingEngine), SessionConfig::default()).unwrap_err();
        assert!(matches!(err, VioPipeError::EngineStart(_)));
    }

    #[test]
    fn test_invalid_config_rejected_before_engine_start() {
        let (engine, sink) = StubEngine::new();
        let config = SessionConfig {
            smoothing_alpha: 2.0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            Session::start(engine, config),
            Err(VioPipeError::InvalidConfig(_))
        ));
        // The engine was never started.
        assert!(sink.lock().unwrap().is_none());
    }

    #[test]
    fn test_poll_empty_returns_none() {
        let (mut session, _sink) = start_session(SessionConfig::default());
        assert!(session.poll_pose().unwrap().is_none());
        assert!(session.poll_map_delta().unwrap().is_none());
    }

    #[test]
    fn test_poll_converts_to_render_frame() {
        let (mut session, sink) = start_session(SessionConfig::default());
        sink.push_pose(tracked_sample(1.0, Vector3::new(1.0, 2.0, 3.0)));

        let pose = session.poll_pose().unwrap().unwrap();
        assert_relative_eq!(pose.position, Vector3::new(1.0, 3.0, 2.0));
        assert_relative_eq!(pose.timestamp, 1.0);
    }

    #[test]
    fn test_untracked_samples_produce_no_pose() {
        let (mut session, sink) = start_session(SessionConfig::default());
        let mut sample = tracked_sample(0.5, Vector3::zeros());
        sample.status = TrackingStatus::Init;
        sink.push_pose(sample);

        // Consumed, but nothing emitted.
        assert!(session.poll_pose().unwrap().is_none());
        assert!(session.poll_pose().unwrap().is_none());
    }

    #[test]
    fn test_reset_on_first_track_zeroes_position() {
        let config = SessionConfig {
            reset_on_first_track: true,
            ..SessionConfig::default()
        };
        let (mut session, sink) = start_session(config);
        sink.push_pose(tracked_sample(0.0, Vector3::new(4.0, -1.0, 2.0)));

        let pose = session.poll_pose().unwrap().unwrap();
        assert_relative_eq!(pose.position, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_manual_reset_applies_from_next_sample() {
        let (mut session, sink) = start_session(SessionConfig::default());
        sink.push_pose(tracked_sample(0.0, Vector3::new(1.0, 0.0, 0.0)));
        let before = session.poll_pose().unwrap().unwrap();
        assert_relative_eq!(before.position, Vector3::new(1.0, 0.0, 0.0));

        session.reset_origin(None).unwrap();
        sink.push_pose(tracked_sample(0.1, Vector3::new(1.0, 0.0, 0.0)));
        let after = session.poll_pose().unwrap().unwrap();
        assert_relative_eq!(after.position, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_map_updates_flow_through_reconciler() {
        use crate::types::{KeyFrame, MapUpdate};
        use std::collections::HashMap;

        let (mut session, sink) = start_session(SessionConfig::default());
        let kf = Arc::new(KeyFrame {
            id: 7,
            position: Vector3::new(0.0, 0.0, 1.0),
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
            point_cloud: None,
        });
        sink.push_map_update(MapUpdate {
            map: HashMap::from([(7, kf)]),
            updated_key_frames: vec![7],
            final_map: false,
        });

        let delta = session.poll_map_delta().unwrap().unwrap();
        assert_eq!(delta.added.len(), 1);
        assert!(session.map().contains(7));
    }

    #[test]
    fn test_wait_for_pose_wakes_on_push() {
        let (mut session, sink) = start_session(SessionConfig::default());
        let producer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            sink.push_pose(tracked_sample(2.0, Vector3::new(0.0, 1.0, 0.0)));
        });

        let pose = session.wait_for_pose(Duration::from_secs(2)).unwrap();
        assert_relative_eq!(pose.timestamp, 2.0);
        producer.join().unwrap();
    }

    #[test]
    fn test_wait_for_pose_times_out() {
        let (mut session, _sink) = start_session(SessionConfig::default());
        let err = session.wait_for_pose(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, VioPipeError::Timeout));
    }

    #[test]
    fn test_use_after_stop_fails_fast() {
        let (mut session, sink) = start_session(SessionConfig::default());
        sink.push_pose(tracked_sample(0.0, Vector3::zeros()));

        session.stop();
        session.stop(); // idempotent

        assert!(matches!(
            session.poll_pose(),
            Err(VioPipeError::SessionStopped)
        ));
        assert!(matches!(
            session.poll_map_delta(),
            Err(VioPipeError::SessionStopped)
        ));
        assert!(matches!(
            session.reset_origin(None),
            Err(VioPipeError::SessionStopped)
        ));
    }
}

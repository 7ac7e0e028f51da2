//! Poll a synthetic estimator session and print processed poses.
//!
//! Run with: cargo run --example stream

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector3};
use viopipe::{OutputSink, PoseSample, Session, SessionConfig, TrackingStatus, VioEngine};

/// Synthetic engine: a producer thread emitting a circular trajectory at
/// 100 Hz in the estimator's native convention.
struct CircleEngine {
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CircleEngine {
    fn new() -> Self {
        Self {
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }
}

impl VioEngine for CircleEngine {
    fn start(&mut self, sink: OutputSink) -> viopipe::Result<()> {
        let stop_flag = Arc::clone(&self.stop_flag);
        self.thread = Some(std::thread::spawn(move || {
            let omega = 0.5; // rad/s about the estimator's up axis (z)
            let radius = 2.0;
            let mut t = 0.0;
            let mut tag = 0;
            while !stop_flag.load(Ordering::Relaxed) {
                let angle: f64 = omega * t;
                let sample = PoseSample {
                    timestamp: t,
                    position: Vector3::new(radius * angle.cos(), radius * angle.sin(), 1.2),
                    orientation: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
                    velocity: Vector3::new(
                        -radius * omega * angle.sin(),
                        radius * omega * angle.cos(),
                        0.0,
                    ),
                    angular_velocity: Vector3::new(0.0, 0.0, omega),
                    status: if t < 0.5 {
                        TrackingStatus::Init
                    } else {
                        TrackingStatus::Tracking
                    },
                    tag,
                };
                sink.push_pose(sample);
                tag += 1;
                t += 0.01;
                std::thread::sleep(Duration::from_millis(10));
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn main() {
    env_logger::init();

    let config = SessionConfig {
        smoothing_alpha: 0.3,
        predict_dt: 0.02,
        reset_on_first_track: true,
        ..SessionConfig::default()
    };
    let mut session = Session::start(Box::new(CircleEngine::new()), config).unwrap();

    // Consumer loop: one poll per "frame" at ~60 Hz.
    for frame in 0..300 {
        if let Some(pose) = session.poll_pose().unwrap() {
            println!(
                "t={:7.3}s tag={:4} pos=[{:6.3} {:6.3} {:6.3}]",
                pose.timestamp, pose.tag, pose.position.x, pose.position.y, pose.position.z
            );
        }
        if frame == 150 {
            println!("-- origin reset --");
            session.reset_origin(None).unwrap();
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    println!("dropped under backpressure: {}", session.dropped_poses());
    session.stop();
}

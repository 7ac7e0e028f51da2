//! Consume incremental sparse-map updates from a synthetic mapper.
//!
//! Run with: cargo run --example mapping

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector3};
use viopipe::{KeyFrame, KeyFrameId, MapUpdate, OutputSink, Session, SessionConfig, VioEngine};

fn key_frame(id: KeyFrameId, along: f64) -> Arc<KeyFrame> {
    Arc::new(KeyFrame {
        id,
        position: Vector3::new(along, 0.0, 0.0),
        orientation: UnitQuaternion::identity(),
        angular_velocity: Vector3::zeros(),
        point_cloud: None,
    })
}

/// Synthetic mapper: grows a key frame trail, occasionally revises old
/// frames and culls the tail, then marks the last update final.
struct TrailMapper {
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl TrailMapper {
    fn new() -> Self {
        Self {
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }
}

impl VioEngine for TrailMapper {
    fn start(&mut self, sink: OutputSink) -> viopipe::Result<()> {
        let stop_flag = Arc::clone(&self.stop_flag);
        self.thread = Some(std::thread::spawn(move || {
            let mut map: HashMap<KeyFrameId, Arc<KeyFrame>> = HashMap::new();
            let mut next_id: KeyFrameId = 0;
            for round in 0..20 {
                if stop_flag.load(Ordering::Relaxed) {
                    return;
                }
                let mut updated = Vec::new();

                // Two new frames per round.
                for _ in 0..2 {
                    map.insert(next_id, key_frame(next_id, next_id as f64 * 0.5));
                    updated.push(next_id);
                    next_id += 1;
                }
                // Every third round a bundle adjustment nudges the oldest
                // surviving frame and the very oldest is culled.
                if round % 3 == 2 {
                    if let Some(&oldest) = map.keys().min() {
                        map.remove(&oldest);
                        updated.push(oldest);
                    }
                    if let Some(&oldest) = map.keys().min() {
                        map.insert(oldest, key_frame(oldest, oldest as f64 * 0.5 + 0.01));
                        updated.push(oldest);
                    }
                }

                sink.push_map_update(MapUpdate {
                    map: map.clone(),
                    updated_key_frames: updated,
                    final_map: round == 19,
                });
                std::thread::sleep(Duration::from_millis(50));
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

    let mut session = Session::start(Box::new(TrailMapper::new()), SessionConfig::default()).unwrap();

    loop {
        match session.poll_map_delta().unwrap() {
            Some(delta) => {
                println!(
                    "delta: +{} ~{} -{} (live map: {} frames)",
                    delta.added.len(),
                    delta.updated.len(),
                    delta.removed.len(),
                    session.map().len()
                );
                if delta.final_map {
                    break;
                }
            }
            None => std::thread::sleep(Duration::from_millis(20)),
        }
    }

    for kf in session.map().key_frames() {
        println!("key frame {:3} at x={:5.2}", kf.id, kf.render_position().x);
    }
    session.stop();
}

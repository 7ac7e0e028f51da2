//! # viopipe - consumer-side pipeline for 6-DoF visual-inertial estimators
//!
//! Bridges an asynchronous pose/mapping producer to a single-threaded
//! rendering loop with bounded latency. Provides:
//! - Bounded, non-blocking producer-to-consumer handoff with drop-oldest
//!   backpressure
//! - Coordinate conversion between the estimator and render conventions
//!   (including the handedness flip)
//! - Constant-velocity dead reckoning and exponential pose smoothing
//! - User-controlled origin rebasing (position + yaw)
//! - Incremental sparse-map reconciliation
//!
//! ## Quick Start
//! ```no_run
//! use viopipe::{OutputSink, Session, SessionConfig, VioEngine};
//!
//! struct MyEngine;
//!
//! impl VioEngine for MyEngine {
//!     fn start(&mut self, _sink: OutputSink) -> viopipe::Result<()> {
//!         // Spawn the estimator and forward its output through the sink.
//!         Ok(())
//!     }
//!     fn stop(&mut self) {}
//! }
//!
//! let mut session = Session::start(Box::new(MyEngine), SessionConfig::default()).unwrap();
//! loop {
//!     if let Some(pose) = session.poll_pose().unwrap() {
//!         println!("pos: {:?}", pose.position);
//!     }
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod frames;
pub mod map;
pub mod origin;
pub mod predict;
pub mod queue;
pub mod session;
pub mod smoother;
pub mod types;

pub use config::SessionConfig;
pub use engine::{OutputSink, VioEngine};
pub use error::VioPipeError;
pub use map::MapReconciler;
pub use origin::OriginRebaser;
pub use queue::HandoffQueue;
pub use session::Session;
pub use smoother::PoseSmoother;
pub use types::*;

/// Result type alias for viopipe operations.
pub type Result<T> = std::result::Result<T, VioPipeError>;

/// Errors surfaced by the pose pipeline.
///
/// Recoverable conditions never show up here: a queue drop under backpressure
/// is reported through counters and trace logs, and degenerate prediction
/// inputs (near-zero angular velocity, non-positive dt) fall back to the
/// identity. Only caller misuse and session construction failures are errors.
#[derive(Debug, thiserror::Error)]
pub enum VioPipeError {
    /// The session was already stopped; any further use is a caller bug.
    #[error("session already stopped")]
    SessionStopped,

    /// The estimation engine rejected the session (bad configuration, device
    /// unavailable, ...). Fatal to this session only.
    #[error("engine failed to start: {0}")]
    EngineStart(String),

    /// No pose arrived within the deadline of a blocking wait.
    #[error("timeout waiting for pose output")]
    Timeout,

    /// The producer side went away while a blocking wait was pending.
    #[error("pose stream stopped")]
    StreamStopped,

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

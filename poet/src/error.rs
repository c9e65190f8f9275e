//! Error types returned by the control engine's public surface.

use thiserror::Error;

/// Failures reported by [`crate::PoetState::init`].
///
/// Everything at steady state (inside [`crate::PoetState::apply_control`]) is
/// a silent skip rather than an error: the engine must never abort a running
/// application once it has been constructed.
#[derive(Error, Debug)]
pub enum PoetError {
    /// `perf_goal` was not strictly positive.
    #[error("performance goal must be > 0, got {goal}")]
    InvalidPerfGoal {
        /// The rejected value.
        goal: f64,
    },

    /// `num_states` was zero, or the supplied slice didn't match it.
    #[error("num_states must be > 0, got {num_states}")]
    InvalidNumStates {
        /// The rejected value.
        num_states: usize,
    },

    /// Control-state ids were not the consecutive sequence `0..N`.
    #[error("control state ids must be 0..{expected} consecutively, found {found:?}")]
    NonConsecutiveIds {
        /// Number of states supplied.
        expected: usize,
        /// Ids actually observed, in order.
        found: Vec<u32>,
    },

    /// `period` was zero.
    #[error("period must be > 0")]
    InvalidPeriod,

    /// A log path was supplied but `buffer_depth` was zero.
    #[error("buffer_depth must be > 0 when a log path is supplied")]
    InvalidBufferDepth,

    /// The log file could not be opened/truncated.
    #[error("failed to open log file {path}: {source}")]
    LogOpen {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for fallible core operations.
pub type PoetResult<T> = Result<T, PoetError>;

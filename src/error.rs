//! Run-level errors
//!
//! Only conditions that abort a whole run live here. Fixture and case
//! failures are recorded into the [`TestResult`](crate::models::TestResult).

use std::time::Duration;
use thiserror::Error;

use crate::models::Level;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(
        "concurrency level must be between {} and {}, got {level}",
        Level::Root.as_i32(),
        Level::Method.as_i32()
    )]
    ConcurrencyLevel { level: i32 },

    #[error("Test suite is not well-formed: {0}")]
    MalformedSuite(String),

    #[error("Timed out after {timeout:?} waiting for {phase} at {level} level")]
    Timeout {
        phase: Phase,
        level: Level,
        timeout: Duration,
    },

    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Wait barrier a timeout was raised from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    SetUp,
    Body,
    TearDown,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::SetUp => write!(f, "setup"),
            Phase::Body => write!(f, "test bodies"),
            Phase::TearDown => write!(f, "teardown"),
        }
    }
}

impl RunError {
    /// True for errors raised before any test executes
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RunError::ConcurrencyLevel { .. } | RunError::MalformedSuite(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_error_message() {
        let err = RunError::ConcurrencyLevel { level: 5 };
        assert_eq!(
            err.to_string(),
            "concurrency level must be between 0 and 3, got 5"
        );
        assert!(err.is_structural());
    }

    #[test]
    fn test_timeout_is_not_structural() {
        let err = RunError::Timeout {
            phase: Phase::TearDown,
            level: Level::Module,
            timeout: Duration::from_secs(2),
        };
        assert!(!err.is_structural());
        assert!(err.to_string().contains("teardown"));
    }
}

use std::fmt;
use thiserror::Error;

/// Errors that abort an analysis run.
///
/// Only configuration problems are fatal. Record-level problems are counted
/// in the build summary and numerical anomalies are reported as data.
#[derive(Error, Debug)]
pub enum LinkRankError {
    #[error("Invalid damping factor {0}: must lie strictly between 0 and 1")]
    InvalidDamping(f64),

    #[error("Invalid convergence epsilon {0}: must be a positive finite number")]
    InvalidEpsilon(f64),

    #[error("Invalid max iterations: must be at least 1")]
    InvalidMaxIterations,

    #[error("Invalid pagerank threshold {0}: must be a fraction in (0, 1]")]
    InvalidThreshold(f64),

    #[error("Invalid weight {weight} for link location '{location}': must be finite and non-negative")]
    InvalidWeight { location: String, weight: f64 },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, LinkRankError>;

/// Which input sequence a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Page,
    Link,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Page => "page",
            RecordKind::Link => "link",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that lacked a required field and was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} record #{position} is missing required field '{field}'")]
pub struct InputValidationError {
    pub kind: RecordKind,
    pub position: usize,
    pub field: &'static str,
}

//! Error taxonomy of the aggregation engine

use thiserror::Error;

use crate::core::Quantity;
use crate::validation::gate::GateRejection;

/// Failures surfaced while reducing an input stream
///
/// Only [`EngineError::Io`] ends a run. The other variants describe a
/// single line or fix group that was set aside.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A line does not match any expected shape and was ignored
    #[error("line {line} skipped: {reason}")]
    ParseSkip { line: usize, reason: String },

    /// A completed fix group failed the quality gate
    #[error("fix group rejected: {0}")]
    GateReject(#[from] GateRejection),

    /// An aggregator refused a new distinct record
    #[error("{quantity} aggregator is full ({capacity} records)")]
    StorageExhaustion { quantity: Quantity, capacity: usize },

    /// The input stream could not be read
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl EngineError {
    /// Whether the run cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Io { .. })
    }

    /// Short stable name, used as a statistics key
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::ParseSkip { .. } => "parse_skip",
            EngineError::GateReject(_) => "gate_reject",
            EngineError::StorageExhaustion { .. } => "storage_exhaustion",
            EngineError::Io { .. } => "io",
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::Io {
            message: error.to_string(),
        }
    }
}

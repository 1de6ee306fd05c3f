//! Fix admission and error reporting

pub mod error;
pub mod gate;

pub use error::EngineError;
pub use gate::{AdmittedFix, GateRejection, QualityGate};

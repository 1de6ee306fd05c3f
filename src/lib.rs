//! High-precision position aggregation
//!
//! Reduces a stream of repeated GPS fixes, logged as NMEA sentences, to a
//! single best-estimate latitude, longitude and altitude plus a dilution of
//! precision figure. Identical raw readings are deduplicated and counted;
//! each quantity's final value is the occurrence-weighted mean.

pub mod core;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{CoordinateTriple, Fix, MeasurementRecord, Quantity};
pub use crate::processing::{Aggregator, DedupTree, EngineReport, EngineStats, PositionEngine, WeightCalculator};
pub use crate::validation::{EngineError, GateRejection, QualityGate};
pub use crate::utils::{EngineConfig, MissingPdopPolicy};
pub use crate::api::{OutputFormat, ResultFormatter};

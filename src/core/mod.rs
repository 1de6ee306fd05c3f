//! Core types and constants for the position aggregation engine

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;

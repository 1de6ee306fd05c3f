//! Configuration and input discovery

pub mod config;
pub mod scan;

pub use config::{ConfigError, EngineConfig, MissingPdopPolicy};
pub use scan::nmea_files_in;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::core::{
    DEFAULT_LATITUDE_WIDTH, DEFAULT_LONGITUDE_WIDTH, DEFAULT_PDOP_CUTOFF, LATITUDE_DEGREE_DIGITS,
    LONGITUDE_DEGREE_DIGITS, MINUTE_DIGITS,
};

/// What to do with a fix group whose satellite-status sentence carried no PDOP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPdopPolicy {
    /// Discard the group
    Reject,
    /// Admit the group; the DOP aggregator gets nothing from it
    Accept,
}

impl Default for MissingPdopPolicy {
    fn default() -> Self {
        MissingPdopPolicy::Reject
    }
}

/// Engine configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Highest admitted PDOP in centi-units
    pub pdop_cutoff: i64,
    /// Required raw latitude width in characters
    pub latitude_width: usize,
    /// Required raw longitude width in characters
    pub longitude_width: usize,
    /// Handling of groups without a PDOP value
    pub missing_pdop: MissingPdopPolicy,
    /// Maximum distinct records per quantity, unbounded when unset
    pub max_records_per_quantity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pdop_cutoff: DEFAULT_PDOP_CUTOFF,
            latitude_width: DEFAULT_LATITUDE_WIDTH,
            longitude_width: DEFAULT_LONGITUDE_WIDTH,
            missing_pdop: MissingPdopPolicy::default(),
            max_records_per_quantity: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    #[error("I/O error: {message}")]
    IoError { message: String },
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl EngineConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: EngineConfig = serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })
    }

    /// Check every parameter against its valid range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pdop_cutoff <= 0 {
            return Err(invalid("pdop_cutoff", self.pdop_cutoff, "must be positive"));
        }

        // Degrees and minutes must fit before the decimal point
        let min_latitude = LATITUDE_DEGREE_DIGITS + MINUTE_DIGITS;
        if self.latitude_width < min_latitude {
            return Err(invalid(
                "latitude_width",
                self.latitude_width,
                &format!("must be at least {}", min_latitude),
            ));
        }

        let min_longitude = LONGITUDE_DEGREE_DIGITS + MINUTE_DIGITS;
        if self.longitude_width < min_longitude {
            return Err(invalid(
                "longitude_width",
                self.longitude_width,
                &format!("must be at least {}", min_longitude),
            ));
        }

        if self.max_records_per_quantity == Some(0) {
            return Err(invalid("max_records_per_quantity", 0, "must be at least 1 when set"));
        }

        Ok(())
    }

    pub fn with_pdop_cutoff(mut self, cutoff: i64) -> Self {
        self.pdop_cutoff = cutoff;
        self
    }

    pub fn with_widths(mut self, latitude_width: usize, longitude_width: usize) -> Self {
        self.latitude_width = latitude_width;
        self.longitude_width = longitude_width;
        self
    }

    pub fn with_missing_pdop(mut self, policy: MissingPdopPolicy) -> Self {
        self.missing_pdop = policy;
        self
    }

    pub fn with_max_records(mut self, limit: usize) -> Self {
        self.max_records_per_quantity = Some(limit);
        self
    }
}

fn invalid<V: ToString>(parameter: &str, value: V, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

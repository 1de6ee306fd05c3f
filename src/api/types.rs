//! Common output types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Fixed-width console tables
    #[default]
    Text,
    /// Comma-separated record rows
    Csv,
    /// Whole report as JSON
    Json,
    /// Placemark document for mapping tools
    Kml,
}

/// Rendering failures
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("CSV encoding failed: {0}")]
    Csv(String),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<csv::Error> for FormatError {
    fn from(error: csv::Error) -> Self {
        FormatError::Csv(error.to_string())
    }
}

pub type FormatResult<T> = Result<T, FormatError>;

//! Output formats and report rendering

pub mod types;
pub mod formatting;

pub use types::{FormatError, FormatResult, OutputFormat};
pub use formatting::{
    coordinate_string, CsvFormatter, JsonFormatter, KmlFormatter, ResultFormatter, TextFormatter,
};

//! Core data types for the position aggregation engine

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::{ALTITUDE_SCALE, ANGLE_SCALE, DOP_SCALE};

/// Quantity tracked by one aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    Latitude,
    Longitude,
    Altitude,
    Dop,
}

impl Quantity {
    /// All quantities in report order
    pub const ALL: [Quantity; 4] = [
        Quantity::Latitude,
        Quantity::Longitude,
        Quantity::Altitude,
        Quantity::Dop,
    ];

    /// Number of minimal units in one natural unit
    pub fn scale(self) -> f64 {
        match self {
            Quantity::Latitude | Quantity::Longitude => ANGLE_SCALE as f64,
            Quantity::Altitude => ALTITUDE_SCALE as f64,
            Quantity::Dop => DOP_SCALE as f64,
        }
    }

    /// Name of the minimal fixed-point unit
    pub fn minimal_unit(self) -> &'static str {
        match self {
            Quantity::Latitude | Quantity::Longitude => "ms",
            Quantity::Altitude => "dm",
            Quantity::Dop => "cu",
        }
    }

    /// Name of the natural unit
    pub fn natural_unit(self) -> &'static str {
        match self {
            Quantity::Latitude | Quantity::Longitude => "deg",
            Quantity::Altitude => "m",
            Quantity::Dop => "",
        }
    }

    /// Decimal places used when rendering natural values
    pub fn display_precision(self) -> usize {
        match self {
            Quantity::Latitude | Quantity::Longitude => 7,
            Quantity::Altitude => 1,
            Quantity::Dop => 2,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::Latitude => "latitude",
            Quantity::Longitude => "longitude",
            Quantity::Altitude => "altitude",
            Quantity::Dop => "dop",
        };
        f.write_str(name)
    }
}

/// One distinct measured value and how often it was seen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Signed raw text, the exact deduplication key
    pub canonical_text: String,
    /// Signed value in the quantity's minimal unit
    pub fixed_point_value: i64,
    /// Signed value in natural units
    pub natural_value: f64,
    /// Number of admitted fixes carrying this exact text
    pub occurrence_count: u64,
    /// Share of the weighted total, only meaningful after weighting
    pub weighted_contribution: f64,
}

impl MeasurementRecord {
    pub fn new(canonical_text: String, fixed_point_value: i64, natural_value: f64) -> Self {
        Self {
            canonical_text,
            fixed_point_value,
            natural_value,
            occurrence_count: 1,
            weighted_contribution: 0.0,
        }
    }

    /// Deduplication key
    pub fn key(&self) -> &str {
        &self.canonical_text
    }
}

/// Raw fields of one logical fix, buffered until its group completes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fix {
    pub latitude: Option<String>,
    pub latitude_hemisphere: Option<String>,
    pub longitude: Option<String>,
    pub longitude_hemisphere: Option<String>,
    pub altitude: Option<String>,
    pub pdop: Option<String>,
    pub status: Option<String>,
}

impl Fix {
    /// Whether a position sentence contributed to this fix
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() || self.longitude.is_some()
    }
}

/// Final weighted longitude, latitude and altitude
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateTriple {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

impl fmt::Display for CoordinateTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.7},{:.7},{:.1}", self.longitude, self.latitude, self.altitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_scales() {
        assert_eq!(Quantity::Latitude.scale(), 3_600_000.0);
        assert_eq!(Quantity::Longitude.scale(), 3_600_000.0);
        assert_eq!(Quantity::Altitude.scale(), 10.0);
        assert_eq!(Quantity::Dop.scale(), 100.0);
    }

    #[test]
    fn test_new_record_counts_once() {
        let record = MeasurementRecord::new("545.4".to_string(), 5454, 545.4);
        assert_eq!(record.occurrence_count, 1);
        assert_eq!(record.key(), "545.4");
    }

    #[test]
    fn test_fix_has_position() {
        let fix = Fix {
            latitude: Some("4807.0380".to_string()),
            status: Some("A".to_string()),
            ..Default::default()
        };
        assert!(fix.has_position());
        assert!(!Fix::default().has_position());
    }

    #[test]
    fn test_coordinate_triple_display() {
        let triple = CoordinateTriple {
            longitude: 11.5166667,
            latitude: -48.1173,
            altitude: 545.4,
        };
        assert_eq!(triple.to_string(), "11.5166667,-48.1173000,545.4");
    }
}

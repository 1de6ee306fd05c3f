//! Quality gate for fix groups
//!
//! Buffers the fields of one group (position, PDOP, validity) as sentences
//! arrive and decides admission when the group closes.

use thiserror::Error;
use tracing::debug;

use crate::core::{Fix, MeasurementRecord, Quantity, VALID_STATUS};
use crate::processing::normalizer::{NormalizeError, ValueNormalizer};
use crate::processing::parser::ExtractedFields;
use crate::utils::config::{EngineConfig, MissingPdopPolicy};

/// Why a completed fix group was discarded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("status '{status}' is not '{}'", VALID_STATUS)]
    InvalidStatus { status: String },
    #[error("no position sentence in group")]
    MissingPosition,
    #[error("latitude width {actual}, expected {expected}")]
    LatitudeWidth { expected: usize, actual: usize },
    #[error("longitude width {actual}, expected {expected}")]
    LongitudeWidth { expected: usize, actual: usize },
    #[error("PDOP {pdop} above cutoff {cutoff} (centi-units)")]
    PdopAboveCutoff { pdop: i64, cutoff: i64 },
    #[error("no PDOP in group")]
    PdopMissing,
    #[error("no altitude in group")]
    MissingAltitude,
    #[error("malformed value: {0}")]
    Malformed(#[from] NormalizeError),
}

impl GateRejection {
    /// Short stable name, used as a statistics key
    pub fn category(&self) -> &'static str {
        match self {
            GateRejection::InvalidStatus { .. } => "invalid_status",
            GateRejection::MissingPosition => "missing_position",
            GateRejection::LatitudeWidth { .. } => "latitude_width",
            GateRejection::LongitudeWidth { .. } => "longitude_width",
            GateRejection::PdopAboveCutoff { .. } => "pdop_above_cutoff",
            GateRejection::PdopMissing => "pdop_missing",
            GateRejection::MissingAltitude => "missing_altitude",
            GateRejection::Malformed(_) => "malformed",
        }
    }
}

/// Normalized values of an admitted fix group
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedFix {
    pub latitude: MeasurementRecord,
    pub longitude: MeasurementRecord,
    pub altitude: MeasurementRecord,
    /// Absent only when the missing-PDOP policy admits the group
    pub dop: Option<MeasurementRecord>,
}

impl AdmittedFix {
    /// Normalized values paired with their quantity
    pub fn into_records(self) -> Vec<(Quantity, MeasurementRecord)> {
        let mut records = vec![
            (Quantity::Latitude, self.latitude),
            (Quantity::Longitude, self.longitude),
            (Quantity::Altitude, self.altitude),
        ];
        if let Some(dop) = self.dop {
            records.push((Quantity::Dop, dop));
        }
        records
    }
}

/// Buffers one fix group and admits or rejects it as a unit
#[derive(Debug, Clone)]
pub struct QualityGate {
    pending: Fix,
    pdop_cutoff: i64,
    latitude_width: usize,
    longitude_width: usize,
    missing_pdop: MissingPdopPolicy,
}

impl QualityGate {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            pending: Fix::default(),
            pdop_cutoff: config.pdop_cutoff,
            latitude_width: config.latitude_width,
            longitude_width: config.longitude_width,
            missing_pdop: config.missing_pdop,
        }
    }

    /// Fields buffered for the group in progress
    pub fn pending(&self) -> &Fix {
        &self.pending
    }

    /// Buffer extracted fields
    ///
    /// A later sentence of the same kind overwrites the fields it carries;
    /// fields it lacks keep their buffered values.
    pub fn absorb(&mut self, fields: &ExtractedFields<'_>) {
        fn set_if_present(slot: &mut Option<String>, field: &Option<&str>) {
            if let Some(value) = field {
                *slot = Some(value.to_string());
            }
        }

        let pending = &mut self.pending;
        match fields {
            ExtractedFields::Position {
                latitude,
                latitude_hemisphere,
                longitude,
                longitude_hemisphere,
                altitude,
            } => {
                set_if_present(&mut pending.latitude, latitude);
                set_if_present(&mut pending.latitude_hemisphere, latitude_hemisphere);
                set_if_present(&mut pending.longitude, longitude);
                set_if_present(&mut pending.longitude_hemisphere, longitude_hemisphere);
                set_if_present(&mut pending.altitude, altitude);
            }
            ExtractedFields::Dop { pdop } => set_if_present(&mut pending.pdop, pdop),
            ExtractedFields::Status { status } => set_if_present(&mut pending.status, status),
        }
    }

    /// Decide on the buffered group and start a fresh one
    pub fn finalize(&mut self) -> Result<AdmittedFix, GateRejection> {
        let fix = std::mem::take(&mut self.pending);
        let decision = self.evaluate(&fix);
        if let Err(rejection) = &decision {
            debug!(reason = rejection.category(), "fix group rejected: {}", rejection);
        }
        decision
    }

    /// Apply every admission predicate to a fix without touching state
    pub fn evaluate(&self, fix: &Fix) -> Result<AdmittedFix, GateRejection> {
        let status = fix.status.as_deref().unwrap_or("");
        if status != VALID_STATUS {
            return Err(GateRejection::InvalidStatus {
                status: status.to_string(),
            });
        }

        if !fix.has_position() {
            return Err(GateRejection::MissingPosition);
        }

        let latitude = fix.latitude.as_deref().unwrap_or("");
        if latitude.len() != self.latitude_width {
            return Err(GateRejection::LatitudeWidth {
                expected: self.latitude_width,
                actual: latitude.len(),
            });
        }

        let longitude = fix.longitude.as_deref().unwrap_or("");
        if longitude.len() != self.longitude_width {
            return Err(GateRejection::LongitudeWidth {
                expected: self.longitude_width,
                actual: longitude.len(),
            });
        }

        // Unparseable PDOP text counts as absent
        let dop = fix.pdop.as_deref().and_then(|raw| ValueNormalizer::dop(raw).ok());
        match &dop {
            Some(record) if record.fixed_point_value > self.pdop_cutoff => {
                return Err(GateRejection::PdopAboveCutoff {
                    pdop: record.fixed_point_value,
                    cutoff: self.pdop_cutoff,
                });
            }
            None if self.missing_pdop == MissingPdopPolicy::Reject => {
                return Err(GateRejection::PdopMissing);
            }
            _ => {}
        }

        let altitude = fix.altitude.as_deref().ok_or(GateRejection::MissingAltitude)?;

        Ok(AdmittedFix {
            latitude: ValueNormalizer::latitude(latitude, fix.latitude_hemisphere.as_deref())?,
            longitude: ValueNormalizer::longitude(longitude, fix.longitude_hemisphere.as_deref())?,
            altitude: ValueNormalizer::altitude(altitude)?,
            dop,
        })
    }
}

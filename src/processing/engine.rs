//! Line-driven reduction of sentence streams into weighted positions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, trace, warn};

use crate::core::{CoordinateTriple, Fix, Quantity};
use crate::processing::aggregator::{Aggregator, QuantitySummary, WeightCalculator};
use crate::processing::parser::{FieldExtractor, SentenceKind, SentenceTokenizer};
use crate::processing::tree::InsertOutcome;
use crate::utils::config::EngineConfig;
use crate::validation::error::EngineError;
use crate::validation::gate::{AdmittedFix, QualityGate};

/// What a successfully processed line did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Fields were buffered into the open fix group
    Buffered(SentenceKind),
    /// The line closed a group that was admitted to aggregation
    Admitted,
}

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub lines_read: usize,
    pub lines_ignored: usize,
    pub position_sentences: usize,
    pub satellite_sentences: usize,
    pub recommended_sentences: usize,
    pub groups_completed: usize,
    pub groups_accepted: usize,
    /// Rejected groups per rejection category
    pub groups_rejected: BTreeMap<String, usize>,
    pub storage_failures: usize,
    /// Input ended with fields buffered but no closing sentence
    pub trailing_group_discarded: bool,
}

impl EngineStats {
    pub fn groups_rejected_total(&self) -> usize {
        self.groups_rejected.values().sum()
    }

    fn count_sentence(&mut self, kind: SentenceKind) {
        match kind {
            SentenceKind::PositionFix => self.position_sentences += 1,
            SentenceKind::SatelliteStatus => self.satellite_sentences += 1,
            SentenceKind::RecommendedMinimum => self.recommended_sentences += 1,
        }
    }

    fn count_rejection(&mut self, category: &str) {
        *self.groups_rejected.entry(category.to_string()).or_insert(0) += 1;
    }
}

/// Final per-quantity results of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
    pub latitude: QuantitySummary,
    pub longitude: QuantitySummary,
    pub altitude: QuantitySummary,
    pub dop: QuantitySummary,
    /// Weighted longitude, latitude and altitude
    pub coordinate: CoordinateTriple,
    pub stats: EngineStats,
}

impl EngineReport {
    pub fn summary(&self, quantity: Quantity) -> &QuantitySummary {
        match quantity {
            Quantity::Latitude => &self.latitude,
            Quantity::Longitude => &self.longitude,
            Quantity::Altitude => &self.altitude,
            Quantity::Dop => &self.dop,
        }
    }

    /// Summaries in report order
    pub fn summaries(&self) -> impl Iterator<Item = &QuantitySummary> {
        Quantity::ALL.into_iter().map(move |q| self.summary(q))
    }
}

/// Single-pass engine: tokenizes, gates and aggregates one input stream
pub struct PositionEngine {
    gate: QualityGate,
    latitude: Aggregator,
    longitude: Aggregator,
    altitude: Aggregator,
    dop: Aggregator,
    stats: EngineStats,
}

impl PositionEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let aggregator = |quantity| match config.max_records_per_quantity {
            Some(limit) => Aggregator::with_capacity_limit(quantity, limit),
            None => Aggregator::new(quantity),
        };

        Self {
            gate: QualityGate::new(config),
            latitude: aggregator(Quantity::Latitude),
            longitude: aggregator(Quantity::Longitude),
            altitude: aggregator(Quantity::Altitude),
            dop: aggregator(Quantity::Dop),
            stats: EngineStats::default(),
        }
    }

    /// Reduce a whole reader; only a read failure aborts the run
    pub fn run<R: BufRead>(config: &EngineConfig, reader: R) -> Result<EngineReport, EngineError> {
        let mut engine = Self::new(config);
        for line in reader.split(b'\n') {
            let line = line?;
            // Corrupt bytes cannot form a recognized sentence anyway
            let text = String::from_utf8_lossy(&line);
            if let Err(err) = engine.process_line(&text) {
                if err.is_fatal() {
                    return Err(err);
                }
            }
        }
        Ok(engine.finish())
    }

    /// Reduce one file
    pub fn run_file<P: AsRef<Path>>(config: &EngineConfig, path: P) -> Result<EngineReport, EngineError> {
        let file = File::open(path.as_ref()).map_err(|e| EngineError::Io {
            message: format!("failed to open '{}': {}", path.as_ref().display(), e),
        })?;
        info!(path = %path.as_ref().display(), "reading sentences");
        Self::run(config, BufReader::new(file))
    }

    /// Reduce in-memory lines
    pub fn run_lines<I, S>(config: &EngineConfig, lines: I) -> EngineReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut engine = Self::new(config);
        for line in lines {
            // No I/O here, so every error is per-line and already in the stats
            if let Err(err) = engine.process_line(line.as_ref()) {
                trace!(category = err.category(), "line not aggregated");
            }
        }
        engine.finish()
    }

    /// Feed one input line
    ///
    /// Errors are per-line or per-group and leave the engine usable.
    pub fn process_line(&mut self, line: &str) -> Result<LineOutcome, EngineError> {
        self.stats.lines_read += 1;
        let line_number = self.stats.lines_read;

        let sentence = SentenceTokenizer::tokenize(line);
        let (kind, fields) = match (sentence.kind, FieldExtractor::extract(&sentence)) {
            (Some(kind), Some(fields)) => (kind, fields),
            _ => {
                self.stats.lines_ignored += 1;
                trace!(line = line_number, "ignoring unrecognized line");
                return Err(EngineError::ParseSkip {
                    line: line_number,
                    reason: "unrecognized sentence".to_string(),
                });
            }
        };

        self.stats.count_sentence(kind);
        self.gate.absorb(&fields);
        if kind != SentenceKind::RecommendedMinimum {
            return Ok(LineOutcome::Buffered(kind));
        }

        self.stats.groups_completed += 1;
        let admitted = self.gate.finalize().map_err(|rejection| {
            self.stats.count_rejection(rejection.category());
            EngineError::from(rejection)
        })?;
        self.admit(admitted)?;
        Ok(LineOutcome::Admitted)
    }

    /// Insert every value of an admitted group, or none of them
    fn admit(&mut self, fix: AdmittedFix) -> Result<(), EngineError> {
        let records = fix.into_records();

        for (quantity, record) in &records {
            let aggregator = self.aggregator(*quantity);
            if !aggregator.can_accept(record) {
                let capacity = aggregator.capacity_limit().unwrap_or_default();
                self.stats.storage_failures += 1;
                warn!(quantity = %quantity, capacity, "aggregator full, fix group dropped");
                return Err(EngineError::StorageExhaustion {
                    quantity: *quantity,
                    capacity,
                });
            }
        }

        for (quantity, record) in records {
            let key = record.canonical_text.clone();
            if self.aggregator_mut(quantity).insert(record)? == InsertOutcome::Created {
                debug!(quantity = %quantity, key = %key, "new record");
            }
        }

        self.stats.groups_accepted += 1;
        Ok(())
    }

    /// Run the weighting pass and produce the report
    pub fn finish(mut self) -> EngineReport {
        if *self.gate.pending() != Fix::default() {
            self.stats.trailing_group_discarded = true;
            debug!("input ended inside an open fix group");
        }

        WeightCalculator::new().weigh_all([
            &mut self.latitude,
            &mut self.longitude,
            &mut self.altitude,
            &mut self.dop,
        ]);

        let report = EngineReport {
            coordinate: CoordinateTriple {
                longitude: self.longitude.weighted_total().unwrap_or_default(),
                latitude: self.latitude.weighted_total().unwrap_or_default(),
                altitude: self.altitude.weighted_total().unwrap_or_default(),
            },
            latitude: self.latitude.summary(),
            longitude: self.longitude.summary(),
            altitude: self.altitude.summary(),
            dop: self.dop.summary(),
            stats: self.stats,
        };

        info!(
            lines = report.stats.lines_read,
            accepted = report.stats.groups_accepted,
            rejected = report.stats.groups_rejected_total(),
            coordinate = %report.coordinate,
            "aggregation complete"
        );
        report
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn aggregator(&self, quantity: Quantity) -> &Aggregator {
        match quantity {
            Quantity::Latitude => &self.latitude,
            Quantity::Longitude => &self.longitude,
            Quantity::Altitude => &self.altitude,
            Quantity::Dop => &self.dop,
        }
    }

    fn aggregator_mut(&mut self, quantity: Quantity) -> &mut Aggregator {
        match quantity {
            Quantity::Latitude => &mut self.latitude,
            Quantity::Longitude => &mut self.longitude,
            Quantity::Altitude => &mut self.altitude,
            Quantity::Dop => &mut self.dop,
        }
    }
}

//! Per-quantity aggregation and the frequency-weighted mean

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{MeasurementRecord, Quantity};
use crate::processing::tree::{DedupTree, InsertOutcome, Iter};
use crate::validation::error::EngineError;

/// Deduplicated records of one quantity plus derived totals
#[derive(Debug)]
pub struct Aggregator {
    quantity: Quantity,
    records: DedupTree,
    total_occurrence_count: u64,
    weighted_total: Option<f64>,
}

impl Aggregator {
    /// Create an empty aggregator
    pub fn new(quantity: Quantity) -> Self {
        Self::from_tree(quantity, DedupTree::new())
    }

    /// Create an empty aggregator refusing more than `capacity` distinct records
    pub fn with_capacity_limit(quantity: Quantity, capacity: usize) -> Self {
        Self::from_tree(quantity, DedupTree::with_capacity_limit(capacity))
    }

    fn from_tree(quantity: Quantity, records: DedupTree) -> Self {
        Self {
            quantity,
            records,
            total_occurrence_count: 0,
            weighted_total: None,
        }
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Insert a normalized value, merging on identical canonical text
    ///
    /// Any earlier weighting result is invalidated.
    pub fn insert(&mut self, record: MeasurementRecord) -> Result<InsertOutcome, EngineError> {
        let key = record.canonical_text.clone();
        let outcome = self
            .records
            .insert(record)
            .map_err(|exceeded| EngineError::StorageExhaustion {
                quantity: self.quantity,
                capacity: exceeded.capacity,
            })?;
        self.total_occurrence_count += 1;
        self.weighted_total = None;
        trace!(quantity = %self.quantity, key = %key, ?outcome, "record inserted");
        Ok(outcome)
    }

    /// Whether `insert` would succeed for this record
    pub fn can_accept(&self, record: &MeasurementRecord) -> bool {
        !self.records.is_full() || self.records.contains(record.key())
    }

    pub fn capacity_limit(&self) -> Option<usize> {
        self.records.capacity_limit()
    }

    /// Number of distinct records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, canonical_text: &str) -> Option<&MeasurementRecord> {
        self.records.get(canonical_text)
    }

    /// Remove a record entirely, whatever its count
    pub fn remove(&mut self, canonical_text: &str) -> Option<MeasurementRecord> {
        let removed = self.records.remove(canonical_text)?;
        self.total_occurrence_count -= removed.occurrence_count;
        self.weighted_total = None;
        Some(removed)
    }

    /// Records in ascending canonical-text order
    pub fn records(&self) -> Iter<'_> {
        self.records.iter()
    }

    /// Sum of all record occurrence counts
    pub fn total_occurrence_count(&self) -> u64 {
        self.total_occurrence_count
    }

    /// Weighted mean, `None` until weighted after the last change
    pub fn weighted_total(&self) -> Option<f64> {
        self.weighted_total
    }

    /// Snapshot of the records and totals for reporting
    pub fn summary(&self) -> QuantitySummary {
        QuantitySummary {
            quantity: self.quantity,
            records: self.records.iter().cloned().collect(),
            total_occurrence_count: self.total_occurrence_count,
            weighted_total: self.weighted_total.unwrap_or(0.0),
        }
    }
}

/// Reported contents of one aggregator after weighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySummary {
    pub quantity: Quantity,
    /// Records in ascending canonical-text order
    pub records: Vec<MeasurementRecord>,
    pub total_occurrence_count: u64,
    pub weighted_total: f64,
}

/// Computes occurrence-weighted means once input is exhausted
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightCalculator;

impl WeightCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Weight every record by its share of all occurrences
    ///
    /// Each record contributes `natural * count / total`, so the weighted
    /// total equals the plain mean of every admitted value. An empty
    /// aggregator weighs to zero.
    pub fn weigh(&self, aggregator: &mut Aggregator) -> f64 {
        let total = aggregator.total_occurrence_count;
        if total == 0 {
            aggregator.weighted_total = Some(0.0);
            return 0.0;
        }

        let divisor = total as f64;
        let mut weighted_total = 0.0;
        for record in aggregator.records.iter_mut() {
            record.weighted_contribution = record.natural_value * record.occurrence_count as f64 / divisor;
            weighted_total += record.weighted_contribution;
        }

        aggregator.weighted_total = Some(weighted_total);
        weighted_total
    }

    /// Weigh every aggregator in turn
    pub fn weigh_all<'a, I>(&self, aggregators: I)
    where
        I: IntoIterator<Item = &'a mut Aggregator>,
    {
        for aggregator in aggregators {
            self.weigh(aggregator);
        }
    }
}

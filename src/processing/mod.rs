//! Sentence parsing, normalization and aggregation

pub mod parser;
pub mod normalizer;
pub mod tree;
pub mod aggregator;
pub mod engine;

pub use parser::{ExtractedFields, FieldExtractor, Sentence, SentenceKind, SentenceTokenizer};
pub use normalizer::{NormalizeError, ValueNormalizer};
pub use tree::{DedupTree, InsertOutcome};
pub use aggregator::{Aggregator, QuantitySummary, WeightCalculator};
pub use engine::{EngineReport, EngineStats, LineOutcome, PositionEngine};

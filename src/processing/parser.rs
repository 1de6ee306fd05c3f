//! Sentence tokenizing and positional field extraction

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delimiters separating the fields of a sentence
const FIELD_DELIMITERS: [char; 2] = [',', '*'];

/// Length of the leading sentence identifier
const SENTENCE_ID_LEN: usize = 6;

// Position-fix field indices
const GGA_LATITUDE: usize = 2;
const GGA_LATITUDE_HEMISPHERE: usize = 3;
const GGA_LONGITUDE: usize = 4;
const GGA_LONGITUDE_HEMISPHERE: usize = 5;
const GGA_ALTITUDE: usize = 9;

// Recommended-minimum field indices
const RMC_STATUS: usize = 2;

/// Sentence kinds taking part in a fix group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentenceKind {
    /// `$GPGGA`: latitude, longitude, altitude
    PositionFix,
    /// `$GPGSA`: satellite geometry, carries PDOP
    SatelliteStatus,
    /// `$GPRMC`: validity status, closes a group
    RecommendedMinimum,
}

impl SentenceKind {
    /// Leading identifier of the sentence
    pub fn identifier(self) -> &'static str {
        match self {
            SentenceKind::PositionFix => "$GPGGA",
            SentenceKind::SatelliteStatus => "$GPGSA",
            SentenceKind::RecommendedMinimum => "$GPRMC",
        }
    }

    /// Classify a sentence by the first six characters of its first field
    pub fn classify(first_field: &str) -> Option<Self> {
        match first_field.get(..SENTENCE_ID_LEN)? {
            "$GPGGA" => Some(SentenceKind::PositionFix),
            "$GPGSA" => Some(SentenceKind::SatelliteStatus),
            "$GPRMC" => Some(SentenceKind::RecommendedMinimum),
            _ => None,
        }
    }
}

impl fmt::Display for SentenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// One tokenized input line
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence<'a> {
    pub kind: Option<SentenceKind>,
    pub fields: Vec<&'a str>,
}

impl<'a> Sentence<'a> {
    /// Field at a positional index, `None` when missing or empty
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.fields.get(index).copied().filter(|f| !f.is_empty())
    }
}

/// Splits lines into fields and classifies them
pub struct SentenceTokenizer;

impl SentenceTokenizer {
    /// Tokenize one line, keeping empty fields in place
    pub fn tokenize(line: &str) -> Sentence<'_> {
        let line = line.trim();
        let fields: Vec<&str> = line.split(&FIELD_DELIMITERS[..]).collect();
        let kind = fields.first().and_then(|first| SentenceKind::classify(first));
        Sentence { kind, fields }
    }
}

/// Fields of interest pulled out of one sentence
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedFields<'a> {
    Position {
        latitude: Option<&'a str>,
        latitude_hemisphere: Option<&'a str>,
        longitude: Option<&'a str>,
        longitude_hemisphere: Option<&'a str>,
        altitude: Option<&'a str>,
    },
    Dop {
        pdop: Option<&'a str>,
    },
    Status {
        status: Option<&'a str>,
    },
}

/// Picks fields out of classified sentences by position
pub struct FieldExtractor;

impl FieldExtractor {
    /// Extract the fields of interest, `None` for unrecognized sentences
    pub fn extract<'a>(sentence: &Sentence<'a>) -> Option<ExtractedFields<'a>> {
        match sentence.kind? {
            SentenceKind::PositionFix => Some(ExtractedFields::Position {
                latitude: sentence.field(GGA_LATITUDE),
                latitude_hemisphere: sentence.field(GGA_LATITUDE_HEMISPHERE),
                longitude: sentence.field(GGA_LONGITUDE),
                longitude_hemisphere: sentence.field(GGA_LONGITUDE_HEMISPHERE),
                altitude: sentence.field(GGA_ALTITUDE),
            }),
            SentenceKind::SatelliteStatus => Some(ExtractedFields::Dop {
                pdop: Self::first_decimal_field(sentence),
            }),
            SentenceKind::RecommendedMinimum => Some(ExtractedFields::Status {
                status: sentence.field(RMC_STATUS),
            }),
        }
    }

    /// First field carrying a decimal point, taken as PDOP
    fn first_decimal_field<'a>(sentence: &Sentence<'a>) -> Option<&'a str> {
        sentence.fields.iter().copied().find(|field| field.contains('.'))
    }
}

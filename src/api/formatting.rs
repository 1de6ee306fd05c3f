//! Report rendering
//!
//! Turns a finished [`EngineReport`] into console tables, CSV rows, JSON or
//! a KML placemark. None of this feeds back into aggregation.

use crate::api::types::{FormatError, FormatResult, OutputFormat};
use crate::core::{CoordinateTriple, MeasurementRecord};
use crate::processing::aggregator::QuantitySummary;
use crate::processing::engine::EngineReport;

/// Column names of a record row
pub const CSV_HEADER: [&str; 6] = [
    "canonicalText",
    "fixedPointValue",
    "naturalValue",
    "occurrenceCount",
    "totalOccurrenceCount",
    "weightedContribution",
];

/// Label of the totals row
pub const TOTAL_LABEL: &str = "TOTAL";

/// Dispatches a report to the formatter for the requested format
#[derive(Debug, Clone)]
pub struct ResultFormatter {
    pub format: OutputFormat,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Placemark name for KML output
    pub name: String,
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            pretty: true,
            name: "hpos".to_string(),
        }
    }
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn render(&self, report: &EngineReport) -> FormatResult<String> {
        match self.format {
            OutputFormat::Text => Ok(TextFormatter::new().format_report(report)),
            OutputFormat::Csv => CsvFormatter::new().format_report(report),
            OutputFormat::Json => {
                let formatter = if self.pretty { JsonFormatter::pretty() } else { JsonFormatter::new() };
                formatter.format_report(report)
            }
            OutputFormat::Kml => Ok(KmlFormatter::new(&self.name).format_report(report)),
        }
    }
}

/// `"<lon>,<lat>,<alt>"` for embedding in mapping documents
pub fn coordinate_string(coordinate: &CoordinateTriple) -> String {
    coordinate.to_string()
}

fn natural(summary: &QuantitySummary, value: f64) -> String {
    format!("{:.*}", summary.quantity.display_precision(), value)
}

/// Fixed-width console tables
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFormatter {
    /// Skip the per-record rows
    pub totals_only: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals_only() -> Self {
        Self { totals_only: true }
    }

    pub fn format_summary(&self, summary: &QuantitySummary) -> String {
        let quantity = summary.quantity;
        let mut output = format!(
            "{} ({} -> {})\n",
            quantity,
            quantity.minimal_unit(),
            quantity.natural_unit()
        );
        output.push_str(&format!(
            "  {:<14} {:>12} {:>14} {:>7} {:>7} {:>14}\n",
            "text", "fixed", "natural", "count", "total", "contribution"
        ));

        if !self.totals_only {
            for record in &summary.records {
                output.push_str(&self.format_record(summary, record));
            }
        }

        output.push_str(&format!("  {}\n", "-".repeat(73)));
        output.push_str(&format!(
            "  {:<14} {:>12} {:>14} {:>7} {:>7} {:>14}\n",
            TOTAL_LABEL,
            "",
            "",
            "",
            summary.total_occurrence_count,
            natural(summary, summary.weighted_total)
        ));
        output
    }

    fn format_record(&self, summary: &QuantitySummary, record: &MeasurementRecord) -> String {
        format!(
            "  {:<14} {:>12} {:>14} {:>7} {:>7} {:>14}\n",
            record.canonical_text,
            record.fixed_point_value,
            natural(summary, record.natural_value),
            record.occurrence_count,
            summary.total_occurrence_count,
            natural(summary, record.weighted_contribution)
        )
    }

    pub fn format_report(&self, report: &EngineReport) -> String {
        let mut output = String::new();
        for summary in report.summaries() {
            output.push_str(&self.format_summary(summary));
            output.push('\n');
        }
        output.push_str(&format!(
            "Lat: {:.7} Lon: {:.7} Alt: {:.1}\n",
            report.coordinate.latitude, report.coordinate.longitude, report.coordinate.altitude
        ));
        output
    }
}

/// Comma-separated record rows
#[derive(Debug, Clone, Copy)]
pub struct CsvFormatter {
    pub include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self { include_header: true }
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// One quantity: record rows, then the totals row
    pub fn format_summary(&self, summary: &QuantitySummary) -> FormatResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.include_header {
            writer.write_record(CSV_HEADER)?;
        }
        for row in rows(summary) {
            writer.write_record(&row)?;
        }
        finish(writer)
    }

    /// Every quantity in one table, led by a `quantity` column
    pub fn format_report(&self, report: &EngineReport) -> FormatResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.include_header {
            writer.write_record(std::iter::once("quantity").chain(CSV_HEADER))?;
        }
        for summary in report.summaries() {
            let quantity = summary.quantity.to_string();
            for row in rows(summary) {
                writer.write_record(std::iter::once(quantity.clone()).chain(row))?;
            }
        }
        finish(writer)
    }
}

fn rows(summary: &QuantitySummary) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = summary
        .records
        .iter()
        .map(|record| {
            vec![
                record.canonical_text.clone(),
                record.fixed_point_value.to_string(),
                natural(summary, record.natural_value),
                record.occurrence_count.to_string(),
                summary.total_occurrence_count.to_string(),
                record.weighted_contribution.to_string(),
            ]
        })
        .collect();
    rows.push(vec![
        TOTAL_LABEL.to_string(),
        String::new(),
        String::new(),
        String::new(),
        summary.total_occurrence_count.to_string(),
        summary.weighted_total.to_string(),
    ]);
    rows
}

fn finish(writer: csv::Writer<Vec<u8>>) -> FormatResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| FormatError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| FormatError::Csv(e.to_string()))
}

/// JSON formatter for structured output
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn format_report(&self, report: &EngineReport) -> FormatResult<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }
}

/// Minimal KML document holding the weighted position as one placemark
#[derive(Debug, Clone)]
pub struct KmlFormatter {
    pub name: String,
}

impl KmlFormatter {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    pub fn format_coordinate(&self, coordinate: &CoordinateTriple) -> String {
        format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n",
                "  <Placemark>\n",
                "    <name>{}</name>\n",
                "    <Point>\n",
                "      <altitudeMode>absolute</altitudeMode>\n",
                "      <coordinates>{}</coordinates>\n",
                "    </Point>\n",
                "  </Placemark>\n",
                "</kml>\n"
            ),
            escape_xml(&self.name),
            coordinate_string(coordinate)
        )
    }

    pub fn format_report(&self, report: &EngineReport) -> String {
        self.format_coordinate(&report.coordinate)
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::engine::PositionEngine;
    use crate::utils::config::EngineConfig;

    fn report() -> EngineReport {
        let lines = [
            "$GPGGA,123519,4807.0380,N,01131.0000,E,1,08,0.9,545.4,M,46.9,M,,*47",
            "$GPGSA,A,3,04,05,,09,12,,,24,,,,,1.50,1.3,2.1*39",
            "$GPRMC,123519,A,4807.0380,N,01131.0000,E,022.4,084.4,230394,003.1,W*6A",
            "$GPGGA,123520,4807.0380,N,01131.0000,E,1,08,0.9,545.6,M,46.9,M,,*47",
            "$GPGSA,A,3,04,05,,09,12,,,24,,,,,1.50,1.3,2.1*39",
            "$GPRMC,123520,A,4807.0380,N,01131.0000,E,022.4,084.4,230394,003.1,W*6A",
        ];
        PositionEngine::run_lines(&EngineConfig::default(), lines)
    }

    #[test]
    fn test_csv_summary() {
        let report = report();
        let csv = CsvFormatter::new().format_summary(&report.altitude).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "canonicalText,fixedPointValue,naturalValue,occurrenceCount,totalOccurrenceCount,weightedContribution"
        );
        assert_eq!(lines[1], "545.4,5454,545.4,1,2,272.7");
        assert_eq!(lines[2], "545.6,5456,545.6,1,2,272.8");
        assert!(lines[3].starts_with("TOTAL,,,,2,"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_csv_contributions_sum_to_total() {
        let lines = [
            "$GPGGA,123519,4807.0380,N,01131.0000,E,1,08,0.9,545.4,M,46.9,M,,*47",
            "$GPGSA,A,3,04,05,,09,12,,,24,,,,,1.30,1.3,2.1*39",
            "$GPRMC,123519,A,4807.0380,N,01131.0000,E,022.4,084.4,230394,003.1,W*6A",
            "$GPGGA,123519,4807.0380,N,01131.0000,E,1,08,0.9,545.4,M,46.9,M,,*47",
            "$GPGSA,A,3,04,05,,09,12,,,24,,,,,1.50,1.3,2.1*39",
            "$GPRMC,123519,A,4807.0380,N,01131.0000,E,022.4,084.4,230394,003.1,W*6A",
            "$GPGGA,123519,4807.0380,N,01131.0000,E,1,08,0.9,545.4,M,46.9,M,,*47",
            "$GPGSA,A,3,04,05,,09,12,,,24,,,,,1.50,1.3,2.1*39",
            "$GPRMC,123519,A,4807.0380,N,01131.0000,E,022.4,084.4,230394,003.1,W*6A",
        ];
        let report = PositionEngine::run_lines(&EngineConfig::default(), lines);
        let csv = CsvFormatter::new().format_summary(&report.dop).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);

        let contributions: f64 = rows[..2].iter().map(|r| r[5].parse::<f64>().unwrap()).sum();
        let total: f64 = rows[2][5].parse().unwrap();
        assert_eq!(&rows[2][0], TOTAL_LABEL);
        assert!((contributions - total).abs() < 1e-12);
        assert!((total - report.dop.weighted_total).abs() < 1e-12);
    }

    #[test]
    fn test_csv_report_has_every_quantity() {
        let csv = CsvFormatter::new().format_report(&report()).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        assert_eq!(reader.headers().unwrap().get(0), Some("quantity"));
        let quantities: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect();
        // latitude, longitude and dop: one record plus total; altitude: two plus total
        assert_eq!(quantities.len(), 9);
        assert_eq!(quantities.iter().filter(|q| *q == "altitude").count(), 3);
    }

    #[test]
    fn test_text_report() {
        let text = TextFormatter::new().format_report(&report());
        assert!(text.contains("latitude (ms -> deg)"));
        assert!(text.contains("4807.0380"));
        assert!(text.contains("173222280"));
        assert!(text.ends_with("Lat: 48.1173000 Lon: 11.5166667 Alt: 545.5\n"));

        let totals = TextFormatter::totals_only().format_summary(&report().altitude);
        assert!(!totals.contains("545.4 "));
        assert!(totals.contains(TOTAL_LABEL));
    }

    #[test]
    fn test_json_report() {
        let report = report();
        let json = JsonFormatter::new().format_report(&report).unwrap();
        let parsed: EngineReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.latitude.records, report.latitude.records);
        assert_eq!(parsed.stats.groups_accepted, 2);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dop"]["quantity"], "dop");
    }

    #[test]
    fn test_kml_placemark() {
        let kml = KmlFormatter::new("track <1>").format_report(&report());
        assert!(kml.contains("<coordinates>11.5166667,48.1173000,545.5</coordinates>"));
        assert!(kml.contains("<name>track &lt;1&gt;</name>"));
    }

    #[test]
    fn test_result_formatter_dispatch() {
        let report = report();
        let kml = ResultFormatter::new(OutputFormat::Kml).with_name("a").render(&report).unwrap();
        assert!(kml.starts_with("<?xml"));
        let json = ResultFormatter::new(OutputFormat::Json).render(&report).unwrap();
        assert!(json.starts_with('{'));
        let text = ResultFormatter::default().render(&report).unwrap();
        assert!(text.contains("Lat: "));
    }

    #[test]
    fn test_coordinate_string() {
        let coordinate = CoordinateTriple {
            longitude: -11.5,
            latitude: 48.25,
            altitude: 0.0,
        };
        assert_eq!(coordinate_string(&coordinate), "-11.5000000,48.2500000,0.0");
    }
}

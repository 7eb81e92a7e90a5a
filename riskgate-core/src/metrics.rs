//! Metrics recording — an append-only sink for per-cycle portfolio values.
//!
//! The sink is passive: the engine writes, external analysis tooling reads,
//! nothing feeds back. Sink failures therefore must not disturb a running
//! backtest; they are logged and swallowed.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Append-only metric sink.
pub trait MetricSink {
    fn record(&mut self, name: &str, value: f64, timestamp: NaiveDateTime);
}

/// One recorded metric observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub timestamp: NaiveDateTime,
    pub name: String,
    pub value: f64,
}

/// In-memory sink for tests and the TUI-less demo path.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<MetricRow>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded values for one metric name, in append order.
    pub fn values_for(&self, name: &str) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|row| row.name == name)
            .map(|row| row.value)
            .collect()
    }
}

impl MetricSink for MemorySink {
    fn record(&mut self, name: &str, value: f64, timestamp: NaiveDateTime) {
        self.rows.push(MetricRow {
            timestamp,
            name: name.to_string(),
            value,
        });
    }
}

/// CSV sink: one `timestamp,name,value` row per observation.
pub struct CsvMetricSink {
    writer: csv::Writer<File>,
    write_failed: bool,
}

impl CsvMetricSink {
    /// Create the file and write the header.
    pub fn create(path: &Path) -> Result<Self, csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["timestamp", "name", "value"])?;
        Ok(Self {
            writer,
            write_failed: false,
        })
    }

    /// Flush buffered rows to disk.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl MetricSink for CsvMetricSink {
    fn record(&mut self, name: &str, value: f64, timestamp: NaiveDateTime) {
        let row = [timestamp.to_string(), name.to_string(), value.to_string()];
        if let Err(e) = self.writer.write_record(&row) {
            if !self.write_failed {
                tracing::error!(error = %e, "metric sink write failed; further errors suppressed");
                self.write_failed = true;
            }
        }
    }
}

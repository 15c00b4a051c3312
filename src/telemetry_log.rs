//! Session telemetry log and its delimited-text renditions.
//!
//! [`TelemetryLog`] is the in-memory system of record for one session: it
//! only grows, in arrival order. [`LogFile`] mirrors each appended row to
//! disk using the same columns as [`TelemetryLog::export_csv`].

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::models::{format_value, Channel, EnrichedReading};

// ---

/// Column headers in output order: device channels, forecast fields, timestamp.
pub fn columns() -> Vec<&'static str> {
    // ---
    Channel::ALL
        .iter()
        .map(|ch| ch.name())
        .chain(["ForecastTemp", "ForecastRH", "Timestamp"])
        .collect()
}

fn row(entry: &EnrichedReading) -> Vec<String> {
    // ---
    Channel::ALL
        .iter()
        .map(|&ch| format_value(entry.reading.get(ch)))
        .chain([
            format_value(entry.forecast_temp),
            format_value(entry.forecast_rh),
            entry
                .reading
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ])
        .collect()
}

#[derive(Debug)]
pub struct TelemetryLog {
    // ---
    session_id: Uuid,
    started_at: DateTime<Utc>,
    entries: Vec<EnrichedReading>,
}

impl TelemetryLog {
    pub fn new() -> Self {
        // ---
        let log = Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            entries: Vec::new(),
        };
        tracing::info!("Telemetry session {} started at {}", log.session_id, log.started_at);
        log
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Append in arrival order. Timestamps are not reordered or checked.
    pub fn append(&mut self, entry: EnrichedReading) {
        self.entries.push(entry);
    }

    pub fn snapshot(&self) -> &[EnrichedReading] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the whole log: header row, then one row per entry.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        // ---
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.write_record(columns())
            .context("CSV header write failed")?;
        for entry in &self.entries {
            wtr.write_record(row(entry))
                .context("CSV row write failed")?;
        }
        wtr.into_inner()
            .map_err(|e| anyhow::anyhow!("CSV writer error: {}", e))
    }
}

impl Default for TelemetryLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-only on-disk copy of the log.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first if the file is empty.
    pub fn append(&self, entry: &EnrichedReading) -> Result<()> {
        // ---
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let is_empty = file
            .metadata()
            .with_context(|| format!("Failed to stat {}", self.path.display()))?
            .len()
            == 0;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            wtr.write_record(columns())?;
        }
        wtr.write_record(row(entry))?;
        wtr.flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        Ok(())
    }
}

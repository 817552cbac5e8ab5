//! Per-source statistics over the report log.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::log_writer::read_records;
use super::record::{ReportRecord, SourceId};

/// Counts for one report source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source: SourceId,
    pub count: usize,
    /// Timestamp line of the first record from this source, in log order
    pub first: String,
    /// Timestamp line of the latest record from this source, in log order
    pub last: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSummary {
    pub total: usize,
    /// Sorted by source name
    pub sources: Vec<SourceSummary>,
}

impl LogSummary {
    pub fn from_records(records: &[ReportRecord]) -> Self {
        let mut by_source: BTreeMap<&SourceId, SourceSummary> = BTreeMap::new();

        for record in records {
            by_source
                .entry(&record.source)
                .and_modify(|s| {
                    s.count += 1;
                    s.last = record.timestamp_text.clone();
                })
                .or_insert_with(|| SourceSummary {
                    source: record.source.clone(),
                    count: 1,
                    first: record.timestamp_text.clone(),
                    last: record.timestamp_text.clone(),
                });
        }

        Self {
            total: records.len(),
            sources: by_source.into_values().collect(),
        }
    }

    /// Summarizes the log at `path`. A log that was never written is empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No report log at {} yet", path.display());
            return Ok(Self::from_records(&[]));
        }
        Ok(Self::from_records(&read_records(path)?))
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl fmt::Display for LogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} reports from {} sources", self.total, self.sources.len())?;
        for s in &self.sources {
            writeln!(f, "  {:<20} {:>5}  first: {}  last: {}", s.source, s.count, s.first, s.last)?;
        }
        Ok(())
    }
}

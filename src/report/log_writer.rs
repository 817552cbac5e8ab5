//! Append-only report log.
//!
//! Each record is two lines:
//!
//! ```text
//! Report from: <source>
//! <timestamp line>
//! ```
//!
//! The file is opened in append mode for every write and closed before the
//! call returns, so records already written survive a crash mid-cycle.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use super::record::{ReportRecord, SourceId};

const SOURCE_PREFIX: &str = "Report from: ";

/// Formats one record as its two-line log entry.
pub fn format_entry(record: &ReportRecord) -> String {
    format!("{}{}\n{}\n", SOURCE_PREFIX, record.source, record.timestamp_text)
}

/// Appends one record. Returns the number of bytes written.
pub fn append_record(path: &Path, record: &ReportRecord) -> Result<usize> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {} for append", path.display()))?;

    let entry = format_entry(record);
    file.write_all(entry.as_bytes())
        .context("Failed to write report entry")?;
    file.flush().context("Failed to flush report entry")?;

    Ok(entry.len())
}

/// Appends records in order. Returns the total number of bytes written.
pub fn append_records(path: &Path, records: &[ReportRecord]) -> Result<usize> {
    let mut written = 0;
    for record in records {
        written += append_record(path, record)?;
    }
    Ok(written)
}

/// Reads every well-formed record back from the log.
///
/// Entries are read by position: the line after a header is always its
/// timestamp line, even when that line itself starts with the header prefix.
/// Lines outside an entry are skipped with a warning.
pub fn read_records(path: &Path) -> Result<Vec<ReportRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open report log {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    // Set after a header; `None` inside when its source was unusable
    let mut pending: Option<Option<SourceId>> = None;

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.context("Failed to read line from report log")?;

        if let Some(source) = pending.take() {
            if let Some(source) = source {
                records.push(ReportRecord::new(source, line));
            }
            continue;
        }

        if let Some(name) = line.strip_prefix(SOURCE_PREFIX) {
            pending = match SourceId::new(name) {
                Ok(source) => Some(Some(source)),
                Err(e) => {
                    tracing::warn!("Skipping report log entry at line {}: {}", line_num + 1, e);
                    Some(None)
                }
            };
        } else if !line.trim().is_empty() {
            tracing::warn!("Skipping stray report log line {}: {:?}", line_num + 1, line);
        }
    }

    if pending.is_some() {
        tracing::warn!("Report log ends with an incomplete entry");
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(source: &str, text: &str) -> ReportRecord {
        ReportRecord::new(SourceId::new(source).unwrap(), text)
    }

    #[test]
    fn test_append_writes_two_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("penguins_report.txt");

        append_record(&path, &record("pingu_03", "Mon Jan 02 2023 14:05:09")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Report from: pingu_03\nMon Jan 02 2023 14:05:09\n");
    }

    #[test]
    fn test_append_never_shortens_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("penguins_report.txt");
        std::fs::write(&path, "Report from: old\nSun Jan 01 2023 00:00:00\n").unwrap();
        let before = std::fs::metadata(&path).unwrap().len() as usize;

        let written = append_record(&path, &record("pingu_01", "Mon Jan 02 2023 14:05:09")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.len() >= before + written);
        assert!(content.starts_with("Report from: old\n"));
    }

    #[test]
    fn test_append_records_keeps_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let records = vec![
            record("pingu_01", "Mon Jan 02 2023 14:05:09"),
            record("pingu_01", "Mon Jan 02 2023 14:05:10"),
        ];

        append_records(&path, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "Mon Jan 02 2023 14:05:09");
        assert_eq!(lines[3], "Mon Jan 02 2023 14:05:10");
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("log.txt");
        assert!(append_record(&path, &record("a", "Mon Jan 02 2023 14:05:09")).is_err());
    }

    #[test]
    fn test_read_records_round_trips_appended_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let records = vec![
            record("pingu_01", "Mon Jan 02 2023 14:05:09"),
            record("pingu_02", "Tue Jan 03 2023 10:00:00"),
        ];
        append_records(&path, &records).unwrap();

        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn test_read_records_skips_malformed_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(
            &path,
            "stray\n\nReport from:  \nSun Jan 01 2023 00:00:00\nReport from: b\nMon Jan 02 2023 14:05:09\nTue Jan 03 2023 10:00:00\nReport from: c\n",
        )
        .unwrap();

        let records = read_records(&path).unwrap();

        assert_eq!(records, vec![record("b", "Mon Jan 02 2023 14:05:09")]);
    }

    #[test]
    fn test_read_records_keeps_timestamp_line_that_looks_like_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let records = vec![
            record("pingu_01", "Report from: Mon Jan 02 2023 14:05:09"),
            record("pingu_02", "Tue Jan 03 2023 10:00:00"),
        ];
        append_records(&path, &records).unwrap();

        assert_eq!(read_records(&path).unwrap(), records);
    }
}

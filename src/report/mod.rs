//! Report detection, records and the append-only report log.
//!
//! This module provides:
//! - Classification of the current frame against report templates
//! - Report records and their source identifiers
//! - The append-only log writer and reader
//! - Per-source statistics over the log

pub mod classifier;
pub mod log_writer;
pub mod record;
pub mod summary;

pub use classifier::{ReportClassifier, SessionState, TieBreak, Verdict};
pub use log_writer::append_records;
pub use record::{ReportRecord, SourceId};
pub use summary::LogSummary;

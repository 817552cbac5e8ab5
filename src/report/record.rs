use anyhow::{Result, anyhow};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Name of the template a report came from, without its file extension.
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Derives the source from a template identifier, e.g. `pingu_03.png` -> `pingu_03`.
    pub fn from_template(template_id: &str) -> Result<Self> {
        let stem = Path::new(template_id)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Self::new(stem).map_err(|_| anyhow!("Template id {:?} has no usable name", template_id))
    }

    /// Wraps an already-stripped source name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(anyhow!("Report source must not be empty"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One validated report line tagged with the template it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    pub source: SourceId,
    pub timestamp_text: String,
}

impl ReportRecord {
    pub fn new(source: SourceId, timestamp_text: impl Into<String>) -> Self {
        Self {
            source,
            timestamp_text: timestamp_text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_template_strips_extension() {
        assert_eq!(SourceId::from_template("pingu_03.png").unwrap().as_str(), "pingu_03");
        assert_eq!(SourceId::from_template("no_report.png").unwrap().as_str(), "no_report");
        assert_eq!(SourceId::from_template("archive.v2.jpg").unwrap().as_str(), "archive.v2");
        assert_eq!(SourceId::from_template("plain").unwrap().as_str(), "plain");
    }

    #[test]
    fn test_empty_sources_are_rejected() {
        assert!(SourceId::from_template("").is_err());
        assert!(SourceId::new("  ").is_err());
    }
}

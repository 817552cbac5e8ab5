//! Validation of recognized text against the report timestamp grammar.
//!
//! A report line ends with a timestamp such as `Mon Jan 02 2023 14:05:09`:
//! two three-letter words, a two-digit day, a four-digit year and a time,
//! separated by single spaces. Only the end of the line is anchored; whatever
//! OCR put in front of the timestamp is kept as part of the line.

use anyhow::Result;
use regex::Regex;

use crate::report::{ReportRecord, SourceId};

/// Timestamp anchored at the end of the line.
const TIMESTAMP_PATTERN: &str =
    r"\p{Alphabetic}{3} \p{Alphabetic}{3} [0-9]{2} [0-9]{4} [0-9]{2}:[0-9]{2}:[0-9]{2}$";

/// Compiled timestamp grammar.
#[derive(Debug, Clone)]
pub struct TimestampGrammar {
    pattern: Regex,
}

impl TimestampGrammar {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(TIMESTAMP_PATTERN)?,
        })
    }

    /// Whether the line ends with a well-formed timestamp. Purely syntactic:
    /// any three letters pass as a day or month name.
    pub fn is_valid_line(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// Lines of `text` that end with a timestamp, in order.
    pub fn valid_lines<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        text.lines().filter(move |line| self.is_valid_line(line))
    }

    /// Pairs every valid line of `text` with `source`.
    pub fn extract_records(&self, text: &str, source: &SourceId) -> Vec<ReportRecord> {
        self.valid_lines(text)
            .map(|line| ReportRecord::new(source.clone(), line))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> TimestampGrammar {
        TimestampGrammar::new().unwrap()
    }

    #[test]
    fn test_accepts_plain_timestamp() {
        assert!(grammar().is_valid_line("Mon Jan 02 2023 14:05:09"));
    }

    #[test]
    fn test_accepts_leading_content() {
        assert!(grammar().is_valid_line("Zgloszenie: Mon Jan 02 2023 14:05:09"));
        assert!(grammar().is_valid_line("xMon Jan 02 2023 14:05:09"));
    }

    #[test]
    fn test_rejects_trailing_content() {
        assert!(!grammar().is_valid_line("Mon Jan 02 2023 14:05:09 GMT"));
        assert!(!grammar().is_valid_line("Mon Jan 02 2023 14:05:09 "));
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        let g = grammar();
        assert!(!g.is_valid_line("garbage line no timestamp"));
        assert!(!g.is_valid_line(""));
        assert!(!g.is_valid_line("Mon Jan 2 2023 14:05:09"));
        assert!(!g.is_valid_line("Mon Jan 02 23 14:05:09"));
        assert!(!g.is_valid_line("Mon Jan 02 2023 14:05"));
        assert!(!g.is_valid_line("Mon  Jan 02 2023 14:05:09"));
        assert!(!g.is_valid_line("Mo Jan 02 2023 14:05:09"));
        assert!(!g.is_valid_line("M0n Jan 02 2023 14:05:09"));
    }

    #[test]
    fn test_no_semantic_checks() {
        // Any letters pass as names and the time is not range checked
        let g = grammar();
        assert!(g.is_valid_line("Xyz Qqq 99 0000 99:99:99"));
        assert!(g.is_valid_line("Pon Sty 31 2024 23:59:59"));
    }

    #[test]
    fn test_valid_lines_splits_crlf_output() {
        let text = "Report\r\nMon Jan 02 2023 14:05:09\r\nTue Feb 14 2023 08:00:00 extra\r\n";
        let g = grammar();
        let lines: Vec<&str> = g.valid_lines(text).collect();
        assert_eq!(lines, vec!["Mon Jan 02 2023 14:05:09"]);
    }

    #[test]
    fn test_extract_records_pairs_lines_with_source() {
        let source = SourceId::from_template("pingu_03.png").unwrap();
        let text = "Pingu\nMon Jan 02 2023 14:05:09\n\nTue Jan 03 2023 09:10:11\n";

        let records = grammar().extract_records(text, &source);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source.as_str(), "pingu_03");
        assert_eq!(records[0].timestamp_text, "Mon Jan 02 2023 14:05:09");
        assert_eq!(records[1].timestamp_text, "Tue Jan 03 2023 09:10:11");
    }

    #[test]
    fn test_extract_records_from_garbage_is_empty() {
        let source = SourceId::from_template("pingu_01.png").unwrap();
        assert!(grammar()
            .extract_records("garbage line no timestamp", &source)
            .is_empty());
    }
}

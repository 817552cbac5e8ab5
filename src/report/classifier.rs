//! Report classification against the folder of report-source templates.
//!
//! Every template in the folder is tested against the frame. The folder
//! holds one template per genuine report source plus a decoy template whose
//! match means "looks like a report but is not one".
//!
//! When nothing matches, the identifier retained in `SessionState` from an
//! earlier classification is returned unchanged. Callers must not read
//! "nothing matched this time" as "no report": only the decoy identifier is
//! an authoritative negative.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::capture::Frame;
use crate::vision::{MatchError, Template, TemplateMatcher, load_template_dir};

/// How a frame matching several report templates is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The last matching template in path order wins
    #[default]
    LastMatch,
    /// The highest similarity wins; equal scores go to the later template
    BestScore,
}

/// Outcome of one classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No template has ever matched in this session
    NoReport,
    /// The decoy template is the current identifier
    FalseReport(String),
    /// A genuine report template is the current identifier
    GenuineReport(String),
}

/// Identifier carried from one classification to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    retained: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retained(&self) -> Option<&str> {
        self.retained.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    /// False when nothing matched and the verdict was carried over
    pub fresh: bool,
}

pub struct ReportClassifier {
    templates: Vec<Template>,
    decoy_id: String,
    threshold: f32,
    tie_break: TieBreak,
}

impl ReportClassifier {
    pub fn new(
        templates: Vec<Template>,
        decoy_id: impl Into<String>,
        threshold: f32,
        tie_break: TieBreak,
    ) -> Result<Self, MatchError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MatchError::InvalidThreshold(threshold));
        }

        let decoy_id = decoy_id.into();
        if !templates.iter().any(|t| t.id() == decoy_id) {
            tracing::warn!("Decoy template {} is not among the report templates", decoy_id);
        }

        Ok(Self {
            templates,
            decoy_id,
            threshold,
            tie_break,
        })
    }

    /// Loads every template under `dir` (recursively, sorted by path).
    pub fn load(dir: &Path, decoy_id: &str, threshold: f32, tie_break: TieBreak) -> Result<Self> {
        let templates = load_template_dir(dir)?;
        Ok(Self::new(templates, decoy_id, threshold, tie_break)?)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    fn verdict_for(&self, id: Option<&str>) -> Verdict {
        match id {
            None => Verdict::NoReport,
            Some(id) if id == self.decoy_id => Verdict::FalseReport(id.to_string()),
            Some(id) => Verdict::GenuineReport(id.to_string()),
        }
    }

    /// Classifies `frame`, updating the identifier retained in `session`.
    pub fn classify(
        &self,
        matcher: &TemplateMatcher,
        frame: &Frame,
        session: &mut SessionState,
    ) -> Result<Classification, MatchError> {
        let search = matcher.prepare(frame);

        let mut chosen: Option<(&Template, f32)> = None;
        for template in &self.templates {
            let Some(region) = matcher.locate_in(&search, template, self.threshold)? else {
                continue;
            };
            tracing::debug!("Report template {} matched ({:.2})", template.id(), region.score);

            chosen = match (self.tie_break, chosen) {
                (TieBreak::BestScore, Some((_, best))) if region.score < best => chosen,
                _ => Some((template, region.score)),
            };
        }

        let fresh = chosen.is_some();
        if let Some((template, _)) = chosen {
            session.retained = Some(template.id().to_string());
        }

        Ok(Classification {
            verdict: self.verdict_for(session.retained()),
            fresh,
        })
    }
}

//! One watch cycle: dismiss, check, classify, record, dismiss.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::input::{Pointer, click_if_present};
use crate::capture::FrameSource;
use crate::config::WatcherConfig;
use crate::ocr::{TextRecognizer, TimestampGrammar};
use crate::report::{ReportClassifier, ReportRecord, SessionState, SourceId, Verdict, append_records};
use crate::vision::{Template, TemplateMatcher};

/// What a completed cycle found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A genuine report; holds the records appended to the log (possibly none)
    Genuine(Vec<ReportRecord>),
    FalseReport,
    NoReport,
}

#[derive(Debug, Clone, Copy)]
enum Button {
    Check,
    Dismiss,
}

/// Button and report templates, loaded once at startup.
pub struct Assets {
    pub check_button: Template,
    pub dismiss_button: Template,
    pub classifier: ReportClassifier,
}

impl Assets {
    pub fn load(config: &WatcherConfig) -> Result<Self> {
        let check_button = Template::load(&crate::paths::resolve(&config.check_button))?;
        let dismiss_button = Template::load(&crate::paths::resolve(&config.dismiss_button))?;
        let classifier = ReportClassifier::load(
            &crate::paths::resolve(&config.report_templates),
            &config.decoy_template,
            config.match_threshold,
            config.tie_break,
        )?;
        tracing::info!("Loaded {} report templates", classifier.templates().len());

        Ok(Self {
            check_button,
            dismiss_button,
            classifier,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub match_threshold: f32,
    pub gate_threshold: f32,
    pub settle_delay: Duration,
    pub report_log: PathBuf,
}

impl CycleSettings {
    pub fn from_config(config: &WatcherConfig) -> Self {
        Self {
            match_threshold: config.match_threshold,
            gate_threshold: config.gate_threshold,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            report_log: crate::paths::resolve(&config.report_log),
        }
    }
}

/// Drives the page through its collaborators.
pub struct Watcher<S, P, R> {
    source: S,
    pointer: P,
    recognizer: R,
    matcher: TemplateMatcher,
    assets: Assets,
    grammar: TimestampGrammar,
    settings: CycleSettings,
}

impl<S, P, R> Watcher<S, P, R>
where
    S: FrameSource,
    P: Pointer,
    R: TextRecognizer,
{
    pub fn new(
        source: S,
        pointer: P,
        recognizer: R,
        matcher: TemplateMatcher,
        assets: Assets,
        settings: CycleSettings,
    ) -> Result<Self> {
        Ok(Self {
            source,
            pointer,
            recognizer,
            matcher,
            assets,
            grammar: TimestampGrammar::new()?,
            settings,
        })
    }

    pub fn report_log(&self) -> &Path {
        &self.settings.report_log
    }

    #[cfg(test)]
    pub fn pointer(&self) -> &P {
        &self.pointer
    }

    /// Whether a check button is on screen, at the stricter gate threshold.
    pub fn check_button_visible(&mut self) -> Result<bool> {
        let frame = self.source.capture()?;
        let found = self
            .matcher
            .locate_all(&frame, &self.assets.check_button, self.settings.gate_threshold)?;
        if !found.is_empty() {
            tracing::debug!("{} check button(s) visible", found.len());
        }
        Ok(!found.is_empty())
    }

    /// Clicks `button` on a fresh frame if it is visible.
    fn click_fresh(&mut self, button: Button) -> Result<bool> {
        let frame = self.source.capture()?;
        let template = match button {
            Button::Check => &self.assets.check_button,
            Button::Dismiss => &self.assets.dismiss_button,
        };
        click_if_present(
            &mut self.pointer,
            &self.matcher,
            &frame,
            template,
            self.settings.match_threshold,
        )
    }

    /// Runs one cycle. `session` carries the last matched report template
    /// from cycle to cycle.
    pub fn run_cycle(&mut self, session: &mut SessionState) -> Result<CycleOutcome> {
        thread::sleep(self.settings.settle_delay);

        // A dialog may still be open from the previous cycle
        self.click_fresh(Button::Dismiss)?;

        if self.click_fresh(Button::Check)? {
            thread::sleep(self.settings.settle_delay);
        }

        let frame = self.source.capture()?;
        let classification = self
            .assets
            .classifier
            .classify(&self.matcher, &frame, session)?;
        if !classification.fresh {
            tracing::debug!("No report template matched, keeping {:?}", session.retained());
        }

        let outcome = match classification.verdict {
            Verdict::GenuineReport(template_id) => {
                tracing::info!("Report from template {}", template_id);
                let records = self.record_report(&template_id)?;
                CycleOutcome::Genuine(records)
            }
            Verdict::FalseReport(template_id) => {
                tracing::info!("False report ({})", template_id);
                CycleOutcome::FalseReport
            }
            Verdict::NoReport => {
                tracing::debug!("No report");
                CycleOutcome::NoReport
            }
        };

        self.click_fresh(Button::Dismiss)?;
        Ok(outcome)
    }

    /// Reads the report text off a fresh frame and appends every valid line.
    fn record_report(&mut self, template_id: &str) -> Result<Vec<ReportRecord>> {
        let source = SourceId::from_template(template_id)?;
        let frame = self.source.capture()?;
        tracing::debug!(
            "Reading report from frame captured at {}",
            frame.captured_at().format("%H:%M:%S%.3f")
        );
        let text = self
            .recognizer
            .recognize(&frame)
            .context("Text recognition failed")?;

        let records = self.grammar.extract_records(&text, &source);
        if records.is_empty() {
            tracing::warn!("No timestamp found in report from {}", source);
            return Ok(records);
        }

        append_records(&self.settings.report_log, &records)?;
        for record in &records {
            tracing::info!("Recorded {}: {}", record.source, record.timestamp_text);
        }
        Ok(records)
    }
}

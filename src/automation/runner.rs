//! The outer watch loop.
//!
//! Polls until cancelled or until the browser goes away. Each iteration runs
//! a cycle only when a check button is on screen, then ships the report log.
//! Cancellation is checked at the top and bottom of every iteration; a cycle
//! that has started always completes.

use anyhow::{Context, Result};
use std::path::Path;
use std::thread;
use std::time::Duration;

use super::browser::Browser;
use super::cancel::CancelToken;
use super::cycle::{CycleOutcome, Watcher};
use super::input::Pointer;
use crate::capture::FrameSource;
use crate::ocr::TextRecognizer;
use crate::report::SessionState;
use crate::transfer::{Dispatcher, RemoteStore, TransferError};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Cancelled,
    BrowserClosed,
}

/// Uploads the log, treating an unavailable server as a skipped upload.
pub fn deliver<T: RemoteStore>(dispatcher: &Dispatcher<T>, report_log: &Path) -> Result<()> {
    if !report_log.exists() {
        tracing::debug!("No report log yet, nothing to send");
        return Ok(());
    }

    match dispatcher.send(report_log) {
        Ok(()) => Ok(()),
        Err(TransferError::Unavailable(reason)) => {
            tracing::warn!("Report server unavailable, log kept for the next cycle: {}", reason);
            Ok(())
        }
        Err(e) => Err(e).context("Report transfer failed"),
    }
}

/// One gated iteration: a cycle and a transfer if the check button is
/// visible, nothing otherwise.
pub fn step<S, P, R, T>(
    watcher: &mut Watcher<S, P, R>,
    session: &mut SessionState,
    dispatcher: &Dispatcher<T>,
) -> Result<Option<CycleOutcome>>
where
    S: FrameSource,
    P: Pointer,
    R: TextRecognizer,
    T: RemoteStore,
{
    if !watcher.check_button_visible()? {
        return Ok(None);
    }

    let outcome = watcher.run_cycle(session)?;
    deliver(dispatcher, watcher.report_log())?;
    Ok(Some(outcome))
}

/// Runs until `cancel` is set or the browser closes, then closes the browser.
pub fn run<S, P, R, T>(
    watcher: &mut Watcher<S, P, R>,
    browser: &mut dyn Browser,
    dispatcher: &Dispatcher<T>,
    cancel: &CancelToken,
    poll_interval: Duration,
) -> Result<Shutdown>
where
    S: FrameSource,
    P: Pointer,
    R: TextRecognizer,
    T: RemoteStore,
{
    tracing::info!("Watching for reports (Esc or Ctrl+C to stop)");

    let mut session = SessionState::new();
    let mut cycles = 0u64;
    let result = watch_loop(watcher, browser, dispatcher, cancel, poll_interval, &mut session, &mut cycles);

    if let Err(e) = browser.close() {
        tracing::warn!("Failed to close browser: {:#}", e);
    }

    match &result {
        Ok(Shutdown::Cancelled) => tracing::info!("Stopped on request after {} cycles", cycles),
        Ok(Shutdown::BrowserClosed) => tracing::info!("Browser closed, stopping after {} cycles", cycles),
        Err(e) => tracing::error!("Watch loop failed after {} cycles: {:#}", cycles, e),
    }
    result
}

fn watch_loop<S, P, R, T>(
    watcher: &mut Watcher<S, P, R>,
    browser: &mut dyn Browser,
    dispatcher: &Dispatcher<T>,
    cancel: &CancelToken,
    poll_interval: Duration,
    session: &mut SessionState,
    cycles: &mut u64,
) -> Result<Shutdown>
where
    S: FrameSource,
    P: Pointer,
    R: TextRecognizer,
    T: RemoteStore,
{
    loop {
        if cancel.is_cancelled() {
            return Ok(Shutdown::Cancelled);
        }
        if !browser.is_alive() {
            return Ok(Shutdown::BrowserClosed);
        }

        thread::sleep(poll_interval);

        if step(watcher, session, dispatcher)?.is_some() {
            *cycles += 1;
        }

        if cancel.is_cancelled() {
            return Ok(Shutdown::Cancelled);
        }
    }
}

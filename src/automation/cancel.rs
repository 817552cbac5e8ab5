//! Cooperative cancellation for the watch loop.
//!
//! The loop polls a shared `CancelToken`. Two sources may set it: a global
//! Escape-key listener and the Ctrl+C handler. Neither interrupts a cycle in
//! progress.

use anyhow::{Context, Result};
use rdev::{Event, EventType, Key, listen};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cancels `token` on Ctrl+C. Can only be installed once per process.
pub fn install_ctrlc_handler(token: &CancelToken) -> Result<()> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        tracing::info!("Ctrl+C received, stopping after the current cycle");
        token.cancel();
    })
    .context("Failed to install Ctrl+C handler")
}

/// Cancels `token` when Escape is pressed anywhere on the desktop.
///
/// The listener thread runs for the rest of the process; if the platform
/// refuses global input hooks, a warning is logged and only Ctrl+C remains.
pub fn spawn_escape_listener(token: &CancelToken) -> Result<()> {
    let token = token.clone();
    thread::Builder::new()
        .name("escape-listener".to_string())
        .spawn(move || {
            let callback = move |event: Event| {
                if let EventType::KeyPress(Key::Escape) = event.event_type {
                    if !token.is_cancelled() {
                        tracing::info!("Escape pressed, stopping after the current cycle");
                    }
                    token.cancel();
                }
            };

            if let Err(error) = listen(callback) {
                tracing::warn!("Escape key listener unavailable: {:?}", error);
            }
        })
        .context("Failed to spawn escape key listener")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_clear() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let remote = token.clone();

        thread::spawn(move || remote.cancel()).join().unwrap();

        assert!(token.is_cancelled());
    }
}

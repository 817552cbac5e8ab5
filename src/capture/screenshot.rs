//! Screenshot capture of the primary monitor using xcap.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use xcap::Monitor;

use super::frame::{Frame, FrameSource};

/// Captures the primary monitor on every request.
pub struct ScreenCapture {
    /// Optional PNG target each capture is also written to
    save_to: Option<PathBuf>,
}

impl ScreenCapture {
    pub fn new(save_to: Option<PathBuf>) -> Self {
        Self { save_to }
    }
}

/// Picks the primary monitor, falling back to the first one reported.
fn primary_monitor() -> Result<Monitor> {
    let monitors = Monitor::all().context("Failed to enumerate monitors")?;

    let index = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(0);

    monitors.into_iter().nth(index).context("No monitors found")
}

impl FrameSource for ScreenCapture {
    fn capture(&mut self) -> Result<Frame> {
        let monitor = primary_monitor()?;
        let origin = (monitor.x().unwrap_or(0), monitor.y().unwrap_or(0));

        let image = monitor
            .capture_image()
            .context("Failed to capture screen. Check screen recording permissions")?;

        if image.width() == 0 || image.height() == 0 {
            bail!("Captured empty screenshot - possible permission issue or no display");
        }

        if let Some(path) = &self.save_to {
            image
                .save(path)
                .with_context(|| format!("Failed to save capture to {}", path.display()))?;
        }

        let frame = Frame::with_origin(image, origin);
        let (w, h) = frame.dimensions();
        tracing::trace!("Captured {}x{} frame at ({}, {})", w, h, origin.0, origin.1);
        Ok(frame)
    }
}

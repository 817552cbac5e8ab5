//! Mouse input simulation for UI automation.
//!
//! Clicks are sent as real input events at absolute screen coordinates, so
//! the actual cursor moves to the target.

use anyhow::{Result, anyhow};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use std::time::Duration;

use crate::capture::Frame;
use crate::vision::{MatchRegion, Template, TemplateMatcher};

/// Something that can click at an absolute screen position.
pub trait Pointer {
    fn click(&mut self, x: i32, y: i32) -> Result<()>;
}

/// Clicks the center of a region found in `frame`.
pub fn click_region<P: Pointer + ?Sized>(pointer: &mut P, frame: &Frame, region: &MatchRegion) -> Result<()> {
    let (cx, cy) = region.center();
    let (x, y) = frame.to_screen(cx, cy);
    tracing::debug!("Clicking at ({}, {}) (score {:.2})", x, y, region.score);
    pointer.click(x, y)
}

/// Clicks the best match of `template` in `frame`, if there is one.
///
/// Returns whether a match existed. Nothing is clicked otherwise.
pub fn click_if_present<P: Pointer + ?Sized>(
    pointer: &mut P,
    matcher: &TemplateMatcher,
    frame: &Frame,
    template: &Template,
    threshold: f32,
) -> Result<bool> {
    match matcher.locate(frame, template, threshold)? {
        Some(region) => {
            tracing::debug!("{} found", template.id());
            click_region(pointer, frame, &region)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Pointer backed by the system input APIs.
pub struct SystemPointer {
    enigo: Enigo,
}

impl SystemPointer {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("Failed to connect to the input system: {}", e))?;
        Ok(Self { enigo })
    }
}

impl Pointer for SystemPointer {
    fn click(&mut self, x: i32, y: i32) -> Result<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| anyhow!("Mouse move failed: {}", e))?;

        // Let the cursor settle before pressing
        std::thread::sleep(Duration::from_millis(20));

        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| anyhow!("Mouse click failed: {}", e))?;
        Ok(())
    }
}

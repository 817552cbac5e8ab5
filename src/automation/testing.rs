//! Fakes for the watcher's collaborators.

use anyhow::{Result, anyhow};
use std::collections::VecDeque;

use super::browser::Browser;
use super::input::Pointer;
use crate::capture::{Frame, FrameSource};
use crate::ocr::TextRecognizer;

#[derive(Default)]
pub struct RecordingPointer {
    pub clicks: Vec<(i32, i32)>,
}

impl Pointer for RecordingPointer {
    fn click(&mut self, x: i32, y: i32) -> Result<()> {
        self.clicks.push((x, y));
        Ok(())
    }
}

/// Hands out frames in order, then keeps repeating the last one.
pub struct ScriptedSource {
    frames: VecDeque<Frame>,
    last: Option<Frame>,
    pub captures: usize,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            last: None,
            captures: 0,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn capture(&mut self) -> Result<Frame> {
        self.captures += 1;
        if let Some(frame) = self.frames.pop_front() {
            self.last = Some(frame);
        }
        self.last.clone().ok_or_else(|| anyhow!("no frames scripted"))
    }
}

/// Returns the same text for every frame.
pub struct FixedText {
    pub text: String,
    pub calls: std::cell::Cell<usize>,
}

impl FixedText {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: std::cell::Cell::new(0),
        }
    }
}

impl TextRecognizer for FixedText {
    fn recognize(&self, _frame: &Frame) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.text.clone())
    }
}

/// A browser that stays open until `alive_checks` runs out.
pub struct FakeBrowser {
    pub alive_checks: Option<usize>,
    pub closed: bool,
}

impl FakeBrowser {
    pub fn open_forever() -> Self {
        Self {
            alive_checks: None,
            closed: false,
        }
    }

    pub fn closing_after(checks: usize) -> Self {
        Self {
            alive_checks: Some(checks),
            closed: false,
        }
    }
}

impl Browser for FakeBrowser {
    fn is_alive(&mut self) -> bool {
        match &mut self.alive_checks {
            None => !self.closed,
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                !self.closed
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

//! Screen capture for the watched browser page.
//!
//! This module provides:
//! - The `Frame` type handed to template matching and OCR
//! - The `FrameSource` seam the watcher captures through
//! - Primary-monitor capture (`ScreenCapture`)

pub mod frame;
pub mod screenshot;

pub use frame::{Frame, FrameSource};
pub use screenshot::ScreenCapture;

//! Page automation: the watch cycle and the loop that drives it.
//!
//! This module provides:
//! - Mouse input at absolute screen coordinates
//! - The browser showing the watched page
//! - Cooperative cancellation (Escape key, Ctrl+C)
//! - One watch cycle and the outer polling loop

pub mod browser;
pub mod cancel;
pub mod cycle;
pub mod input;
pub mod runner;

#[cfg(test)]
pub mod testing;

pub use browser::open_page;
pub use cancel::{CancelToken, install_ctrlc_handler, spawn_escape_listener};
pub use cycle::{Assets, CycleSettings, Watcher};
pub use input::SystemPointer;
pub use runner::{Shutdown, run, step};

//! Template images and the matcher that finds them on screen.

pub mod matcher;
pub mod template;

#[cfg(test)]
pub mod testing;

pub use matcher::{MatchError, MatchRegion, TemplateMatcher};
pub use template::{Template, load_template_dir};

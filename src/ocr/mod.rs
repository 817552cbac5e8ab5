pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{Tesseract, TextRecognizer};
pub use extract::TimestampGrammar;

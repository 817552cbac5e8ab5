use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

use super::preprocess::prepare_for_ocr;
use super::setup::{ensure_tessdata, find_tesseract_executable};
use crate::capture::Frame;

/// Turns a frame into raw multi-line text.
pub trait TextRecognizer {
    fn recognize(&self, frame: &Frame) -> Result<String>;
}

/// Tesseract command-line engine.
#[derive(Debug, Clone)]
pub struct Tesseract {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    language: String,
}

impl Tesseract {
    /// Locates the executable and language data, downloading the data if needed.
    pub fn locate(configured: Option<&Path>, language: &str) -> Result<Self> {
        let executable = find_tesseract_executable(configured)?;
        let tessdata = ensure_tessdata(&executable, language)?;
        tracing::info!("Tesseract found at: {}", executable.display());

        Ok(Self {
            executable,
            tessdata,
            language: language.to_string(),
        })
    }
}

impl TextRecognizer for Tesseract {
    fn recognize(&self, frame: &Frame) -> Result<String> {
        let img = prepare_for_ocr(frame.to_luma());

        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let mut command = Command::new(&self.executable);
        command
            .arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg("3"); // Fully automatic page segmentation
        if let Some(dir) = &self.tessdata {
            command.arg("--tessdata-dir").arg(dir);
        }

        let output = command
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        tracing::debug!("OCR produced {} lines", text.lines().count());
        Ok(text)
    }
}

use anyhow::{Result, anyhow};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Install locations checked when Tesseract is not on PATH.
#[cfg(windows)]
const COMMON_EXECUTABLES: [&str; 2] = [
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];
#[cfg(not(windows))]
const COMMON_EXECUTABLES: [&str; 3] = [
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

#[cfg(windows)]
const COMMON_TESSDATA: [&str; 2] = [
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];
#[cfg(not(windows))]
const COMMON_TESSDATA: [&str; 4] = [
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

/// Returns the directory for locally stored language data
pub fn get_tessdata_dir() -> PathBuf {
    crate::paths::get_data_dir().join("tessdata")
}

fn traineddata_name(language: &str) -> String {
    format!("{}.traineddata", language)
}

fn runs(executable: &Path) -> bool {
    Command::new(executable)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Finds the Tesseract executable: the configured path, then PATH, then
/// common install locations.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!("Configured Tesseract not found at {}", path.display());
    }

    let on_path = PathBuf::from("tesseract");
    if runs(&on_path) {
        return Ok(on_path);
    }

    COMMON_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Tesseract not found. Please install Tesseract-OCR or set tesseract_path."))
}

/// Finds a tessdata directory containing `language`, checking the local data
/// dir, then TESSDATA_PREFIX, then common install locations.
pub fn find_tessdata_dir(language: &str) -> Option<PathBuf> {
    let file = traineddata_name(language);

    let mut candidates = vec![get_tessdata_dir()];
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        candidates.push(PathBuf::from(&prefix));
        candidates.push(PathBuf::from(&prefix).join("tessdata"));
    }
    candidates.extend(COMMON_TESSDATA.iter().map(PathBuf::from));

    candidates.into_iter().find(|dir| dir.join(&file).exists())
}

/// Whether the Tesseract install lists `language` among its own languages.
fn has_builtin_language(executable: &Path, language: &str) -> bool {
    Command::new(executable)
        .arg("--list-langs")
        .output()
        .map(|output| {
            // Older releases print the list on stderr
            let listing = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            listing.lines().any(|line| line.trim() == language)
        })
        .unwrap_or(false)
}

/// Ensures language data for `language` is available.
///
/// Returns the tessdata directory to pass to Tesseract, or `None` when the
/// install's default directory already has the language.
pub fn ensure_tessdata(executable: &Path, language: &str) -> Result<Option<PathBuf>> {
    if let Some(dir) = find_tessdata_dir(language) {
        tracing::info!("Using tessdata at: {}", dir.display());
        return Ok(Some(dir));
    }

    if has_builtin_language(executable, language) {
        return Ok(None);
    }

    let dir = get_tessdata_dir();
    download_tessdata(&dir, language)?;
    Ok(Some(dir))
}

/// Downloads trained data for `language` into `tessdata_dir`.
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    let file = traineddata_name(language);
    let url = format!("{}/{}", TESSDATA_REPO, file);
    fs::create_dir_all(tessdata_dir)?;

    tracing::info!("Downloading {}...", file);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client.get(&url).header("User-Agent", "fast-react").send()?;

    if !response.status().is_success() {
        return Err(anyhow!("Failed to download {}: HTTP {}", file, response.status()));
    }

    let bytes = response.bytes()?;
    let mut out = fs::File::create(tessdata_dir.join(&file))?;
    out.write_all(&bytes)?;

    tracing::info!("Downloaded {} ({} bytes)", file, bytes.len());
    Ok(())
}

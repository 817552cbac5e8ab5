//! Configuration types for the report watcher.
//!
//! Loads settings from config.json at startup. Provides template locations,
//! match thresholds, timing parameters and the remote store credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::TieBreak;

/// Environment variables that override the remote store settings.
pub const ENV_FTP_HOST: &str = "FAST_REACT_FTP_HOST";
pub const ENV_FTP_PORT: &str = "FAST_REACT_FTP_PORT";
pub const ENV_FTP_USER: &str = "FAST_REACT_FTP_USER";
pub const ENV_FTP_PASSWORD: &str = "FAST_REACT_FTP_PASSWORD";

/// Remote store connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Directory on the server the log is stored into
    pub directory: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 21,
            username: "anonymous".to_string(),
            password: String::new(),
            directory: "pycamp".to_string(),
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("directory", &self.directory)
            .finish()
    }
}

/// Complete watcher configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Local HTML document opened in the browser
    pub page: PathBuf,
    /// Browser argv; the page URL is appended. Uses the system opener when empty.
    pub browser_command: Vec<String>,
    /// Template of the "check" (sprawdź) button
    pub check_button: PathBuf,
    /// Template of the button that closes a report dialog
    pub dismiss_button: PathBuf,
    /// Folder holding every report-source template, searched recursively
    pub report_templates: PathBuf,
    /// File name of the decoy template inside `report_templates`
    pub decoy_template: String,
    /// Similarity required for buttons and report templates (0.0-1.0)
    pub match_threshold: f32,
    /// Similarity required for the check button before a cycle runs (0.0-1.0)
    pub gate_threshold: f32,
    /// Downscale factor applied to frame and template before matching
    pub search_scale: f32,
    /// How simultaneous report-template matches are resolved
    pub tie_break: TieBreak,
    /// Pause before each cycle and after clicking the check button (milliseconds)
    pub settle_delay_ms: u64,
    /// Pause between outer loop iterations (milliseconds)
    pub poll_interval_ms: u64,
    /// Append-only report log
    pub report_log: PathBuf,
    /// When set, every captured frame is also written to this PNG file
    pub save_captures_to: Option<PathBuf>,
    /// Explicit Tesseract executable; searched for when unset
    pub tesseract_path: Option<PathBuf>,
    /// Tesseract language code
    pub ocr_language: String,
    pub remote: RemoteConfig,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            page: PathBuf::from("web").join("strona.html"),
            browser_command: Vec::new(),
            check_button: PathBuf::from("buttons").join("sprawdz.png"),
            dismiss_button: PathBuf::from("buttons").join("zamknij_zgloszenie.png"),
            report_templates: PathBuf::from("web").join("img").join("penguins_check"),
            decoy_template: "no_report.png".to_string(),
            match_threshold: 0.6,
            gate_threshold: 0.7,
            search_scale: 0.5,
            tie_break: TieBreak::LastMatch,
            settle_delay_ms: 100,
            poll_interval_ms: 10,
            report_log: PathBuf::from("penguins_report.txt"),
            save_captures_to: None,
            tesseract_path: None,
            ocr_language: "eng".to_string(),
            remote: RemoteConfig::default(),
        }
    }
}

impl WatcherConfig {
    /// Applies remote store overrides looked up by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_FTP_HOST) {
            self.remote.host = host;
        }
        if let Some(port) = lookup(ENV_FTP_PORT) {
            match port.parse() {
                Ok(port) => self.remote.port = port,
                Err(e) => tracing::warn!("Ignoring {}={:?}: {}", ENV_FTP_PORT, port, e),
            }
        }
        if let Some(user) = lookup(ENV_FTP_USER) {
            self.remote.username = user;
        }
        if let Some(password) = lookup(ENV_FTP_PASSWORD) {
            self.remote.password = password;
        }
    }
}

/// Finds config.json: next to the executable first, then the working directory.
fn default_config_path() -> PathBuf {
    let beside_exe = crate::paths::get_exe_dir().join("config.json");
    if beside_exe.exists() {
        beside_exe
    } else {
        Path::new("config.json").to_path_buf()
    }
}

/// Loads configuration from `path` (or the default location) or returns defaults.
/// Credentials from the environment (and a `.env` file) are applied on top.
pub fn load_config(path: Option<&Path>) -> WatcherConfig {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    tracing::info!("Looking for config at: {}", config_path.display());

    let mut config = read_config_file(&config_path).unwrap_or_default();

    if dotenv::dotenv().is_ok() {
        tracing::debug!("Loaded environment from .env");
    }
    config.apply_overrides(|key| std::env::var(key).ok());
    config
}

fn read_config_file(path: &Path) -> Option<WatcherConfig> {
    if !path.exists() {
        tracing::info!("config.json not found. Using default config.");
        return None;
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Config loaded from {}", path.display());
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
            None
        }
    }
}

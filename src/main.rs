//! Fast React
//!
//! Watches a browser page for incoming reports, validates them by reading
//! their timestamp off the screen, appends them to a local log and ships the
//! log to an FTP server.

mod automation;
mod capture;
mod config;
mod ocr;
mod paths;
mod report;
mod transfer;
mod vision;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::{self, time::ChronoLocal};
use tracing_subscriber::prelude::*;

use automation::{Assets, CancelToken, CycleSettings, Shutdown, SystemPointer, Watcher};
use capture::ScreenCapture;
use config::WatcherConfig;
use ocr::Tesseract;
use report::{LogSummary, SessionState};
use transfer::{Dispatcher, FtpStore};
use vision::TemplateMatcher;

const LOG_FILE: &str = "fast_react.log";
const TIME_FORMAT: &str = "%H:%M:%S%.3f";

#[derive(Parser)]
#[command(name = "fast-react", version, about = "Watches a page for reports and ships them to a server")]
struct Cli {
    /// Path to config.json (default: next to the executable, then the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the page and watch it until Esc or Ctrl+C (default)
    Watch,
    /// Run a single check cycle and transfer against the current screen
    Once,
    /// Upload the report log once
    Send,
    /// Print per-source counts from the report log
    Summary {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Console (stderr) and file logging, both with local wall-clock timestamps.
fn init_logging() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let log_path = paths::get_logs_dir().join(LOG_FILE);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();

        tracing::error!("[PANIC]{} {}", location, msg);
    }));
}

fn build_watcher(config: &WatcherConfig) -> Result<Watcher<ScreenCapture, SystemPointer, Tesseract>> {
    let assets = Assets::load(config)?;
    let recognizer = Tesseract::locate(config.tesseract_path.as_deref(), &config.ocr_language)?;
    let matcher = TemplateMatcher::new(config.search_scale)?;
    let source = ScreenCapture::new(config.save_captures_to.as_ref().map(|p| paths::resolve(p)));

    Watcher::new(
        source,
        SystemPointer::new()?,
        recognizer,
        matcher,
        assets,
        CycleSettings::from_config(config),
    )
}

fn build_dispatcher(config: &WatcherConfig) -> Dispatcher<FtpStore> {
    Dispatcher::new(FtpStore::from_config(&config.remote), config.remote.directory.clone())
}

fn watch(config: &WatcherConfig) -> Result<()> {
    let mut watcher = build_watcher(config)?;
    let dispatcher = build_dispatcher(config);

    let cancel = CancelToken::new();
    automation::install_ctrlc_handler(&cancel)?;
    automation::spawn_escape_listener(&cancel)?;

    let mut browser = automation::open_page(config)?;
    let shutdown = automation::run(
        &mut watcher,
        browser.as_mut(),
        &dispatcher,
        &cancel,
        Duration::from_millis(config.poll_interval_ms),
    )?;

    match shutdown {
        Shutdown::Cancelled => tracing::info!("Stopped"),
        Shutdown::BrowserClosed => tracing::info!("Page closed"),
    }
    Ok(())
}

fn once(config: &WatcherConfig) -> Result<()> {
    let mut watcher = build_watcher(config)?;
    let dispatcher = build_dispatcher(config);

    match automation::step(&mut watcher, &mut SessionState::new(), &dispatcher)? {
        Some(outcome) => tracing::info!("Cycle finished: {:?}", outcome),
        None => tracing::info!("No check button on screen, nothing to do"),
    }
    Ok(())
}

fn send(config: &WatcherConfig) -> Result<()> {
    let report_log = paths::resolve(&config.report_log);
    build_dispatcher(config)
        .send(&report_log)
        .with_context(|| format!("Failed to send {}", report_log.display()))?;
    tracing::info!("Report log sent");
    Ok(())
}

fn summary(config: &WatcherConfig, json: bool) -> Result<()> {
    let report_log = paths::resolve(&config.report_log);
    let summary = LogSummary::load(&report_log)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if summary.is_empty() {
        println!("No reports recorded in {}", report_log.display());
    } else {
        print!("{}", summary);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Ensure output directories exist
    paths::ensure_directories()?;
    init_logging()?;
    install_panic_hook();

    let config = config::load_config(cli.config.as_deref());
    tracing::debug!("{:?}", config);

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(&config),
        Command::Once => once(&config),
        Command::Send => send(&config),
        Command::Summary { json } => summary(&config, json),
    }
}

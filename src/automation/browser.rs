//! The browser showing the watched page.

use anyhow::{Context, Result, anyhow, bail};
use std::path::Path;
use std::process::{Child, Command};
use url::Url;

use crate::config::WatcherConfig;

/// A browser window the watcher runs against.
pub trait Browser {
    /// Whether the page is still open.
    fn is_alive(&mut self) -> bool;

    fn close(&mut self) -> Result<()>;
}

/// `file://` URL for a local document.
pub fn page_url(page: &Path) -> Result<Url> {
    let absolute = crate::paths::resolve(page);
    Url::from_file_path(&absolute).map_err(|_| anyhow!("Cannot build a file URL for {}", absolute.display()))
}

/// A browser started from a configured command line; the page URL is its
/// last argument. Alive while the process runs.
pub struct ProcessBrowser {
    child: Child,
}

impl ProcessBrowser {
    pub fn launch(command: &[String], url: &Url) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("Browser command is empty"))?;

        let child = Command::new(program)
            .args(args)
            .arg(url.as_str())
            .spawn()
            .with_context(|| format!("Failed to start browser {}", program))?;

        tracing::info!("Browser started (pid {})", child.id());
        Ok(Self { child })
    }
}

impl Browser for ProcessBrowser {
    fn is_alive(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::info!("Browser exited ({})", status);
                false
            }
            Err(e) => {
                tracing::warn!("Cannot query browser process: {}", e);
                false
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.kill().context("Failed to stop browser")?;
            self.child.wait().context("Failed to reap browser process")?;
            tracing::info!("Browser closed");
        }
        Ok(())
    }
}

/// The page handed to the desktop's default opener. There is no handle on
/// the resulting window, so it always counts as alive and closing is a no-op.
pub struct SystemBrowser;

impl SystemBrowser {
    pub fn open(url: &Url) -> Result<Self> {
        open::that(url.as_str()).with_context(|| format!("Failed to open {}", url))?;
        Ok(Self)
    }
}

impl Browser for SystemBrowser {
    fn is_alive(&mut self) -> bool {
        true
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens the configured page in the configured browser.
pub fn open_page(config: &WatcherConfig) -> Result<Box<dyn Browser>> {
    let page = crate::paths::resolve(&config.page);
    if !page.is_file() {
        bail!("Page {} does not exist", page.display());
    }
    let url = page_url(&page)?;
    tracing::info!("Opening {}", url);

    if config.browser_command.is_empty() {
        Ok(Box::new(SystemBrowser::open(&url)?))
    } else {
        Ok(Box::new(ProcessBrowser::launch(&config.browser_command, &url)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_page_url_is_file_url() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("strona.html");

        let url = page_url(&page).unwrap();

        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/strona.html"));
    }

    #[test]
    fn test_open_page_rejects_missing_document() {
        let dir = tempdir().unwrap();
        let config = WatcherConfig {
            page: dir.path().join("missing.html"),
            ..WatcherConfig::default()
        };
        assert!(open_page(&config).is_err());
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let url = Url::parse("file:///tmp/strona.html").unwrap();
        assert!(ProcessBrowser::launch(&[], &url).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_browser_lifecycle() {
        let url = Url::parse("file:///tmp/strona.html").unwrap();
        // The URL lands in $0 of the shell script
        let command = ["sh", "-c", "sleep 30"].map(String::from);
        let mut browser = ProcessBrowser::launch(&command, &url).unwrap();

        assert!(browser.is_alive());
        browser.close().unwrap();
        assert!(!browser.is_alive());
    }

    #[cfg(unix)]
    #[test]
    fn test_exited_process_is_not_alive() {
        let url = Url::parse("file:///tmp/strona.html").unwrap();
        let command = ["sh", "-c", "exit 0"].map(String::from);
        let mut browser = ProcessBrowser::launch(&command, &url).unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while browser.is_alive() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        assert!(!browser.is_alive());
        browser.close().unwrap();
    }
}

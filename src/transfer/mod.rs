//! Upload of the report log to the remote store.
//!
//! The whole log file is sent on every dispatch and left in place locally, so
//! a failed upload is simply repeated with the next cycle.

pub mod ftp;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub use ftp::FtpStore;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The server could not be reached or refused access
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("transfer failed: {0}")]
    Transport(String),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An open, logged-in connection to the remote store.
pub trait RemoteSession {
    fn change_dir(&mut self, dir: &str) -> Result<(), TransferError>;

    /// Stores the reader's bytes under `name` in binary mode.
    fn store(&mut self, name: &str, reader: &mut dyn Read) -> Result<(), TransferError>;

    /// Ends the session politely.
    fn finish(self) -> Result<(), TransferError>;
}

/// Opens sessions against a remote store.
pub trait RemoteStore {
    type Session: RemoteSession;

    fn connect(&self) -> Result<Self::Session, TransferError>;
}

/// Sends the local log file into a fixed remote directory.
pub struct Dispatcher<S: RemoteStore> {
    store: S,
    directory: String,
}

impl<S: RemoteStore> Dispatcher<S> {
    pub fn new(store: S, directory: impl Into<String>) -> Self {
        Self {
            store,
            directory: directory.into(),
        }
    }

    /// Uploads `path` under its own file name. One attempt, no retries.
    pub fn send(&self, path: &Path) -> Result<(), TransferError> {
        let io_error = |source| TransferError::Io {
            path: path.to_path_buf(),
            source,
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| io_error(std::io::Error::other("path has no file name")))?;
        let mut file = File::open(path).map_err(io_error)?;

        let mut session = self.store.connect()?;
        session.change_dir(&self.directory)?;
        session.store(&name, &mut file)?;
        session.finish()?;

        tracing::info!("Uploaded {} to {}/", name, self.directory);
        Ok(())
    }
}

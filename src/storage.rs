//! Local persistence for reconciled state and investigations.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <root>/
//!   state.sqlite     # The state blob, rewritten inside a transaction per event
//!   investigations   # Append-only `group project id` lines
//! ```

mod investigations;
mod state;

use std::{fs, io, path::PathBuf};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Local file-based storage for the radiator.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the default storage root: `~/.radiator/data/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".radiator").join("data"))
    }

    fn state_path(&self) -> PathBuf {
        self.root.join("state.sqlite")
    }

    fn investigations_path(&self) -> PathBuf {
        self.root.join("investigations")
    }
}

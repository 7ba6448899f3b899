//! Persistence of session credentials. Pure I/O, no protocol logic.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::Credentials;

/// Reads and writes the credential file named in the client configuration.
///
/// The file holds one pretty-printed JSON object so users can inspect and
/// delete their session by hand.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when no credential file exists yet.
    pub fn load(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn store(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(credentials)?)?;
        Ok(())
    }

    /// Removes the credential file. Missing file counts as cleared.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

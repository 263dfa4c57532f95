//! Baseline persistence
//!
//! The last delivered reading is the reference for the next validation, so it
//! has to survive a restart. It is stored as a small JSON document, written to
//! a temporary file and renamed into place on every change.
//!
//! A missing or unreadable file loads as "no prior reading": the next sample
//! is validated as a bootstrap sample instead of halting the agent.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror_no_std::Error;

use crate::reading::Baseline;

/// Errors from the baseline store
#[derive(Error, Debug)]
pub enum BaselineError {
    /// Reading or writing the file failed
    #[error("Baseline I/O error: {0}")]
    Io(io::Error),

    /// The stored document is not a baseline
    #[error("Baseline format error: {0}")]
    Format(serde_json::Error),
}

impl From<io::Error> for BaselineError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for BaselineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err)
    }
}

/// Baseline stored in a JSON file
#[derive(Debug, Clone)]
pub struct BaselineFile {
    path: PathBuf,
}

impl BaselineFile {
    /// Store the baseline at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored baseline
    pub fn load(&self) -> Result<Baseline, BaselineError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Baseline::none()),
            Err(err) => return Err(err.into()),
        };
        if bytes.is_empty() {
            return Ok(Baseline::none());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read the stored baseline, falling back to "no prior reading"
    pub fn load_or_default(&self) -> Baseline {
        match self.load() {
            Ok(baseline) => baseline,
            Err(err) => {
                log::warn!(
                    "ignoring unreadable baseline {}: {}",
                    self.path.display(),
                    err
                );
                Baseline::none()
            }
        }
    }

    /// Persist the baseline atomically
    pub fn save(&self, baseline: &Baseline) -> Result<(), BaselineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = self.path.with_extension("tmp");
        let bytes = serde_json::to_vec(baseline)?;

        let mut file = File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

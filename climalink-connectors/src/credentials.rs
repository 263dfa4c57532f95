//! Sensor credential persistence
//!
//! The collector issues an id and an API key once, at registration. They are
//! kept in a JSON file next to the backlog:
//!
//! ```json
//! {"sensor_id":"3f2a","api_key":"c0ffee…","name":"attic","location":"Kharkiv"}
//! ```
//!
//! Writes go to `<path>.tmp` first and are renamed into place.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use climalink_core::Identity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credential store errors
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reading or writing the file failed
    #[error("Credential I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a credential document
    #[error("Credential format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// What the collector issued, plus what it was issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Id assigned by the collector
    pub sensor_id: String,
    /// Key sent as `x-api-key`
    pub api_key: String,
    /// Name the sensor registered under
    #[serde(default)]
    pub name: String,
    /// Location the sensor registered with
    #[serde(default)]
    pub location: String,
}

impl Credentials {
    /// Both the id and the key are present
    pub fn is_complete(&self) -> bool {
        !self.sensor_id.is_empty() && !self.api_key.is_empty()
    }

    /// First characters of the API key, safe to log
    pub fn key_hint(&self) -> &str {
        key_hint(&self.api_key)
    }

    /// The part the delivery path needs
    pub fn identity(&self) -> Identity {
        Identity {
            sensor_id: self.sensor_id.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

pub(crate) fn key_hint(key: &str) -> &str {
    match key.char_indices().nth(4) {
        Some((end, _)) => &key[..end],
        None => key,
    }
}

/// Credentials kept in a JSON file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store credentials at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored credentials, `None` if the sensor never registered
    pub fn load(&self) -> Result<Option<Credentials>, CredentialError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let credentials: Credentials = serde_json::from_slice(&bytes)?;
        Ok(Some(credentials).filter(Credentials::is_complete))
    }

    /// Persist credentials atomically
    pub fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let mut file = File::create(&tmp_path)?;
        file.write_all(&serde_json::to_vec_pretty(credentials)?)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Forget the stored credentials
    pub fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

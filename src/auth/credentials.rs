//! Credential Store
//!
//! Durable home of the backend bearer token. The stored token is the single
//! source of truth whenever the identity provider cannot be reached. No
//! expiry checks happen here; a 401 from the backend is the only expiry
//! signal.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

/// Key under which the bearer token is persisted
pub const TOKEN_KEY: &str = "exam_connect_token";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("credential store is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait CredentialStore: Send + Sync {
    fn save(&self, token: &str) -> Result<(), StoreError>;
    fn load(&self) -> Option<String>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Token persisted as a small JSON document on disk
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes writers within this process; across processes last writer wins.
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        // A corrupt file is replaced rather than blocking login.
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_entries(&entries)?;
        tracing::debug!("Credential saved to {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Option<String> {
        match self.read_entries() {
            Ok(mut entries) => entries.remove(TOKEN_KEY).filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Ignoring unreadable credential store {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(StoreError::Serialization(_)) => HashMap::new(),
            Err(e) => return Err(e),
        };
        entries.remove(TOKEN_KEY);
        if entries.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        } else {
            self.write_entries(&entries)?;
        }
        tracing::debug!("Credential cleared from {}", self.path.display());
        Ok(())
    }
}

/// Process-local store, for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn load(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.token.write() = None;
        Ok(())
    }
}

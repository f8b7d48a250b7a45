//! Durable storage for the bearer token.
//!
//! The token is the only client-side state that survives a restart. It
//! lives under a single fixed name; everything else is rebuilt from the
//! API on startup.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// The fixed name the persisted token is stored under.
pub const TOKEN_FILE_NAME: &str = "voting_app_token";

/// Somewhere a bearer token can be persisted between runs.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, token: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// A [`TokenStore`] backed by a file on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileTokenStore { path: path.into() }
    }

    /// The store at the conventional location,
    /// `<config dir>/ballotbox/voting_app_token`.
    ///
    /// Returns [`None`] when the platform has no config directory.
    pub fn in_config_dir() -> Option<Self> {
        let path = dirs::config_dir()?.join("ballotbox").join(TOKEN_FILE_NAME);

        Some(FileTokenStore::new(path))
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            },
            Err(ref err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(ref err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}

/// An in-memory [`TokenStore`] for short-lived sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self { MemoryTokenStore::default() }

    /// A store pre-populated with a token.
    pub fn containing(token: &str) -> Self {
        MemoryTokenStore {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

/// Errors encountered while reading or writing the persisted token.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unable to access the token file")]
    Io(#[from] io::Error),
}

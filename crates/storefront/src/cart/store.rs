//! Durable storage slot for the current cart.
//!
//! A store holds at most one serialized cart snapshot. It knows nothing about
//! the format; the manager decides what is well-formed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// Name of the slot holding the cart.
pub const CART_SLOT: &str = "shopify_cart";

/// Errors raised by a [`CartStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cart store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cart store unavailable: {0}")]
    Unavailable(String),
}

/// A single durable slot holding the serialized cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Read the slot. `None` when it is empty.
    async fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replace the slot contents.
    async fn save(&self, contents: &str) -> Result<(), StoreError>;

    /// Empty the slot. Clearing an empty slot succeeds.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Cart slot backed by a JSON file.
///
/// Writes go to a sibling temp file that is renamed over the slot, so a
/// crash mid-write never leaves a torn snapshot behind.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Slot file `shopify_cart.json` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{CART_SLOT}.json")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl CartStore for FileCartStore {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 bytes are malformed content, not an I/O failure
            Err(e) if e.kind() == ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save(&self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, contents)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory cart slot for tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `contents`.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(contents.into())),
        }
    }

    /// Current slot contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot lock is poisoned.
    pub fn contents(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StoreError> {
        self.slot
            .lock()
            .map_err(|_| StoreError::Unavailable("memory slot lock poisoned".to_string()))
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.clone())
    }

    async fn save(&self, contents: &str) -> Result<(), StoreError> {
        *self.lock()? = Some(contents.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.lock()? = None;
        Ok(())
    }
}

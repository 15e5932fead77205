//! Raw-content settings stores.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{Error, Result};

/// A named blob of settings owned by one consumer, usually a plugin.
///
/// The content format is up to the consumer; the store only keeps and persists it.
pub trait SettingsStore: fmt::Debug + Send + Sync {
    /// Current content
    fn content(&self) -> String;

    /// Replaces the content.
    ///
    /// # Errors
    /// Returns [`Error::ReadOnly`] for read-only stores.
    fn set_content(&self, content: &str) -> Result<()>;

    /// True if [`SettingsStore::set_content`] always fails
    fn is_read_only(&self) -> bool;
}

/// Shared handle to a settings store
pub type StoreRc = Arc<dyn SettingsStore>;

/// A writable in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    content: RwLock<String>,
}

impl MemoryStore {
    /// A store holding `content`
    #[must_use]
    pub fn new(content: &str) -> Self {
        MemoryStore {
            content: RwLock::new(content.to_string()),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn content(&self) -> String {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_content(&self, content: &str) -> Result<()> {
        *self.content.write().unwrap_or_else(PoisonError::into_inner) = content.to_string();
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        false
    }
}

/// Read-only view of another store.
#[derive(Debug, Clone)]
pub struct ReadOnlyStore {
    inner: StoreRc,
}

impl ReadOnlyStore {
    /// Wraps `inner`
    #[must_use]
    pub fn new(inner: StoreRc) -> Self {
        ReadOnlyStore { inner }
    }
}

impl SettingsStore for ReadOnlyStore {
    fn content(&self) -> String {
        self.inner.content()
    }

    fn set_content(&self, _content: &str) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn is_read_only(&self) -> bool {
        true
    }
}

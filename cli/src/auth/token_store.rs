//! Refresh-token persistence.
//!
//! This module provides the on-disk cache for the long-lived refresh token:
//! - [`RefreshTokenStore`] - Trait for token storage operations
//! - [`FileRefreshTokenStore`] - Single-file storage implementation
//!
//! The file's entire content IS the token: a raw UTF-8 string with no
//! envelope or wrapping format. At most one token is persisted per path;
//! each save replaces the previous content. No locking is performed, so
//! concurrent processes sharing one path race with last-writer-wins.

use std::fs;
use std::path::PathBuf;

use crate::error::{DstoreError, Result};

/// Trait for refresh-token storage operations (enables test fakes).
pub trait RefreshTokenStore {
    /// Loads the stored refresh token.
    ///
    /// Returns `None` if the file is absent or unreadable; absence signals
    /// "no prior session" and is never an error.
    ///
    /// # Errors
    ///
    /// Infallible for the file implementation; fakes may fail.
    fn load(&self) -> Result<Option<String>>;

    /// Writes the full token string, replacing any existing content.
    ///
    /// # Errors
    ///
    /// Returns [`DstoreError::Persistence`] if the write cannot complete
    /// (directory missing, permission denied). This is surfaced to the
    /// caller, never swallowed: losing the refresh token forces
    /// re-authorization on every subsequent run.
    fn save(&self, token: &str) -> Result<()>;

    /// Removes the stored token.
    ///
    /// Returns `true` if a token was removed, `false` if none was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    fn clear(&self) -> Result<bool>;
}

/// File-based refresh-token storage at a fixed path.
pub struct FileRefreshTokenStore {
    path: PathBuf,
}

impl FileRefreshTokenStore {
    /// Creates a store backed by the given path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl RefreshTokenStore for FileRefreshTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(token) => Ok(Some(token)),
            Err(_) => Ok(None),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        fs::write(&self.path, token).map_err(|source| DstoreError::Persistence {
            path: self.path.clone(),
            source,
        })
    }

    fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileRefreshTokenStore {
        FileRefreshTokenStore::new(dir.path().join("token.dat"))
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save("1//refresh-token-value").unwrap();
        assert_eq!(
            store.load().unwrap().as_deref(),
            Some("1//refresh-token-value")
        );
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_replaces_previous_token() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save("old-token").unwrap();
        store.save("new-token").unwrap();

        // Replaced, not appended.
        assert_eq!(store.load().unwrap().as_deref(), Some("new-token"));
    }

    #[test]
    fn file_content_is_the_raw_token() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save("raw-token").unwrap();
        let on_disk = std::fs::read_to_string(dir.path().join("token.dat")).unwrap();
        assert_eq!(on_disk, "raw-token");
    }

    #[test]
    fn save_into_missing_directory_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let store = FileRefreshTokenStore::new(dir.path().join("no-such-dir").join("token.dat"));

        let err = store.save("token").unwrap_err();
        assert!(matches!(err, DstoreError::Persistence { .. }));
    }

    #[test]
    fn clear_removes_stored_token() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save("token").unwrap();
        assert!(store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn clear_without_token_returns_false() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(!store.clear().unwrap());
    }
}

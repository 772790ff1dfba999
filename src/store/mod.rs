//! User file storage.
//!
//! The conversion check uploads each fixture into a user's folder, asks the
//! preview service for a thumbnail, then deletes the file again. This module
//! provides the storage side of that cycle.
//!
//! # Components
//!
//! - [`FileStore`]: async trait for creating, reading and deleting files
//! - [`Folder`]: a user's root folder, passed back into the store
//! - [`StoredFile`]: handle to one stored file, including a content etag
//! - [`MemoryFileStore`]: in-process store, used by default and in tests
//! - [`LocalFileStore`]: on-disk store rooted at a directory

mod local;
mod memory;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::fixture::digest::sha1_hex;

pub use local::LocalFileStore;
pub use memory::MemoryFileStore;

// =============================================================================
// Types
// =============================================================================

/// A user's root folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Folder {
    pub owner: String,
}

impl Folder {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
        }
    }
}

/// Handle to a file in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// User the file belongs to
    pub owner: String,

    /// File name inside the user's folder
    pub name: String,

    /// Content length in bytes
    pub size: u64,

    /// SHA-1 hex of the content; identifies the exact bytes
    pub etag: String,
}

impl StoredFile {
    /// Build a handle for `content` stored as `name` in `folder`.
    pub fn describe(folder: &Folder, name: &str, content: &[u8]) -> Self {
        Self {
            owner: folder.owner.clone(),
            name: name.to_string(),
            size: content.len() as u64,
            etag: sha1_hex(content),
        }
    }

    /// The folder this file lives in.
    pub fn folder(&self) -> Folder {
        Folder::new(self.owner.clone())
    }
}

// =============================================================================
// FileStore Trait
// =============================================================================

/// Storage for user files.
///
/// Every operation that targets a missing file fails with
/// [`StoreError::NotFound`], which callers can tell apart from other failures
/// via [`StoreError::is_not_found`].
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Get (creating if needed) the root folder of `user`.
    async fn user_folder(&self, user: &str) -> Result<Folder, StoreError>;

    /// Create a new file. Fails with `AlreadyExists` if the name is taken.
    async fn new_file(
        &self,
        folder: &Folder,
        name: &str,
        content: Bytes,
    ) -> Result<StoredFile, StoreError>;

    /// Look up an existing file.
    async fn get(&self, folder: &Folder, name: &str) -> Result<StoredFile, StoreError>;

    /// Read the full content of a file.
    async fn read(&self, file: &StoredFile) -> Result<Bytes, StoreError>;

    /// Delete a file by name.
    async fn delete(&self, folder: &Folder, name: &str) -> Result<(), StoreError>;
}

// =============================================================================
// Name Validation
// =============================================================================

/// Check that `name` is a single, non-special path component.
///
/// Non-ASCII characters and punctuation such as `"` are allowed.
pub fn check_file_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name == "." || name == ".." {
        return Err("name is a relative path component");
    }
    if name.contains(['/', '\\', '\0']) {
        return Err("name contains a path separator or NUL");
    }
    Ok(())
}

/// [`check_file_name`] mapped to a store error.
pub(crate) fn validate_name(name: &str) -> Result<(), StoreError> {
    check_file_name(name).map_err(|reason| StoreError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

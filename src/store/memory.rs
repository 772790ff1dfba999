use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use super::{validate_name, FileStore, Folder, StoredFile};
use crate::error::StoreError;

type FileKey = (String, String);

/// In-memory [`FileStore`].
///
/// Files are keyed by `(owner, name)`. Content is held as [`Bytes`], so
/// reads hand out cheap clones.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<FileKey, Bytes>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files across all users.
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }

    /// Names of the files in `folder`, sorted.
    pub async fn list(&self, folder: &Folder) -> Vec<String> {
        let files = self.files.read().await;
        let mut names: Vec<String> = files
            .keys()
            .filter(|(owner, _)| *owner == folder.owner)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn key(folder: &Folder, name: &str) -> FileKey {
        (folder.owner.clone(), name.to_string())
    }

    fn not_found(owner: &str, name: &str) -> StoreError {
        StoreError::NotFound {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn user_folder(&self, user: &str) -> Result<Folder, StoreError> {
        Ok(Folder::new(user))
    }

    async fn new_file(
        &self,
        folder: &Folder,
        name: &str,
        content: Bytes,
    ) -> Result<StoredFile, StoreError> {
        validate_name(name)?;

        let mut files = self.files.write().await;
        let key = Self::key(folder, name);
        if files.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                owner: folder.owner.clone(),
                name: name.to_string(),
            });
        }

        let file = StoredFile::describe(folder, name, &content);
        files.insert(key, content);
        debug!(owner = %folder.owner, name, size = file.size, "Stored file in memory");
        Ok(file)
    }

    async fn get(&self, folder: &Folder, name: &str) -> Result<StoredFile, StoreError> {
        let files = self.files.read().await;
        files
            .get(&Self::key(folder, name))
            .map(|content| StoredFile::describe(folder, name, content))
            .ok_or_else(|| Self::not_found(&folder.owner, name))
    }

    async fn read(&self, file: &StoredFile) -> Result<Bytes, StoreError> {
        let files = self.files.read().await;
        files
            .get(&(file.owner.clone(), file.name.clone()))
            .cloned()
            .ok_or_else(|| Self::not_found(&file.owner, &file.name))
    }

    async fn delete(&self, folder: &Folder, name: &str) -> Result<(), StoreError> {
        let mut files = self.files.write().await;
        files
            .remove(&Self::key(folder, name))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(&folder.owner, name))
    }
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::{validate_name, FileStore, Folder, StoredFile};
use crate::error::StoreError;

/// [`FileStore`] backed by a directory tree.
///
/// Layout: `<root>/<user>/files/<name>`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn files_dir(&self, owner: &str) -> PathBuf {
        self.root.join(owner).join("files")
    }

    fn path_for(&self, owner: &str, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.files_dir(owner).join(name))
    }

    fn map_io(err: std::io::Error, owner: &str, name: &str) -> StoreError {
        match err.kind() {
            ErrorKind::NotFound => StoreError::NotFound {
                owner: owner.to_string(),
                name: name.to_string(),
            },
            ErrorKind::AlreadyExists => StoreError::AlreadyExists {
                owner: owner.to_string(),
                name: name.to_string(),
            },
            _ => StoreError::Io(format!("{}/{}: {}", owner, name, err)),
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn user_folder(&self, user: &str) -> Result<Folder, StoreError> {
        validate_name(user)?;
        let dir = self.files_dir(user);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {}", dir.display(), e)))?;
        Ok(Folder::new(user))
    }

    async fn new_file(
        &self,
        folder: &Folder,
        name: &str,
        content: Bytes,
    ) -> Result<StoredFile, StoreError> {
        let path = self.path_for(&folder.owner, name)?;

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| Self::map_io(e, &folder.owner, name))?;
        write_or_remove(file, &path, &content)
            .await
            .map_err(|e| Self::map_io(e, &folder.owner, name))?;

        debug!(path = %path.display(), size = content.len(), "Stored file on disk");
        Ok(StoredFile::describe(folder, name, &content))
    }

    async fn get(&self, folder: &Folder, name: &str) -> Result<StoredFile, StoreError> {
        let path = self.path_for(&folder.owner, name)?;
        let content = fs::read(&path)
            .await
            .map_err(|e| Self::map_io(e, &folder.owner, name))?;
        Ok(StoredFile::describe(folder, name, &content))
    }

    async fn read(&self, file: &StoredFile) -> Result<Bytes, StoreError> {
        let path = self.path_for(&file.owner, &file.name)?;
        let content = fs::read(&path)
            .await
            .map_err(|e| Self::map_io(e, &file.owner, &file.name))?;
        Ok(Bytes::from(content))
    }

    async fn delete(&self, folder: &Folder, name: &str) -> Result<(), StoreError> {
        let path = self.path_for(&folder.owner, name)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| Self::map_io(e, &folder.owner, name))
    }
}

/// Write `content` through `writer`; a failed write removes the partial file
/// at `path`.
async fn write_or_remove<W: AsyncWrite + Unpin>(
    mut writer: W,
    path: &Path,
    content: &[u8],
) -> std::io::Result<()> {
    let written = async {
        writer.write_all(content).await?;
        writer.flush().await
    }
    .await;

    if written.is_err() {
        drop(writer);
        if let Err(e) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove partially written file");
        }
    }
    written
}

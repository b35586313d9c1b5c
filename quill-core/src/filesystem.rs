//! Document storage the sessions read from and save to.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;

use crate::error::FsError;
use crate::util;

/// Capacity of the folder-change broadcast channel.
const FOLDER_EVENT_CAPACITY: usize = 64;

/// Virtual filesystem used by editor sessions.
///
/// Paths are absolute, `/`-separated virtual paths.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Write `content` to `path`. With `overwrite == false` an existing file
    /// is left untouched and [`FsError::AlreadyExists`] is returned.
    async fn write_file(&self, path: &str, content: &[u8], overwrite: bool)
        -> Result<(), FsError>;

    /// Tell listeners that entry `name` inside `dir` changed.
    fn update_folder(&self, dir: &str, name: &str);
}

/// Folder-change notification published by [`LocalFileSystem`].
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct FolderChange {
    pub dir: String,
    pub name: String,
}

/// [`FileSystem`] backed by a directory on the host disk.
///
/// The virtual path `/a/b.txt` maps to `<root>/a/b.txt`; paths that would
/// escape the root are rejected.
pub struct LocalFileSystem {
    root: PathBuf,
    folder_tx: broadcast::Sender<FolderChange>,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (folder_tx, _) = broadcast::channel(FOLDER_EVENT_CAPACITY);
        Self {
            root: root.into(),
            folder_tx,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subscribe to folder-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<FolderChange> {
        self.folder_tx.subscribe()
    }

    /// Resolve a virtual path to a host path under the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(FsError::OutsideRoot(path.to_string())),
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let host_path = self.resolve(path)?;
        tokio::fs::read(&host_path)
            .await
            .map_err(|e| FsError::from_io(path, e))
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        overwrite: bool,
    ) -> Result<(), FsError> {
        let host_path = self.resolve(path)?;
        if let Some(parent) = host_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FsError::from_io(util::dirname(path), e))?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&host_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                FsError::AlreadyExists(path.to_string())
            } else {
                FsError::from_io(path, e)
            }
        })?;
        file.write_all(content)
            .await
            .map_err(|e| FsError::from_io(path, e))?;
        file.flush().await.map_err(|e| FsError::from_io(path, e))?;

        log::debug!("Wrote {} bytes to {}", content.len(), path);
        Ok(())
    }

    fn update_folder(&self, dir: &str, name: &str) {
        // No subscribers is fine.
        let _ = self.folder_tx.send(FolderChange {
            dir: dir.to_string(),
            name: name.to_string(),
        });
    }
}

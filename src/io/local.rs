use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use super::{ByteStream, ObjectStore, RemoteObject};
use crate::error::{Error, Result};

/// Object store backed by a local directory
///
/// Containers are subdirectories of the root and objects are files below
/// them, so `container/a/b.bin` maps to `{root}/container/a/b.bin`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            Ok(_) => Err(Error::Connection(format!(
                "store root is not a directory: {}",
                root.display()
            ))),
            Err(e) => Err(Error::Connection(format!(
                "cannot access store root {}: {e}",
                root.display()
            ))),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    type Object = LocalObject;

    async fn object(&self, container: &str, name: &str) -> Result<LocalObject> {
        let label = format!("{container}/{name}");
        let path = self.root.join(container).join(name);

        let meta = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(label.clone()),
            _ => Error::Io(e),
        })?;
        if !meta.is_file() {
            return Err(Error::NotFound(label));
        }

        debug!(object = %label, path = %path.display(), "resolved local object");

        Ok(LocalObject {
            path,
            name: label,
            size: meta.len(),
        })
    }
}

/// A file inside a [`LocalObjectStore`].
pub struct LocalObject {
    path: PathBuf,
    name: String,
    size: u64,
}

impl LocalObject {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RemoteObject for LocalObject {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open_range(&self, start: u64, length: Option<u64>) -> Result<ByteStream> {
        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::NotFound(self.name.clone()),
                _ => Error::Io(e),
            })?;
        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }

        Ok(match length {
            Some(len) => Box::new(file.take(len)),
            None => Box::new(file),
        })
    }
}

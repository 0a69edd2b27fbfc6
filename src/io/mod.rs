mod http;
mod local;
mod memory;

pub use http::{HttpObject, HttpObjectStore};
pub use local::{LocalObject, LocalObjectStore};
pub use memory::{MemoryObject, MemoryObjectStore, RangeRequest};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;

/// A forward-only byte stream over (part of) a remote object.
///
/// Dropping the stream releases the underlying connection or file handle.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Read exactly `buf.len()` bytes at `offset`.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let n = self.read_at(offset, buf).await?;
        if n < buf.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes at offset {offset}, got {n}", buf.len()),
            )
            .into());
        }
        Ok(())
    }
}

/// An immutable, byte-addressable object in a remote store.
#[async_trait]
pub trait RemoteObject: Send + Sync {
    /// Display name, `{container}/{object}`.
    fn name(&self) -> &str;

    /// Open a stream over `[start, start + length)`, or to the end of the
    /// object when `length` is `None`.
    async fn open_range(&self, start: u64, length: Option<u64>) -> Result<ByteStream>;

    /// Open a stream over the whole object.
    async fn open(&self) -> Result<ByteStream> {
        self.open_range(0, None).await
    }
}

#[async_trait]
impl<T: RemoteObject + ?Sized> RemoteObject for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn open_range(&self, start: u64, length: Option<u64>) -> Result<ByteStream> {
        (**self).open_range(start, length).await
    }

    async fn open(&self) -> Result<ByteStream> {
        (**self).open().await
    }
}

/// A session with an object store that resolves names into objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    type Object: RemoteObject;

    /// Resolve `container`/`name` into an object handle.
    async fn object(&self, container: &str, name: &str) -> Result<Self::Object>;
}

/// Read from `stream` until `buf` is full or the stream ends.
///
/// Returns the number of bytes written, which is less than `buf.len()` only
/// when the stream ended early.
pub async fn read_full<R>(stream: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

//! Buffered positional reads over a remote object.
//!
//! [`BufferedRangeReader`] keeps a single read-ahead window of `capacity`
//! bytes. Every [`read_at`](BufferedRangeReader::read_at) is served in one of
//! three ways:
//!
//! 1. **Hit**: the requested span lies entirely inside the window and is
//!    copied out without touching the network.
//! 2. **Refill**: the span is smaller than the window, so `capacity` bytes are
//!    fetched starting at the requested offset and become the new window.
//! 3. **Bypass**: the span is at least as large as the window and is fetched
//!    straight into the caller's buffer. The window is left alone.
//!
//! Small, clustered requests (header probing, strip-wise access into
//! structured binary formats) mostly become hits, while large reads cost
//! exactly one request of exactly their size.

mod sequential;
mod window;

use async_trait::async_trait;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::{ReaderConfig, SequentialMode};
use crate::error::{Error, Result};
use crate::io::{ObjectStore, ReadAt, RemoteObject, read_full};

use sequential::SequentialSource;
use window::CacheWindow;

/// Counters describing how a reader has served its requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// `read_at` calls answered from the window.
    pub hits: u64,
    /// `read_at` calls that replaced the window.
    pub refills: u64,
    /// `read_at` calls fetched directly into the caller's buffer.
    pub bypasses: u64,
    /// Range streams opened by `read_at`, including failed ones.
    pub fetches: u64,
    /// Bytes received from the store by `read_at`.
    pub transferred_bytes: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    refills: AtomicU64,
    bypasses: AtomicU64,
    fetches: AtomicU64,
    transferred_bytes: AtomicU64,
}

/// Positional and sequential reads over a [`RemoteObject`] with a single
/// read-ahead window.
///
/// The window is guarded by one lock that is held across the containment
/// check, the refill fetch and the commit, so a reader can be shared between
/// tasks. Bypass fetches do not take the lock.
pub struct BufferedRangeReader<O> {
    object: O,
    capacity: usize,
    window: Mutex<CacheWindow>,
    sequential: SequentialSource,
    counters: Counters,
}

impl<O: RemoteObject> BufferedRangeReader<O> {
    /// Resolve `container`/`name` in `store` and wrap it in a reader.
    pub async fn open<S>(store: &S, container: &str, name: &str, config: ReaderConfig) -> Result<Self>
    where
        S: ObjectStore<Object = O>,
    {
        let object = store.object(container, name).await?;
        Self::new(object, config).await
    }

    /// Wrap an already resolved object.
    ///
    /// With [`SequentialMode::Reused`] this opens the whole-object stream used
    /// by [`read`](Self::read), so a missing object is reported here.
    pub async fn new(object: O, config: ReaderConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(Error::InvalidCapacity(config.capacity));
        }

        let sequential = SequentialSource::open(&object, config.sequential).await?;

        debug!(
            object = %object.name(),
            capacity = config.capacity,
            sequential = ?config.sequential,
            "opened buffered range reader"
        );

        Ok(Self {
            object,
            capacity: config.capacity,
            window: Mutex::new(CacheWindow::new(config.capacity)),
            sequential,
            counters: Counters::default(),
        })
    }

    pub fn object(&self) -> &O {
        &self.object
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sequential_mode(&self) -> SequentialMode {
        self.sequential.mode()
    }

    /// The span of the object currently cached, if any.
    pub async fn window(&self) -> Option<Range<u64>> {
        self.window.lock().await.range()
    }

    pub fn stats(&self) -> ReaderStats {
        ReaderStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            refills: self.counters.refills.load(Ordering::Relaxed),
            bypasses: self.counters.bypasses.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            transferred_bytes: self.counters.transferred_bytes.load(Ordering::Relaxed),
        }
    }

    /// Read `buf.len()` bytes of the object starting at `offset`.
    ///
    /// Returns `buf.len()` on success. An empty `buf` returns `Ok(0)` without
    /// any fetch. A failed refill leaves the previous window intact, and a
    /// failed bypass never touches it.
    pub async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let len = buf.len();

        let mut window = self.window.lock().await;
        if let Some(cached) = window.get(offset, len) {
            buf.copy_from_slice(cached);
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            trace!(object = %self.object.name(), offset, len, "window hit");
            return Ok(len);
        }

        if len < self.capacity {
            debug!(object = %self.object.name(), offset, len, capacity = self.capacity, "refilling window");
            self.fetch(offset, window.staging_mut()).await?;
            window.commit(offset);
            buf.copy_from_slice(window.prefix(len));
            self.counters.refills.fetch_add(1, Ordering::Relaxed);
            return Ok(len);
        }
        drop(window);

        debug!(object = %self.object.name(), offset, len, "bypassing window");
        self.fetch(offset, buf).await?;
        self.counters.bypasses.fetch_add(1, Ordering::Relaxed);
        Ok(len)
    }

    /// Read from the sequential stream.
    ///
    /// This path is independent of the window: `read_at` calls neither move
    /// nor are moved by it. Returns `Ok(0)` at the end of the object.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.sequential.read(&self.object, buf).await
    }

    /// Fill `dest` with the object bytes at `offset` using one range stream.
    async fn fetch(&self, offset: u64, dest: &mut [u8]) -> Result<()> {
        self.counters.fetches.fetch_add(1, Ordering::Relaxed);

        let mut stream = self
            .object
            .open_range(offset, Some(dest.len() as u64))
            .await?;
        let filled = read_full(&mut stream, dest).await?;
        self.counters
            .transferred_bytes
            .fetch_add(filled as u64, Ordering::Relaxed);

        if filled < dest.len() {
            return Err(Error::ShortRead {
                object: self.object.name().to_string(),
                offset,
                expected: dest.len(),
                filled,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<O: RemoteObject> ReadAt for BufferedRangeReader<O> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        BufferedRangeReader::read_at(self, offset, buf).await
    }
}

//! Reader and store configuration.

use std::time::Duration;

/// Default size of the read-ahead window in bytes.
pub const DEFAULT_CAPACITY: usize = 1024;

/// How [`BufferedRangeReader::read`](crate::BufferedRangeReader::read) obtains its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequentialMode {
    /// Open one whole-object stream at construction and keep reading from it.
    #[default]
    Reused,
    /// Open a fresh whole-object stream for every call.
    ///
    /// Each call therefore reads from the start of the object.
    PerCall,
}

/// Configuration for a [`BufferedRangeReader`](crate::BufferedRangeReader).
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Size of the cache window. Must be greater than zero.
    pub capacity: usize,
    /// Strategy for the sequential read path.
    pub sequential: SequentialMode,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            sequential: SequentialMode::default(),
        }
    }
}

impl ReaderConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn sequential(mut self, mode: SequentialMode) -> Self {
        self.sequential = mode;
        self
    }
}

/// Configuration for [`HttpObjectStore`](crate::HttpObjectStore).
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL; objects live at `{endpoint}/{container}/{object}`.
    pub endpoint: String,
    /// Deadline for a HEAD or bounded range request, including the body.
    ///
    /// Whole-object streams only use it to bound how long one read waits for data.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl HttpStoreConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
        }
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

//! # rangeread
//!
//! Positional reads over large immutable objects in a remote object store,
//! with a single read-ahead window that keeps round trips down.
//!
//! Format parsers that need `read_at(offset, buf)` access (image headers,
//! strip or tile tables, archive directories) tend to issue many small reads
//! clustered near each other. [`BufferedRangeReader`] turns each cache miss
//! smaller than its window into one fetch of the whole window, so the
//! neighbouring reads that follow are served from memory. Reads at least as
//! large as the window go straight to the store.
//!
//! ## Features
//!
//! - HTTP object stores addressed as `{endpoint}/{container}/{object}`,
//!   read with Range requests
//! - Local-directory and in-memory stores with the same interface
//! - Sequential reads from a reused or per-call whole-object stream
//! - Safe to share one reader between tasks
//!
//! ## Example
//!
//! ```no_run
//! use rangeread::{BufferedRangeReader, HttpObjectStore, HttpStoreConfig, ReaderConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = HttpObjectStore::connect(&HttpStoreConfig::new("https://storage.googleapis.com"))?;
//!     let reader = BufferedRangeReader::open(&store, "my-bucket", "scene.tif", ReaderConfig::default()).await?;
//!
//!     // One request for bytes [0, 1024), the second read is served from memory
//!     let mut header = [0u8; 8];
//!     reader.read_at(0, &mut header).await?;
//!     let mut ifd = [0u8; 16];
//!     reader.read_at(8, &mut ifd).await?;
//!
//!     println!("{:?}", reader.stats());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod reader;

pub use cli::Cli;
pub use config::{DEFAULT_CAPACITY, HttpStoreConfig, ReaderConfig, SequentialMode};
pub use error::{Error, Result};
pub use io::{
    ByteStream, HttpObject, HttpObjectStore, LocalObject, LocalObjectStore, MemoryObject,
    MemoryObjectStore, ObjectStore, RangeRequest, ReadAt, RemoteObject,
};
pub use reader::{BufferedRangeReader, ReaderStats};

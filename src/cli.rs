use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DEFAULT_CAPACITY, ReaderConfig, SequentialMode};

#[derive(Parser, Debug)]
#[command(name = "rangeread")]
#[command(version)]
#[command(about = "Read byte ranges of remote objects through a read-ahead window", long_about = None)]
#[command(after_help = "Examples:\n  \
  rangeread --endpoint https://storage.googleapis.com bucket scene.tif -o 0 -n 64 --stats\n  \
  rangeread --root ./data bucket archive.bin --sequential | head -c 100\n  \
  RANGEREAD_ENDPOINT=http://localhost:9000 rangeread bucket a.bin -n 4096 --chunk 4096")]
pub struct Cli {
    /// Container (bucket) holding the object
    #[arg(value_name = "CONTAINER")]
    pub container: String,

    /// Object name inside the container
    #[arg(value_name = "OBJECT")]
    pub object: String,

    /// HTTP endpoint serving {endpoint}/{container}/{object}
    #[arg(long, env = "RANGEREAD_ENDPOINT", conflicts_with = "root")]
    pub endpoint: Option<String>,

    /// Serve objects from a local directory instead of HTTP
    #[arg(long, env = "RANGEREAD_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Offset of the first byte to read
    #[arg(short = 'o', long, default_value_t = 0)]
    pub offset: u64,

    /// Number of bytes to read (required unless --sequential)
    #[arg(short = 'n', long)]
    pub length: Option<u64>,

    /// Size of each individual read call
    #[arg(long, default_value_t = 512)]
    pub chunk: usize,

    /// Size of the read-ahead window
    #[arg(short = 'c', long, env = "RANGEREAD_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Stream the object from the start instead of reading at an offset
    #[arg(long)]
    pub sequential: bool,

    /// Open a new stream for every sequential read (issues a single read)
    #[arg(long, requires = "sequential")]
    pub fresh_stream: bool,

    /// Request deadline in seconds, 0 disables it
    #[arg(long, env = "RANGEREAD_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Print reader statistics to stderr when done
    #[arg(long)]
    pub stats: bool,
}

impl Cli {
    /// Only a `--sequential` run without `--fresh-stream` keeps a stream open;
    /// positional runs never read it.
    pub fn reader_config(&self) -> ReaderConfig {
        let mode = if self.sequential && !self.fresh_stream {
            SequentialMode::Reused
        } else {
            SequentialMode::PerCall
        };
        ReaderConfig::with_capacity(self.capacity).sequential(mode)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

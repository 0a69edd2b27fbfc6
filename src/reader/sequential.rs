use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use crate::config::SequentialMode;
use crate::error::Result;
use crate::io::{ByteStream, RemoteObject};

/// Source of bytes for the sequential read path.
pub(crate) enum SequentialSource {
    /// A whole-object stream opened up front; reads advance through it.
    Reused(Mutex<ByteStream>),
    /// A fresh whole-object stream for every read.
    PerCall,
}

impl SequentialSource {
    pub(crate) async fn open<O: RemoteObject>(object: &O, mode: SequentialMode) -> Result<Self> {
        Ok(match mode {
            SequentialMode::Reused => SequentialSource::Reused(Mutex::new(object.open().await?)),
            SequentialMode::PerCall => SequentialSource::PerCall,
        })
    }

    pub(crate) async fn read<O: RemoteObject>(&self, object: &O, buf: &mut [u8]) -> Result<usize> {
        match self {
            SequentialSource::Reused(stream) => Ok(stream.lock().await.read(buf).await?),
            SequentialSource::PerCall => {
                let mut stream = object.open().await?;
                Ok(stream.read(buf).await?)
            }
        }
    }

    pub(crate) fn mode(&self) -> SequentialMode {
        match self {
            SequentialSource::Reused(_) => SequentialMode::Reused,
            SequentialSource::PerCall => SequentialMode::PerCall,
        }
    }
}

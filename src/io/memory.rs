use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use super::{ByteStream, ObjectStore, RemoteObject};
use crate::error::{Error, Result};

/// A single `open_range` call observed by a [`MemoryObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    pub start: u64,
    pub length: Option<u64>,
}

/// An object held entirely in memory.
///
/// Every stream request is recorded, which makes it useful for checking
/// how many round trips a reader would make against a real store.
pub struct MemoryObject {
    name: String,
    data: Bytes,
    requests: Mutex<Vec<RangeRequest>>,
}

impl MemoryObject {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// All range requests made so far, oldest first.
    pub fn requests(&self) -> Vec<RangeRequest> {
        self.requests.lock().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl RemoteObject for MemoryObject {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open_range(&self, start: u64, length: Option<u64>) -> Result<ByteStream> {
        self.requests.lock().push(RangeRequest { start, length });

        let size = self.data.len() as u64;
        let begin = start.min(size);
        let end = match length {
            Some(len) => start.saturating_add(len).min(size),
            None => size,
        };
        let slice = self.data.slice(begin as usize..end.max(begin) as usize);
        Ok(Box::new(Cursor::new(slice)))
    }
}

/// A map of in-memory objects keyed by container and name.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Arc<MemoryObject>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `container/name`, replacing any previous object.
    pub fn insert(
        &self,
        container: &str,
        name: &str,
        data: impl Into<Bytes>,
    ) -> Arc<MemoryObject> {
        let object = Arc::new(MemoryObject::new(format!("{container}/{name}"), data));
        self.objects.write().insert(
            (container.to_string(), name.to_string()),
            Arc::clone(&object),
        );
        object
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    type Object = Arc<MemoryObject>;

    async fn object(&self, container: &str, name: &str) -> Result<Arc<MemoryObject>> {
        self.objects
            .read()
            .get(&(container.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{container}/{name}")))
    }
}

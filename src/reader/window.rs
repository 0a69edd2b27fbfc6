use std::ops::Range;

/// The single cached span of an object.
///
/// `buffer` holds exactly the object bytes `[start, start + capacity)` once
/// `start` is set. Refills go through `staging` and only become visible
/// through [`commit`](CacheWindow::commit), so a failed fetch never leaves a
/// partially overwritten window behind.
pub(crate) struct CacheWindow {
    buffer: Vec<u8>,
    staging: Vec<u8>,
    start: Option<u64>,
}

impl CacheWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity],
            staging: vec![0u8; capacity],
            start: None,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn range(&self) -> Option<Range<u64>> {
        self.start
            .map(|start| start..start.saturating_add(self.capacity() as u64))
    }

    /// The cached bytes for `[offset, offset + len)`, if the whole span is
    /// inside the window.
    pub(crate) fn get(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let start = self.start?;
        let rel = offset.checked_sub(start)?;
        let end = rel.checked_add(len as u64)?;
        if end > self.capacity() as u64 {
            return None;
        }
        Some(&self.buffer[rel as usize..end as usize])
    }

    /// Scratch space for the next refill.
    pub(crate) fn staging_mut(&mut self) -> &mut [u8] {
        &mut self.staging
    }

    /// Promote the fully fetched staging buffer to be the window at `start`.
    pub(crate) fn commit(&mut self, start: u64) {
        std::mem::swap(&mut self.buffer, &mut self.staging);
        self.start = Some(start);
    }

    pub(crate) fn prefix(&self, len: usize) -> &[u8] {
        &self.buffer[..len]
    }
}

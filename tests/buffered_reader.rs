//! Behavioural tests for the read-ahead window of `BufferedRangeReader`.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;

use rangeread::{
    BufferedRangeReader, ByteStream, Error, LocalObjectStore, MemoryObject, RangeRequest,
    ReaderConfig, RemoteObject, Result, SequentialMode,
};

const CAPACITY: usize = 1024;

/// Deterministic object content.
fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn range(start: u64, length: u64) -> RangeRequest {
    RangeRequest {
        start,
        length: Some(length),
    }
}

async fn memory_reader(len: usize) -> BufferedRangeReader<MemoryObject> {
    let object = MemoryObject::new("imagery/scene.tif", pattern(len));
    let config = ReaderConfig::with_capacity(CAPACITY).sequential(SequentialMode::PerCall);
    BufferedRangeReader::new(object, config).await.unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    /// `open_range` fails outright.
    Error,
    /// The stream ends after half the requested bytes.
    Truncate,
}

/// Wraps a memory object and injects fetch failures on demand.
struct FaultyObject {
    inner: MemoryObject,
    fault: Mutex<Fault>,
}

impl FaultyObject {
    fn new(len: usize) -> Self {
        Self {
            inner: MemoryObject::new("imagery/faulty.tif", pattern(len)),
            fault: Mutex::new(Fault::None),
        }
    }

    fn set_fault(&self, fault: Fault) {
        *self.fault.lock().unwrap() = fault;
    }
}

#[async_trait]
impl RemoteObject for FaultyObject {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn open_range(&self, start: u64, length: Option<u64>) -> Result<ByteStream> {
        let fault = *self.fault.lock().unwrap();
        match fault {
            Fault::None => self.inner.open_range(start, length).await,
            Fault::Error => Err(Error::Fetch {
                object: self.name().to_string(),
                reason: "injected failure".to_string(),
            }),
            Fault::Truncate => {
                let stream = self.inner.open_range(start, length).await?;
                let half = length.map_or(0, |len| len / 2);
                Ok(Box::new(stream.take(half)))
            }
        }
    }
}

#[tokio::test]
async fn test_scenario_refill_hit_bypass() {
    let reader = memory_reader(8192).await;
    let data = pattern(8192);

    let mut small = [0u8; 10];
    assert_eq!(reader.read_at(5000, &mut small).await.unwrap(), 10);
    assert_eq!(small[..], data[5000..5010]);
    assert_eq!(reader.window().await, Some(5000..6024));
    assert_eq!(reader.object().requests(), vec![range(5000, 1024)]);

    let mut tiny = [0u8; 5];
    assert_eq!(reader.read_at(5020, &mut tiny).await.unwrap(), 5);
    assert_eq!(tiny[..], data[5020..5025]);
    assert_eq!(reader.object().requests().len(), 1);

    let mut large = vec![0u8; 2000];
    assert_eq!(reader.read_at(0, &mut large).await.unwrap(), 2000);
    assert_eq!(large[..], data[0..2000]);
    assert_eq!(reader.window().await, Some(5000..6024));
    assert_eq!(
        reader.object().requests(),
        vec![range(5000, 1024), range(0, 2000)]
    );

    let stats = reader.stats();
    assert_eq!((stats.hits, stats.refills, stats.bypasses), (1, 1, 1));
    assert_eq!(stats.fetches, 2);
    assert_eq!(stats.transferred_bytes, 3024);
}

#[tokio::test]
async fn test_every_contained_span_is_a_hit() {
    let reader = memory_reader(8192).await;
    let data = pattern(8192);
    let mut first = [0u8; 1];
    reader.read_at(3000, &mut first).await.unwrap();

    for (offset, len) in [(3000u64, 1023usize), (3000, 1024), (3500, 100), (4023, 1), (3001, 1023)] {
        let mut buf = vec![0u8; len];
        reader.read_at(offset, &mut buf).await.unwrap();
        let start = offset as usize;
        assert_eq!(buf[..], data[start..start + len], "offset {offset} len {len}");
    }

    assert_eq!(reader.object().requests(), vec![range(3000, 1024)]);
    assert_eq!(reader.stats().hits, 5);
}

#[tokio::test]
async fn test_large_read_inside_window_is_still_a_hit() {
    let reader = memory_reader(8192).await;
    let mut buf = [0u8; 1];
    reader.read_at(0, &mut buf).await.unwrap();

    // a full-capacity request that fits the window is served from it
    let mut full = vec![0u8; CAPACITY];
    reader.read_at(0, &mut full).await.unwrap();
    assert_eq!(full, pattern(8192)[..CAPACITY]);
    assert_eq!(reader.object().requests().len(), 1);
}

#[tokio::test]
async fn test_bypass_leaves_window_unset() {
    let reader = memory_reader(8192).await;
    let mut buf = vec![0u8; 4096];
    reader.read_at(100, &mut buf).await.unwrap();

    assert_eq!(buf, pattern(8192)[100..4196]);
    assert_eq!(reader.window().await, None);
    assert_eq!(reader.object().requests(), vec![range(100, 4096)]);
}

#[tokio::test]
async fn test_zero_length_reads() {
    let reader = memory_reader(8192).await;
    assert_eq!(reader.read_at(42, &mut []).await.unwrap(), 0);

    let mut buf = [0u8; 4];
    reader.read_at(100, &mut buf).await.unwrap();
    assert_eq!(reader.read_at(100, &mut []).await.unwrap(), 0);
    assert_eq!(reader.read_at(999_999, &mut []).await.unwrap(), 0);

    assert_eq!(reader.object().requests().len(), 1);
    assert_eq!(reader.window().await, Some(100..1124));
}

#[tokio::test]
async fn test_failed_refill_keeps_previous_window() {
    let object = FaultyObject::new(8192);
    let reader = BufferedRangeReader::new(
        object,
        ReaderConfig::with_capacity(CAPACITY).sequential(SequentialMode::PerCall),
    )
    .await
    .unwrap();
    let data = pattern(8192);

    let mut buf = [0u8; 16];
    reader.read_at(2000, &mut buf).await.unwrap();
    assert_eq!(reader.window().await, Some(2000..3024));

    reader.object().set_fault(Fault::Error);
    let err = reader.read_at(6000, &mut buf).await.err().unwrap();
    assert!(matches!(err, Error::Fetch { .. }));
    assert_eq!(reader.window().await, Some(2000..3024));

    reader.object().set_fault(Fault::Truncate);
    let err = reader.read_at(6000, &mut buf).await.err().unwrap();
    assert!(matches!(
        err,
        Error::ShortRead { offset: 6000, expected: 1024, filled: 512, .. }
    ));
    assert_eq!(reader.window().await, Some(2000..3024));

    // still faulty, but the old window serves hits without a fetch
    let mut hit = [0u8; 24];
    reader.read_at(2500, &mut hit).await.unwrap();
    assert_eq!(hit[..], data[2500..2524]);

    reader.object().set_fault(Fault::None);
    reader.read_at(6000, &mut buf).await.unwrap();
    assert_eq!(buf[..], data[6000..6016]);
    assert_eq!(reader.window().await, Some(6000..7024));

    let stats = reader.stats();
    assert_eq!((stats.hits, stats.refills, stats.fetches), (1, 2, 4));
}

#[tokio::test]
async fn test_failed_bypass_keeps_window() {
    let object = FaultyObject::new(8192);
    let reader = BufferedRangeReader::new(
        object,
        ReaderConfig::with_capacity(CAPACITY).sequential(SequentialMode::PerCall),
    )
    .await
    .unwrap();

    let mut buf = [0u8; 8];
    reader.read_at(0, &mut buf).await.unwrap();

    reader.object().set_fault(Fault::Truncate);
    let mut large = vec![0u8; 2048];
    let err = reader.read_at(4000, &mut large).await.err().unwrap();
    assert!(matches!(err, Error::ShortRead { expected: 2048, filled: 1024, .. }));
    assert_eq!(reader.window().await, Some(0..1024));
}

#[tokio::test]
async fn test_reused_sequential_stream_is_independent_of_read_at() {
    let object = MemoryObject::new("imagery/scene.tif", pattern(4096));
    let reader = BufferedRangeReader::new(object, ReaderConfig::with_capacity(CAPACITY))
        .await
        .unwrap();
    let data = pattern(4096);

    let mut seq = [0u8; 100];
    let n = reader.read(&mut seq).await.unwrap();
    assert_eq!(seq[..n], data[..n]);

    let mut positional = [0u8; 50];
    reader.read_at(2000, &mut positional).await.unwrap();
    assert_eq!(positional[..], data[2000..2050]);

    // the stream continues where it left off
    let mut rest = Vec::new();
    rest.extend_from_slice(&seq[..n]);
    loop {
        let n = reader.read(&mut seq).await.unwrap();
        if n == 0 {
            break;
        }
        rest.extend_from_slice(&seq[..n]);
    }
    assert_eq!(rest, data);

    // and positional reads do not care that the stream is exhausted
    reader.read_at(2010, &mut positional).await.unwrap();
    assert_eq!(positional[..], data[2010..2060]);
    assert_eq!(reader.window().await, Some(2000..3024));
    assert_eq!(
        reader.object().requests(),
        vec![RangeRequest { start: 0, length: None }, range(2000, 1024)]
    );
}

#[tokio::test]
async fn test_per_call_sequential_restarts() {
    let reader = memory_reader(4096).await;
    let data = pattern(4096);

    let mut buf = [0u8; 64];
    let n = reader.read(&mut buf).await.unwrap();
    assert_eq!(buf[..n], data[..n]);
    let n = reader.read(&mut buf).await.unwrap();
    assert_eq!(buf[..n], data[..n]);

    assert_eq!(
        reader.object().requests(),
        vec![
            RangeRequest { start: 0, length: None },
            RangeRequest { start: 0, length: None },
        ]
    );
    assert_eq!(reader.window().await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reads_see_consistent_bytes() {
    let object = Arc::new(MemoryObject::new("imagery/scene.tif", pattern(65536)));
    let reader = Arc::new(
        BufferedRangeReader::new(
            Arc::clone(&object),
            ReaderConfig::with_capacity(CAPACITY).sequential(SequentialMode::PerCall),
        )
        .await
        .unwrap(),
    );

    let mut tasks = Vec::new();
    for task in 0..8u64 {
        let reader = Arc::clone(&reader);
        tasks.push(tokio::spawn(async move {
            let data = pattern(65536);
            for i in 0..200u64 {
                let offset = (task * 7919 + i * 131) % 60000;
                let len = 1 + ((task + i) % 40) as usize;
                let mut buf = vec![0u8; len];
                reader.read_at(offset, &mut buf).await.unwrap();
                let start = offset as usize;
                assert_eq!(buf[..], data[start..start + len]);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stats = reader.stats();
    assert_eq!(stats.hits + stats.refills, 1600);
    assert_eq!(stats.fetches as usize, object.requests().len());
}

#[tokio::test]
async fn test_local_store_end_to_end() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("imagery").join("scenes").join("a.tif");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, pattern(8192)).unwrap();

    let store = LocalObjectStore::new(temp_dir.path()).unwrap();
    let reader = BufferedRangeReader::open(
        &store,
        "imagery",
        "scenes/a.tif",
        ReaderConfig::with_capacity(256),
    )
    .await
    .unwrap();
    let data = pattern(8192);

    let mut buf = [0u8; 12];
    reader.read_at(700, &mut buf).await.unwrap();
    assert_eq!(buf[..], data[700..712]);
    reader.read_at(900, &mut buf).await.unwrap();
    assert_eq!(buf[..], data[900..912]);
    assert_eq!(reader.window().await, Some(700..956));

    let mut large = vec![0u8; 1000];
    reader.read_at(7000, &mut large).await.unwrap();
    assert_eq!(large[..], data[7000..8000]);

    let mut head = [0u8; 4];
    assert_eq!(reader.read(&mut head).await.unwrap(), 4);
    assert_eq!(head[..], data[..4]);

    let stats = reader.stats();
    assert_eq!((stats.hits, stats.refills, stats.bypasses), (1, 1, 1));

    let err = BufferedRangeReader::open(&store, "imagery", "scenes/b.tif", ReaderConfig::default())
        .await
        .err()
        .unwrap();
    assert!(err.is_not_found());
}

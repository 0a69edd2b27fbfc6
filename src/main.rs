//! Main entry point for the rangeread CLI application.
//!
//! Reads a byte range of an object from an HTTP object store or a local
//! directory through a [`BufferedRangeReader`] and writes it to stdout.

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use rangeread::{
    BufferedRangeReader, Cli, HttpObjectStore, HttpStoreConfig, LocalObjectStore, ObjectStore,
    RemoteObject,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.chunk == 0 {
        bail!("--chunk must be greater than zero");
    }
    if !cli.sequential && cli.length.is_none() {
        bail!("--length is required for positional reads");
    }

    if let Some(ref root) = cli.root {
        let store = LocalObjectStore::new(root)?;
        run(&store, &cli).await
    } else if let Some(ref endpoint) = cli.endpoint {
        let config = HttpStoreConfig::new(endpoint).timeout(cli.request_timeout());
        let store = HttpObjectStore::connect(&config)?;
        run(&store, &cli).await
    } else {
        bail!("either --endpoint or --root must be given")
    }
}

/// Open the reader and copy the requested bytes to stdout.
async fn run<S: ObjectStore>(store: &S, cli: &Cli) -> Result<()> {
    let reader = BufferedRangeReader::open(store, &cli.container, &cli.object, cli.reader_config())
        .await
        .with_context(|| format!("Failed to open {}/{}", cli.container, cli.object))?;

    let mut stdout = tokio::io::stdout();
    let written = if cli.sequential {
        copy_sequential(&reader, cli, &mut stdout).await?
    } else {
        copy_range(&reader, cli, &mut stdout).await?
    };
    stdout.flush().await?;

    if cli.stats {
        let stats = reader.stats();
        eprintln!(
            "{written} bytes written; {} hits, {} refills, {} bypasses, {} fetches, {} bytes transferred",
            stats.hits, stats.refills, stats.bypasses, stats.fetches, stats.transferred_bytes
        );
    }

    Ok(())
}

/// Positional mode: `chunk`-sized `read_at` calls over `[offset, offset + length)`.
async fn copy_range<O: RemoteObject>(
    reader: &BufferedRangeReader<O>,
    cli: &Cli,
    out: &mut tokio::io::Stdout,
) -> Result<u64> {
    let length = cli.length.unwrap_or(0);
    let mut buf = vec![0u8; cli.chunk];
    let mut written = 0u64;

    while written < length {
        let n = (length - written).min(cli.chunk as u64) as usize;
        let offset = cli.offset + written;
        reader
            .read_at(offset, &mut buf[..n])
            .await
            .with_context(|| format!("Failed to read {n} bytes at offset {offset}"))?;
        out.write_all(&buf[..n]).await?;
        written += n as u64;
    }

    Ok(written)
}

/// Sequential mode: skip to `offset`, then copy up to `length` bytes.
///
/// A per-call stream restarts at the beginning of the object every time, so
/// only one read is issued in that mode.
async fn copy_sequential<O: RemoteObject>(
    reader: &BufferedRangeReader<O>,
    cli: &Cli,
    out: &mut tokio::io::Stdout,
) -> Result<u64> {
    let mut buf = vec![0u8; cli.chunk];
    let mut position = 0u64;
    let mut written = 0u64;
    let end = cli.length.map(|len| cli.offset.saturating_add(len));

    loop {
        let n = reader.read(&mut buf).await.context("Sequential read failed")?;
        if n == 0 {
            break;
        }

        let chunk_start = position;
        position += n as u64;

        let from = cli.offset.saturating_sub(chunk_start).min(n as u64) as usize;
        let to = match end {
            Some(end) => end.saturating_sub(chunk_start).min(n as u64) as usize,
            None => n,
        };
        if from < to {
            out.write_all(&buf[from..to]).await?;
            written += (to - from) as u64;
        }

        if cli.fresh_stream || end.is_some_and(|end| position >= end) {
            break;
        }
    }

    Ok(written)
}

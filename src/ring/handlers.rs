use super::buffer::BoundedRecordBuffer;
use super::types::*;
use super::RingCollector;
use crate::error::{Error, Result};
use futures::future::join_all;
use std::fs::File;
use std::io::{ErrorKind, Read};
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;

/// Reads `reader` to EOF in fragments of at most `chunk_size` bytes and
/// feeds each fragment to the ring called `name`.
///
/// Reads happen on a blocking worker; fragments cross to the collector over
/// a bounded channel.
pub async fn pump<R>(
    collector: &RingCollector,
    name: &str,
    mut reader: R,
    chunk_size: usize,
) -> Result<PumpSummary>
where
    R: Read + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(CHANNEL_DEPTH);

    let read_handle = spawn_blocking(move || {
        let mut read_buffer = vec![0u8; chunk_size.max(1)];
        loop {
            let n = match reader.read(&mut read_buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if tx.blocking_send(read_buffer[..n].to_vec()).is_err() {
                break;
            }
        }
        Ok(())
    });

    let mut summary = PumpSummary::default();
    let mut routed: Result<()> = Ok(());
    while let Some(fragment) = rx.recv().await {
        let len = fragment.len();
        match collector.on_ring_data(name, fragment).await {
            Ok(status) => summary.record(len, status),
            Err(e) => {
                routed = Err(e);
                break;
            }
        }
    }

    // Closing the channel stops the reader at its next send.
    drop(rx);
    let read_result = read_handle.await?;
    routed?;
    read_result.map_err(|source| Error::Source {
        ring: name.to_string(),
        source,
    })?;

    tracing::debug!(
        ring = name,
        fragments = summary.fragments,
        bytes = summary.bytes,
        "Source drained"
    );
    Ok(summary)
}

fn open_source(source: &Source) -> Result<Box<dyn Read + Send>> {
    match &source.path {
        Some(path) => File::open(path)
            .map(|file| Box::new(file) as Box<dyn Read + Send>)
            .map_err(|e| Error::Source {
                ring: source.name.clone(),
                source: e,
            }),
        None => Ok(Box::new(std::io::stdin())),
    }
}

/// Pumps every source into its own ring concurrently.
///
/// Rings must already be registered. Results come back in source order.
pub async fn pump_all(
    collector: &RingCollector,
    sources: &[Source],
    chunk_size: usize,
) -> Vec<(String, Result<PumpSummary>)> {
    let tasks = sources.iter().map(|source| async move {
        let result = match open_source(source) {
            Ok(reader) => pump(collector, &source.name, reader, chunk_size).await,
            Err(e) => Err(e),
        };
        (source.name.clone(), result)
    });
    join_all(tasks).await
}

/// Appends synthetic records of the given lengths to a fresh ring and
/// records the outcome of each append.
pub fn simulate(max_size: usize, lengths: &[usize]) -> Vec<SimulationStep> {
    let mut buffer = BoundedRecordBuffer::new(max_size);
    lengths
        .iter()
        .enumerate()
        .map(|(i, &len)| {
            let status = if len > max_size {
                AppendStatus::FailIpBufferExceededMaxsize
            } else {
                let mut record = Vec::new();
                match record.try_reserve_exact(len) {
                    Ok(()) => {
                        record.resize(len, i as u8);
                        AppendStatus::from(&buffer.append(record))
                    }
                    Err(_) => AppendStatus::FailGeneric,
                }
            };
            SimulationStep {
                len,
                status,
                retained: buffer.get_data().iter().map(Vec::len).collect(),
                size: buffer.size(),
            }
        })
        .collect()
}

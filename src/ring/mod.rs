mod buffer;
mod handlers;
mod report;
mod types;

pub use buffer::BoundedRecordBuffer;
pub use handlers::{pump, pump_all, simulate};
pub use report::{render_json, render_text};
pub use types::*;

use crate::error::{AppendError, Error, Result};
use crate::utils::is_valid_ring_name;
use std::time::{SystemTime, UNIX_EPOCH};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

pub struct RingSession {
    buffer: BoundedRecordBuffer,
    stats: RingStats,
}

impl RingSession {
    fn new(max_size: usize) -> Self {
        Self {
            buffer: BoundedRecordBuffer::new(max_size),
            stats: RingStats::default(),
        }
    }

    fn append(&mut self, name: &str, data: Vec<u8>) -> AppendStatus {
        let len = data.len();
        let records_before = self.buffer.len();
        let bytes_before = self.buffer.size();

        let result = self.buffer.append(data);
        let status = AppendStatus::from(&result);
        match result {
            Ok(()) => {
                let evicted_records = records_before + 1 - self.buffer.len();
                let evicted_bytes = bytes_before + len - self.buffer.size();
                self.stats.record_success(len, evicted_records, evicted_bytes);
                if evicted_records > 0 {
                    tracing::debug!(
                        ring = name,
                        evicted_records,
                        evicted_bytes,
                        "Evicted oldest records"
                    );
                }
            }
            Err(e) => {
                self.stats.record_failure(status);
                match e {
                    AppendError::ExceededMaxSize { .. } => {
                        tracing::info!(ring = name, "Oversized record dropped: {}", e);
                    }
                    AppendError::Empty => {
                        tracing::warn!(ring = name, "Empty record dropped");
                    }
                    AppendError::Corrupted { .. } => {
                        tracing::error!(ring = name, "Ring buffer corrupted, rebuilding: {}", e);
                        self.buffer = BoundedRecordBuffer::new(self.buffer.max_size());
                    }
                    AppendError::Generic(_) => {
                        tracing::error!(ring = name, "Error appending data to ring: {}", e);
                    }
                }
            }
        }
        status
    }

    fn snapshot(&self, name: &str) -> RingSnapshot {
        RingSnapshot {
            name: name.to_string(),
            max_size: self.buffer.max_size(),
            size: self.buffer.size(),
            records: self.buffer.get_data().iter().cloned().collect(),
            stats: self.stats.clone(),
        }
    }
}

pub type Rings = Arc<Mutex<HashMap<String, RingSession>>>;

/// Named rings behind a single lock.
///
/// Every buffer operation runs with the map locked, so a ring is never
/// observed mid-eviction.
#[derive(Clone, Default)]
pub struct RingCollector {
    rings: Rings,
}

impl RingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, name: &str, max_size: usize) -> Result<()> {
        if !is_valid_ring_name(name) {
            return Err(Error::InvalidRingName(name.to_string()));
        }
        let mut rings = self.rings.lock().await;
        if rings.contains_key(name) {
            return Err(Error::DuplicateRing(name.to_string()));
        }
        rings.insert(name.to_string(), RingSession::new(max_size));
        tracing::info!(ring = name, max_size, "Registered ring");
        Ok(())
    }

    pub async fn unregister(&self, name: &str) -> Result<()> {
        match self.rings.lock().await.remove(name) {
            Some(_) => {
                tracing::info!(ring = name, "Unregistered ring");
                Ok(())
            }
            None => Err(Error::RingNotFound(name.to_string())),
        }
    }

    /// Routes one fragment to the ring called `name`.
    ///
    /// A refused fragment is not an `Err`: the status is returned and
    /// counted in the ring's stats.
    pub async fn on_ring_data(&self, name: &str, data: Vec<u8>) -> Result<AppendStatus> {
        let mut rings = self.rings.lock().await;
        match rings.get_mut(name) {
            Some(session) => Ok(session.append(name, data)),
            None => {
                tracing::error!("Ring {} not found, dropping {} bytes", name, data.len());
                Err(Error::RingNotFound(name.to_string()))
            }
        }
    }

    pub async fn snapshot(&self, name: &str) -> Result<RingSnapshot> {
        self.rings
            .lock()
            .await
            .get(name)
            .map(|session| session.snapshot(name))
            .ok_or_else(|| Error::RingNotFound(name.to_string()))
    }

    /// Snapshots of every ring, sorted by name.
    pub async fn report(&self) -> Report {
        let rings = self.rings.lock().await;
        let mut snapshots: Vec<_> = rings
            .iter()
            .map(|(name, session)| session.snapshot(name))
            .collect();
        drop(rings);
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));

        let generated_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Report {
            generated_at_ms,
            rings: snapshots,
        }
    }

    pub async fn clear(&self, name: &str) -> Result<()> {
        let mut rings = self.rings.lock().await;
        let session = rings
            .get_mut(name)
            .ok_or_else(|| Error::RingNotFound(name.to_string()))?;
        session.buffer.clear();
        tracing::debug!(ring = name, "Cleared ring");
        Ok(())
    }

    pub async fn clear_all(&self) {
        for session in self.rings.lock().await.values_mut() {
            session.buffer.clear();
        }
    }

    pub async fn ring_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.rings.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

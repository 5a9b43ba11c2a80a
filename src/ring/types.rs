use crate::error::AppendError;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default byte budget per ring.
pub const DEFAULT_MAX_SIZE: usize = 3 * 1024 * 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;
pub const DEFAULT_RING: &str = "default";
/// Fragments in flight between a source reader and the collector.
pub const CHANNEL_DEPTH: usize = 64;

/// Flat status code for one append, including success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppendStatus {
    Success,
    FailGeneric,
    FailIpBufferZero,
    FailIpBufferExceededMaxsize,
    FailRingBufferCorrupted,
}

impl AppendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppendStatus::Success => "SUCCESS",
            AppendStatus::FailGeneric => "FAIL_GENERIC",
            AppendStatus::FailIpBufferZero => "FAIL_IP_BUFFER_ZERO",
            AppendStatus::FailIpBufferExceededMaxsize => "FAIL_IP_BUFFER_EXCEEDED_MAXSIZE",
            AppendStatus::FailRingBufferCorrupted => "FAIL_RING_BUFFER_CORRUPTED",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == AppendStatus::Success
    }
}

impl std::fmt::Display for AppendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&Result<(), AppendError>> for AppendStatus {
    fn from(result: &Result<(), AppendError>) -> Self {
        match result {
            Ok(()) => AppendStatus::Success,
            Err(e) => e.status(),
        }
    }
}

/// Where a ring's fragments come from.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub name: String,
    /// `None` reads stdin.
    pub path: Option<PathBuf>,
}

impl Source {
    pub fn stdin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
        }
    }
}

/// Per-ring counters. Survive `clear`, reset on unregister.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RingStats {
    pub appended_records: u64,
    pub appended_bytes: u64,
    pub evicted_records: u64,
    pub evicted_bytes: u64,
    pub rejected: BTreeMap<AppendStatus, u64>,
}

impl RingStats {
    pub fn record_success(&mut self, len: usize, evicted_records: usize, evicted_bytes: usize) {
        self.appended_records += 1;
        self.appended_bytes += len as u64;
        self.evicted_records += evicted_records as u64;
        self.evicted_bytes += evicted_bytes as u64;
    }

    pub fn record_failure(&mut self, status: AppendStatus) {
        *self.rejected.entry(status).or_default() += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RingSnapshot {
    pub name: String,
    pub max_size: usize,
    pub size: usize,
    #[serde(serialize_with = "serialize_records")]
    pub records: Vec<Vec<u8>>,
    pub stats: RingStats,
}

fn serialize_records<S: Serializer>(records: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(records.iter().map(hex::encode))
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at_ms: u64,
    pub rings: Vec<RingSnapshot>,
}

/// What one source contributed while being pumped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PumpSummary {
    pub fragments: u64,
    pub bytes: u64,
    pub statuses: BTreeMap<AppendStatus, u64>,
}

impl PumpSummary {
    pub fn record(&mut self, len: usize, status: AppendStatus) {
        self.fragments += 1;
        self.bytes += len as u64;
        *self.statuses.entry(status).or_default() += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationStep {
    pub len: usize,
    pub status: AppendStatus,
    /// Lengths of the records held after this step, oldest first.
    pub retained: Vec<usize>,
    pub size: usize,
}

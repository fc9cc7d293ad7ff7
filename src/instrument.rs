//! Refresh instrumentation
//!
//! Every successful refresh cycle produces one record describing the dataset
//! that was published: which source, how many items, when the cycle ran and
//! how long it took. Records flow through an infallible sink so that
//! instrumentation can never fail or delay a refresh.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Metadata about one completed refresh cycle
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRecord {
    /// Name of the data source that refreshed
    pub source: String,
    /// Number of items staged into the new snapshot
    pub item_count: usize,
    /// When the cycle started
    pub started_at: DateTime<Utc>,
    /// When the dataset was ready for publication
    pub finished_at: DateTime<Utc>,
    /// Elapsed wall-clock time in milliseconds
    pub duration_ms: i64,
}

impl RefreshRecord {
    /// Builds a record from the cycle boundary timestamps
    pub fn new(
        source: &str,
        item_count: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.to_string(),
            item_count,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
        }
    }
}

/// Receives refresh records
///
/// Recording is infallible by contract; a sink that cannot deliver a record
/// drops it rather than failing the cycle.
pub trait RefreshSink: Send + Sync {
    /// Records one completed refresh cycle
    fn record(&self, record: &RefreshRecord);
}

/// Sink that emits each record as a structured log line
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl RefreshSink for LogSink {
    fn record(&self, record: &RefreshRecord) {
        info!(
            source = %record.source,
            item_count = record.item_count,
            duration_ms = record.duration_ms,
            "refresh completed"
        );
    }
}

/// Sink that keeps every record in memory
///
/// Used by tests and diagnostics to observe which cycles ran and what they
/// published.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<RefreshRecord>>,
}

impl MemorySink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All records seen so far, in arrival order
    pub fn records(&self) -> Vec<RefreshRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RefreshSink for MemorySink {
    fn record(&self, record: &RefreshRecord) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push(record.clone());
    }
}

//! Refresh brokers for the lookup caches
//!
//! A broker sits between the remote fetcher and one double-buffered cache.
//! Each cycle fetches the complete dataset for its data kind, stages every
//! record and publishes the result with a single atomic swap. Any failure
//! along the way aborts the cycle and leaves the previously published
//! snapshot in service.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::cache::DoubleBufferedCache;
use crate::config::{ConfigError, ProviderConfig};
use crate::endpoint::EndpointDescriptor;
use crate::instrument::{RefreshRecord, RefreshSink};
use crate::remote::{fetch_payload, FetchError, RemoteFetcher};

/// Why a refresh cycle failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The provider answered but the dataset contained no records
    ///
    /// Treated as a failure like the others (the cache is left untouched and
    /// the event is logged at error level), but carried as its own variant so
    /// an empty upstream can be told apart from a broken one.
    NoData,
    /// The response body could not be decoded into the expected payload
    MalformedPayload,
    /// The provider could not be reached or answered with an error status
    Transport,
    /// Local configuration prevented the request from being attempted
    Configuration,
}

impl From<&FetchError> for FailureReason {
    fn from(error: &FetchError) -> Self {
        match error {
            FetchError::Transport(_) | FetchError::Status { .. } => FailureReason::Transport,
            FetchError::Decode(_) => FailureReason::MalformedPayload,
        }
    }
}

impl From<&ConfigError> for FailureReason {
    fn from(_: &ConfigError) -> Self {
        FailureReason::Configuration
    }
}

/// Result of one refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was published
    Success {
        /// Number of records in the published snapshot
        item_count: usize,
        /// Elapsed wall-clock time in milliseconds
        duration_ms: i64,
    },
    /// The cycle aborted; the previous snapshot is still being served
    Failure {
        /// Classification of what went wrong
        reason: FailureReason,
    },
}

impl RefreshOutcome {
    /// Returns `true` if the cycle published a new snapshot
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshOutcome::Success { .. })
    }
}

/// Strategy seam describing one cacheable data kind
///
/// A source knows its logical name, which provider endpoint serves its
/// dataset, and how to turn the decoded payload into cacheable records. The
/// generic refresh cycle in [`RefreshBroker`] supplies everything else.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Cache key type
    type Key: Eq + Hash + Send + Sync + 'static;
    /// Cached record type
    type Record: Send + Sync + 'static;
    /// Wire shape the provider answers with
    type Payload: DeserializeOwned + Send;

    /// Logical name used in logs and instrumentation records
    fn name(&self) -> &'static str;

    /// Endpoint serving this kind's dataset, composed from the provider config
    fn endpoint(&self, config: &ProviderConfig) -> Result<EndpointDescriptor, ConfigError>;

    /// Maps a decoded payload to the `(key, record)` pairs to cache
    fn extract_records(&self, payload: Self::Payload) -> Vec<(Self::Key, Self::Record)>;

    /// Hook invoked after a successful swap, for example to request a
    /// dependent refresh. Defaults to doing nothing.
    async fn after_swap(&self) {}
}

/// Object-safe view of a broker, held by the scheduler
#[async_trait]
pub trait Refreshable: Send + Sync {
    /// Logical name of the underlying data source
    fn name(&self) -> &'static str;

    /// Runs one refresh cycle to completion
    async fn refresh(&self) -> RefreshOutcome;
}

/// Runs refresh cycles for one data kind
///
/// Owns the strategy source, the cache being refreshed, the fetcher and the
/// instrumentation sink. At most one cycle runs at a time; a trigger arriving
/// while a cycle is in flight waits its turn behind the cycle lock.
pub struct RefreshBroker<S: DataSource> {
    source: S,
    config: ProviderConfig,
    cache: Arc<DoubleBufferedCache<S::Key, S::Record>>,
    fetcher: Arc<dyn RemoteFetcher>,
    sink: Arc<dyn RefreshSink>,
    cycle_lock: Mutex<()>,
}

impl<S: DataSource> RefreshBroker<S> {
    /// Creates a broker wiring a source to its cache, fetcher and sink
    pub fn new(
        source: S,
        config: ProviderConfig,
        cache: Arc<DoubleBufferedCache<S::Key, S::Record>>,
        fetcher: Arc<dyn RemoteFetcher>,
        sink: Arc<dyn RefreshSink>,
    ) -> Self {
        Self {
            source,
            config,
            cache,
            fetcher,
            sink,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Executes one complete refresh cycle
    ///
    /// Either publishes a full new snapshot and reports `Success`, or aborts
    /// without touching the active snapshot and reports `Failure`. Never
    /// panics or returns early while holding staged data.
    pub async fn run_cycle(&self) -> RefreshOutcome {
        let _cycle = self.cycle_lock.lock().await;
        let started_at = Utc::now();

        let endpoint = match self.source.endpoint(&self.config) {
            Ok(endpoint) => endpoint,
            Err(error) => return self.fail(FailureReason::from(&error), &error),
        };

        let payload = match fetch_payload::<S::Payload>(self.fetcher.as_ref(), &endpoint).await {
            Ok(payload) => payload,
            Err(error) => return self.fail(FailureReason::from(&error), &error),
        };

        let records = self.source.extract_records(payload);
        if records.is_empty() {
            error!(source = self.source.name(), "refresh failed: no data");
            return RefreshOutcome::Failure {
                reason: FailureReason::NoData,
            };
        }

        let item_count = records.len();
        for (key, record) in records {
            self.cache.stage(key, record);
        }

        // Instrumentation is recorded before publication, so the sink has
        // seen the cycle even if a post-swap hook misbehaves.
        let finished_at = Utc::now();
        let record = RefreshRecord::new(self.source.name(), item_count, started_at, finished_at);
        let duration_ms = record.duration_ms;
        self.sink.record(&record);

        self.cache.swap();
        debug!(
            source = self.source.name(),
            item_count, "snapshot published"
        );

        self.source.after_swap().await;

        RefreshOutcome::Success {
            item_count,
            duration_ms,
        }
    }

    fn fail(&self, reason: FailureReason, error: &dyn fmt::Display) -> RefreshOutcome {
        error!(source = self.source.name(), error = %error, "refresh failed");
        RefreshOutcome::Failure { reason }
    }
}

#[async_trait]
impl<S: DataSource> Refreshable for RefreshBroker<S> {
    fn name(&self) -> &'static str {
        self.source.name()
    }

    async fn refresh(&self) -> RefreshOutcome {
        self.run_cycle().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use serde::Deserialize;

    use crate::instrument::MemorySink;

    /// Sample provider response for the toy entry source below
    const ENTRY_RESPONSE: &str = r#"{
        "entries": [
            { "id": "red", "value": 1 },
            { "id": "blue", "value": 2 }
        ]
    }"#;

    #[derive(Debug, Deserialize)]
    struct EntryList {
        entries: Vec<Entry>,
    }

    #[derive(Debug, Deserialize)]
    struct Entry {
        id: String,
        value: u32,
    }

    struct EntrySource;

    #[async_trait]
    impl DataSource for EntrySource {
        type Key = String;
        type Record = u32;
        type Payload = EntryList;

        fn name(&self) -> &'static str {
            "EntryData"
        }

        fn endpoint(&self, config: &ProviderConfig) -> Result<EndpointDescriptor, ConfigError> {
            Ok(config.base_endpoint()?.with_segment("entries"))
        }

        fn extract_records(&self, payload: EntryList) -> Vec<(String, u32)> {
            payload
                .entries
                .into_iter()
                .map(|entry| (entry.id, entry.value))
                .collect()
        }
    }

    /// Fetcher that replays a script of canned bodies and error statuses
    struct ScriptedFetcher {
        script: StdMutex<VecDeque<Result<&'static str, u16>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<&'static str, u16>>) -> Self {
            Self {
                script: StdMutex::new(script.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteFetcher for ScriptedFetcher {
        async fn fetch(&self, endpoint: &EndpointDescriptor) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("Fetch script exhausted");
            match step {
                Ok(body) => Ok(body.to_string()),
                Err(status) => Err(FetchError::Status {
                    status,
                    url: endpoint.url(),
                }),
            }
        }
    }

    fn test_config() -> ProviderConfig {
        ProviderConfig {
            host: "provider.test".to_string(),
            ..Default::default()
        }
    }

    fn entry_broker(
        fetcher: Arc<dyn RemoteFetcher>,
        cache: Arc<DoubleBufferedCache<String, u32>>,
        sink: Arc<MemorySink>,
    ) -> RefreshBroker<EntrySource> {
        RefreshBroker::new(EntrySource, test_config(), cache, fetcher, sink)
    }

    #[tokio::test]
    async fn test_cycle_publishes_complete_snapshot() {
        let cache = Arc::new(DoubleBufferedCache::new());
        let sink = Arc::new(MemorySink::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(ENTRY_RESPONSE)]));
        let broker = entry_broker(fetcher, Arc::clone(&cache), Arc::clone(&sink));

        let outcome = broker.run_cycle().await;

        assert!(matches!(
            outcome,
            RefreshOutcome::Success { item_count: 2, .. }
        ));
        assert_eq!(cache.size(), 2);
        assert_eq!(*cache.lookup("red").expect("red should be cached"), 1);
        assert_eq!(*cache.lookup("blue").expect("blue should be cached"), 2);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "EntryData");
        assert_eq!(records[0].item_count, 2);
        assert!(records[0].duration_ms >= 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_leaves_cache_empty() {
        let cache = Arc::new(DoubleBufferedCache::new());
        let sink = Arc::new(MemorySink::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok("{ not json")]));
        let broker = entry_broker(fetcher, Arc::clone(&cache), Arc::clone(&sink));

        let outcome = broker.run_cycle().await;

        assert_eq!(
            outcome,
            RefreshOutcome::Failure {
                reason: FailureReason::MalformedPayload
            }
        );
        assert!(cache.is_empty());
        assert!(sink.records().is_empty(), "Failures must not be recorded");
    }

    #[tokio::test]
    async fn test_transport_failure_preserves_previous_snapshot() {
        let cache = Arc::new(DoubleBufferedCache::new());
        let sink = Arc::new(MemorySink::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(ENTRY_RESPONSE), Err(503)]));
        let broker = entry_broker(fetcher, Arc::clone(&cache), Arc::clone(&sink));

        assert!(broker.run_cycle().await.is_success());

        let outcome = broker.run_cycle().await;
        assert_eq!(
            outcome,
            RefreshOutcome::Failure {
                reason: FailureReason::Transport
            }
        );

        // The snapshot from the first cycle is still served in full
        assert_eq!(cache.size(), 2);
        assert_eq!(*cache.lookup("red").expect("red should be cached"), 1);
        assert_eq!(*cache.lookup("blue").expect("blue should be cached"), 2);
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_dataset_is_no_data_failure() {
        let cache = Arc::new(DoubleBufferedCache::new());
        let sink = Arc::new(MemorySink::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Ok(ENTRY_RESPONSE),
            Ok(r#"{ "entries": [] }"#),
        ]));
        let broker = entry_broker(fetcher, Arc::clone(&cache), Arc::clone(&sink));

        assert!(broker.run_cycle().await.is_success());

        let outcome = broker.run_cycle().await;
        assert_eq!(
            outcome,
            RefreshOutcome::Failure {
                reason: FailureReason::NoData
            }
        );

        // An empty upstream never wipes the previous snapshot
        assert_eq!(cache.size(), 2);
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_host_fails_before_any_fetch() {
        let cache = Arc::new(DoubleBufferedCache::new());
        let sink = Arc::new(MemorySink::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(ENTRY_RESPONSE)]));
        let broker = RefreshBroker::new(
            EntrySource,
            ProviderConfig::default(),
            Arc::clone(&cache),
            Arc::clone(&fetcher) as Arc<dyn RemoteFetcher>,
            Arc::clone(&sink) as Arc<dyn RefreshSink>,
        );

        let outcome = broker.run_cycle().await;

        assert_eq!(
            outcome,
            RefreshOutcome::Failure {
                reason: FailureReason::Configuration
            }
        );
        assert_eq!(
            fetcher.calls.load(Ordering::SeqCst),
            0,
            "No request may be attempted without a host"
        );
        assert!(cache.is_empty());
    }

    /// Sink that looks at the active snapshot size at record time
    struct SwapOrderProbe {
        cache: Arc<DoubleBufferedCache<String, u32>>,
        size_at_record: AtomicUsize,
    }

    impl RefreshSink for SwapOrderProbe {
        fn record(&self, _record: &RefreshRecord) {
            self.size_at_record
                .store(self.cache.size(), Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_instrumentation_is_recorded_before_publication() {
        let cache = Arc::new(DoubleBufferedCache::new());
        let probe = Arc::new(SwapOrderProbe {
            cache: Arc::clone(&cache),
            size_at_record: AtomicUsize::new(usize::MAX),
        });
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(ENTRY_RESPONSE)]));
        let broker = RefreshBroker::new(
            EntrySource,
            test_config(),
            Arc::clone(&cache),
            fetcher as Arc<dyn RemoteFetcher>,
            Arc::clone(&probe) as Arc<dyn RefreshSink>,
        );

        assert!(broker.run_cycle().await.is_success());

        // The sink ran while the old (empty) snapshot was still active
        assert_eq!(probe.size_at_record.load(Ordering::SeqCst), 0);
        assert_eq!(cache.size(), 2);
    }

    /// Source whose post-swap hook counts its invocations
    struct HookSource {
        swaps: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DataSource for HookSource {
        type Key = String;
        type Record = u32;
        type Payload = EntryList;

        fn name(&self) -> &'static str {
            "HookedEntryData"
        }

        fn endpoint(&self, config: &ProviderConfig) -> Result<EndpointDescriptor, ConfigError> {
            Ok(config.base_endpoint()?.with_segment("entries"))
        }

        fn extract_records(&self, payload: EntryList) -> Vec<(String, u32)> {
            payload
                .entries
                .into_iter()
                .map(|entry| (entry.id, entry.value))
                .collect()
        }

        async fn after_swap(&self) {
            self.swaps.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_after_swap_runs_only_on_success() {
        let swaps = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(DoubleBufferedCache::new());
        let sink = Arc::new(MemorySink::new());
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(ENTRY_RESPONSE), Err(500)]));
        let broker = RefreshBroker::new(
            HookSource {
                swaps: Arc::clone(&swaps),
            },
            test_config(),
            cache,
            fetcher as Arc<dyn RemoteFetcher>,
            sink as Arc<dyn RefreshSink>,
        );

        assert!(broker.run_cycle().await.is_success());
        assert_eq!(swaps.load(Ordering::SeqCst), 1);

        assert!(!broker.run_cycle().await.is_success());
        assert_eq!(swaps.load(Ordering::SeqCst), 1, "Hook must not run on failure");
    }

    /// Fetcher that panics if two fetches are ever in flight at once
    struct OverlapProbe {
        in_flight: AtomicUsize,
    }

    #[async_trait]
    impl RemoteFetcher for OverlapProbe {
        async fn fetch(&self, _endpoint: &EndpointDescriptor) -> Result<String, FetchError> {
            let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst);
            assert_eq!(concurrent, 0, "Cycles overlapped");
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(ENTRY_RESPONSE.to_string())
        }
    }

    #[tokio::test]
    async fn test_overlapping_triggers_serialize() {
        let cache = Arc::new(DoubleBufferedCache::new());
        let sink = Arc::new(MemorySink::new());
        let fetcher = Arc::new(OverlapProbe {
            in_flight: AtomicUsize::new(0),
        });
        let broker = Arc::new(entry_broker(fetcher, cache, sink));

        let first = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move { broker.run_cycle().await })
        };
        let second = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move { broker.run_cycle().await })
        };

        assert!(first.await.expect("First cycle panicked").is_success());
        assert!(second.await.expect("Second cycle panicked").is_success());
    }

    #[test]
    fn test_failure_reason_mapping() {
        let status = FetchError::Status {
            status: 502,
            url: "http://provider.test/lookup".to_string(),
        };
        assert_eq!(FailureReason::from(&status), FailureReason::Transport);

        let decode_error = serde_json::from_str::<EntryList>("oops")
            .expect_err("Decode should fail");
        assert_eq!(
            FailureReason::from(&FetchError::Decode(decode_error)),
            FailureReason::MalformedPayload
        );

        assert_eq!(
            FailureReason::from(&ConfigError::EmptyHost),
            FailureReason::Configuration
        );
    }
}

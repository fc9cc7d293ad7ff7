//! Background refresh scheduling
//!
//! Runs one periodic refresh loop per registered broker plus a dispatcher for
//! on-demand refresh requests. The first tick of every loop fires
//! immediately, so all caches populate on process start; a broadcast
//! shutdown signal stops every task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::broker::Refreshable;

/// Capacity of the on-demand refresh request channel
const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// Intervals between scheduled refresh cycles, one per data kind
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval for banner ad refresh
    pub banner_interval: Duration,
    /// Interval for video ad refresh
    pub video_interval: Duration,
    /// Interval for supplier refresh
    pub supplier_interval: Duration,
    /// Interval for currency rate refresh
    pub currency_interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            banner_interval: Duration::from_secs(300),    // 5 minutes
            video_interval: Duration::from_secs(300),     // 5 minutes
            supplier_interval: Duration::from_secs(600),  // 10 minutes
            currency_interval: Duration::from_secs(3600), // hourly
        }
    }
}

/// On-demand request to refresh one broker outside its schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Source name as reported by `Refreshable::name`
    pub source: &'static str,
}

impl RefreshRequest {
    /// Creates a request for the named source
    pub fn new(source: &'static str) -> Self {
        Self { source }
    }
}

/// One broker registered with the scheduler
struct Registration {
    broker: Arc<dyn Refreshable>,
    interval: Duration,
}

/// Builds the set of background refresh tasks
pub struct RefreshScheduler {
    registrations: Vec<Registration>,
    request_tx: mpsc::Sender<RefreshRequest>,
    request_rx: mpsc::Receiver<RefreshRequest>,
}

impl RefreshScheduler {
    /// Creates a scheduler with no registered brokers
    pub fn new() -> Self {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        Self {
            registrations: Vec::new(),
            request_tx,
            request_rx,
        }
    }

    /// Registers a broker to refresh on the given interval
    ///
    /// # Panics
    /// If `interval` is zero.
    pub fn register(&mut self, broker: Arc<dyn Refreshable>, interval: Duration) {
        assert!(!interval.is_zero(), "refresh interval must be non-zero");
        self.registrations.push(Registration { broker, interval });
    }

    /// Sender half of the on-demand request channel
    ///
    /// Post-swap hooks hold one of these to chain dependent refreshes.
    pub fn request_sender(&self) -> mpsc::Sender<RefreshRequest> {
        self.request_tx.clone()
    }

    /// Spawns the periodic loops and the request dispatcher
    ///
    /// # Returns
    /// A [`SchedulerHandle`] used to stop every spawned task
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut tasks = Vec::new();

        for registration in &self.registrations {
            let broker = Arc::clone(&registration.broker);
            let interval = registration.interval;
            let mut shutdown_rx = shutdown_tx.subscribe();

            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                info!(
                    source = broker.name(),
                    interval_secs = interval.as_secs(),
                    "refresh loop started"
                );

                // The first tick completes immediately, which populates the
                // cache at startup.
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            broker.refresh().await;
                        }
                        _ = shutdown_rx.recv() => {
                            info!(source = broker.name(), "refresh loop stopped");
                            break;
                        }
                    }
                }
            }));
        }

        let brokers: Vec<Arc<dyn Refreshable>> = self
            .registrations
            .iter()
            .map(|registration| Arc::clone(&registration.broker))
            .collect();
        let mut request_rx = self.request_rx;
        let mut shutdown_rx = shutdown_tx.subscribe();

        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    request = request_rx.recv() => {
                        let Some(request) = request else {
                            break;
                        };
                        match brokers.iter().find(|broker| broker.name() == request.source) {
                            Some(broker) => {
                                debug!(source = request.source, "on-demand refresh");
                                broker.refresh().await;
                            }
                            None => {
                                warn!(source = request.source, "refresh requested for unknown source");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        }));

        SchedulerHandle { shutdown_tx, tasks }
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for stopping the background refresh tasks
pub struct SchedulerHandle {
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signals every task to stop and waits for them to finish
    ///
    /// A task that ended abnormally is logged rather than silently discarded.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for task in self.tasks {
            if let Err(error) = task.await {
                error!(error = %error, "refresh task ended abnormally");
            }
        }
    }
}

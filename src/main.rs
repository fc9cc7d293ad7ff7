//! adcached - keeps ad-serving lookup caches fresh
//!
//! Daemon binary that pulls complete datasets (banner ads, video ads,
//! suppliers, currency exchange rates) from the remote data provider on
//! per-kind schedules and publishes each one as an atomic cache snapshot.

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use futures::future::join_all;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adcache::broker::{RefreshBroker, Refreshable};
use adcache::cache::DoubleBufferedCache;
use adcache::cli::{Cli, DaemonOptions};
use adcache::data::{BannerAdSource, CurrencyRateSource, SupplierSource, VideoAdSource};
use adcache::instrument::{LogSink, RefreshSink};
use adcache::refresh::RefreshScheduler;
use adcache::remote::{RemoteFetcher, RestFetcher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let options = DaemonOptions::from_cli(&cli)?;

    init_tracing();

    // A missing host cannot heal while the daemon runs; bail now instead of
    // logging a configuration failure every cycle.
    options.provider.base_endpoint()?;

    let fetcher: Arc<dyn RemoteFetcher> =
        Arc::new(RestFetcher::new().with_credentials(options.provider.credentials.clone()));
    let sink: Arc<dyn RefreshSink> = Arc::new(LogSink);

    let mut scheduler = RefreshScheduler::new();
    let requests = scheduler.request_sender();

    let banner_broker: Arc<dyn Refreshable> = Arc::new(RefreshBroker::new(
        BannerAdSource::new(),
        options.provider.clone(),
        Arc::new(DoubleBufferedCache::new()),
        Arc::clone(&fetcher),
        Arc::clone(&sink),
    ));
    let video_broker: Arc<dyn Refreshable> = Arc::new(RefreshBroker::new(
        VideoAdSource::new(),
        options.provider.clone(),
        Arc::new(DoubleBufferedCache::new()),
        Arc::clone(&fetcher),
        Arc::clone(&sink),
    ));
    let supplier_broker: Arc<dyn Refreshable> = Arc::new(RefreshBroker::new(
        SupplierSource::new().with_rate_chaining(requests),
        options.provider.clone(),
        Arc::new(DoubleBufferedCache::new()),
        Arc::clone(&fetcher),
        Arc::clone(&sink),
    ));
    let rate_broker: Arc<dyn Refreshable> = Arc::new(RefreshBroker::new(
        CurrencyRateSource::new(),
        options.provider.clone(),
        Arc::new(DoubleBufferedCache::new()),
        Arc::clone(&fetcher),
        Arc::clone(&sink),
    ));

    if options.once {
        let brokers = [banner_broker, video_broker, supplier_broker, rate_broker];
        let outcomes = join_all(brokers.iter().map(|broker| broker.refresh())).await;

        let failed = outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
            .count();
        if failed > 0 {
            return Err(format!("{failed} of {} refresh cycles failed", outcomes.len()).into());
        }
        return Ok(());
    }

    scheduler.register(banner_broker, options.refresh.banner_interval);
    scheduler.register(video_broker, options.refresh.video_interval);
    scheduler.register(supplier_broker, options.refresh.supplier_interval);
    scheduler.register(rate_broker, options.refresh.currency_interval);

    let handle = scheduler.start();
    info!("adcached running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    handle.shutdown().await;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

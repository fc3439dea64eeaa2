use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use rollpulse::fetchers::{AnalyticsFetcher, ExplorerFetcher, ProxyClient};
use rollpulse::{
    CacheStore, CronScheduler, CronSettings, DatasetManager, EcosystemCollector, RegistrySource,
    Settings,
};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    // Load configuration
    let settings = Arc::new(
        Settings::new()
            .context("Failed to load config.yaml. Please ensure it exists and is valid")?,
    );

    let proxy = Arc::new(ProxyClient::new(&settings.proxy.base_url));
    let registry = RegistrySource::new(proxy.clone(), settings.registry.sheet_url.clone());
    let explorer = ExplorerFetcher::new(proxy.clone());
    let analytics = AnalyticsFetcher::new(
        proxy.clone(),
        &settings.analytics.host,
        &settings.analytics.range,
    );

    let collector = Arc::new(EcosystemCollector::new(registry, explorer, analytics));
    let store = Arc::new(CacheStore::new(settings.cache.dir.clone()));
    let manager = Arc::new(DatasetManager::new(store, collector));

    let cancellation_token = CancellationToken::new();

    // Warm every dataset once so the first consumer read hits fresh cache.
    // Stale entries from a previous run are refreshed, fresh ones reused.
    warm_datasets(&manager).await;

    // Spawn the cron scheduler to keep the bundles warm on TTL cadence
    let cron_scheduler = CronScheduler::new(manager.clone(), CronSettings::default());

    let cron_token = cancellation_token.child_token();
    let cron_handle = tokio::spawn(async move {
        if let Err(e) = cron_scheduler.run(cron_token).await {
            error!("Cron scheduler failed: {:#}", e);
        }
    });

    info!("Cron scheduler started - datasets will refresh periodically");

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    // Set up graceful shutdown signal handler
    info!("Aggregator running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    // Cancel all running tasks
    info!("Finishing all tasks...");

    cancellation_token.cancel();

    // Wait for cron scheduler to stop
    info!("Waiting for cron scheduler to stop...");
    let _ = cron_handle.await;

    info!("Shutdown complete");
    Ok(())
}

/// Initial warm cycle. Failures are logged and left to the scheduler to
/// retry; a dead upstream at boot should not keep the service from starting.
async fn warm_datasets(manager: &DatasetManager) {
    info!("Warming datasets...");

    if let Err(e) = manager.ecosystem().await {
        error!("Failed to warm ecosystem dataset: {:#}", e);
    }
    if let Err(e) = manager.tps().await {
        error!("Failed to warm TPS dataset: {:#}", e);
    }
    if let Err(e) = manager.raas_pages().await {
        error!("Failed to warm RaaS pages dataset: {:#}", e);
    }
}

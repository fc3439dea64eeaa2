//! Cron scheduler for periodic background dataset refreshes.
//!
//! Pre-warms the cached bundles on their TTL cadence so interactive reads
//! mostly find a fresh entry. Each job calls the same consumer entry points
//! as an interactive read and therefore respects the cache gate.

use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::worker::DatasetManager;

use super::jobs;

/// Cron scheduler that manages the periodic refresh jobs.
pub struct CronScheduler {
    manager: Arc<DatasetManager>,
    settings: Arc<CronSettings>,
}

/// Configuration for refresh intervals. Defaults track each dataset's TTL.
#[derive(Debug, Clone)]
pub struct CronSettings {
    /// Interval for the ecosystem overview refresh - default 6 hours
    pub ecosystem_refresh_interval_secs: u64,
    /// Interval for the TPS refresh - default 1 hour
    pub tps_refresh_interval_secs: u64,
    /// Interval for the RaaS pages refresh - default 6 hours
    pub raas_refresh_interval_secs: u64,
}

impl Default for CronSettings {
    fn default() -> Self {
        Self {
            ecosystem_refresh_interval_secs: 21600, // 6 hours
            tps_refresh_interval_secs: 3600,        // 1 hour
            raas_refresh_interval_secs: 21600,      // 6 hours
        }
    }
}

impl CronScheduler {
    pub fn new(manager: Arc<DatasetManager>, settings: CronSettings) -> Self {
        Self {
            manager,
            settings: Arc::new(settings),
        }
    }

    /// Starts the cron scheduler and runs until cancellation.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;

        // Register all jobs
        self.register_refresh_ecosystem_job(&scheduler).await?;
        self.register_refresh_tps_job(&scheduler).await?;
        self.register_refresh_raas_pages_job(&scheduler).await?;

        // Start the scheduler
        scheduler.start().await?;
        info!("Cron scheduler started with {} jobs", 3);

        // Wait for cancellation
        cancellation_token.cancelled().await;
        info!("Cron scheduler shutting down...");

        scheduler.shutdown().await?;
        Ok(())
    }

    async fn register_refresh_ecosystem_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let manager = self.manager.clone();
        let interval = self.settings.ecosystem_refresh_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let manager = manager.clone();
                Box::pin(async move {
                    if let Err(e) = jobs::refresh_ecosystem::run(&manager).await {
                        error!("Failed to refresh ecosystem dataset: {:#}", e);
                    }
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered refresh_ecosystem job (every {}s)", interval);
        Ok(())
    }

    async fn register_refresh_tps_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let manager = self.manager.clone();
        let interval = self.settings.tps_refresh_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let manager = manager.clone();
                Box::pin(async move {
                    if let Err(e) = jobs::refresh_tps::run(&manager).await {
                        error!("Failed to refresh TPS dataset: {:#}", e);
                    }
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered refresh_tps job (every {}s)", interval);
        Ok(())
    }

    async fn register_refresh_raas_pages_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let manager = self.manager.clone();
        let interval = self.settings.raas_refresh_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let manager = manager.clone();
                Box::pin(async move {
                    if let Err(e) = jobs::refresh_raas_pages::run(&manager).await {
                        error!("Failed to refresh RaaS pages dataset: {:#}", e);
                    }
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered refresh_raas_pages job (every {}s)", interval);
        Ok(())
    }
}

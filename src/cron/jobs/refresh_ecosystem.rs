//! Job to pre-warm the ecosystem overview dataset.
//!
//! Goes through the same consumer entry point as interactive reads, so it
//! only refetches when the cached bundle has actually gone stale.

use anyhow::Result;
use log::info;

use crate::worker::DatasetManager;

pub async fn run(manager: &DatasetManager) -> Result<()> {
    info!("Starting refresh_ecosystem job...");

    let start = std::time::Instant::now();
    let bundle = manager.ecosystem().await?;

    info!(
        "Completed refresh_ecosystem job in {:?} ({} chains, {} days of transactions)",
        start.elapsed(),
        bundle.chains.len(),
        bundle.daily_transactions.len()
    );
    Ok(())
}

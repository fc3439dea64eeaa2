//! Job to pre-warm the per-provider dataset behind the RaaS pages.

use anyhow::Result;
use log::info;

use crate::worker::DatasetManager;

pub async fn run(manager: &DatasetManager) -> Result<()> {
    info!("Starting refresh_raas_pages job...");

    let start = std::time::Instant::now();
    let bundle = manager.raas_pages().await?;

    info!(
        "Completed refresh_raas_pages job in {:?} ({} providers)",
        start.elapsed(),
        bundle.providers.len()
    );
    Ok(())
}

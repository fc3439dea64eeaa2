//! Job to pre-warm the TPS dataset, the shortest-lived bundle.

use anyhow::Result;
use log::info;

use crate::worker::DatasetManager;

pub async fn run(manager: &DatasetManager) -> Result<()> {
    info!("Starting refresh_tps job...");

    let start = std::time::Instant::now();
    let bundle = manager.tps().await?;

    info!(
        "Completed refresh_tps job in {:?} ({} chains reporting)",
        start.elapsed(),
        bundle.tps_by_chain.len()
    );
    Ok(())
}

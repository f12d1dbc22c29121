//! Periodic cleanup of aged temp and output files.
//!
//! Uploads whose jobs have long finished and toolbox artifacts the
//! client already downloaded accumulate under the storage root. This
//! task sweeps both directories on a fixed interval, deleting files
//! older than the configured retention period.

use std::time::Duration;

use murmur_core::storage::{sweep_aged_files, StorageLayout};
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the retention sweep loop until `cancel` is triggered.
pub async fn run(storage: StorageLayout, retention_hours: u64, cancel: CancellationToken) {
    let max_age = Duration::from_secs(retention_hours * 3600);

    tracing::info!(
        retention_hours,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Retention sweep started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Retention sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let mut removed = 0;
                for dir in [storage.temp_dir(), storage.output_dir()] {
                    removed += sweep_aged_files(&dir, max_age).await;
                }
                if removed > 0 {
                    tracing::info!(removed, "Retention sweep: purged aged files");
                } else {
                    tracing::debug!("Retention sweep: nothing to purge");
                }
            }
        }
    }
}

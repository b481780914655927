//! Retention sweep for decided submissions.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::state::AppState;

/// Interval between retention sweeps.
const RETENTION_INTERVAL: Duration = Duration::from_secs(3600);

/// Remove decided submissions older than the configured retention.
///
/// Returns the number of submissions purged.
pub async fn purge_decided(state: &AppState) -> usize {
    let cutoff = i64::try_from(state.config.done_retention_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|retention| state.clock.now().checked_sub_signed(retention))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let purged = state.submissions.purge_done(cutoff).await;
    if purged > 0 {
        info!(purged, "retention purge completed");
    }
    purged
}

/// Spawn the background sweep; it exits when `cancel` fires.
#[must_use]
pub fn spawn_retention_task(state: Arc<AppState>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RETENTION_INTERVAL);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("retention task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    purge_decided(&state).await;
                }
            }
        }
    })
}

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::task_service::LogoTaskService;

/// Periodically fails tasks nobody is polling, so abandoned rows do not sit in
/// `pending` forever.
pub fn spawn_sweeper(service: Arc<LogoTaskService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(?interval, "Stale task sweeper started");

        loop {
            ticker.tick().await;
            match service.sweep_stale().await {
                Ok(0) => {}
                Ok(count) => info!(count, "Timed out stale logo tasks"),
                Err(e) => error!(error = %e, "Stale task sweep failed"),
            }
        }
    })
}

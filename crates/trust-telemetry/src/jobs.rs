//! Background maintenance tasks
//!
//! Two periodic sweeps run while the engine is active: an hourly retention
//! sweep that purges expired metrics, logs, alerts and completed spans, and
//! a five-minute health sweep that re-runs every registered health check.
//! Both stop promptly on shutdown via a watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::engine::Shared;

const RETENTION_INTERVAL: Duration = Duration::from_secs(3600);
const HEALTH_INTERVAL: Duration = Duration::from_secs(300);

/// Handles to the spawned sweeps plus their shutdown signal
pub(crate) struct BackgroundJobs {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundJobs {
    /// Spawn the retention and health sweeps on the current tokio runtime
    pub(crate) fn spawn(shared: Arc<Shared>) -> Self {
        let (shutdown, _) = watch::channel(false);

        let retention = {
            let shared = Arc::clone(&shared);
            let mut rx = shutdown.subscribe();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(RETENTION_INTERVAL);
                ticker.tick().await; // first tick fires immediately
                loop {
                    tokio::select! {
                        _ = ticker.tick() => shared.sweep_retention(),
                        _ = rx.changed() => break,
                    }
                }
            })
        };

        let health = {
            let shared = Arc::clone(&shared);
            let mut rx = shutdown.subscribe();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(HEALTH_INTERVAL);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => shared.sweep_health(),
                        _ = rx.changed() => break,
                    }
                }
            })
        };

        tracing::debug!("observability background jobs started");
        Self {
            shutdown,
            handles: vec![retention, health],
        }
    }

    /// Signal both sweeps to stop and wait for them to finish
    pub(crate) async fn stop(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
        tracing::debug!("observability background jobs stopped");
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ObservabilityConfig;
    use crate::engine::ObservabilityEngine;

    #[tokio::test]
    async fn test_jobs_start_and_stop() {
        let engine = ObservabilityEngine::new(ObservabilityConfig::default());
        engine.start_background_jobs();
        // Starting twice is a no-op.
        engine.start_background_jobs();
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_without_jobs() {
        let engine = ObservabilityEngine::new(ObservabilityConfig::default());
        engine.shutdown().await;
    }
}

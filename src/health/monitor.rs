//! Periodic health probing.
//!
//! # Responsibilities
//! - Run the probe on a fixed interval until shutdown
//! - Log readiness transitions
//! - Publish per-role liveness gauges

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthConfig;
use crate::health::probe::HealthProbe;
use crate::observability::metrics;
use crate::store::Role;

pub struct HealthMonitor {
    probe: HealthProbe,
    config: HealthConfig,
    ready: Option<bool>,
}

impl HealthMonitor {
    pub fn new(probe: HealthProbe, config: HealthConfig) -> Self {
        Self {
            probe,
            config,
            ready: None,
        }
    }

    /// Last observed readiness, `None` before the first probe.
    pub fn is_ready(&self) -> Option<bool> {
        self.ready
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Background health checks disabled");
            return;
        }

        tracing::info!(interval = self.config.interval_secs, "Health monitor starting");

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one probe and record the result.
    pub async fn check(&mut self) {
        let ready = match self.probe.check().await {
            Ok(report) => {
                metrics::record_db_health(Role::Primary, true);
                if let Some(status) = &report.replica {
                    metrics::record_db_health(Role::Replica, status.is_up());
                }
                true
            }
            Err(e) => {
                metrics::record_db_health(Role::Primary, false);
                tracing::debug!(error = %e, "Health probe failed");
                false
            }
        };

        match (self.ready, ready) {
            (Some(true) | None, false) => {
                tracing::error!("Primary database unreachable, service not ready");
            }
            (Some(false), true) => tracing::info!("Primary database reachable again, service ready"),
            (None, true) => tracing::info!("Service ready"),
            _ => {}
        }
        self.ready = Some(ready);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConnectionManager;
    use crate::store::{MemoryStore, SharedStore};
    use std::sync::Arc;

    fn monitor(enabled: bool) -> HealthMonitor {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let probe = HealthProbe::new(
            Arc::new(ConnectionManager::from_parts(store, None)),
            Duration::from_secs(1),
        );
        HealthMonitor::new(
            probe,
            HealthConfig {
                enabled,
                interval_secs: 10,
                timeout_secs: 1,
            },
        )
    }

    #[tokio::test]
    async fn test_check_marks_ready() {
        let mut monitor = monitor(true);
        assert_eq!(monitor.is_ready(), None);
        monitor.check().await;
        assert_eq!(monitor.is_ready(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(monitor(true).run(rx));

        time::advance(Duration::from_secs(25)).await;
        tx.send(()).unwrap();

        time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_disabled_monitor_returns_immediately() {
        let (_tx, rx) = broadcast::channel(1);
        monitor(false).run(rx).await;
    }
}

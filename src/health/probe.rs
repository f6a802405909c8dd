//! On-demand database liveness probe.
//!
//! # Design Decisions
//! - Pings go straight to the connections, without breaker or retry, so a
//!   probe reports live status
//! - Primary down fails the probe; replica down is logged and tolerated
//! - Each ping is bounded by a timeout; a timeout counts as a failed ping

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time;

use crate::db::ConnectionManager;
use crate::store::{Role, SharedStore};

/// Result of pinging one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingStatus {
    Up,
    Down(String),
}

impl PingStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, PingStatus::Up)
    }
}

/// Outcome of a probe that passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    /// `None` when reads go to the primary.
    pub replica: Option<PingStatus>,
}

impl HealthReport {
    pub fn is_degraded(&self) -> bool {
        matches!(self.replica, Some(PingStatus::Down(_)))
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Database connection failed: {0}")]
    PrimaryDown(String),
}

#[derive(Debug, Clone)]
pub struct HealthProbe {
    connections: Arc<ConnectionManager>,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(connections: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { connections, timeout }
    }

    /// Ping the primary and, if distinct, the replica.
    pub async fn check(&self) -> Result<HealthReport, ProbeError> {
        if let PingStatus::Down(reason) = self.ping(self.connections.primary()).await {
            return Err(ProbeError::PrimaryDown(reason));
        }

        let replica = match self.connections.replica() {
            None => None,
            Some(replica) => {
                let status = self.ping(replica).await;
                if let PingStatus::Down(reason) = &status {
                    tracing::warn!(role = %Role::Replica, error = %reason, "Read replica ping failed");
                }
                Some(status)
            }
        };

        Ok(HealthReport { replica })
    }

    async fn ping(&self, store: &SharedStore) -> PingStatus {
        match time::timeout(self.timeout, store.ping()).await {
            Ok(Ok(())) => PingStatus::Up,
            Ok(Err(e)) => PingStatus::Down(e.to_string()),
            Err(_) => PingStatus::Down(format!("ping timed out after {:?}", self.timeout)),
        }
    }
}

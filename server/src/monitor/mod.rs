//! # Health Monitor
//!
//! Two periodic loops run next to the apiserver: the host loop samples
//! process-host metrics into the store, the cluster loop detects missed
//! heartbeats and resource overload. Both observe a shared cancellation
//! token and are joined on shutdown.

mod cluster;
mod host;

use std::sync::Arc;
use std::time::Duration;

pub use host::{HostSampler, SysinfoSampler};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::state::State;

/// Sleep applied after a failed iteration before the next attempt.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub host_interval: Duration,
    pub cluster_interval: Duration,
    /// Seconds without a heartbeat before a node is flipped offline.
    pub liveness_threshold: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host_interval: Duration::from_secs(30),
            cluster_interval: Duration::from_secs(60),
            liveness_threshold: 300,
        }
    }
}

/// Supervisor over the two monitor loops.
pub struct Monitor {
    token: CancellationToken,
    host: JoinHandle<()>,
    cluster: JoinHandle<()>,
}

impl Monitor {
    pub fn start(state: State, sampler: Arc<dyn HostSampler>, config: MonitorConfig) -> Self {
        let token = CancellationToken::new();
        let host = tokio::spawn(host::run(
            state.clone(),
            sampler,
            config.host_interval,
            token.clone(),
        ));
        let cluster = tokio::spawn(cluster::run(
            state,
            config.cluster_interval,
            config.liveness_threshold,
            token.clone(),
        ));
        Self {
            token,
            host,
            cluster,
        }
    }

    /// Cancels both loops and waits for them to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(err) = self.host.await {
            tracing::error!(error=%err, "Host monitor task failed");
        }
        if let Err(err) = self.cluster.await {
            tracing::error!(error=%err, "Cluster monitor task failed");
        }
    }
}

//! # Heartbeat Client
//!
//! Periodically reports observed metrics to the control plane. The control
//! plane interprets a heartbeat as liveness plus a clamped resource update.
//! On shutdown the agent tells the control plane to clean up its state.

use std::fs;
use std::time::Duration;

use reqwest::Client;
use shared::api::HeartbeatRequest;
use shared::models::NodeStatus;
use tokio::time;

use crate::metrics::Collector;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HeartbeatClient {
    client: Client,
    api_url: String,
    node_id: String,
}

impl HeartbeatClient {
    pub fn new(api_url: String, node_id: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build http client");
        Self {
            client,
            api_url,
            node_id,
        }
    }

    /// Sends one heartbeat; returns whether the control plane accepted it.
    pub async fn send(&self, collector: &Collector) -> bool {
        let payload = HeartbeatRequest {
            resources: collector.collect(),
            status: NodeStatus::Online,
        };
        let url = format!("{}/health/heartbeat/{}", self.api_url, self.node_id);

        match self.client.post(&url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(node_id=%self.node_id, "Heartbeat sent");
                true
            }
            Ok(resp) => {
                tracing::error!(status=%resp.status(), "Heartbeat rejected");
                false
            }
            Err(err) => {
                tracing::error!(error=%err, "Heartbeat request failed");
                false
            }
        }
    }

    /// Runs the heartbeat loop until the task is dropped. Warns once failures
    /// start piling up, so a broken control-plane address is visible in the
    /// container logs.
    pub async fn run(&self, collector: &Collector, interval: Duration) {
        tracing::info!(
            interval_secs = interval.as_secs(),
            node_id=%self.node_id,
            "Starting heartbeat loop"
        );
        let mut ticker = time::interval(interval);
        let mut consecutive_failures: u32 = 0;

        loop {
            ticker.tick().await;
            if self.send(collector).await {
                consecutive_failures = 0;
            } else {
                consecutive_failures += 1;
                if consecutive_failures > 3 {
                    tracing::warn!(
                        consecutive_failures,
                        "Multiple consecutive heartbeat failures"
                    );
                }
            }
        }
    }

    /// Asks the control plane to clean up this node's state before exit.
    pub async fn cleanup(&self) {
        let url = format!("{}/nodes/{}/shutdown", self.api_url, self.node_id);
        match self.client.post(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(node_id=%self.node_id, "Shutdown cleanup completed");
            }
            Ok(resp) => {
                tracing::error!(status=%resp.status(), "Shutdown cleanup rejected");
            }
            Err(err) => {
                tracing::error!(error=%err, "Shutdown cleanup request failed");
            }
        }
    }
}

/// The node id the control plane knows is the container id. Inside a
/// container the cgroup path carries it; otherwise fall back to the hostname
/// or the configured id.
pub fn detect_container_id(fallback: &str) -> String {
    if let Ok(content) = fs::read_to_string("/proc/self/cgroup") {
        for line in content.lines() {
            if line.contains("docker") {
                if let Some(id) = line.trim().rsplit('/').next() {
                    if !id.is_empty() {
                        return id.to_string();
                    }
                }
            }
        }
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| fallback.to_string())
}

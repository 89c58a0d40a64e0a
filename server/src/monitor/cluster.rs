//! Cluster loop: flips nodes offline when their heartbeat goes stale and
//! hands overloaded nodes to the fault handler. Utilization is computed from
//! pod reservations against the node's pinned capacity and compared to the
//! limits stored in `host:resources`.

use std::time::Duration;

use chrono::Utc;
use dashmap::DashSet;
use shared::models::NodeStatus;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::errors::ApiError;
use crate::state::State;

use super::ERROR_BACKOFF;

pub(super) async fn run(
    state: State,
    interval: Duration,
    liveness_threshold: i64,
    token: CancellationToken,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        liveness_threshold,
        "Starting cluster monitor"
    );
    let monitor = ClusterMonitor::new(state, liveness_threshold);
    let mut ticker = time::interval(interval);
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("Cluster monitor stopping");
                break;
            }
            _ = ticker.tick() => {
                if let Err(err) = monitor.tick().await {
                    tracing::error!(error=%err, "Cluster monitor iteration failed");
                    time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }
}

pub(crate) struct ClusterMonitor {
    state: State,
    liveness_threshold: i64,
    /// Node ids this monitor has seen fail, by timeout or by overload.
    failed_nodes: DashSet<String>,
}

impl ClusterMonitor {
    pub(crate) fn new(state: State, liveness_threshold: i64) -> Self {
        Self {
            state,
            liveness_threshold,
            failed_nodes: DashSet::new(),
        }
    }

    pub(crate) async fn tick(&self) -> Result<(), ApiError> {
        self.check_node_liveness().await?;
        self.check_resource_limits().await?;
        Ok(())
    }

    /// Flips nodes offline whose last heartbeat is older than the liveness
    /// threshold. Nodes that never reported are left alone.
    async fn check_node_liveness(&self) -> Result<(), ApiError> {
        let now = Utc::now();
        for node in self.state.manager.list_nodes().await? {
            if node.status == NodeStatus::Offline {
                continue;
            }
            let Some(last_heartbeat) = node.last_heartbeat else {
                continue;
            };
            if (now - last_heartbeat).num_seconds() > self.liveness_threshold {
                tracing::warn!(node_id=%node.id, "Node missed heartbeat, marking offline");
                self.state
                    .manager
                    .update_status(&node.id, NodeStatus::Offline)
                    .await?;
                self.failed_nodes.insert(node.id.clone());
            }
        }
        Ok(())
    }

    /// Compares per-node utilization against the host limits and hands
    /// offenders to the fault handler. Without a host record there are no
    /// limits to enforce yet.
    async fn check_resource_limits(&self) -> Result<(), ApiError> {
        let Some(host) = self.state.store.get_host().await? else {
            return Ok(());
        };

        for node in self.state.manager.list_nodes().await? {
            if node.status != NodeStatus::Online {
                continue;
            }
            let util = self.state.manager.utilization(&node).await?;

            let cpu_exceeded = util.cpu_utilization > host.cpu_limit_percent;
            let memory_exceeded = util.memory_utilization > host.memory_limit_percent;
            if cpu_exceeded {
                tracing::warn!(
                    node_id=%node.id,
                    utilization = format!("{:.1}", util.cpu_utilization),
                    limit = host.cpu_limit_percent,
                    "Node CPU utilization exceeds limit"
                );
            }
            if memory_exceeded {
                tracing::warn!(
                    node_id=%node.id,
                    utilization = format!("{:.1}", util.memory_utilization),
                    limit = host.memory_limit_percent,
                    "Node memory utilization exceeds limit"
                );
            }
            if cpu_exceeded || memory_exceeded {
                self.state.faults.handle_resource_failure(&node).await?;
                self.failed_nodes.insert(node.id.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! - test_stale_heartbeat_flips_node_offline
    //! - test_fresh_heartbeat_left_alone
    //! - test_node_without_heartbeat_left_alone
    //! - test_overload_hands_node_to_fault_handler

    use std::sync::Arc;

    use super::*;
    use crate::runtime::test_runtime::TestRuntime;
    use crate::state::new_state;
    use crate::store::Store;
    use crate::store::test_store::TestStore;
    use chrono::Duration as ChronoDuration;
    use shared::models::{
        HostResource, Node, NodeResources, Pod, PodResources, PodStatus,
    };

    fn test_state() -> (Arc<TestStore>, State) {
        let store = Arc::new(TestStore::new());
        let state = new_state(store.clone(), Arc::new(TestRuntime::new()));
        (store, state)
    }

    async fn seed_node(store: &TestStore, id: &str, cpu: u32, heartbeat_age: Option<i64>) {
        let node = Node {
            id: id.to_string(),
            resources: NodeResources {
                cpu_count: cpu,
                memory_total: 4 * 1024 * 1024 * 1024,
                memory_available: 4 * 1024 * 1024 * 1024,
            },
            last_heartbeat: heartbeat_age
                .map(|secs| Utc::now() - ChronoDuration::seconds(secs)),
            ..Default::default()
        };
        store.put_node(&node).await.unwrap();
    }

    async fn seed_host(store: &TestStore, cpu_limit: f64) {
        store
            .put_host(&HostResource {
                cpu_count: 16,
                memory_total: 32 * 1024 * 1024 * 1024,
                memory_available: 16 * 1024 * 1024 * 1024,
                cpu_limit_percent: cpu_limit,
                memory_limit_percent: 90.0,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stale_heartbeat_flips_node_offline() {
        let (store, state) = test_state();
        seed_node(&store, "n1", 4, Some(400)).await;

        let mut pod = Pod::new(
            "p1".to_string(),
            PodResources {
                cpu_cores: 1,
                memory_mb: 64,
            },
        );
        pod.node_id = Some("n1".to_string());
        pod.status = PodStatus::Running;
        store.put_pod(&pod).await.unwrap();

        ClusterMonitor::new(state, 300).tick().await.unwrap();

        let node = store.get_node("n1").await.unwrap().unwrap();
        assert_eq!(node.status, NodeStatus::Offline);
        // timeout alone does not fail pods
        let pod = store.get_pod(&pod.id).await.unwrap().unwrap();
        assert_eq!(pod.status, PodStatus::Running);
    }

    #[tokio::test]
    async fn test_fresh_heartbeat_left_alone() {
        let (store, state) = test_state();
        seed_node(&store, "n1", 4, Some(10)).await;

        ClusterMonitor::new(state, 300).tick().await.unwrap();

        let node = store.get_node("n1").await.unwrap().unwrap();
        assert_eq!(node.status, NodeStatus::Online);
    }

    #[tokio::test]
    async fn test_node_without_heartbeat_left_alone() {
        let (store, state) = test_state();
        seed_node(&store, "n1", 4, None).await;

        ClusterMonitor::new(state, 300).tick().await.unwrap();

        let node = store.get_node("n1").await.unwrap().unwrap();
        assert_eq!(node.status, NodeStatus::Online);
    }

    #[tokio::test]
    async fn test_overload_hands_node_to_fault_handler() {
        let (store, state) = test_state();
        seed_node(&store, "n1", 4, Some(10)).await;
        seed_host(&store, 50.0).await;

        // 3 of 4 cores reserved: 75% against a 50% limit
        let mut pod = Pod::new(
            "p1".to_string(),
            PodResources {
                cpu_cores: 3,
                memory_mb: 64,
            },
        );
        pod.node_id = Some("n1".to_string());
        pod.status = PodStatus::Running;
        store.put_pod(&pod).await.unwrap();

        ClusterMonitor::new(state, 300).tick().await.unwrap();

        let node = store.get_node("n1").await.unwrap().unwrap();
        assert_eq!(node.status, NodeStatus::Offline);
        let pod = store.get_pod(&pod.id).await.unwrap().unwrap();
        assert_eq!(pod.status, PodStatus::Failed);
    }
}

//! # Best-Fit Scheduler
//!
//! Places a pod onto the online node that would be left with the least CPU
//! slack after the placement. Concentrating workloads keeps large free slots
//! open on the other nodes for future large pods. Memory acts as a filter
//! only; CPU is the scarcer dimension in typical registrations and breaks the
//! decision.

use std::sync::Arc;

use shared::models::{Node, NodeStatus, Pod};

use crate::errors::ApiError;
use crate::store::Store;

#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn Store>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns the best-fitting online node for the pod, or `None` when no
    /// candidate has the capacity. The caller commits the placement.
    pub async fn schedule(&self, pod: &Pod) -> Result<Option<Node>, ApiError> {
        let nodes = self.store.list_nodes().await?;

        let mut best: Option<(Node, i64)> = None;
        for node in nodes
            .into_iter()
            .filter(|n| n.status == NodeStatus::Online)
        {
            let Some(slack) = self.cpu_slack_after(&node, pod).await? else {
                continue;
            };
            let replace = match &best {
                Some((_, best_slack)) => slack < *best_slack,
                None => true,
            };
            if replace {
                best = Some((node, slack));
            }
        }

        if best.is_none() {
            tracing::warn!(pod_name=%pod.name, "No node with sufficient capacity");
        }
        Ok(best.map(|(node, _)| node))
    }

    /// CPU slack the node would be left with after taking the pod, or `None`
    /// when the pod does not fit. Every pod in the node's pod set counts
    /// against capacity, whatever its status.
    async fn cpu_slack_after(&self, node: &Node, pod: &Pod) -> Result<Option<i64>, ApiError> {
        let placed = self.store.list_node_pods(&node.id).await?;
        let used_cpu: u64 = placed.iter().map(|p| p.resources.cpu_cores as u64).sum();
        let used_memory: u64 = placed.iter().map(|p| p.resources.memory_bytes()).sum();

        let available_cpu = node.resources.cpu_count as i64 - used_cpu as i64;
        let available_memory = (node.resources.memory_available as i64)
            .min(node.resources.memory_total as i64 - used_memory as i64);

        let fits = available_cpu >= pod.resources.cpu_cores as i64
            && available_memory >= pod.resources.memory_bytes() as i64;
        Ok(fits.then(|| available_cpu - pod.resources.cpu_cores as i64))
    }
}

#[cfg(test)]
mod tests {
    //! - test_best_fit_picks_tighter_node
    //! - test_no_candidate_fits
    //! - test_offline_nodes_excluded
    //! - test_memory_filter_uses_reservations
    //! - test_pending_pods_count_against_capacity

    use super::*;
    use crate::store::test_store::TestStore;
    use shared::models::{NodeResources, PodResources, PodStatus};

    const GIB: u64 = 1024 * 1024 * 1024;

    fn node(id: &str, cpu: u32, memory: u64) -> Node {
        Node {
            id: id.to_string(),
            hostname: id.to_string(),
            resources: NodeResources {
                cpu_count: cpu,
                memory_total: memory,
                memory_available: memory,
            },
            ..Default::default()
        }
    }

    fn pod(cpu: u32, memory_mb: u64) -> Pod {
        Pod::new(
            "pod".to_string(),
            PodResources {
                cpu_cores: cpu,
                memory_mb,
            },
        )
    }

    async fn place(store: &TestStore, node_id: &str, cpu: u32, memory_mb: u64) {
        let mut p = pod(cpu, memory_mb);
        p.node_id = Some(node_id.to_string());
        p.status = PodStatus::Running;
        store.put_pod(&p).await.unwrap();
    }

    #[tokio::test]
    async fn test_best_fit_picks_tighter_node() {
        let store = Arc::new(TestStore::new());
        store.put_node(&node("n1", 4, 4 * GIB)).await.unwrap();
        store.put_node(&node("n2", 8, 8 * GIB)).await.unwrap();

        let scheduler = Scheduler::new(store);
        let chosen = scheduler.schedule(&pod(2, 1024)).await.unwrap().unwrap();
        // post-placement slack 2 on n1 beats 6 on n2
        assert_eq!(chosen.id, "n1");
    }

    #[tokio::test]
    async fn test_no_candidate_fits() {
        let store = Arc::new(TestStore::new());
        store.put_node(&node("n1", 2, 2 * GIB)).await.unwrap();

        let scheduler = Scheduler::new(store);
        assert!(scheduler.schedule(&pod(4, 512)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offline_nodes_excluded() {
        let store = Arc::new(TestStore::new());
        let mut offline = node("n1", 8, 8 * GIB);
        offline.status = NodeStatus::Offline;
        store.put_node(&offline).await.unwrap();

        let scheduler = Scheduler::new(store);
        assert!(scheduler.schedule(&pod(1, 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_filter_uses_reservations() {
        let store = Arc::new(TestStore::new());
        // reported availability is stale-high; reservations say otherwise
        let n = node("n1", 8, 2 * GIB);
        store.put_node(&n).await.unwrap();
        place(&store, "n1", 1, 1536).await;

        let scheduler = Scheduler::new(store);
        // 2 GiB total minus 1.5 GiB reserved leaves 512 MiB, not the
        // reported 2 GiB available
        assert!(scheduler.schedule(&pod(1, 1024)).await.unwrap().is_none());
        assert!(scheduler.schedule(&pod(1, 512)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_pending_pods_count_against_capacity() {
        let store = Arc::new(TestStore::new());
        store.put_node(&node("n1", 2, 2 * GIB)).await.unwrap();

        let mut parked = pod(2, 0);
        parked.node_id = Some("n1".to_string());
        parked.status = PodStatus::Pending;
        store.put_pod(&parked).await.unwrap();

        let scheduler = Scheduler::new(store);
        assert!(scheduler.schedule(&pod(1, 0)).await.unwrap().is_none());
    }
}

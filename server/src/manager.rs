//! # Node Manager
//!
//! Handles node lifecycle: creation through the container runtime, status
//! transitions, resource-report reconciliation and cascading deletion. Also
//! carries the resource accounting used by the scheduler views and the
//! cluster monitor.

use std::sync::Arc;

use chrono::Utc;
use shared::api::ResourceUtilization;
use shared::models::{AllocatedResources, Node, NodeResources, NodeStatus};

use crate::errors::ApiError;
use crate::runtime::{NodeProvision, NodeRuntime};
use crate::store::Store;

#[derive(Clone)]
pub struct NodeManager {
    store: Arc<dyn Store>,
    runtime: Arc<dyn NodeRuntime>,
}

/// Result of a node creation: the stored record plus the runtime identifiers.
pub struct NodeCreated {
    pub node: Node,
    pub provision: NodeProvision,
}

/// Reserved capacity on a node, summed over every pod in its pod set
/// regardless of pod status.
pub struct NodeUsage {
    pub cpu: u64,
    pub memory_bytes: u64,
}

impl NodeManager {
    pub fn new(store: Arc<dyn Store>, runtime: Arc<dyn NodeRuntime>) -> Self {
        Self { store, runtime }
    }

    pub async fn get_node(&self, id: &str) -> Result<Option<Node>, ApiError> {
        Ok(self.store.get_node(id).await?)
    }

    pub async fn list_nodes(&self) -> Result<Vec<Node>, ApiError> {
        Ok(self.store.list_nodes().await?)
    }

    /// Provisions a worker container and stores the node record alongside its
    /// allocated-capacity companion record. If the runtime refuses, nothing
    /// is written.
    pub async fn create_node(
        &self,
        cpu_count: u32,
        memory_mb: Option<u64>,
    ) -> Result<NodeCreated, ApiError> {
        let provision = self.runtime.create_node(cpu_count, memory_mb).await?;

        let memory_bytes = memory_mb.unwrap_or(0) * 1024 * 1024;
        let node = Node {
            id: provision.container_id.clone(),
            hostname: provision.hostname.clone(),
            address: provision.address.clone(),
            status: NodeStatus::Online,
            resources: NodeResources {
                cpu_count,
                memory_total: memory_bytes,
                memory_available: memory_bytes,
            },
            last_heartbeat: None,
        };

        self.store
            .put_allocated(
                &node.id,
                &AllocatedResources {
                    cpu_count,
                    memory_total: memory_bytes,
                    memory_available: memory_bytes,
                },
            )
            .await?;
        self.store.put_node(&node).await?;

        tracing::info!(node_id=%node.id, cpu_count, "Registered node");
        Ok(NodeCreated { node, provision })
    }

    /// Fails soft: an unknown node returns `None`.
    pub async fn update_status(
        &self,
        id: &str,
        status: NodeStatus,
    ) -> Result<Option<Node>, ApiError> {
        let Some(mut node) = self.store.get_node(id).await? else {
            return Ok(None);
        };
        node.status = status;
        self.store.put_node(&node).await?;
        Ok(Some(node))
    }

    /// Reconciles an observed resource report against the allocated ceiling:
    /// cpu count and total memory are pinned at creation time, and an agent
    /// reporting host-level counters must not inflate them. Stamps the
    /// heartbeat timestamp.
    pub async fn update_resources(
        &self,
        id: &str,
        mut observed: NodeResources,
    ) -> Result<Option<Node>, ApiError> {
        let Some(mut node) = self.store.get_node(id).await? else {
            return Ok(None);
        };

        if let Some(allocated) = self.store.get_allocated(id).await? {
            observed.cpu_count = allocated.cpu_count;
            observed.memory_total = allocated.memory_total;
        }
        if observed.memory_available > observed.memory_total {
            observed.memory_available = observed.memory_total;
        }

        node.resources = observed;
        node.last_heartbeat = Some(Utc::now());
        self.store.put_node(&node).await?;
        Ok(Some(node))
    }

    pub async fn stop_node(&self, id: &str) -> Result<Option<Node>, ApiError> {
        let Some(node) = self.store.get_node(id).await? else {
            return Ok(None);
        };
        self.runtime.stop_node(&node.id).await?;
        self.update_status(id, NodeStatus::Offline).await
    }

    pub async fn restart_node(&self, id: &str) -> Result<Option<Node>, ApiError> {
        let Some(node) = self.store.get_node(id).await? else {
            return Ok(None);
        };
        self.runtime.restart_node(&node.id).await?;
        self.update_status(id, NodeStatus::Online).await
    }

    /// Deletes the container, then every pod placed on the node, then the
    /// node record itself. A runtime refusal aborts before any record is
    /// touched so the operator can retry.
    pub async fn delete_node(&self, id: &str) -> Result<bool, ApiError> {
        let Some(node) = self.store.get_node(id).await? else {
            return Ok(false);
        };
        self.runtime.delete_node(&node.id).await?;

        for pod in self.store.list_node_pods(id).await? {
            self.store.delete_pod(&pod.id).await?;
        }
        self.store.delete_node(id).await?;

        tracing::info!(node_id=%id, "Deleted node");
        Ok(true)
    }

    pub async fn node_usage(&self, node_id: &str) -> Result<NodeUsage, ApiError> {
        let pods = self.store.list_node_pods(node_id).await?;
        Ok(NodeUsage {
            cpu: pods.iter().map(|p| p.resources.cpu_cores as u64).sum(),
            memory_bytes: pods.iter().map(|p| p.resources.memory_bytes()).sum(),
        })
    }

    pub async fn utilization(&self, node: &Node) -> Result<ResourceUtilization, ApiError> {
        let usage = self.node_usage(&node.id).await?;
        let cpu_utilization = if node.resources.cpu_count > 0 {
            usage.cpu as f64 / node.resources.cpu_count as f64 * 100.0
        } else {
            0.0
        };
        let memory_utilization = if node.resources.memory_total > 0 {
            usage.memory_bytes as f64 / node.resources.memory_total as f64 * 100.0
        } else {
            0.0
        };
        Ok(ResourceUtilization {
            cpu_utilization,
            memory_utilization,
        })
    }
}

#[cfg(test)]
mod tests {
    //! CREATE
    //! - test_create_node_stores_record_and_allocation
    //! - test_create_node_runtime_failure_writes_nothing
    //!
    //! RECONCILIATION
    //! - test_update_resources_clamps_to_allocation
    //! - test_update_resources_unknown_node
    //!
    //! LIFECYCLE
    //! - test_stop_and_restart_flip_status
    //! - test_delete_node_cascades_to_pods

    use super::*;
    use crate::runtime::test_runtime::TestRuntime;
    use crate::store::test_store::TestStore;
    use shared::models::{Pod, PodResources, PodStatus};

    const GIB: u64 = 1024 * 1024 * 1024;

    fn manager_with(store: Arc<TestStore>, runtime: TestRuntime) -> NodeManager {
        NodeManager::new(store, Arc::new(runtime))
    }

    #[tokio::test]
    async fn test_create_node_stores_record_and_allocation() {
        let store = Arc::new(TestStore::new());
        let manager = manager_with(store.clone(), TestRuntime::new());

        let created = manager.create_node(4, Some(2048)).await.unwrap();
        assert_eq!(created.node.status, NodeStatus::Online);
        assert_eq!(created.node.resources.cpu_count, 4);
        assert_eq!(created.node.resources.memory_total, 2 * GIB);
        assert!(created.node.last_heartbeat.is_none());

        let allocated = store.get_allocated(&created.node.id).await.unwrap().unwrap();
        assert_eq!(allocated.cpu_count, 4);
        assert_eq!(allocated.memory_total, 2 * GIB);
        assert!(store.get_node(&created.node.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_node_runtime_failure_writes_nothing() {
        let store = Arc::new(TestStore::new());
        let manager = manager_with(store.clone(), TestRuntime::failing());

        assert!(manager.create_node(4, None).await.is_err());
        assert!(store.list_nodes().await.unwrap().is_empty());
        assert!(store.allocated.is_empty());
    }

    #[tokio::test]
    async fn test_update_resources_clamps_to_allocation() {
        let store = Arc::new(TestStore::new());
        let manager = manager_with(store.clone(), TestRuntime::new());
        let created = manager.create_node(2, Some(2048)).await.unwrap();

        // agent reports host-level counters far above the allocation
        let observed = NodeResources {
            cpu_count: 16,
            memory_total: 32 * GIB,
            memory_available: 30 * GIB,
        };
        let node = manager
            .update_resources(&created.node.id, observed)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(node.resources.cpu_count, 2);
        assert_eq!(node.resources.memory_total, 2 * GIB);
        assert_eq!(node.resources.memory_available, 2 * GIB);
        assert!(node.last_heartbeat.is_some());
    }

    #[tokio::test]
    async fn test_update_resources_unknown_node() {
        let store = Arc::new(TestStore::new());
        let manager = manager_with(store, TestRuntime::new());
        let observed = NodeResources {
            cpu_count: 1,
            memory_total: 0,
            memory_available: 0,
        };
        assert!(manager
            .update_resources("missing", observed)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_stop_and_restart_flip_status() {
        let store = Arc::new(TestStore::new());
        let manager = manager_with(store.clone(), TestRuntime::new());
        let created = manager.create_node(2, None).await.unwrap();

        let stopped = manager.stop_node(&created.node.id).await.unwrap().unwrap();
        assert_eq!(stopped.status, NodeStatus::Offline);

        let restarted = manager
            .restart_node(&created.node.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(restarted.status, NodeStatus::Online);
    }

    #[tokio::test]
    async fn test_delete_node_cascades_to_pods() {
        let store = Arc::new(TestStore::new());
        let manager = manager_with(store.clone(), TestRuntime::new());
        let created = manager.create_node(4, Some(4096)).await.unwrap();

        for name in ["p1", "p2"] {
            let mut pod = Pod::new(
                name.to_string(),
                PodResources {
                    cpu_cores: 1,
                    memory_mb: 128,
                },
            );
            pod.node_id = Some(created.node.id.clone());
            pod.status = PodStatus::Running;
            store.put_pod(&pod).await.unwrap();
        }
        assert_eq!(store.list_node_pods(&created.node.id).await.unwrap().len(), 2);

        assert!(manager.delete_node(&created.node.id).await.unwrap());
        assert!(store.get_node(&created.node.id).await.unwrap().is_none());
        assert!(store.get_allocated(&created.node.id).await.unwrap().is_none());
        assert!(store.list_pods().await.unwrap().is_empty());
    }
}

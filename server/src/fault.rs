//! # Fault Handler
//!
//! Reacts to node overload and offline transitions: marks the affected pods
//! failed, and purges the state of nodes that are gone for good. Pods are not
//! rescheduled onto healthy nodes; a failed pod stays failed until an
//! operator acts on it.

use std::sync::Arc;

use shared::models::{Node, NodeStatus, Pod, PodStatus};

use crate::errors::ApiError;
use crate::manager::NodeManager;
use crate::store::Store;

#[derive(Clone)]
pub struct FaultHandler {
    store: Arc<dyn Store>,
    manager: NodeManager,
}

impl FaultHandler {
    pub fn new(store: Arc<dyn Store>, manager: NodeManager) -> Self {
        Self { store, manager }
    }

    /// Marks the node offline and transitions every pod placed on it to
    /// failed. Returns the affected pods.
    pub async fn handle_resource_failure(&self, node: &Node) -> Result<Vec<Pod>, ApiError> {
        self.manager
            .update_status(&node.id, NodeStatus::Offline)
            .await?;

        let mut affected = self.store.list_node_pods(&node.id).await?;
        for pod in &mut affected {
            pod.status = PodStatus::Failed;
            self.store.put_pod(pod).await?;
        }

        tracing::warn!(
            node_id=%node.id,
            affected=%affected.len(),
            "Resource failure handled"
        );
        Ok(affected)
    }

    /// Deletes every pod record placed on the node and marks the node
    /// offline; the node record itself is retained. Safe to call repeatedly.
    pub async fn cleanup_node(&self, node_id: &str) -> Result<(), ApiError> {
        for pod in self.store.list_node_pods(node_id).await? {
            self.store.delete_pod(&pod.id).await?;
            tracing::info!(pod_id=%pod.id, %node_id, "Cleaned up pod");
        }

        if self
            .manager
            .update_status(node_id, NodeStatus::Offline)
            .await?
            .is_some()
        {
            tracing::info!(%node_id, "Node marked as offline");
        }
        Ok(())
    }

    /// Runs `cleanup_node` for every node currently offline. Invoked on
    /// process shutdown.
    pub async fn cleanup_stale_resources(&self) -> Result<(), ApiError> {
        for node in self.store.list_nodes().await? {
            if node.status == NodeStatus::Offline {
                self.cleanup_node(&node.id).await?;
            }
        }
        tracing::info!("Completed stale resource cleanup");
        Ok(())
    }
}

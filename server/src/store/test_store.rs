use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use shared::models::{AllocatedResources, HostResource, Node, Pod};
use uuid::Uuid;

use super::errors::StoreError;
use super::store::Store;

/// In-memory `Store` used by unit tests.
pub struct TestStore {
    pub nodes: DashMap<String, Node>,
    pub allocated: DashMap<String, AllocatedResources>,
    pub pods: DashMap<Uuid, Pod>,
    pub node_pods: DashMap<String, DashSet<Uuid>>,
    pub host: Mutex<Option<HostResource>>,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
            allocated: DashMap::new(),
            pods: DashMap::new(),
            node_pods: DashMap::new(),
            host: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Store for TestStore {
    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError> {
        Ok(self.nodes.get(id).map(|entry| entry.clone()))
    }

    async fn put_node(&self, node: &Node) -> Result<(), StoreError> {
        self.nodes.insert(node.id.clone(), node.clone());
        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, StoreError> {
        Ok(self.nodes.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn delete_node(&self, id: &str) -> Result<(), StoreError> {
        self.nodes.remove(id);
        self.allocated.remove(id);
        self.node_pods.remove(id);
        Ok(())
    }

    async fn get_allocated(
        &self,
        node_id: &str,
    ) -> Result<Option<AllocatedResources>, StoreError> {
        Ok(self.allocated.get(node_id).map(|entry| entry.clone()))
    }

    async fn put_allocated(
        &self,
        node_id: &str,
        resources: &AllocatedResources,
    ) -> Result<(), StoreError> {
        self.allocated.insert(node_id.to_string(), resources.clone());
        Ok(())
    }

    async fn get_pod(&self, id: &Uuid) -> Result<Option<Pod>, StoreError> {
        Ok(self.pods.get(id).map(|entry| entry.clone()))
    }

    async fn put_pod(&self, pod: &Pod) -> Result<(), StoreError> {
        self.pods.insert(pod.id, pod.clone());
        if let Some(node_id) = &pod.node_id {
            self.node_pods
                .entry(node_id.clone())
                .or_default()
                .insert(pod.id);
        }
        Ok(())
    }

    async fn list_pods(&self) -> Result<Vec<Pod>, StoreError> {
        Ok(self.pods.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn list_node_pods(&self, node_id: &str) -> Result<Vec<Pod>, StoreError> {
        let Some(ids) = self.node_pods.get(node_id) else {
            return Ok(vec![]);
        };
        Ok(ids
            .iter()
            .filter_map(|id| self.pods.get(&id).map(|entry| entry.clone()))
            .collect())
    }

    async fn delete_pod(&self, id: &Uuid) -> Result<bool, StoreError> {
        let Some((_, pod)) = self.pods.remove(id) else {
            return Ok(false);
        };
        if let Some(node_id) = &pod.node_id {
            if let Some(ids) = self.node_pods.get(node_id) {
                ids.remove(id);
            }
        }
        Ok(true)
    }

    async fn get_host(&self) -> Result<Option<HostResource>, StoreError> {
        Ok(self.host.lock().unwrap().clone())
    }

    async fn put_host(&self, host: &HostResource) -> Result<(), StoreError> {
        *self.host.lock().unwrap() = Some(host.clone());
        Ok(())
    }
}

//! Redis-backed implementation of the `Store` trait.
//!
//! Records are JSON-encoded strings under prefixed keys; enumeration goes
//! through the `nodes` and `pods` sets and the per-node pod sets. Writes are
//! last-writer-wins and there is no cross-key transaction: callers order
//! writes so a record exists before its set membership, and memberships
//! vanish before the record does. Every backend call carries a short
//! deadline so a wedged backend cannot stall the process.

use std::env;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Serialize, de::DeserializeOwned};
use shared::models::{AllocatedResources, HostResource, Node, Pod};
use uuid::Uuid;

use super::errors::StoreError;

/// Trait for persistent store functionality (e.g., redis, memory).
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError>;
    /// Writes the node record and registers its id in the `nodes` set.
    async fn put_node(&self, node: &Node) -> Result<(), StoreError>;
    async fn list_nodes(&self) -> Result<Vec<Node>, StoreError>;
    /// Removes the node record, its `nodes` membership and its companion keys.
    async fn delete_node(&self, id: &str) -> Result<(), StoreError>;

    async fn get_allocated(
        &self,
        node_id: &str,
    ) -> Result<Option<AllocatedResources>, StoreError>;
    /// Written once, when the node is created.
    async fn put_allocated(
        &self,
        node_id: &str,
        resources: &AllocatedResources,
    ) -> Result<(), StoreError>;

    async fn get_pod(&self, id: &Uuid) -> Result<Option<Pod>, StoreError>;
    /// Writes the pod record, registers it in the `pods` set and, when the
    /// pod is placed, in its node's pod set.
    async fn put_pod(&self, pod: &Pod) -> Result<(), StoreError>;
    async fn list_pods(&self) -> Result<Vec<Pod>, StoreError>;
    async fn list_node_pods(&self, node_id: &str) -> Result<Vec<Pod>, StoreError>;
    /// Removes record and memberships; returns whether the record existed.
    async fn delete_pod(&self, id: &Uuid) -> Result<bool, StoreError>;

    async fn get_host(&self) -> Result<Option<HostResource>, StoreError>;
    /// Writes the host record and stamps `host:last_update`.
    async fn put_host(&self, host: &HostResource) -> Result<(), StoreError>;
}

/// Redis-backed store for persisting cluster state
pub struct RedisStore {
    con: ConnectionManager,
}

impl RedisStore {
    const NODES_SET: &'static str = "nodes";
    const PODS_SET: &'static str = "pods";
    const HOST_KEY: &'static str = "host:resources";
    const HOST_UPDATED_KEY: &'static str = "host:last_update";
    const OP_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connects to the address in `REDIS_HOST` / `REDIS_PORT`.
    pub async fn new() -> Self {
        let host = env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("REDIS_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(6379);
        let addr = format!("redis://{}:{}", host, port);
        tracing::info!(%addr, "Connecting to backend");

        let client = redis::Client::open(addr.as_str()).expect("Invalid redis address");
        let con = ConnectionManager::new(client)
            .await
            .expect("Failed to connect to redis");
        Self { con }
    }

    fn node_key(id: &str) -> String {
        format!("node:{}", id)
    }
    fn allocated_key(id: &str) -> String {
        format!("node:{}:allocated", id)
    }
    fn node_pods_key(id: &str) -> String {
        format!("node:{}:pods", id)
    }
    fn pod_key(id: &Uuid) -> String {
        format!("pod:{}", id)
    }

    /// Runs a backend call under the store deadline.
    async fn deadline<T, F>(&self, key: &str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(Self::OP_TIMEOUT, fut)
            .await
            .map_err(|_| StoreError::Timeout(key.to_string()))?
            .map_err(|error| {
                tracing::error!(%key, %error, "Store operation failed");
                StoreError::BackendError(error.to_string())
            })
    }

    /// Retrieves a single record and deserializes it.
    async fn get_object<T>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut con = self.con.clone();
        let raw: Option<String> = self.deadline(key, async move { con.get(key).await }).await?;
        raw.map(|data| {
            serde_json::from_str::<T>(&data).map_err(|e| StoreError::CodecError(e.to_string()))
        })
        .transpose()
    }

    /// Serializes and writes a record.
    async fn put_object<T>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let json =
            serde_json::to_string(value).map_err(|e| StoreError::CodecError(e.to_string()))?;
        let mut con = self.con.clone();
        self.deadline(key, async move { con.set::<_, _, ()>(key, json).await })
            .await
    }

    async fn delete_keys(&self, keys: Vec<String>) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        let label = keys.first().cloned().unwrap_or_default();
        self.deadline(&label, async move { con.del::<_, ()>(keys).await })
            .await
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        self.deadline(set, async move { con.sadd::<_, _, ()>(set, member).await })
            .await
    }

    async fn set_remove(&self, set: &str, member: &str) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        self.deadline(set, async move { con.srem::<_, _, ()>(set, member).await })
            .await
    }

    async fn set_members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        let mut con = self.con.clone();
        self.deadline(set, async move { con.smembers::<_, Vec<String>>(set).await })
            .await
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError> {
        self.get_object::<Node>(&Self::node_key(id)).await
    }

    async fn put_node(&self, node: &Node) -> Result<(), StoreError> {
        // record first, membership second
        self.put_object::<Node>(&Self::node_key(&node.id), node)
            .await?;
        self.set_add(Self::NODES_SET, &node.id).await
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, StoreError> {
        let ids = self.set_members(Self::NODES_SET).await?;
        let nodes = join_all(ids.iter().map(|id| self.get_node(id)))
            .await
            .into_iter()
            .filter_map(Result::ok)
            .flatten()
            .collect();
        Ok(nodes)
    }

    async fn delete_node(&self, id: &str) -> Result<(), StoreError> {
        // membership first, record and companion keys second
        self.set_remove(Self::NODES_SET, id).await?;
        self.delete_keys(vec![
            Self::node_key(id),
            Self::allocated_key(id),
            Self::node_pods_key(id),
        ])
        .await
    }

    async fn get_allocated(
        &self,
        node_id: &str,
    ) -> Result<Option<AllocatedResources>, StoreError> {
        self.get_object::<AllocatedResources>(&Self::allocated_key(node_id))
            .await
    }

    async fn put_allocated(
        &self,
        node_id: &str,
        resources: &AllocatedResources,
    ) -> Result<(), StoreError> {
        self.put_object::<AllocatedResources>(&Self::allocated_key(node_id), resources)
            .await
    }

    async fn get_pod(&self, id: &Uuid) -> Result<Option<Pod>, StoreError> {
        self.get_object::<Pod>(&Self::pod_key(id)).await
    }

    async fn put_pod(&self, pod: &Pod) -> Result<(), StoreError> {
        self.put_object::<Pod>(&Self::pod_key(&pod.id), pod).await?;
        self.set_add(Self::PODS_SET, &pod.id.to_string()).await?;
        if let Some(node_id) = &pod.node_id {
            self.set_add(&Self::node_pods_key(node_id), &pod.id.to_string())
                .await?;
        }
        Ok(())
    }

    async fn list_pods(&self) -> Result<Vec<Pod>, StoreError> {
        let ids: Vec<Uuid> = self
            .set_members(Self::PODS_SET)
            .await?
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect();
        let pods = join_all(ids.iter().map(|id| self.get_pod(id)))
            .await
            .into_iter()
            .filter_map(Result::ok)
            .flatten()
            .collect();
        Ok(pods)
    }

    async fn list_node_pods(&self, node_id: &str) -> Result<Vec<Pod>, StoreError> {
        let ids: Vec<Uuid> = self
            .set_members(&Self::node_pods_key(node_id))
            .await?
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect();
        let pods = join_all(ids.iter().map(|id| self.get_pod(id)))
            .await
            .into_iter()
            .filter_map(Result::ok)
            .flatten()
            .collect();
        Ok(pods)
    }

    async fn delete_pod(&self, id: &Uuid) -> Result<bool, StoreError> {
        let Some(pod) = self.get_pod(id).await? else {
            return Ok(false);
        };
        if let Some(node_id) = &pod.node_id {
            self.set_remove(&Self::node_pods_key(node_id), &id.to_string())
                .await?;
        }
        self.set_remove(Self::PODS_SET, &id.to_string()).await?;
        self.delete_keys(vec![Self::pod_key(id)]).await?;
        Ok(true)
    }

    async fn get_host(&self) -> Result<Option<HostResource>, StoreError> {
        self.get_object::<HostResource>(Self::HOST_KEY).await
    }

    async fn put_host(&self, host: &HostResource) -> Result<(), StoreError> {
        self.put_object::<HostResource>(Self::HOST_KEY, host)
            .await?;
        let stamp = Utc::now().timestamp().to_string();
        let mut con = self.con.clone();
        self.deadline(Self::HOST_UPDATED_KEY, async move {
            con.set::<_, _, ()>(Self::HOST_UPDATED_KEY, stamp).await
        })
        .await
    }
}

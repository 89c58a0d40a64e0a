use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered compute worker, backed by a container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Node {
    /// Container id assigned by the runtime driver.
    pub id: String,
    pub hostname: String,
    pub address: String,
    pub status: NodeStatus,
    pub resources: NodeResources,
    /// Timestamp of the most recent resource report, absent until the first one.
    pub last_heartbeat: Option<DateTime<Utc>>,
}

/// Status of a node in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Online => write!(f, "online"),
            NodeStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Capacity triple of a node. Memory is byte-denominated.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeResources {
    pub cpu_count: u32,
    pub memory_total: u64,
    pub memory_available: u64,
}

/// The capacity a node was created with, stored separately from the live
/// `NodeResources`. Observed reports never raise `cpu_count` or `memory_total`
/// above these values.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllocatedResources {
    pub cpu_count: u32,
    pub memory_total: u64,
    pub memory_available: u64,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            id: "node".to_string(),
            hostname: "node".to_string(),
            address: "0.0.0.0".to_string(),
            status: NodeStatus::Online,
            resources: NodeResources {
                cpu_count: 2,
                memory_total: 2 * 1024 * 1024 * 1024,
                memory_available: 2 * 1024 * 1024 * 1024,
            },
            last_heartbeat: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&NodeStatus::Online).unwrap(),
            "\"online\""
        );
        let status: NodeStatus = serde_json::from_str("\"offline\"").unwrap();
        assert_eq!(status, NodeStatus::Offline);
    }
}

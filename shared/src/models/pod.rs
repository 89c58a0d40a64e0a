use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named resource reservation, placed on at most one node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Pod {
    pub id: Uuid,
    /// Caller-supplied label, not required to be unique.
    pub name: String,
    /// The node the pod is placed on, absent while pending.
    pub node_id: Option<String>,
    pub status: PodStatus,
    pub resources: PodResources,
    pub created_at: DateTime<Utc>,
}

/// Status of a pod during its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PodStatus {
    Pending,
    Running,
    Failed,
}

impl std::fmt::Display for PodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PodStatus::Pending => write!(f, "pending"),
            PodStatus::Running => write!(f, "running"),
            PodStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Resource request of a pod.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PodResources {
    pub cpu_cores: u32,
    pub memory_mb: u64,
}

impl PodResources {
    pub fn memory_bytes(&self) -> u64 {
        self.memory_mb * 1024 * 1024
    }
}

impl Pod {
    pub fn new(name: String, resources: PodResources) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            node_id: None,
            status: PodStatus::Pending,
            resources,
            created_at: Utc::now(),
        }
    }
}

impl Default for Pod {
    fn default() -> Self {
        Self::new(
            "pod".to_string(),
            PodResources {
                cpu_cores: 1,
                memory_mb: 128,
            },
        )
    }
}

//! Types used for communication between cli, apiserver and the node agent,
//! including request/response payloads and computed resource views.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{NodeResources, NodeStatus, PodResources};

// --- Requests ---

/// Body of `POST /nodes`: capacity to pin on the new worker container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeRegistration {
    pub cpu_count: u32,
    pub memory_mb: Option<u64>,
}

/// Body of `PUT /nodes/{id}/status`.
#[derive(Debug, Deserialize, Serialize)]
pub struct NodeStatusUpdate {
    pub status: NodeStatus,
}

/// Body of `POST /pods`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PodCreation {
    pub name: String,
    pub resources: PodResources,
}

/// Periodic report from the in-container agent: observed metrics plus a
/// liveness claim. The control plane clamps the metrics against the node's
/// allocated ceiling before persisting them.
#[derive(Debug, Deserialize, Serialize)]
pub struct HeartbeatRequest {
    pub resources: NodeResources,
    #[serde(default = "default_heartbeat_status")]
    pub status: NodeStatus,
}

fn default_heartbeat_status() -> NodeStatus {
    NodeStatus::Online
}

/// Body of `PUT /host/resources/limits`. Values above 90 are rejected.
#[derive(Debug, Deserialize, Serialize)]
pub struct HostLimits {
    pub cpu_limit_percent: f64,
    pub memory_limit_percent: f64,
}

// --- Computed views ---

/// Utilization percentages for a single node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceUtilization {
    pub cpu_utilization: f64,
    pub memory_utilization: f64,
}

/// Response of `GET /nodes/{id}/resources`: live capacity accounting for a
/// node, with pod reservations subtracted from the allocated totals.
#[derive(Debug, Deserialize, Serialize)]
pub struct NodeResourceView {
    pub cpu_available: i64,
    pub memory_available: i64,
    pub total_cpu: u32,
    pub total_memory: u64,
    pub used_cpu: u64,
    pub used_memory: u64,
    pub cpu_utilization_percent: f64,
    pub memory_utilization_percent: f64,
}

/// Response of `GET /health/cluster`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ClusterHealth {
    pub total_nodes: usize,
    pub online_nodes: usize,
    pub total_cpu_cores: u64,
    pub total_memory_gb: f64,
    pub average_cpu_utilization: f64,
    pub average_memory_utilization: f64,
    pub nodes_utilization: HashMap<String, ResourceUtilization>,
}

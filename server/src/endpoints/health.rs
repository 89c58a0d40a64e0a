//! Health endpoints
//!
//! ## Routes
//! - `POST /health/heartbeat/{id}` — agent heartbeat: reconcile resources, refresh liveness
//! - `GET  /health/cluster`        — cluster-wide utilization summary
//! - `GET  /health/nodes/{id}`     — per-node utilization

use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use shared::api::{ClusterHealth, HeartbeatRequest};
use shared::models::NodeStatus;

use crate::errors::ApiError;
use crate::state::State;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/heartbeat/{id}", web::post().to(heartbeat))
        .route("/cluster", web::get().to(cluster))
        .route("/nodes/{id}", web::get().to(node));
}

/// Receive a node heartbeat with observed resource metrics. The report goes
/// through reconciliation, so it cannot raise the node's pinned capacity.
async fn heartbeat(
    state: State,
    path: web::Path<String>,
    payload: web::Json<HeartbeatRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let report = payload.into_inner();

    match state.manager.update_resources(&id, report.resources).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return ApiError::NotFound(format!("Node {} not found", id)).to_http_response();
        }
        Err(err) => return err.to_http_response(),
    }

    if report.status == NodeStatus::Online {
        if let Err(err) = state.manager.update_status(&id, NodeStatus::Online).await {
            return err.to_http_response();
        }
    }

    tracing::debug!(node_id=%id, "Heartbeat received");
    HttpResponse::Ok().json(json!({
        "received": true,
        "message": "Resource metrics updated successfully"
    }))
}

/// Cluster-wide health view over the online nodes.
async fn cluster(state: State) -> impl Responder {
    let nodes = match state.manager.list_nodes().await {
        Ok(nodes) => nodes,
        Err(err) => return err.to_http_response(),
    };
    if nodes.is_empty() {
        return ApiError::NotFound("No nodes found in cluster".to_string()).to_http_response();
    }

    let online: Vec<_> = nodes
        .iter()
        .filter(|n| n.status == NodeStatus::Online)
        .collect();

    let total_cpu_cores: u64 = online.iter().map(|n| n.resources.cpu_count as u64).sum();
    let total_memory: u64 = online.iter().map(|n| n.resources.memory_total).sum();

    let mut nodes_utilization = HashMap::new();
    let mut cpu_sum = 0.0;
    let mut memory_sum = 0.0;
    for node in &online {
        let util = match state.manager.utilization(node).await {
            Ok(util) => util,
            Err(err) => return err.to_http_response(),
        };
        cpu_sum += util.cpu_utilization;
        memory_sum += util.memory_utilization;
        nodes_utilization.insert(node.id.clone(), util);
    }

    let count = online.len();
    let health = ClusterHealth {
        total_nodes: nodes.len(),
        online_nodes: count,
        total_cpu_cores,
        total_memory_gb: total_memory as f64 / (1024.0 * 1024.0 * 1024.0),
        average_cpu_utilization: if count > 0 { cpu_sum / count as f64 } else { 0.0 },
        average_memory_utilization: if count > 0 {
            memory_sum / count as f64
        } else {
            0.0
        },
        nodes_utilization,
    };
    HttpResponse::Ok().json(&health)
}

/// Per-node utilization; only meaningful for online nodes.
async fn node(state: State, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    let node = match state.manager.get_node(&id).await {
        Ok(Some(node)) => node,
        Ok(None) => {
            return ApiError::NotFound(format!("Node {} not found", id)).to_http_response();
        }
        Err(err) => return err.to_http_response(),
    };
    if node.status != NodeStatus::Online {
        return ApiError::InvalidInput(format!("Node {} is not online", id)).to_http_response();
    }

    match state.manager.utilization(&node).await {
        Ok(util) => HttpResponse::Ok().json(&util),
        Err(err) => err.to_http_response(),
    }
}

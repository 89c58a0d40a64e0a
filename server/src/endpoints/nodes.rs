//! Node endpoints
//!
//! HTTP handlers for node lifecycle and accounting views.
//!
//! ## Routes
//! - `POST   /nodes`                — register a node (provisions a worker container)
//! - `GET    /nodes`                — list registered nodes
//! - `GET    /nodes/{id}`           — read one node
//! - `PUT    /nodes/{id}/status`    — force a status transition
//! - `PUT    /nodes/{id}/resources` — reconcile an observed resource report
//! - `GET    /nodes/{id}/resources` — computed capacity view
//! - `GET    /nodes/{id}/pods`      — pods placed on the node
//! - `POST   /nodes/{id}/stop|restart|shutdown` — lifecycle operations
//! - `DELETE /nodes/{id}`           — delete the node and its pods

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use shared::api::{NodeRegistration, NodeResourceView, NodeStatusUpdate};
use shared::models::NodeResources;

use crate::errors::ApiError;
use crate::state::State;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list))
        .route("", web::post().to(register))
        .route("/{id}", web::get().to(get))
        .route("/{id}", web::delete().to(delete))
        .route("/{id}/status", web::put().to(update_status))
        .route("/{id}/resources", web::put().to(update_resources))
        .route("/{id}/resources", web::get().to(resources))
        .route("/{id}/pods", web::get().to(pods))
        .route("/{id}/stop", web::post().to(stop))
        .route("/{id}/restart", web::post().to(restart))
        .route("/{id}/shutdown", web::post().to(shutdown));
}

fn node_not_found(id: &str) -> HttpResponse {
    ApiError::NotFound(format!("Node {} not found", id)).to_http_response()
}

/// Register a new node by provisioning a worker container with the requested
/// capacity pinned.
///
/// # Returns
/// - 201: the stored node
/// - 400: cpu_count below 1
/// - 500: runtime or store failure, nothing persisted
async fn register(state: State, payload: web::Json<NodeRegistration>) -> impl Responder {
    let registration = payload.into_inner();
    if registration.cpu_count < 1 {
        return HttpResponse::BadRequest().body("cpu_count must be at least 1");
    }

    match state
        .manager
        .create_node(registration.cpu_count, registration.memory_mb)
        .await
    {
        Ok(created) => {
            tracing::info!(
                hostname=%created.provision.hostname,
                address=%created.provision.address,
                "Worker container provisioned"
            );
            HttpResponse::Created().json(&created.node)
        }
        Err(err) => {
            tracing::warn!(error=%err, "Could not register node");
            err.to_http_response()
        }
    }
}

async fn list(state: State) -> impl Responder {
    match state.manager.list_nodes().await {
        Ok(nodes) => HttpResponse::Ok().json(&nodes),
        Err(err) => err.to_http_response(),
    }
}

async fn get(state: State, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.manager.get_node(&id).await {
        Ok(Some(node)) => HttpResponse::Ok().json(&node),
        Ok(None) => node_not_found(&id),
        Err(err) => err.to_http_response(),
    }
}

/// Force a status transition. An operator may set a node online even with a
/// stale heartbeat; the next cluster tick can revert it.
async fn update_status(
    state: State,
    path: web::Path<String>,
    payload: web::Json<NodeStatusUpdate>,
) -> impl Responder {
    let id = path.into_inner();
    match state.manager.update_status(&id, payload.status).await {
        Ok(Some(node)) => HttpResponse::Ok().json(&node),
        Ok(None) => node_not_found(&id),
        Err(err) => err.to_http_response(),
    }
}

/// Reconcile an observed resource report against the node's allocation.
async fn update_resources(
    state: State,
    path: web::Path<String>,
    payload: web::Json<NodeResources>,
) -> impl Responder {
    let id = path.into_inner();
    match state
        .manager
        .update_resources(&id, payload.into_inner())
        .await
    {
        Ok(Some(node)) => HttpResponse::Ok().json(&node),
        Ok(None) => node_not_found(&id),
        Err(err) => err.to_http_response(),
    }
}

/// Computed capacity view: pod reservations subtracted from the pinned
/// capacity, with utilization percentages.
async fn resources(state: State, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    let node = match state.manager.get_node(&id).await {
        Ok(Some(node)) => node,
        Ok(None) => return node_not_found(&id),
        Err(err) => return err.to_http_response(),
    };
    let usage = match state.manager.node_usage(&id).await {
        Ok(usage) => usage,
        Err(err) => return err.to_http_response(),
    };

    let capacity = &node.resources;
    let view = NodeResourceView {
        cpu_available: capacity.cpu_count as i64 - usage.cpu as i64,
        memory_available: capacity.memory_total as i64 - usage.memory_bytes as i64,
        total_cpu: capacity.cpu_count,
        total_memory: capacity.memory_total,
        used_cpu: usage.cpu,
        used_memory: usage.memory_bytes,
        cpu_utilization_percent: if capacity.cpu_count > 0 {
            usage.cpu as f64 / capacity.cpu_count as f64 * 100.0
        } else {
            0.0
        },
        memory_utilization_percent: if capacity.memory_total > 0 {
            usage.memory_bytes as f64 / capacity.memory_total as f64 * 100.0
        } else {
            0.0
        },
    };
    HttpResponse::Ok().json(&view)
}

async fn pods(state: State, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.manager.get_node(&id).await {
        Ok(Some(_)) => match state.store.list_node_pods(&id).await {
            Ok(pods) => HttpResponse::Ok().json(&pods),
            Err(err) => ApiError::from(err).to_http_response(),
        },
        Ok(None) => node_not_found(&id),
        Err(err) => err.to_http_response(),
    }
}

async fn stop(state: State, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.manager.stop_node(&id).await {
        Ok(Some(_)) => HttpResponse::Ok().json(json!({
            "message": format!("Node {} stopped successfully", id)
        })),
        Ok(None) => node_not_found(&id),
        Err(err) => {
            tracing::warn!(node_id=%id, error=%err, "Could not stop node");
            err.to_http_response()
        }
    }
}

async fn restart(state: State, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.manager.restart_node(&id).await {
        Ok(Some(_)) => HttpResponse::Ok().json(json!({
            "message": format!("Node {} restarted successfully", id)
        })),
        Ok(None) => node_not_found(&id),
        Err(err) => {
            tracing::warn!(node_id=%id, error=%err, "Could not restart node");
            err.to_http_response()
        }
    }
}

/// Graceful in-container shutdown: purge the node's pods and mark it
/// offline, keeping the node record.
async fn shutdown(state: State, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.manager.get_node(&id).await {
        Ok(Some(_)) => match state.faults.cleanup_node(&id).await {
            Ok(()) => HttpResponse::Ok().json(json!({
                "message": format!("Node {} shutdown handled successfully", id)
            })),
            Err(err) => err.to_http_response(),
        },
        Ok(None) => node_not_found(&id),
        Err(err) => err.to_http_response(),
    }
}

async fn delete(state: State, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.manager.delete_node(&id).await {
        Ok(true) => HttpResponse::Ok().json(json!({
            "message": format!("Node {} deleted successfully", id)
        })),
        Ok(false) => node_not_found(&id),
        Err(err) => {
            tracing::warn!(node_id=%id, error=%err, "Could not delete node");
            err.to_http_response()
        }
    }
}

#[cfg(test)]
mod tests {
    //! REGISTER
    //! - test_register_node
    //! - test_register_node_zero_cpu
    //! - test_register_node_runtime_failure
    //!
    //! READ
    //! - test_get_node_not_found
    //! - test_node_resources_view
    //!
    //! UPDATE
    //! - test_update_resources_clamps_report
    //! - test_update_status_forces_online
    //!
    //! LIFECYCLE
    //! - test_stop_node_marks_offline
    //! - test_delete_node_cascades
    //! - test_shutdown_unknown_node

    use std::sync::Arc;

    use super::*;
    use crate::runtime::test_runtime::TestRuntime;
    use crate::state::new_state;
    use crate::store::Store;
    use crate::store::test_store::TestStore;
    use actix_web::body::BoxBody;
    use actix_web::dev::Service;
    use actix_web::{
        App,
        http::StatusCode,
        test::{TestRequest, call_service, init_service, read_body_json},
    };
    use shared::models::{Node, NodeStatus, Pod, PodResources, PodStatus};

    const GIB: u64 = 1024 * 1024 * 1024;

    async fn node_service(
        state: &State,
    ) -> impl Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<BoxBody>,
        Error = actix_web::Error,
    > {
        init_service(
            App::new()
                .app_data(state.clone())
                .service(web::scope("/nodes").configure(config)),
        )
        .await
    }

    fn states() -> (Arc<TestStore>, State) {
        let store = Arc::new(TestStore::new());
        let state = new_state(store.clone(), Arc::new(TestRuntime::new()));
        (store, state)
    }

    #[actix_web::test]
    async fn test_register_node() {
        let (store, state) = states();
        let app = node_service(&state).await;

        let req = TestRequest::post()
            .uri("/nodes")
            .set_json(NodeRegistration {
                cpu_count: 4,
                memory_mb: Some(2048),
            })
            .to_request();
        let res = call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let node: Node = read_body_json(res).await;
        assert_eq!(node.status, NodeStatus::Online);
        assert_eq!(node.resources.cpu_count, 4);
        assert!(store.get_allocated(&node.id).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn test_register_node_zero_cpu() {
        let (_, state) = states();
        let app = node_service(&state).await;

        let req = TestRequest::post()
            .uri("/nodes")
            .set_json(NodeRegistration {
                cpu_count: 0,
                memory_mb: None,
            })
            .to_request();
        let res = call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_register_node_runtime_failure() {
        let store = Arc::new(TestStore::new());
        let state = new_state(store.clone(), Arc::new(TestRuntime::failing()));
        let app = node_service(&state).await;

        let req = TestRequest::post()
            .uri("/nodes")
            .set_json(NodeRegistration {
                cpu_count: 2,
                memory_mb: None,
            })
            .to_request();
        let res = call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.list_nodes().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_get_node_not_found() {
        let (_, state) = states();
        let app = node_service(&state).await;

        let req = TestRequest::get().uri("/nodes/missing").to_request();
        let res = call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_node_resources_view() {
        let (store, state) = states();
        let node = Node {
            id: "n1".to_string(),
            resources: shared::models::NodeResources {
                cpu_count: 4,
                memory_total: 4 * GIB,
                memory_available: 4 * GIB,
            },
            ..Default::default()
        };
        store.put_node(&node).await.unwrap();

        let mut pod = Pod::new(
            "p".to_string(),
            PodResources {
                cpu_cores: 2,
                memory_mb: 1024,
            },
        );
        pod.node_id = Some("n1".to_string());
        pod.status = PodStatus::Running;
        store.put_pod(&pod).await.unwrap();

        let app = node_service(&state).await;
        let req = TestRequest::get().uri("/nodes/n1/resources").to_request();
        let res = call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let view: NodeResourceView = read_body_json(res).await;
        assert_eq!(view.cpu_available, 2);
        assert_eq!(view.used_cpu, 2);
        assert_eq!(view.used_memory, GIB);
        assert_eq!(view.cpu_utilization_percent, 50.0);
    }

    #[actix_web::test]
    async fn test_update_resources_clamps_report() {
        let (store, state) = states();
        let app = node_service(&state).await;

        // register through the endpoint so the allocation record exists
        let req = TestRequest::post()
            .uri("/nodes")
            .set_json(NodeRegistration {
                cpu_count: 2,
                memory_mb: Some(2048),
            })
            .to_request();
        let created: Node = read_body_json(call_service(&app, req).await).await;

        let req = TestRequest::put()
            .uri(&format!("/nodes/{}/resources", created.id))
            .set_json(shared::models::NodeResources {
                cpu_count: 16,
                memory_total: 32 * GIB,
                memory_available: 30 * GIB,
            })
            .to_request();
        let res = call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let node: Node = read_body_json(res).await;
        assert_eq!(node.resources.cpu_count, 2);
        assert_eq!(node.resources.memory_total, 2 * GIB);
        assert_eq!(node.resources.memory_available, 2 * GIB);
        assert!(store.get_node(&created.id).await.unwrap().unwrap().last_heartbeat.is_some());
    }

    #[actix_web::test]
    async fn test_update_status_forces_online() {
        let (store, state) = states();
        let node = Node {
            id: "n1".to_string(),
            status: NodeStatus::Offline,
            ..Default::default()
        };
        store.put_node(&node).await.unwrap();

        let app = node_service(&state).await;
        let req = TestRequest::put()
            .uri("/nodes/n1/status")
            .set_json(NodeStatusUpdate {
                status: NodeStatus::Online,
            })
            .to_request();
        let res = call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let node: Node = read_body_json(res).await;
        assert_eq!(node.status, NodeStatus::Online);
    }

    #[actix_web::test]
    async fn test_stop_node_marks_offline() {
        let (store, state) = states();
        store.put_node(&Node::default()).await.unwrap();

        let app = node_service(&state).await;
        let req = TestRequest::post().uri("/nodes/node/stop").to_request();
        let res = call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            store.get_node("node").await.unwrap().unwrap().status,
            NodeStatus::Offline
        );
    }

    #[actix_web::test]
    async fn test_delete_node_cascades() {
        let (store, state) = states();
        store.put_node(&Node::default()).await.unwrap();
        for name in ["p1", "p2"] {
            let mut pod = Pod::new(
                name.to_string(),
                PodResources {
                    cpu_cores: 1,
                    memory_mb: 64,
                },
            );
            pod.node_id = Some("node".to_string());
            pod.status = PodStatus::Running;
            store.put_pod(&pod).await.unwrap();
        }

        let app = node_service(&state).await;
        let req = TestRequest::delete().uri("/nodes/node").to_request();
        let res = call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(store.get_node("node").await.unwrap().is_none());
        assert!(store.list_pods().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_shutdown_unknown_node() {
        let (_, state) = states();
        let app = node_service(&state).await;

        let req = TestRequest::post()
            .uri("/nodes/missing/shutdown")
            .to_request();
        let res = call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}

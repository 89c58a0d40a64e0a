//! Pod endpoints
//!
//! ## Routes
//! - `POST   /pods`      — create a pod and schedule it immediately
//! - `GET    /pods`      — list pods
//! - `GET    /pods/{id}` — read one pod
//! - `DELETE /pods/{id}` — delete a pod and free its reservation

use actix_web::{HttpResponse, Responder, web};
use shared::api::PodCreation;
use shared::models::{Pod, PodStatus};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::State;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list))
        .route("", web::post().to(create))
        .route("/{id}", web::get().to(get))
        .route("/{id}", web::delete().to(delete));
}

/// Create a pod and run placement right away.
///
/// # Returns
/// - 201: pod stored with `node_id` set and status running
/// - 400: cpu_cores below 1
/// - 503: no node fits; the pod is persisted as pending
async fn create(state: State, payload: web::Json<PodCreation>) -> impl Responder {
    let creation = payload.into_inner();
    if creation.resources.cpu_cores < 1 {
        return HttpResponse::BadRequest().body("cpu_cores must be at least 1");
    }

    let mut pod = Pod::new(creation.name, creation.resources);
    match state.scheduler.schedule(&pod).await {
        Ok(Some(node)) => {
            pod.node_id = Some(node.id.clone());
            pod.status = PodStatus::Running;
            if let Err(err) = state.store.put_pod(&pod).await {
                return ApiError::from(err).to_http_response();
            }
            tracing::info!(pod_id=%pod.id, node_id=%node.id, "Scheduled pod");
            HttpResponse::Created().json(&pod)
        }
        Ok(None) => {
            // park the reservation; an operator may retry once capacity exists
            if let Err(err) = state.store.put_pod(&pod).await {
                return ApiError::from(err).to_http_response();
            }
            ApiError::NoCapacity(
                "No nodes available with sufficient CPU and memory".to_string(),
            )
            .to_http_response()
        }
        Err(err) => err.to_http_response(),
    }
}

async fn list(state: State) -> impl Responder {
    match state.store.list_pods().await {
        Ok(pods) => HttpResponse::Ok().json(&pods),
        Err(err) => ApiError::from(err).to_http_response(),
    }
}

async fn get(state: State, path: web::Path<Uuid>) -> impl Responder {
    let id = path.into_inner();
    match state.store.get_pod(&id).await {
        Ok(Some(pod)) => HttpResponse::Ok().json(&pod),
        Ok(None) => {
            ApiError::NotFound(format!("Pod {} not found", id)).to_http_response()
        }
        Err(err) => ApiError::from(err).to_http_response(),
    }
}

async fn delete(state: State, path: web::Path<Uuid>) -> impl Responder {
    let id = path.into_inner();
    match state.store.delete_pod(&id).await {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => {
            ApiError::NotFound(format!("Pod {} not found", id)).to_http_response()
        }
        Err(err) => ApiError::from(err).to_http_response(),
    }
}

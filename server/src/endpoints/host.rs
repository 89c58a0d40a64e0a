//! Host endpoints
//!
//! The host record is a safety rail: the cluster monitor compares node
//! utilization against its limits. Default limits are 50% CPU and 90%
//! memory.
//!
//! ## Routes
//! - `GET /host/resources`        — latest host metrics and limits
//! - `PUT /host/resources/limits` — update the utilization limits

use actix_web::{HttpResponse, Responder, web};
use shared::api::HostLimits;

use crate::errors::ApiError;
use crate::state::State;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/resources", web::get().to(resources))
        .route("/resources/limits", web::put().to(update_limits));
}

async fn resources(state: State) -> impl Responder {
    match state.store.get_host().await {
        Ok(Some(host)) => HttpResponse::Ok().json(&host),
        Ok(None) => {
            ApiError::NotFound("Host resources not found".to_string()).to_http_response()
        }
        Err(err) => ApiError::from(err).to_http_response(),
    }
}

/// Update the utilization limits. Values above 90 are rejected; the metric
/// fields of the stored record are left untouched.
async fn update_limits(state: State, payload: web::Json<HostLimits>) -> impl Responder {
    let limits = payload.into_inner();
    if limits.cpu_limit_percent > 90.0 {
        return ApiError::InvalidInput("CPU limit cannot exceed 90%".to_string())
            .to_http_response();
    }
    if limits.memory_limit_percent > 90.0 {
        return ApiError::InvalidInput("Memory limit cannot exceed 90%".to_string())
            .to_http_response();
    }

    match state.store.get_host().await {
        Ok(Some(mut host)) => {
            host.cpu_limit_percent = limits.cpu_limit_percent;
            host.memory_limit_percent = limits.memory_limit_percent;
            if let Err(err) = state.store.put_host(&host).await {
                return ApiError::from(err).to_http_response();
            }
            HttpResponse::Ok().json(&limits)
        }
        Ok(None) => {
            // nothing sampled yet; the next host tick starts from defaults
            tracing::warn!("Limits update before first host sample, nothing stored");
            HttpResponse::Ok().json(&limits)
        }
        Err(err) => ApiError::from(err).to_http_response(),
    }
}

use std::fmt;

use actix_web::HttpResponse as Http;

use crate::runtime::RuntimeError;
use crate::store::StoreError;

/// Failure kinds raised by the core components, mapped onto HTTP status codes
/// at the surface.
#[derive(Debug)]
pub enum ApiError {
    /// Requested resource was not found.
    NotFound(String),
    /// Input data is out of range or in the wrong shape.
    InvalidInput(String),
    /// The scheduler found no node able to take the pod.
    NoCapacity(String),
    /// The container runtime driver refused an operation.
    Runtime(String),
    /// Error from the state store backend.
    Store(String),
}

impl ApiError {
    /// Maps the error to an appropriate HTTP response.
    pub fn to_http_response(&self) -> Http {
        match self {
            ApiError::NotFound(msg) => Http::NotFound().body(msg.clone()),
            ApiError::InvalidInput(msg) => Http::BadRequest().body(msg.clone()),
            ApiError::NoCapacity(msg) => Http::ServiceUnavailable().body(msg.clone()),
            ApiError::Runtime(msg) | ApiError::Store(msg) => {
                Http::InternalServerError().body(msg.clone())
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ApiError::NoCapacity(msg) => write!(f, "No capacity: {}", msg),
            ApiError::Runtime(msg) => write!(f, "Runtime failure: {}", msg),
            ApiError::Store(msg) => write!(f, "Store failure: {}", msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        ApiError::Runtime(err.to_string())
    }
}

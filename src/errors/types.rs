//! Error type definitions for the gateway.
//!
//! Mirrors the taxonomy in spec.md §7: each semantic kind maps to exactly one
//! HTTP status when surfaced through `GatewayError::into_response`.

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde::Serialize;
use thiserror::Error;

/// Top-level error type returned by every data-plane and control-plane
/// operation. Layer-specific errors convert into this via `#[from]`.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request malformed: {0}")]
    RequestMalformed(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("new version required: {0}")]
    NewVersionRequired(String),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: String, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("upstream timeout")]
    UpstreamTimeout,

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("all upstream hosts are down")]
    AllHostsDown,

    #[error("client closed connection")]
    ClientClosed,

    #[error("circuit open for {endpoint}")]
    CircuitOpen { endpoint: String },

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::ValidationFailed(message.into())
    }

    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status this error surfaces as, per spec.md §7's propagation table.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RequestMalformed(_) => StatusCode::BAD_REQUEST,
            GatewayError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            GatewayError::NewVersionRequired(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::UpstreamUnreachable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::AllHostsDown => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::ClientClosed => StatusCode::from_u16(499).unwrap(),
            GatewayError::CircuitOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard admin-plane error body: `{status, message}` (spec.md §6).
#[derive(Debug, Serialize)]
struct StatusMessage {
    status: &'static str,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if !matches!(self, GatewayError::ClientClosed) {
            tracing::warn!(error = %self, status = %status.as_u16(), "request failed");
        }
        let body = StatusMessage {
            status: "error",
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

//! REST API Handlers
//!
//! Thin inbound surface of the frontend: a health endpoint and resource
//! lookup/deletion by internal id, dispatched to the injected Cluster Service
//! client.

use crate::domain::internal_id::{InternalId, ResourceKind};
use crate::domain::ports::{CallContext, Cluster, ClusterServiceClientRef, NodePool};
use crate::error::Error;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Resource returned by a lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ResourceResponse {
    Cluster(Cluster),
    NodePool(NodePool),
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Error::InvalidResourcePath(_) => (StatusCode::BAD_REQUEST, "invalid_resource_path"),
            Error::KindMismatch { .. } => (StatusCode::BAD_REQUEST, "kind_mismatch"),
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            Error::AlreadyExists { .. } => (StatusCode::CONFLICT, "already_exists"),
            Error::EmptyBody { .. } | Error::Transport(_) | Error::Api { .. } => {
                (StatusCode::BAD_GATEWAY, "cluster_service_error")
            }
            Error::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (
            status,
            Json(ApiErrorResponse {
                error: code.into(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

// =============================================================================
// REST Router
// =============================================================================

/// REST API router builder
pub struct RestRouter {
    client: ClusterServiceClientRef,
    request_timeout: Duration,
}

impl RestRouter {
    /// Create a new REST router
    pub fn new(client: ClusterServiceClientRef, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let state = AppState {
            client: self.client,
            request_timeout: self.request_timeout,
        };

        Router::new()
            .route(
                "/v1/resources/*path",
                get(get_resource).delete(delete_resource),
            )
            .route("/healthz", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    client: ClusterServiceClientRef,
    request_timeout: Duration,
}

impl AppState {
    fn context(&self) -> CallContext {
        CallContext::background().timeout(self.request_timeout)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Look up a cluster or node pool by its internal id
async fn get_resource(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<ResourceResponse>, Error> {
    let id = InternalId::new(format!("/{}", path))?;
    debug!("Looking up {} {}", id.kind(), id);

    let ctx = state.context();
    let resource = match id.kind() {
        ResourceKind::Cluster => {
            ResourceResponse::Cluster(state.client.get_cluster(&ctx, &id).await?)
        }
        ResourceKind::NodePool => {
            ResourceResponse::NodePool(state.client.get_node_pool(&ctx, &id).await?)
        }
    };
    Ok(Json(resource))
}

/// Delete a cluster or node pool by its internal id
async fn delete_resource(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<StatusCode, Error> {
    let id = InternalId::new(format!("/{}", path))?;
    info!("Deleting {} {}", id.kind(), id);

    let ctx = state.context();
    match id.kind() {
        ResourceKind::Cluster => state.client.delete_cluster(&ctx, &id).await?,
        ResourceKind::NodePool => state.client.delete_node_pool(&ctx, &id).await?,
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Liveness check
async fn health_check() -> &'static str {
    "ok"
}

//! Cluster Service Connection
//!
//! HTTP connection to the Cluster Service plus the typed per-resource clients
//! handed out by [`InternalId`](crate::domain::InternalId). Each request method
//! issues exactly one outbound call; an empty success body is reported as
//! `Ok(None)` and left to the caller to interpret.

use crate::domain::internal_id::{ResourceKind, V1_API_ROOT};
use crate::domain::ports::{CallContext, Cluster, ClusterStatus, NodePool};
use crate::error::{Error, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Cluster Service connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Base URL of the Cluster Service API gateway
    pub url: String,
    /// Skip TLS certificate verification (non-production only)
    pub insecure: bool,
    /// Default request timeout
    pub timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openshift.com".to_string(),
            insecure: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Error body returned by the Cluster Service
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    reason: Option<String>,
}

// =============================================================================
// Connection
// =============================================================================

/// Unauthenticated connection to the Cluster Service
#[derive(Debug, Clone)]
pub struct Connection {
    client: reqwest::Client,
    base_url: String,
}

impl Connection {
    /// Build a connection from its configuration
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        reqwest::Url::parse(&config.url).map_err(|e| {
            Error::Configuration(format!("Invalid Cluster Service URL '{}': {}", config.url, e))
        })?;

        if config.insecure {
            warn!("TLS verification disabled for Cluster Service at {}", config.url);
        }

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL of the Cluster Service
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Client for the clusters collection
    pub fn clusters(&self) -> ClustersClient<'_> {
        ClustersClient { conn: self }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send one request and return the raw body of a successful response
    async fn execute(
        &self,
        ctx: &CallContext,
        request: RequestBuilder,
        kind: ResourceKind,
        path: &str,
    ) -> Result<Vec<u8>> {
        let request = match ctx.deadline() {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };

        let call = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, Error>((status, body))
        };

        let (status, body) = tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => return Err(Error::Cancelled),
            result = call => result?,
        };

        debug!("Cluster Service {} -> {}", path, status);

        if status == StatusCode::NOT_FOUND {
            let id = path.rsplit('/').next().unwrap_or(path);
            return Err(Error::not_found(kind, id));
        }

        if !status.is_success() {
            let reason = serde_json::from_slice::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.reason)
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            return Err(Error::Api {
                status: status.as_u16(),
                reason,
            });
        }

        Ok(body.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: RequestBuilder,
        kind: ResourceKind,
        path: &str,
    ) -> Result<Option<T>> {
        let body = self.execute(ctx, request, kind, path).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        body: &B,
        kind: ResourceKind,
    ) -> Result<Option<T>> {
        let request = self.request(method, path).json(body);
        self.fetch(ctx, request, kind, path).await
    }
}

// =============================================================================
// Cluster Clients
// =============================================================================

/// Client for the clusters collection
pub struct ClustersClient<'a> {
    conn: &'a Connection,
}

impl ClustersClient<'_> {
    /// POST a new cluster
    pub async fn add(&self, ctx: &CallContext, cluster: &Cluster) -> Result<Option<Cluster>> {
        let path = format!("{}/clusters", V1_API_ROOT);
        self.conn
            .send_json(ctx, Method::POST, &path, cluster, ResourceKind::Cluster)
            .await
    }
}

/// Client for a single cluster
pub struct ClusterClient<'a> {
    conn: &'a Connection,
    path: String,
}

impl<'a> ClusterClient<'a> {
    pub(crate) fn new(conn: &'a Connection, path: String) -> Self {
        Self { conn, path }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// GET the cluster
    pub async fn get(&self, ctx: &CallContext) -> Result<Option<Cluster>> {
        let request = self.conn.request(Method::GET, &self.path);
        self.conn
            .fetch(ctx, request, ResourceKind::Cluster, &self.path)
            .await
    }

    /// GET the cluster status sub-resource
    pub async fn status(&self, ctx: &CallContext) -> Result<Option<ClusterStatus>> {
        let path = format!("{}/status", self.path);
        let request = self.conn.request(Method::GET, &path);
        self.conn
            .fetch(ctx, request, ResourceKind::Cluster, &self.path)
            .await
    }

    /// PATCH the cluster
    pub async fn update(&self, ctx: &CallContext, cluster: &Cluster) -> Result<Option<Cluster>> {
        self.conn
            .send_json(ctx, Method::PATCH, &self.path, cluster, ResourceKind::Cluster)
            .await
    }

    /// DELETE the cluster
    pub async fn delete(&self, ctx: &CallContext) -> Result<()> {
        let request = self.conn.request(Method::DELETE, &self.path);
        self.conn
            .execute(ctx, request, ResourceKind::Cluster, &self.path)
            .await?;
        Ok(())
    }

    /// Client for the node pools of this cluster
    pub fn node_pools(&self) -> NodePoolsClient<'a> {
        NodePoolsClient {
            conn: self.conn,
            cluster_path: self.path.clone(),
        }
    }
}

// =============================================================================
// Node Pool Clients
// =============================================================================

/// Client for the node pools collection of one cluster
pub struct NodePoolsClient<'a> {
    conn: &'a Connection,
    cluster_path: String,
}

impl NodePoolsClient<'_> {
    /// POST a new node pool
    pub async fn add(&self, ctx: &CallContext, node_pool: &NodePool) -> Result<Option<NodePool>> {
        let path = format!("{}/node_pools", self.cluster_path);
        self.conn
            .send_json(ctx, Method::POST, &path, node_pool, ResourceKind::NodePool)
            .await
    }
}

/// Client for a single node pool
pub struct NodePoolClient<'a> {
    conn: &'a Connection,
    path: String,
}

impl<'a> NodePoolClient<'a> {
    pub(crate) fn new(conn: &'a Connection, path: String) -> Self {
        Self { conn, path }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// GET the node pool
    pub async fn get(&self, ctx: &CallContext) -> Result<Option<NodePool>> {
        let request = self.conn.request(Method::GET, &self.path);
        self.conn
            .fetch(ctx, request, ResourceKind::NodePool, &self.path)
            .await
    }

    /// PATCH the node pool
    pub async fn update(&self, ctx: &CallContext, node_pool: &NodePool) -> Result<Option<NodePool>> {
        self.conn
            .send_json(ctx, Method::PATCH, &self.path, node_pool, ResourceKind::NodePool)
            .await
    }

    /// DELETE the node pool
    pub async fn delete(&self, ctx: &CallContext) -> Result<()> {
        let request = self.conn.request(Method::DELETE, &self.path);
        self.conn
            .execute(ctx, request, ResourceKind::NodePool, &self.path)
            .await?;
        Ok(())
    }
}

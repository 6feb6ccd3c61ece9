//! Domain Ports - Core trait definitions for the frontend
//!
//! These traits define the boundaries between the frontend and external systems.
//! Adapters implement these traits to provide concrete functionality.

use crate::cluster_service::connection::Connection;
use crate::domain::internal_id::{InternalId, ResourceKind};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Provisioning-control metadata attached to create requests
pub type PropertyBag = BTreeMap<String, String>;

// =============================================================================
// Cluster Service Resources
// =============================================================================

/// Cluster lifecycle states reported by the Cluster Service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    #[default]
    Pending,
    Validating,
    Waiting,
    Installing,
    Ready,
    Error,
    Uninstalling,
    Hibernating,
    Unknown,
}

/// Cluster status sub-resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    #[serde(default)]
    pub state: ClusterState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Hosted control plane cluster as known to the Cluster Service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Assigned by the Cluster Service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource path, assigned on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyBag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClusterStatus>,
}

impl Cluster {
    /// Create a cluster payload with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Identifier derived from the assigned href
    pub fn internal_id(&self) -> Result<InternalId> {
        let href = self.href.as_deref().ok_or_else(|| {
            Error::InvalidResourcePath(format!("cluster '{}' has no href", self.name))
        })?;
        let id = InternalId::new(href)?;
        id.expect_kind(ResourceKind::Cluster)?;
        Ok(id)
    }
}

/// Node pool status sub-resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePoolStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_replicas: Option<u32>,
}

/// Group of worker nodes attached to exactly one cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePool {
    /// Node pool id, chosen by the caller
    #[serde(default)]
    pub id: String,
    /// Resource path, assigned on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyBag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodePoolStatus>,
}

impl NodePool {
    /// Create a node pool payload with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Identifier derived from the assigned href
    pub fn internal_id(&self) -> Result<InternalId> {
        let href = self.href.as_deref().ok_or_else(|| {
            Error::InvalidResourcePath(format!("node pool '{}' has no href", self.id))
        })?;
        let id = InternalId::new(href)?;
        id.expect_kind(ResourceKind::NodePool)?;
        Ok(id)
    }
}

// =============================================================================
// Call Context
// =============================================================================

/// Cancellation and deadline carried by every Cluster Service call
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl CallContext {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Context cancelled together with the given token
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            timeout: None,
        }
    }

    /// Bound the call duration
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

// =============================================================================
// Cluster Service Client Port
// =============================================================================

/// Port for cluster and node pool operations against the Cluster Service
///
/// Implementations must agree on success and error semantics so that the
/// in-memory client can stand in for the remote one.
#[async_trait]
pub trait ClusterServiceClient: Send + Sync {
    /// Underlying remote connection
    fn connection(&self) -> &Connection;

    /// Copy of the cluster payload with the provisioning properties merged in
    fn add_properties(&self, cluster: Cluster) -> Cluster;

    /// Fetch a cluster
    async fn get_cluster(&self, ctx: &CallContext, id: &InternalId) -> Result<Cluster>;

    /// Fetch the status of a cluster
    async fn get_cluster_status(&self, ctx: &CallContext, id: &InternalId)
        -> Result<ClusterStatus>;

    /// Create a cluster, returning it with its assigned href
    async fn create_cluster(&self, ctx: &CallContext, cluster: &Cluster) -> Result<Cluster>;

    /// Replace an existing cluster
    async fn update_cluster(
        &self,
        ctx: &CallContext,
        id: &InternalId,
        cluster: &Cluster,
    ) -> Result<Cluster>;

    /// Delete a cluster
    async fn delete_cluster(&self, ctx: &CallContext, id: &InternalId) -> Result<()>;

    /// Fetch a node pool
    async fn get_node_pool(&self, ctx: &CallContext, id: &InternalId) -> Result<NodePool>;

    /// Create a node pool under a cluster, returning it with its assigned href
    async fn create_node_pool(
        &self,
        ctx: &CallContext,
        cluster_id: &InternalId,
        node_pool: &NodePool,
    ) -> Result<NodePool>;

    /// Replace an existing node pool
    async fn update_node_pool(
        &self,
        ctx: &CallContext,
        id: &InternalId,
        node_pool: &NodePool,
    ) -> Result<NodePool>;

    /// Delete a node pool
    async fn delete_node_pool(&self, ctx: &CallContext, id: &InternalId) -> Result<()>;
}

// =============================================================================
// Database Port
// =============================================================================

/// Port for the persistence layer, limited to a connectivity check
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Check that the database is reachable, describing what was found
    async fn connection_test(&self) -> Result<String>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type ClusterServiceClientRef = Arc<dyn ClusterServiceClient>;
pub type DatabaseClientRef = Arc<dyn DatabaseClient>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::internal_id::cluster_href;
    use assert_matches::assert_matches;

    #[test]
    fn test_cluster_json_shape() {
        let json = r#"{
            "kind": "Cluster",
            "id": "abc123",
            "href": "/api/clusters_mgmt/v1/clusters/abc123",
            "name": "dev",
            "status": {"state": "installing"}
        }"#;
        let cluster: Cluster = serde_json::from_str(json).unwrap();
        assert_eq!(cluster.name, "dev");
        assert_eq!(cluster.status.unwrap().state, ClusterState::Installing);
        assert!(cluster.properties.is_empty());

        let payload = serde_json::to_value(Cluster::new("dev")).unwrap();
        assert_eq!(payload, serde_json::json!({"name": "dev"}));
    }

    #[test]
    fn test_internal_id_from_href() {
        let mut cluster = Cluster::new("abc123");
        assert_matches!(cluster.internal_id(), Err(Error::InvalidResourcePath(_)));

        cluster.href = Some(cluster_href("abc123"));
        assert_eq!(cluster.internal_id().unwrap().id(), "abc123");

        let mut node_pool = NodePool::new("np1");
        node_pool.href = Some(cluster_href("abc123"));
        assert_matches!(
            node_pool.internal_id(),
            Err(Error::KindMismatch {
                expected: ResourceKind::NodePool,
                ..
            })
        );
    }

    #[test]
    fn test_call_context() {
        let token = CancellationToken::new();
        let ctx = CallContext::with_cancellation(token.clone()).timeout(Duration::from_secs(5));
        assert_eq!(ctx.deadline(), Some(Duration::from_secs(5)));
        assert!(!ctx.is_cancelled());

        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(!CallContext::background().is_cancelled());
    }
}

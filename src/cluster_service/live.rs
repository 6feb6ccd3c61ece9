//! Live Cluster Service Client
//!
//! Implements the Cluster Service port over an HTTP [`Connection`]. Every
//! operation issues exactly one outbound call; there is no retrying and no
//! caching.

use super::connection::{Connection, ConnectionConfig};
use super::properties::ProvisioningOverrides;
use crate::domain::internal_id::{InternalId, ResourceKind};
use crate::domain::ports::{CallContext, Cluster, ClusterServiceClient, ClusterStatus, NodePool};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Cluster Service client backed by a remote connection
#[derive(Debug, Clone)]
pub struct LiveClusterServiceClient {
    conn: Connection,
    overrides: ProvisioningOverrides,
}

impl LiveClusterServiceClient {
    /// Create a client over an existing connection
    pub fn new(conn: Connection, overrides: ProvisioningOverrides) -> Self {
        Self { conn, overrides }
    }

    /// Build the connection and the client from configuration
    pub fn from_config(config: ConnectionConfig, overrides: ProvisioningOverrides) -> Result<Self> {
        info!("Connecting to Cluster Service at {}", config.url);
        Ok(Self::new(Connection::new(config)?, overrides))
    }

    pub fn overrides(&self) -> &ProvisioningOverrides {
        &self.overrides
    }
}

fn kind_mismatch(expected: ResourceKind, id: &InternalId) -> Error {
    Error::KindMismatch {
        expected,
        path: id.to_string(),
    }
}

#[async_trait]
impl ClusterServiceClient for LiveClusterServiceClient {
    fn connection(&self) -> &Connection {
        &self.conn
    }

    fn add_properties(&self, cluster: Cluster) -> Cluster {
        self.overrides.apply(cluster)
    }

    async fn get_cluster(&self, ctx: &CallContext, id: &InternalId) -> Result<Cluster> {
        let client = id
            .cluster_client(&self.conn)
            .ok_or_else(|| kind_mismatch(ResourceKind::Cluster, id))?;
        client
            .get(ctx)
            .await?
            .ok_or_else(|| Error::empty_body("get cluster"))
    }

    async fn get_cluster_status(
        &self,
        ctx: &CallContext,
        id: &InternalId,
    ) -> Result<ClusterStatus> {
        let client = id
            .cluster_client(&self.conn)
            .ok_or_else(|| kind_mismatch(ResourceKind::Cluster, id))?;
        client
            .status(ctx)
            .await?
            .ok_or_else(|| Error::empty_body("get cluster status"))
    }

    async fn create_cluster(&self, ctx: &CallContext, cluster: &Cluster) -> Result<Cluster> {
        let payload = self.add_properties(cluster.clone());
        let created = self
            .conn
            .clusters()
            .add(ctx, &payload)
            .await?
            .ok_or_else(|| Error::empty_body("create cluster"))?;

        let id = created.internal_id()?;
        debug!("Created cluster {} at {}", created.name, id);
        Ok(created)
    }

    async fn update_cluster(
        &self,
        ctx: &CallContext,
        id: &InternalId,
        cluster: &Cluster,
    ) -> Result<Cluster> {
        let client = id
            .cluster_client(&self.conn)
            .ok_or_else(|| kind_mismatch(ResourceKind::Cluster, id))?;
        client
            .update(ctx, cluster)
            .await?
            .ok_or_else(|| Error::empty_body("update cluster"))
    }

    async fn delete_cluster(&self, ctx: &CallContext, id: &InternalId) -> Result<()> {
        let client = id
            .cluster_client(&self.conn)
            .ok_or_else(|| kind_mismatch(ResourceKind::Cluster, id))?;
        client.delete(ctx).await
    }

    async fn get_node_pool(&self, ctx: &CallContext, id: &InternalId) -> Result<NodePool> {
        let client = id
            .node_pool_client(&self.conn)
            .ok_or_else(|| kind_mismatch(ResourceKind::NodePool, id))?;
        client
            .get(ctx)
            .await?
            .ok_or_else(|| Error::empty_body("get node pool"))
    }

    async fn create_node_pool(
        &self,
        ctx: &CallContext,
        cluster_id: &InternalId,
        node_pool: &NodePool,
    ) -> Result<NodePool> {
        let client = cluster_id
            .cluster_client(&self.conn)
            .ok_or_else(|| kind_mismatch(ResourceKind::Cluster, cluster_id))?;
        let created = client
            .node_pools()
            .add(ctx, node_pool)
            .await?
            .ok_or_else(|| Error::empty_body("create node pool"))?;

        let id = created.internal_id()?;
        debug!("Created node pool {} at {}", created.id, id);
        Ok(created)
    }

    async fn update_node_pool(
        &self,
        ctx: &CallContext,
        id: &InternalId,
        node_pool: &NodePool,
    ) -> Result<NodePool> {
        let client = id
            .node_pool_client(&self.conn)
            .ok_or_else(|| kind_mismatch(ResourceKind::NodePool, id))?;
        client
            .update(ctx, node_pool)
            .await?
            .ok_or_else(|| Error::empty_body("update node pool"))
    }

    async fn delete_node_pool(&self, ctx: &CallContext, id: &InternalId) -> Result<()> {
        let client = id
            .node_pool_client(&self.conn)
            .ok_or_else(|| kind_mismatch(ResourceKind::NodePool, id))?;
        client.delete(ctx).await
    }
}

//! In-memory Cluster Service Client
//!
//! Implements the Cluster Service port on top of a keyed store owned by the
//! client instance, so tests and local development can run without a Cluster
//! Service. Operations complete synchronously and ignore cancellation.

use super::connection::Connection;
use super::properties::ProvisioningOverrides;
use crate::domain::internal_id::{cluster_href, node_pool_href, InternalId, ResourceKind};
use crate::domain::ports::{CallContext, Cluster, ClusterServiceClient, ClusterStatus, NodePool};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
struct MockStore {
    clusters: HashMap<InternalId, Cluster>,
    node_pools: HashMap<InternalId, NodePool>,
}

/// Cluster Service client backed by an in-memory store
///
/// The store lives and dies with the instance. The lock only satisfies the
/// `Send + Sync` port bound; the client is meant for single-caller tests.
#[derive(Debug, Default)]
pub struct MockClusterServiceClient {
    store: Mutex<MockStore>,
    overrides: ProvisioningOverrides,
}

impl MockClusterServiceClient {
    /// Create an empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mock client that injects the given overrides
    pub fn with_overrides(overrides: ProvisioningOverrides) -> Self {
        Self {
            store: Mutex::default(),
            overrides,
        }
    }

    /// Number of stored clusters
    pub fn cluster_count(&self) -> usize {
        self.store.lock().clusters.len()
    }

    /// Number of stored node pools
    pub fn node_pool_count(&self) -> usize {
        self.store.lock().node_pools.len()
    }
}

#[async_trait]
impl ClusterServiceClient for MockClusterServiceClient {
    fn connection(&self) -> &Connection {
        unimplemented!("the mock Cluster Service client has no remote connection")
    }

    fn add_properties(&self, cluster: Cluster) -> Cluster {
        self.overrides.apply(cluster)
    }

    async fn get_cluster(&self, _ctx: &CallContext, id: &InternalId) -> Result<Cluster> {
        id.expect_kind(ResourceKind::Cluster)?;
        self.store
            .lock()
            .clusters
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(ResourceKind::Cluster, id.id()))
    }

    async fn get_cluster_status(
        &self,
        ctx: &CallContext,
        id: &InternalId,
    ) -> Result<ClusterStatus> {
        let cluster = self.get_cluster(ctx, id).await?;
        Ok(cluster.status.unwrap_or_default())
    }

    async fn create_cluster(&self, _ctx: &CallContext, cluster: &Cluster) -> Result<Cluster> {
        let href = cluster_href(&cluster.name);
        let id = InternalId::new(href.clone())?;
        id.expect_kind(ResourceKind::Cluster)?;

        let mut enriched = self.add_properties(cluster.clone());
        enriched.id = Some(id.id().to_string());
        enriched.href = Some(href);

        let mut store = self.store.lock();
        if store.clusters.contains_key(&id) {
            return Err(Error::AlreadyExists {
                kind: ResourceKind::Cluster,
                id: id.id().to_string(),
            });
        }
        debug!("Mock created cluster {}", id);
        store.clusters.insert(id, enriched.clone());
        Ok(enriched)
    }

    async fn update_cluster(
        &self,
        _ctx: &CallContext,
        id: &InternalId,
        cluster: &Cluster,
    ) -> Result<Cluster> {
        id.expect_kind(ResourceKind::Cluster)?;
        let mut store = self.store.lock();
        let stored = store
            .clusters
            .get_mut(id)
            .ok_or_else(|| Error::not_found(ResourceKind::Cluster, id.id()))?;

        let mut updated = cluster.clone();
        updated.id = Some(id.id().to_string());
        updated.href = Some(id.to_string());
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete_cluster(&self, _ctx: &CallContext, id: &InternalId) -> Result<()> {
        id.expect_kind(ResourceKind::Cluster)?;
        let mut store = self.store.lock();
        if store.clusters.remove(id).is_none() {
            return Err(Error::not_found(ResourceKind::Cluster, id.id()));
        }
        store
            .node_pools
            .retain(|np_id, _| np_id.cluster_id().as_ref() != Some(id));
        debug!("Mock deleted cluster {}", id);
        Ok(())
    }

    async fn get_node_pool(&self, _ctx: &CallContext, id: &InternalId) -> Result<NodePool> {
        id.expect_kind(ResourceKind::NodePool)?;
        self.store
            .lock()
            .node_pools
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(ResourceKind::NodePool, id.id()))
    }

    async fn create_node_pool(
        &self,
        _ctx: &CallContext,
        cluster_id: &InternalId,
        node_pool: &NodePool,
    ) -> Result<NodePool> {
        cluster_id.expect_kind(ResourceKind::Cluster)?;
        let href = node_pool_href(cluster_id, &node_pool.id);
        let id = InternalId::new(href.clone())?;

        let mut enriched = node_pool.clone();
        enriched.href = Some(href);

        let mut store = self.store.lock();
        if store.node_pools.contains_key(&id) {
            return Err(Error::AlreadyExists {
                kind: ResourceKind::NodePool,
                id: id.id().to_string(),
            });
        }
        debug!("Mock created node pool {}", id);
        store.node_pools.insert(id, enriched.clone());
        Ok(enriched)
    }

    async fn update_node_pool(
        &self,
        _ctx: &CallContext,
        id: &InternalId,
        node_pool: &NodePool,
    ) -> Result<NodePool> {
        id.expect_kind(ResourceKind::NodePool)?;
        let mut store = self.store.lock();
        let stored = store
            .node_pools
            .get_mut(id)
            .ok_or_else(|| Error::not_found(ResourceKind::NodePool, id.id()))?;

        let mut updated = node_pool.clone();
        updated.id = id.id().to_string();
        updated.href = Some(id.to_string());
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete_node_pool(&self, _ctx: &CallContext, id: &InternalId) -> Result<()> {
        id.expect_kind(ResourceKind::NodePool)?;
        if self.store.lock().node_pools.remove(id).is_none() {
            return Err(Error::not_found(ResourceKind::NodePool, id.id()));
        }
        debug!("Mock deleted node pool {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster_service::properties::{
        PROVISIONER_HOSTEDCLUSTER_STEP_ENABLED, PROVISION_SHARD_ID,
    };
    use crate::domain::ports::{ClusterState, ClusterServiceClientRef};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    const CLUSTER: &str = "/api/clusters_mgmt/v1/clusters/abc123";
    const NODE_POOL: &str = "/api/clusters_mgmt/v1/clusters/abc123/node_pools/np1";

    fn id(path: &str) -> InternalId {
        InternalId::new(path).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get_returns_enriched_cluster() {
        let client = MockClusterServiceClient::new();
        let ctx = CallContext::background();

        let input = Cluster::new("abc123");
        let created = client.create_cluster(&ctx, &input).await.unwrap();

        assert_eq!(created.href.as_deref(), Some(CLUSTER));
        assert_eq!(created.id.as_deref(), Some("abc123"));
        assert_eq!(created.properties[PROVISIONER_HOSTEDCLUSTER_STEP_ENABLED], "true");
        assert_ne!(created, input);
        assert!(input.href.is_none());

        let fetched = client
            .get_cluster(&ctx, &created.internal_id().unwrap())
            .await
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_applies_overrides() {
        let client = MockClusterServiceClient::with_overrides(ProvisioningOverrides {
            provision_shard_id: Some("shard-1".into()),
            ..Default::default()
        });
        let created = client
            .create_cluster(&CallContext::background(), &Cluster::new("dev"))
            .await
            .unwrap();
        assert_eq!(created.properties[PROVISION_SHARD_ID], "shard-1");
    }

    #[tokio::test]
    async fn test_create_duplicate_and_invalid_name() {
        let client = MockClusterServiceClient::new();
        let ctx = CallContext::background();

        client.create_cluster(&ctx, &Cluster::new("dev")).await.unwrap();
        assert_matches!(
            client.create_cluster(&ctx, &Cluster::new("dev")).await,
            Err(Error::AlreadyExists { .. })
        );
        assert_matches!(
            client.create_cluster(&ctx, &Cluster::new("")).await,
            Err(Error::InvalidResourcePath(_))
        );
        assert_matches!(
            client.create_cluster(&ctx, &Cluster::new("a/b")).await,
            Err(Error::InvalidResourcePath(_))
        );
        assert_eq!(client.cluster_count(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_cluster() {
        let client = MockClusterServiceClient::new();
        assert_matches!(
            client.get_cluster(&CallContext::background(), &id(CLUSTER)).await,
            Err(Error::NotFound {
                kind: ResourceKind::Cluster,
                ..
            })
        );
    }

    #[tokio::test]
    async fn test_update_cluster() {
        let client = MockClusterServiceClient::new();
        let ctx = CallContext::background();

        let mut replacement = Cluster::new("abc123");
        replacement.status = Some(ClusterStatus {
            state: ClusterState::Ready,
            description: None,
        });

        assert_matches!(
            client.update_cluster(&ctx, &id(CLUSTER), &replacement).await,
            Err(Error::NotFound { .. })
        );

        client.create_cluster(&ctx, &Cluster::new("abc123")).await.unwrap();
        let updated = client
            .update_cluster(&ctx, &id(CLUSTER), &replacement)
            .await
            .unwrap();
        assert_eq!(updated.href.as_deref(), Some(CLUSTER));

        assert_eq!(client.get_cluster(&ctx, &id(CLUSTER)).await.unwrap(), updated);
        let status = client.get_cluster_status(&ctx, &id(CLUSTER)).await.unwrap();
        assert_eq!(status.state, ClusterState::Ready);
    }

    #[tokio::test]
    async fn test_delete_is_not_idempotent() {
        let client = MockClusterServiceClient::new();
        let ctx = CallContext::background();
        let missing = id("/api/clusters_mgmt/v1/clusters/missing");

        assert_matches!(
            client.delete_cluster(&ctx, &missing).await,
            Err(Error::NotFound { .. })
        );

        let created = client.create_cluster(&ctx, &Cluster::new("abc123")).await.unwrap();
        let created_id = created.internal_id().unwrap();
        client.delete_cluster(&ctx, &created_id).await.unwrap();

        assert_matches!(
            client.delete_cluster(&ctx, &missing).await,
            Err(Error::NotFound { .. })
        );
        assert_matches!(
            client.delete_cluster(&ctx, &created_id).await,
            Err(Error::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_create_node_pool_under_cluster() {
        let client = MockClusterServiceClient::new();
        let ctx = CallContext::background();

        let created = client
            .create_node_pool(&ctx, &id(CLUSTER), &NodePool::new("np1"))
            .await
            .unwrap();
        assert_eq!(created.href.as_deref(), Some(NODE_POOL));

        let fetched = client.get_node_pool(&ctx, &id(NODE_POOL)).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_node_pool_update_and_delete() {
        let client = MockClusterServiceClient::new();
        let ctx = CallContext::background();
        client
            .create_node_pool(&ctx, &id(CLUSTER), &NodePool::new("np1"))
            .await
            .unwrap();

        let mut scaled = NodePool::new("np1");
        scaled.replicas = Some(3);
        let updated = client
            .update_node_pool(&ctx, &id(NODE_POOL), &scaled)
            .await
            .unwrap();
        assert_eq!(updated.replicas, Some(3));

        client.delete_node_pool(&ctx, &id(NODE_POOL)).await.unwrap();
        assert_matches!(
            client.delete_node_pool(&ctx, &id(NODE_POOL)).await,
            Err(Error::NotFound {
                kind: ResourceKind::NodePool,
                ..
            })
        );
        assert_matches!(
            client.update_node_pool(&ctx, &id(NODE_POOL), &scaled).await,
            Err(Error::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_delete_cluster_removes_node_pools() {
        let client = MockClusterServiceClient::new();
        let ctx = CallContext::background();

        client.create_cluster(&ctx, &Cluster::new("abc123")).await.unwrap();
        client.create_cluster(&ctx, &Cluster::new("other")).await.unwrap();
        client
            .create_node_pool(&ctx, &id(CLUSTER), &NodePool::new("np1"))
            .await
            .unwrap();
        client
            .create_node_pool(
                &ctx,
                &id("/api/clusters_mgmt/v1/clusters/other"),
                &NodePool::new("np1"),
            )
            .await
            .unwrap();

        client.delete_cluster(&ctx, &id(CLUSTER)).await.unwrap();
        assert_eq!(client.node_pool_count(), 1);
        assert!(client.get_node_pool(&ctx, &id(NODE_POOL)).await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_kind_is_rejected() {
        let client = MockClusterServiceClient::new();
        let ctx = CallContext::background();

        assert_matches!(
            client.get_cluster(&ctx, &id(NODE_POOL)).await,
            Err(Error::KindMismatch { .. })
        );
        assert_matches!(
            client
                .create_node_pool(&ctx, &id(NODE_POOL), &NodePool::new("np2"))
                .await,
            Err(Error::KindMismatch { .. })
        );
    }

    #[tokio::test]
    async fn test_instances_do_not_share_state() {
        let ctx = CallContext::background();
        let first: ClusterServiceClientRef = Arc::new(MockClusterServiceClient::new());
        let second: ClusterServiceClientRef = Arc::new(MockClusterServiceClient::new());

        first.create_cluster(&ctx, &Cluster::new("abc123")).await.unwrap();
        assert!(second.get_cluster(&ctx, &id(CLUSTER)).await.is_err());
    }

    #[test]
    #[should_panic(expected = "no remote connection")]
    fn test_connection_is_unsupported() {
        let client = MockClusterServiceClient::new();
        let _ = client.connection();
    }
}

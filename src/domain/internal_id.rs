//! Internal resource identifiers
//!
//! An [`InternalId`] is the validated Cluster Service path of a cluster or
//! node pool, e.g. `/api/clusters_mgmt/v1/clusters/abc123` or
//! `/api/clusters_mgmt/v1/clusters/abc123/node_pools/np1`. It is used as a
//! lookup key and as the entry point to the per-resource remote clients.

use crate::cluster_service::connection::{ClusterClient, Connection, NodePoolClient};
use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

// =============================================================================
// Path Grammar
// =============================================================================

/// Root of the clusters management v1 API
pub const V1_API_ROOT: &str = "/api/clusters_mgmt/v1";

const CLUSTER_PATTERN: &str = "/api/clusters_mgmt/v1/clusters/*";
const NODE_POOL_PATTERN: &str = "/api/clusters_mgmt/v1/clusters/*/node_pools/*";

const NODE_POOL_SEGMENT: &str = "/node_pools/";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn patterns() -> &'static (Pattern, Pattern) {
    static PATTERNS: OnceLock<(Pattern, Pattern)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Pattern::new(CLUSTER_PATTERN).expect("cluster pattern is valid"),
            Pattern::new(NODE_POOL_PATTERN).expect("node pool pattern is valid"),
        )
    })
}

/// Build the href of a cluster with the given id
pub fn cluster_href(cluster_id: &str) -> String {
    format!("{}/clusters/{}", V1_API_ROOT, cluster_id)
}

/// Build the href of a node pool under the given cluster
pub fn node_pool_href(cluster: &InternalId, node_pool_id: &str) -> String {
    format!("{}{}{}", cluster.path, NODE_POOL_SEGMENT, node_pool_id)
}

// =============================================================================
// Resource Kind
// =============================================================================

/// Kind of resource addressed by an [`InternalId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cluster,
    NodePool,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Cluster => write!(f, "Cluster"),
            ResourceKind::NodePool => write!(f, "NodePool"),
        }
    }
}

// =============================================================================
// Internal ID
// =============================================================================

/// Validated Cluster Service path of a cluster or node pool
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InternalId {
    path: String,
    kind: ResourceKind,
}

impl InternalId {
    /// Parse and classify a resource path
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();

        // `*` also matches empty and dot segments, and the URL layer would
        // rewrite those, or any query, fragment or escape, into another path
        if path.ends_with('/')
            || path.contains("//")
            || path.contains(['?', '#', '%'])
            || path.split('/').any(|segment| segment == "." || segment == "..")
        {
            return Err(Error::InvalidResourcePath(path));
        }

        let (cluster, node_pool) = patterns();
        let kind = if cluster.matches_with(&path, MATCH_OPTIONS) {
            ResourceKind::Cluster
        } else if node_pool.matches_with(&path, MATCH_OPTIONS) {
            ResourceKind::NodePool
        } else {
            return Err(Error::InvalidResourcePath(path));
        };

        Ok(Self { path, kind })
    }

    /// Kind of the addressed resource
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Full resource path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment: the cluster or node pool id
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Identifier of the owning cluster, for node pools
    pub fn cluster_id(&self) -> Option<InternalId> {
        match self.kind {
            ResourceKind::Cluster => None,
            ResourceKind::NodePool => {
                let (cluster_path, _) = self.path.rsplit_once(NODE_POOL_SEGMENT)?;
                Some(InternalId {
                    path: cluster_path.to_string(),
                    kind: ResourceKind::Cluster,
                })
            }
        }
    }

    /// Remote client for this cluster, or `None` if this is not a cluster
    pub fn cluster_client<'a>(&self, conn: &'a Connection) -> Option<ClusterClient<'a>> {
        match self.kind {
            ResourceKind::Cluster => Some(ClusterClient::new(conn, self.path.clone())),
            ResourceKind::NodePool => None,
        }
    }

    /// Remote client for this node pool, or `None` if this is not a node pool
    pub fn node_pool_client<'a>(&self, conn: &'a Connection) -> Option<NodePoolClient<'a>> {
        match self.kind {
            ResourceKind::NodePool => Some(NodePoolClient::new(conn, self.path.clone())),
            ResourceKind::Cluster => None,
        }
    }

    /// Require this identifier to be of the given kind
    pub(crate) fn expect_kind(&self, expected: ResourceKind) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(Error::KindMismatch {
                expected,
                path: self.path.clone(),
            })
        }
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl FromStr for InternalId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Serialize for InternalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}

impl<'de> Deserialize<'de> for InternalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        InternalId::new(path).map_err(serde::de::Error::custom)
    }
}

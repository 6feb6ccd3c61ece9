//! Cluster Service Adapters
//!
//! Provides the two implementations of the Cluster Service port:
//! - Live: HTTP calls against a remote Cluster Service
//! - Mock: in-memory store for tests and local development

pub mod connection;
pub mod live;
pub mod mock;
pub mod properties;

pub use connection::*;
pub use live::*;
pub use mock::*;
pub use properties::*;

use crate::domain::ports::ClusterServiceClientRef;
use crate::error::Result;
use std::sync::Arc;

/// Combined Cluster Service client configuration
#[derive(Debug, Clone, Default)]
pub struct ClusterServiceConfig {
    pub connection: ConnectionConfig,
    pub overrides: ProvisioningOverrides,
    /// Use the in-memory client instead of the remote one
    pub mock: bool,
}

/// Factory for creating Cluster Service clients
pub struct ClusterServiceFactory;

impl ClusterServiceFactory {
    /// Create the client selected by the configuration
    pub fn create(config: ClusterServiceConfig) -> Result<ClusterServiceClientRef> {
        if config.mock {
            return Ok(Arc::new(MockClusterServiceClient::with_overrides(
                config.overrides,
            )));
        }
        Ok(Arc::new(LiveClusterServiceClient::from_config(
            config.connection,
            config.overrides,
        )?))
    }
}

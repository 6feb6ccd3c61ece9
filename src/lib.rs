//! HCP Frontend - Cluster Service addressing and clients
//!
//! Frontend core of a hosted control plane service: it addresses clusters and
//! node pools hosted by the Cluster Service, talks to it through a live or an
//! in-memory client, and runs the inbound service with a cooperative,
//! signal-driven shutdown.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                            Frontend (runtime)                                │
//! │   listener ─► REST router (processor task) ◄── stop token / join (control)   │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │        InternalId  ──►  ClusterServiceClient (port)  ──►  PropertyBag        │
//! ├──────────────────────────────────────┬──────────────────────────────────────┤
//! │     LiveClusterServiceClient         │      MockClusterServiceClient        │
//! │     (HTTP Connection)                │      (in-memory store)               │
//! └──────────────────────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`domain`]: Resource identifiers and port traits
//! - [`cluster_service`]: Live and mock Cluster Service clients, provisioning properties
//! - [`database`]: Startup database connectivity probe
//! - [`frontend`]: Service lifecycle, REST router and server
//! - [`error`]: Error types and handling

pub mod cluster_service;
pub mod database;
pub mod domain;
pub mod error;
pub mod frontend;

// Re-export commonly used types
pub use cluster_service::{
    ClusterServiceConfig, ClusterServiceFactory, Connection, ConnectionConfig,
    LiveClusterServiceClient, MockClusterServiceClient, ProvisioningOverrides,
};

pub use database::{
    DatabaseConfig, HttpDatabaseClient, MockDatabaseClient, UnconfiguredDatabaseClient,
};

pub use domain::{
    CallContext, Cluster, ClusterServiceClient, ClusterServiceClientRef, ClusterState,
    ClusterStatus, DatabaseClient, DatabaseClientRef, InternalId, NodePool, PropertyBag,
    ResourceKind,
};

pub use error::{Error, Result};

pub use frontend::{shutdown_signal, Frontend, FrontendConfig, Lifecycle, LifecycleState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! HCP Frontend
//!
//! Serves the hosted control plane frontend. It talks to the Cluster Service
//! and checks its database once at startup.
//!
//! ```text
//! # Run against a local Cluster Service at http://localhost:8000
//! hcp-frontend --database-name $DB_NAME --database-url $DB_URL --region $REGION \
//!     --clusters-service-url http://localhost:8000
//! ```

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hcp_frontend::{
    shutdown_signal, ClusterServiceConfig, ClusterServiceFactory, ConnectionConfig,
    DatabaseClientRef, DatabaseConfig, Error, Frontend, FrontendConfig, HttpDatabaseClient,
    ProvisioningOverrides, Result, UnconfiguredDatabaseClient,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// HCP Frontend - serve the hosted control plane frontend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8443")]
    port: u16,

    /// Region the frontend runs in
    #[arg(long, env = "REGION", default_value = "")]
    region: String,

    /// Database name
    #[arg(long, env = "DB_NAME", default_value = "")]
    database_name: String,

    /// Database url
    #[arg(long, env = "DB_URL", default_value = "")]
    database_url: String,

    /// URL of the Cluster Service API gateway
    #[arg(long, env = "CLUSTERS_SERVICE_URL", default_value = "https://api.openshift.com")]
    clusters_service_url: String,

    /// Skip validating TLS for the Cluster Service
    #[arg(long, env = "INSECURE")]
    insecure: bool,

    /// Pin all clusters to this provision shard
    #[arg(long, env = "PROVISION_SHARD_ID")]
    provision_shard_id: Option<String>,

    /// Short-circuit the Cluster Service provision flow
    #[arg(long, env = "PROVISIONER_NOOP_PROVISION")]
    provisioner_noop_provision: bool,

    /// Short-circuit the Cluster Service deprovision flow
    #[arg(long, env = "PROVISIONER_NOOP_DEPROVISION")]
    provisioner_noop_deprovision: bool,

    /// Timeout for each Cluster Service request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    request_timeout_secs: u64,

    /// Use an in-memory Cluster Service (development only)
    #[arg(long, env = "MOCK_CLUSTERS_SERVICE")]
    mock_clusters_service: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    let request_timeout = Duration::from_secs(args.request_timeout_secs);

    let database: DatabaseClientRef = if args.database_url.is_empty() {
        warn!("No database url configured");
        Arc::new(UnconfiguredDatabaseClient)
    } else {
        Arc::new(HttpDatabaseClient::new(DatabaseConfig {
            name: args.database_name.clone(),
            url: args.database_url.clone(),
            ..Default::default()
        })?)
    };

    let client = ClusterServiceFactory::create(ClusterServiceConfig {
        connection: ConnectionConfig {
            url: args.clusters_service_url.clone(),
            insecure: args.insecure,
            timeout: request_timeout,
        },
        overrides: ProvisioningOverrides {
            provision_shard_id: args.provision_shard_id.clone(),
            noop_provision: args.provisioner_noop_provision,
            noop_deprovision: args.provisioner_noop_deprovision,
        },
        mock: args.mock_clusters_service,
    })?;
    if args.mock_clusters_service {
        info!("Using in-memory Cluster Service");
    }

    let config = FrontendConfig {
        port: args.port,
        region: args.region.clone(),
        request_timeout,
        ..Default::default()
    };

    let mut frontend = Frontend::new(config, client, database);
    frontend.listen().await?;
    frontend.run(shutdown_signal()).await
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn", "tower_http=info", "axum=info"] {
        let directive = directive
            .parse()
            .map_err(|e| Error::Configuration(format!("Invalid log directive: {}", e)))?;
        filter = filter.add_directive(directive);
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }

    Ok(())
}

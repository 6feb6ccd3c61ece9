//! Database connectivity probe
//!
//! The frontend only checks once at startup that its database is reachable.
//! The outcome is logged and never gates startup.

use crate::domain::ports::DatabaseClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Configuration for the database connection
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database name
    pub name: String,
    /// Database account endpoint
    pub url: String,
    /// Probe timeout
    pub timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Database properties returned by the account endpoint
#[derive(Debug, Deserialize)]
struct DatabaseProperties {
    id: String,
    #[serde(rename = "_rid", default)]
    rid: Option<String>,
}

/// Database client reaching the account endpoint over HTTP
#[derive(Debug)]
pub struct HttpDatabaseClient {
    config: DatabaseConfig,
    client: reqwest::Client,
}

impl HttpDatabaseClient {
    /// Create a new database client
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(Error::Configuration("database url is required".into()));
        }
        if config.name.is_empty() {
            return Err(Error::Configuration("database name is required".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl DatabaseClient for HttpDatabaseClient {
    async fn connection_test(&self) -> Result<String> {
        let url = format!(
            "{}/dbs/{}",
            self.config.url.trim_end_matches('/'),
            self.config.name
        );
        debug!("Probing database at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Database(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Database(format!("{} returned {}", url, status)));
        }

        let properties: DatabaseProperties = response
            .json()
            .await
            .map_err(|e| Error::Database(format!("invalid database properties: {}", e)))?;

        Ok(match properties.rid {
            Some(rid) => format!("database {} ({})", properties.id, rid),
            None => format!("database {}", properties.id),
        })
    }
}

/// Database client that always answers the probe
#[derive(Debug, Default)]
pub struct MockDatabaseClient;

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn connection_test(&self) -> Result<String> {
        Ok("mock database".to_string())
    }
}

/// Database client used when no database url is configured
///
/// Every probe fails, so the startup check reports the missing configuration.
#[derive(Debug, Default)]
pub struct UnconfiguredDatabaseClient;

#[async_trait]
impl DatabaseClient for UnconfiguredDatabaseClient {
    async fn connection_test(&self) -> Result<String> {
        Err(Error::Database("no database url configured".into()))
    }
}

//! Frontend Server
//!
//! Owns the inbound listener, runs the REST router on its own task and drives
//! the cooperative shutdown sequence when a termination signal arrives.

use crate::domain::ports::{ClusterServiceClientRef, DatabaseClientRef};
use crate::error::{Error, Result};
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::lifecycle::{Lifecycle, LifecycleState};
use super::rest::RestRouter;

/// Program name used in lifecycle log lines
pub const PROGRAM_NAME: &str = "hcp-frontend";

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the frontend server
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    /// Listen address
    pub host: IpAddr,
    /// Listen port
    pub port: u16,
    /// Region the frontend serves
    pub region: String,
    /// Timeout applied to each Cluster Service call made for a request
    pub request_timeout: Duration,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8443,
            region: String::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl FrontendConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Frontend
// =============================================================================

/// Frontend service runtime
///
/// The Cluster Service and database clients are injected; the frontend never
/// builds them itself.
pub struct Frontend {
    config: FrontendConfig,
    client: ClusterServiceClientRef,
    database: DatabaseClientRef,
    lifecycle: Lifecycle,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
}

impl Frontend {
    /// Create a new frontend in the `Created` state
    pub fn new(
        config: FrontendConfig,
        client: ClusterServiceClientRef,
        database: DatabaseClientRef,
    ) -> Self {
        Self {
            config,
            client,
            database,
            lifecycle: Lifecycle::new(),
            listener: None,
            local_addr: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Bound address, once listening
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind the inbound listener
    pub async fn listen(&mut self) -> Result<SocketAddr> {
        let current = self.state();
        if current != LifecycleState::Created {
            return Err(Error::InvalidTransition {
                from: current,
                to: LifecycleState::Listening,
            });
        }

        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind {}: {}", addr, e);
            Error::Io(e)
        })?;
        let local_addr = listener.local_addr()?;

        self.lifecycle.mark_listening()?;
        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        info!("Listening on {}", local_addr);
        Ok(local_addr)
    }

    /// Check database connectivity once and log the outcome
    async fn probe_database(&self) {
        info!("Testing DB Access");
        match self.database.connection_test().await {
            Ok(result) => info!("Database check completed - {}", result),
            Err(e) => error!("Database test failed to fetch properties: {}", e),
        }
    }

    /// Probe the database, then spawn the request processor
    pub async fn start(&mut self) -> Result<()> {
        let current = self.state();
        if current != LifecycleState::Listening {
            return Err(Error::InvalidTransition {
                from: current,
                to: LifecycleState::Running,
            });
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| Error::Internal("listener already consumed".into()))?;

        self.probe_database().await;

        let app = RestRouter::new(self.client.clone(), self.config.request_timeout).build();
        self.lifecycle.spawn(|stop| async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await?;
            info!("REST server shut down");
            Ok::<_, Error>(())
        })
    }

    /// Signal the processor to drain
    pub fn stop(&self) -> Result<()> {
        self.lifecycle.stop()
    }

    /// Wait for the processor to finish draining
    pub async fn join(&mut self) -> Result<()> {
        self.lifecycle.join().await
    }

    /// Run until `signal` resolves, then drain and stop
    pub async fn run<S>(mut self, signal: S) -> Result<()>
    where
        S: Future<Output = Result<&'static str>>,
    {
        info!("{} ({}) started", PROGRAM_NAME, crate::VERSION);
        info!("Application running in region: {}", self.config.region);

        if self.state() == LifecycleState::Created {
            self.listen().await?;
        }
        self.start().await?;

        // the processor drains on every exit path, including a failed signal wait
        let signal = signal.await;
        match &signal {
            Ok(name) => info!("caught {} signal", name),
            Err(e) => error!("Waiting for a termination signal failed: {}", e),
        }

        self.stop()?;
        self.join().await?;
        info!("{} ({}) stopped", PROGRAM_NAME, crate::VERSION);
        signal.map(|_| ())
    }
}

// =============================================================================
// Termination Signals
// =============================================================================

/// Wait for SIGINT or SIGTERM, returning the signal name
#[cfg(unix)]
pub async fn shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

/// Wait for Ctrl-C, returning the signal name
#[cfg(not(unix))]
pub async fn shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster_service::MockClusterServiceClient;
    use crate::database::MockDatabaseClient;
    use crate::domain::ports::DatabaseClient;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct CountingDatabase {
        probes: AtomicUsize,
    }

    #[async_trait]
    impl DatabaseClient for CountingDatabase {
        async fn connection_test(&self) -> Result<String> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            Err(Error::Database("unreachable".into()))
        }
    }

    fn local_config() -> FrontendConfig {
        FrontendConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            region: "eastus".into(),
            ..Default::default()
        }
    }

    fn frontend(database: DatabaseClientRef) -> Frontend {
        Frontend::new(
            local_config(),
            Arc::new(MockClusterServiceClient::new()),
            database,
        )
    }

    #[test]
    fn test_default_config() {
        let config = FrontendConfig::default();
        assert_eq!(config.port, 8443);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8443");
    }

    #[tokio::test]
    async fn test_lifecycle_serves_until_stopped() {
        let database = Arc::new(CountingDatabase::default());
        let mut frontend = frontend(database.clone());
        assert_eq!(frontend.state(), LifecycleState::Created);

        let addr = frontend.listen().await.unwrap();
        assert_eq!(frontend.state(), LifecycleState::Listening);

        // a failing probe does not block startup
        frontend.start().await.unwrap();
        assert_eq!(frontend.state(), LifecycleState::Running);
        assert_eq!(database.probes.load(Ordering::SeqCst), 1);

        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .unwrap();
        let body = http
            .get(format!("http://{}/healthz", addr))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");

        frontend.stop().unwrap();
        assert_eq!(frontend.state(), LifecycleState::Draining);
        frontend.join().await.unwrap();
        assert_eq!(frontend.state(), LifecycleState::Stopped);
        assert_eq!(database.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let mut frontend = Frontend::new(
            FrontendConfig {
                port,
                ..local_config()
            },
            Arc::new(MockClusterServiceClient::new()),
            Arc::new(MockDatabaseClient),
        );
        assert_matches!(frontend.listen().await, Err(Error::Io(_)));
        assert_eq!(frontend.state(), LifecycleState::Created);
    }

    #[tokio::test]
    async fn test_start_requires_listener() {
        let mut frontend = frontend(Arc::new(MockDatabaseClient));
        assert_matches!(
            frontend.start().await,
            Err(Error::InvalidTransition {
                from: LifecycleState::Created,
                to: LifecycleState::Running,
            })
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_signal() {
        let frontend = frontend(Arc::new(MockDatabaseClient));
        let (signal_tx, signal_rx) = oneshot::channel::<()>();

        let run = tokio::spawn(frontend.run(async move {
            let _ = signal_rx.await;
            Ok::<_, Error>("SIGTERM")
        }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!run.is_finished());

        signal_tx.send(()).unwrap();
        run.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_run_drains_when_signal_wait_fails() {
        let mut frontend = frontend(Arc::new(MockDatabaseClient));
        let addr = frontend.listen().await.unwrap();

        let result = frontend
            .run(async { Err::<&'static str, _>(Error::Internal("no signal handler".into())) })
            .await;
        assert_matches!(result, Err(Error::Internal(_)));

        // the listener was closed by the drained processor
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        assert!(http
            .get(format!("http://{}/healthz", addr))
            .send()
            .await
            .is_err());
    }
}

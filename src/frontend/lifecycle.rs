//! Service lifecycle
//!
//! Linear state machine `Created -> Listening -> Running -> Draining -> Stopped`
//! plus the stop/join protocol between the controller and the processor task:
//! the controller cancels a one-shot stop token exactly once, then blocks on
//! the processor's join handle until the processor has observed the token and
//! returned.

use crate::error::{Error, Result};
use std::fmt;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Lifecycle states of the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Created,
    Listening,
    Running,
    Draining,
    Stopped,
}

impl LifecycleState {
    /// The only state reachable from this one
    pub fn next(self) -> Option<LifecycleState> {
        match self {
            LifecycleState::Created => Some(LifecycleState::Listening),
            LifecycleState::Listening => Some(LifecycleState::Running),
            LifecycleState::Running => Some(LifecycleState::Draining),
            LifecycleState::Draining => Some(LifecycleState::Stopped),
            LifecycleState::Stopped => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Created => write!(f, "created"),
            LifecycleState::Listening => write!(f, "listening"),
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Draining => write!(f, "draining"),
            LifecycleState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Controller side of the lifecycle
pub struct Lifecycle {
    state: watch::Sender<LifecycleState>,
    stop: CancellationToken,
    processor: Option<JoinHandle<Result<()>>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Created);
        Self {
            state,
            stop: CancellationToken::new(),
            processor: None,
        }
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Token cancelled when draining begins
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    fn advance(&self, to: LifecycleState) -> Result<()> {
        let mut result = Ok(());
        self.state.send_if_modified(|current| {
            if current.next() == Some(to) {
                *current = to;
                true
            } else {
                result = Err(Error::InvalidTransition { from: *current, to });
                false
            }
        });
        if result.is_ok() {
            debug!("Lifecycle -> {}", to);
        }
        result
    }

    /// Created -> Listening, once the listener is bound
    pub fn mark_listening(&self) -> Result<()> {
        self.advance(LifecycleState::Listening)
    }

    /// Listening -> Running: spawn the processor with the stop token
    pub fn spawn<F, Fut>(&mut self, processor: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.advance(LifecycleState::Running)?;
        let task = processor(self.stop.clone());
        self.processor = Some(tokio::spawn(task));
        Ok(())
    }

    /// Running -> Draining: signal the processor to stop
    ///
    /// Only the first call succeeds.
    pub fn stop(&self) -> Result<()> {
        self.advance(LifecycleState::Draining)?;
        info!("Draining: waiting for in-flight work to finish");
        self.stop.cancel();
        Ok(())
    }

    /// Draining -> Stopped: wait for the processor to return
    ///
    /// Returns the processor's own result once it has exited.
    pub async fn join(&mut self) -> Result<()> {
        let current = self.state();
        if current != LifecycleState::Draining {
            return Err(Error::InvalidTransition {
                from: current,
                to: LifecycleState::Stopped,
            });
        }

        let result = match self.processor.take() {
            Some(handle) => handle
                .await
                .unwrap_or_else(|e| Err(Error::Internal(format!("processor task failed: {}", e)))),
            None => Ok(()),
        };

        // a panicked processor has still exited
        self.advance(LifecycleState::Stopped)?;
        result
    }
}

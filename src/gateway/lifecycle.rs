//! Engine lifecycle state machine.
//!
//! The manager is the only component that holds or mutates the lifecycle
//! state; everything else reads the derived engine handle, re-fetched fresh
//! per request.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::engine::{EngineFactory, EngineHandle};
use crate::error::{GatewayError, Result};

enum LifecycleState {
    Uninitialized,
    Initialized(Arc<dyn EngineHandle>),
    /// A failed initialize; retryable, keeps the reason for diagnostics.
    Failed { reason: String },
}

/// Result of a successful first initialize.
#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub trader_id: String,
}

pub struct LifecycleManager {
    state: Mutex<LifecycleState>,
    factory: Arc<dyn EngineFactory>,
}

impl LifecycleManager {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            state: Mutex::new(LifecycleState::Uninitialized),
            factory,
        }
    }

    /// Build the engine handle exactly once.
    ///
    /// The whole transition holds the state lock, so concurrent callers
    /// cannot both construct a handle; losers observe `AlreadyInitialized`
    /// with the winner's trader identity. A failed build leaves the state
    /// retryable and discards any partial handle.
    pub async fn initialize(&self, config: &EngineConfig) -> Result<InitOutcome> {
        let mut state = self.state.lock().await;

        if let LifecycleState::Initialized(handle) = &*state {
            let trader_id = handle.trader_id();
            warn!(trader_id = %trader_id, "initialize called on an already initialized engine");
            return Err(GatewayError::AlreadyInitialized { trader_id });
        }
        if let LifecycleState::Failed { reason } = &*state {
            info!(last_error = %reason, "retrying initialize after earlier failure");
        }

        match self.factory.build(config).await {
            Ok(handle) => {
                let trader_id = handle.trader_id();
                *state = LifecycleState::Initialized(handle);
                info!(trader_id = %trader_id, "trading engine initialized");
                Ok(InitOutcome { trader_id })
            }
            Err(e) => {
                error!(error = %e, "failed to initialize trading engine");
                *state = LifecycleState::Failed {
                    reason: e.to_string(),
                };
                Err(GatewayError::Engine(format!(
                    "failed to initialize trading engine: {e}"
                )))
            }
        }
    }

    /// Current engine handle, or `NotInitialized`.
    pub async fn require_initialized(&self) -> Result<Arc<dyn EngineHandle>> {
        match &*self.state.lock().await {
            LifecycleState::Initialized(handle) => Ok(Arc::clone(handle)),
            LifecycleState::Uninitialized | LifecycleState::Failed { .. } => {
                Err(GatewayError::NotInitialized)
            }
        }
    }
}

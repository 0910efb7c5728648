use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the gateway.
///
/// Every request-path failure resolves to one of these variants; the
/// response mapper turns them into error (or warning) envelopes, so no
/// failure in the core is ever fatal to the process.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("trading engine not initialized; call initialize first")]
    NotInitialized,

    /// Idempotent re-initialize. Rendered as a warning envelope, not an
    /// error, carrying the existing trader identity.
    #[error("trading engine already initialized (trader {trader_id})")]
    AlreadyInitialized { trader_id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("engine error: {0}")]
    Engine(String),
}

/// Result type alias for GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Stable failure taxonomy attached to non-success envelopes so callers
/// can branch without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotInitialized,
    AlreadyInitialized,
    ValidationError,
    NotFound,
    EngineError,
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::NotInitialized => ErrorKind::NotInitialized,
            GatewayError::AlreadyInitialized { .. } => ErrorKind::AlreadyInitialized,
            GatewayError::Validation(_) => ErrorKind::ValidationError,
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::Engine(_) => ErrorKind::EngineError,
        }
    }

    /// Expected control states are logged at info/warn only; everything
    /// else carries full diagnostic context at error level.
    pub fn is_expected_control_state(&self) -> bool {
        matches!(
            self,
            GatewayError::NotInitialized | GatewayError::AlreadyInitialized { .. }
        )
    }
}

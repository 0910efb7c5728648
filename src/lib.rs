//! Tiller: a trading command gateway.
//!
//! Exposes a trading engine's control surface (lifecycle, order
//! submission, cancellation, account/position/order queries) as named,
//! schema-validated operations over a request/response transport. The
//! engine itself is opaque behind [`engine::EngineHandle`]; the gateway
//! validates, translates, and wraps every result in a uniform envelope.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod transport;
pub mod validation;

pub use config::{EngineConfig, GatewayConfig};
pub use error::{ErrorKind, GatewayError, Result};
pub use gateway::{Gateway, Operation, ResponseEnvelope};
pub use validation::ValidatedCommand;

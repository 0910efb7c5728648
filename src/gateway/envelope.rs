//! Response mapping: every request resolves to exactly one envelope.
//!
//! Monetary and quantity fields serialize as exact decimal strings; the
//! record types in [`crate::engine`] carry the serde attributes, so the
//! precision guarantee holds for every payload built here.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ErrorKind, GatewayError, Result};

use super::translate::CommandOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Warning,
    Error,
}

/// The uniform `{status, message, payload?}` structure returned for every
/// operation. The only value that crosses back to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub status: EnvelopeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ResponseEnvelope {
    pub fn success(message: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: message.into(),
            error_kind: None,
            payload,
        }
    }

    pub fn warning(message: impl Into<String>, kind: ErrorKind, payload: Option<Value>) -> Self {
        Self {
            status: EnvelopeStatus::Warning,
            message: message.into(),
            error_kind: Some(kind),
            payload,
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: message.into(),
            error_kind: Some(kind),
            payload: None,
        }
    }

    pub fn from_result(result: Result<CommandOutput>) -> Self {
        match result {
            Ok(output) => render(output),
            Err(err) => Self::from_error(&err),
        }
    }

    pub fn from_error(err: &GatewayError) -> Self {
        match err {
            // Idempotent re-initialize: a warning carrying the existing
            // trader identity, not an error.
            GatewayError::AlreadyInitialized { trader_id } => {
                Self::warning(
                    err.to_string(),
                    ErrorKind::AlreadyInitialized,
                    Some(json!({ "trader_id": trader_id })),
                )
            }
            _ => {
                if err.is_expected_control_state() {
                    info!(error = %err, "request refused");
                } else {
                    warn!(error = %err, "request failed");
                }
                Self::error(err.kind(), err.to_string())
            }
        }
    }
}

fn render(output: CommandOutput) -> ResponseEnvelope {
    match output {
        CommandOutput::Initialized { trader_id } => ResponseEnvelope::success(
            "trading engine initialized",
            Some(json!({ "trader_id": trader_id })),
        ),
        CommandOutput::VenueConnected { venue } => ResponseEnvelope::success(
            format!("successfully connected to venue {venue}"),
            None,
        ),
        CommandOutput::Instruments(instruments) => ResponseEnvelope::success(
            format!("found {} instruments", instruments.len()),
            Some(json!({ "instruments": instruments })),
        ),
        CommandOutput::OrderSubmitted {
            order_id,
            order_type,
        } => ResponseEnvelope::success(
            format!("{} order submitted", order_type.to_string().to_lowercase()),
            Some(json!({ "order_id": order_id })),
        ),
        CommandOutput::CancelRequested { order_id } => ResponseEnvelope::success(
            format!("cancellation requested for order {order_id}"),
            None,
        ),
        CommandOutput::Account(balances) => ResponseEnvelope::success(
            format!("retrieved {} balance entries", balances.len()),
            Some(json!({ "balances": balances })),
        ),
        CommandOutput::Positions(positions) => ResponseEnvelope::success(
            format!("retrieved {} positions", positions.len()),
            Some(json!({ "positions": positions })),
        ),
        CommandOutput::OrderStatuses { orders, not_found } => ResponseEnvelope::success(
            format!("retrieved status for {} orders", orders.len()),
            Some(json!({ "orders": orders, "not_found": not_found })),
        ),
    }
}

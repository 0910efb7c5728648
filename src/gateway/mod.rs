//! The trading command gateway.
//!
//! Control flow per request: resolve the operation name against the fixed
//! registry, check the lifecycle precondition, validate and normalize the
//! parameters, translate into exactly one engine call, and map the result
//! into the response envelope. Every failure resolves to an envelope; the
//! gateway stays usable after any failed operation.

mod envelope;
mod idgen;
mod lifecycle;
mod registry;
mod translate;

pub use envelope::{EnvelopeStatus, ResponseEnvelope};
pub use idgen::ClientOrderIdGenerator;
pub use lifecycle::{InitOutcome, LifecycleManager};
pub use registry::Operation;
pub use translate::CommandOutput;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::engine::EngineFactory;
use crate::validation;

pub struct Gateway {
    lifecycle: LifecycleManager,
    ids: ClientOrderIdGenerator,
}

impl Gateway {
    pub fn new(config: &GatewayConfig, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            lifecycle: LifecycleManager::new(factory),
            ids: ClientOrderIdGenerator::new(config.orders.id_prefix.clone()),
        }
    }

    /// Handle one named operation invocation.
    pub async fn handle(&self, operation_name: &str, raw_params: Value) -> ResponseEnvelope {
        let operation = match operation_name.parse::<Operation>() {
            Ok(op) => op,
            Err(e) => return ResponseEnvelope::from_error(&e),
        };
        debug!(operation = %operation, "handling operation");

        let params = match raw_params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return ResponseEnvelope::from_error(&crate::error::GatewayError::Validation(
                    format!("params must be an object, got {other}"),
                ))
            }
        };

        // Lifecycle precondition comes before validation: an uninitialized
        // engine refuses every other operation regardless of its params.
        if !operation.allowed_uninitialized() {
            if let Err(e) = self.lifecycle.require_initialized().await {
                return ResponseEnvelope::from_error(&e);
            }
        }

        let command = match validation::validate(operation, &params) {
            Ok(command) => command,
            Err(e) => return ResponseEnvelope::from_error(&e),
        };

        ResponseEnvelope::from_result(
            translate::execute(command, &self.lifecycle, &self.ids).await,
        )
    }

    /// Names of all registered operations, in registry order.
    pub fn operations() -> impl Iterator<Item = &'static str> {
        Operation::ALL.iter().map(Operation::as_str)
    }
}

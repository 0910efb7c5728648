//! Parameter validation and normalization.
//!
//! Turns each operation's untyped parameter map into a [`ValidatedCommand`]
//! exactly once, at the boundary. Validation is pure and has no side
//! effects: it short-circuits on the first missing or malformed field, so
//! nothing ever reaches the engine on bad input.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::domain::{
    ClientOrderId, InstrumentId, OrderSide, TimeInForce, Venue, VenueCredentials,
};
use crate::error::{GatewayError, Result};
use crate::gateway::Operation;

/// One well-typed domain command per request. Immutable once constructed.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Initialize(EngineConfig),
    Connect {
        venue: Venue,
        credentials: VenueCredentials,
    },
    InstrumentsQuery {
        venue: Option<Venue>,
        symbol: Option<String>,
    },
    SubmitMarketOrder {
        instrument_id: InstrumentId,
        side: OrderSide,
        quantity: Decimal,
        client_order_id: Option<ClientOrderId>,
    },
    SubmitLimitOrder {
        instrument_id: InstrumentId,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
        client_order_id: Option<ClientOrderId>,
    },
    CancelOrder {
        client_order_id: ClientOrderId,
    },
    AccountQuery {
        venue: Venue,
    },
    PositionQuery {
        venue: Venue,
        instrument_id: Option<InstrumentId>,
    },
    OrderStatusQuery {
        client_order_ids: Vec<ClientOrderId>,
    },
}

/// Validate and normalize `raw_params` for `operation`.
pub fn validate(operation: Operation, params: &Map<String, Value>) -> Result<ValidatedCommand> {
    match operation {
        Operation::Initialize => validate_initialize(params),
        Operation::ConnectVenue => Ok(ValidatedCommand::Connect {
            venue: Venue::new(require_str(params, "venue")?),
            credentials: require_credentials(params, "credentials")?,
        }),
        Operation::GetInstruments => Ok(ValidatedCommand::InstrumentsQuery {
            venue: optional_str(params, "venue")?.map(Venue::new),
            symbol: optional_str(params, "symbol")?.map(str::to_string),
        }),
        Operation::SubmitMarketOrder => Ok(ValidatedCommand::SubmitMarketOrder {
            instrument_id: require_str(params, "instrument_id")?.parse()?,
            side: require_str(params, "side")?.parse()?,
            quantity: require_positive_decimal(params, "quantity")?,
            client_order_id: optional_str(params, "client_order_id")?
                .map(ClientOrderId::new),
        }),
        Operation::SubmitLimitOrder => Ok(ValidatedCommand::SubmitLimitOrder {
            instrument_id: require_str(params, "instrument_id")?.parse()?,
            side: require_str(params, "side")?.parse()?,
            quantity: require_positive_decimal(params, "quantity")?,
            price: require_positive_decimal(params, "price")?,
            time_in_force: match optional_str(params, "time_in_force")? {
                Some(raw) => raw.parse()?,
                None => TimeInForce::default(),
            },
            client_order_id: optional_str(params, "client_order_id")?
                .map(ClientOrderId::new),
        }),
        Operation::CancelOrder => Ok(ValidatedCommand::CancelOrder {
            client_order_id: ClientOrderId::new(require_str(params, "client_order_id")?),
        }),
        Operation::GetAccountInfo => Ok(ValidatedCommand::AccountQuery {
            venue: Venue::new(require_str(params, "venue")?),
        }),
        Operation::GetPositions => Ok(ValidatedCommand::PositionQuery {
            venue: Venue::new(require_str(params, "venue")?),
            instrument_id: optional_str(params, "instrument_id")?
                .map(InstrumentId::from_str)
                .transpose()?,
        }),
        Operation::GetOrderStatus => Ok(ValidatedCommand::OrderStatusQuery {
            client_order_ids: require_id_list(params, "client_order_ids")?,
        }),
    }
}

fn validate_initialize(params: &Map<String, Value>) -> Result<ValidatedCommand> {
    // Engine configuration may arrive nested under `config` or as the
    // parameter object itself.
    let source = match params.get("config") {
        Some(value) => value.clone(),
        None => Value::Object(params.clone()),
    };
    let config: EngineConfig = serde_json::from_value(source)
        .map_err(|e| GatewayError::Validation(format!("invalid engine configuration: {e}")))?;
    Ok(ValidatedCommand::Initialize(config))
}

fn require_str<'a>(params: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    match params.get(field) {
        None | Some(Value::Null) => Err(missing(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(missing(field)),
        Some(Value::String(s)) => Ok(s.trim()),
        Some(other) => Err(GatewayError::Validation(format!(
            "invalid {field}: expected a string, got {other}"
        ))),
    }
}

fn optional_str<'a>(params: &'a Map<String, Value>, field: &str) -> Result<Option<&'a str>> {
    match params.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim())),
        Some(other) => Err(GatewayError::Validation(format!(
            "invalid {field}: expected a string, got {other}"
        ))),
    }
}

/// Parse a quantity/price field as an exact decimal. Accepts a decimal
/// string or a JSON number; the number's literal text is used directly
/// (serde_json is built with `arbitrary_precision`), so the value never
/// passes through binary floating point.
fn require_decimal(params: &Map<String, Value>, field: &str) -> Result<Decimal> {
    let value = params.get(field).ok_or_else(|| missing(field))?;
    let text = match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::String(_) | Value::Null => return Err(missing(field)),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(GatewayError::Validation(format!(
                "invalid {field}: expected a decimal string or number, got {other}"
            )))
        }
    };
    Decimal::from_str(&text).map_err(|_| {
        GatewayError::Validation(format!("invalid {field} '{text}': not a decimal number"))
    })
}

fn require_positive_decimal(params: &Map<String, Value>, field: &str) -> Result<Decimal> {
    let value = require_decimal(params, field)?;
    if value <= Decimal::ZERO {
        return Err(GatewayError::Validation(format!(
            "invalid {field} '{value}': must be positive"
        )));
    }
    Ok(value)
}

fn require_credentials(params: &Map<String, Value>, field: &str) -> Result<VenueCredentials> {
    match params.get(field) {
        None | Some(Value::Null) => Err(missing(field)),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()).map_err(|_| {
            GatewayError::Validation(format!(
                "invalid {field}: expected an object with string values"
            ))
        }),
        Some(_) => Err(GatewayError::Validation(format!(
            "invalid {field}: expected an object with string values"
        ))),
    }
}

fn require_id_list(params: &Map<String, Value>, field: &str) -> Result<Vec<ClientOrderId>> {
    let items = match params.get(field) {
        None | Some(Value::Null) => return Err(missing(field)),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(GatewayError::Validation(format!(
                "invalid {field}: expected a list of strings, got {other}"
            )))
        }
    };
    if items.is_empty() {
        return Err(GatewayError::Validation(format!(
            "invalid {field}: list must not be empty"
        )));
    }
    items
        .iter()
        .map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Ok(ClientOrderId::new(s.trim())),
            other => Err(GatewayError::Validation(format!(
                "invalid {field}: expected a list of strings, got element {other}"
            ))),
        })
        .collect()
}

fn missing(field: &str) -> GatewayError {
    GatewayError::Validation(format!("missing required parameter: {field}"))
}

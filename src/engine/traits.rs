use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::domain::{
    ClientOrderId, InstrumentId, OrderSide, OrderStatus, OrderType, TimeInForce, Venue,
    VenueCredentials,
};

/// Failures surfaced by the engine behind the handle.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("venue rejected request: {0}")]
    Rejected(String),

    #[error("connectivity failure: {0}")]
    Connectivity(String),

    #[error("engine failure: {0}")]
    Internal(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Argument record for a single order submission. Market and limit orders
/// differ only in the presence of `price`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCommand {
    pub client_order_id: ClientOrderId,
    pub instrument_id: InstrumentId,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub time_in_force: TimeInForce,
}

/// Account balance entry for one asset at a venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub asset: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub available: Decimal,
}

/// Open position at a venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub instrument_id: InstrumentId,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub average_entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub unrealized_pnl: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub realized_pnl: Decimal,
}

/// Point-in-time view of an order held by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub client_order_id: ClientOrderId,
    pub venue_order_id: Option<String>,
    pub instrument_id: InstrumentId,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub filled_quantity: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub average_fill_price: Option<Decimal>,
    pub ts_created: DateTime<Utc>,
    pub ts_updated: DateTime<Utc>,
}

/// Opaque handle onto the running trading engine.
///
/// All trading logic (routing, risk, matching, venue connectivity) lives
/// behind this trait; the gateway only builds argument records and relays
/// results. Calls are synchronous bounded-latency operations from the
/// gateway's perspective.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineHandle: Send + Sync {
    /// Identity of the trader context this engine runs under.
    fn trader_id(&self) -> String;

    async fn connect_venue(
        &self,
        venue: &Venue,
        credentials: &VenueCredentials,
    ) -> EngineResult<()>;

    /// All instruments currently known to the engine.
    async fn instruments(&self) -> EngineResult<Vec<InstrumentId>>;

    async fn submit_order(&self, command: &OrderCommand) -> EngineResult<()>;

    async fn cancel_order(&self, client_order_id: &ClientOrderId) -> EngineResult<()>;

    async fn account_balances(&self, venue: &Venue) -> EngineResult<Vec<AccountBalance>>;

    async fn positions(&self, venue: &Venue) -> EngineResult<Vec<Position>>;

    /// Records for the requested ids. Unknown ids are simply absent from
    /// the result; the caller reconciles.
    async fn orders(&self, client_order_ids: &[ClientOrderId]) -> EngineResult<Vec<OrderRecord>>;
}

impl std::fmt::Debug for dyn EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EngineHandle")
    }
}

/// Builds the engine handle exactly once per process, on `initialize`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn build(&self, config: &EngineConfig) -> EngineResult<Arc<dyn EngineHandle>>;
}

//! In-memory paper engine.
//!
//! Default engine wiring for the binary: records orders and connections
//! without routing anything to a venue, the same role a dry-run client
//! plays in live trading. No matching or risk logic lives here.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::domain::{ClientOrderId, InstrumentId, OrderStatus, Venue, VenueCredentials};

use super::traits::{
    AccountBalance, EngineError, EngineFactory, EngineHandle, EngineResult, OrderCommand,
    OrderRecord, Position,
};

pub struct PaperEngine {
    trader_id: String,
    instruments: Vec<InstrumentId>,
    connected_venues: Mutex<HashSet<Venue>>,
    orders: Mutex<HashMap<ClientOrderId, OrderRecord>>,
}

impl PaperEngine {
    fn new(config: &EngineConfig) -> EngineResult<Self> {
        let instruments = config
            .instruments
            .iter()
            .map(|raw| {
                InstrumentId::from_str(raw).map_err(|e| {
                    EngineError::Internal(format!("bad instrument in engine config: {e}"))
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Self {
            trader_id: config.trader_id.clone(),
            instruments,
            connected_venues: Mutex::new(HashSet::new()),
            orders: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl EngineHandle for PaperEngine {
    fn trader_id(&self) -> String {
        self.trader_id.clone()
    }

    async fn connect_venue(
        &self,
        venue: &Venue,
        _credentials: &VenueCredentials,
    ) -> EngineResult<()> {
        self.connected_venues.lock().await.insert(venue.clone());
        info!(venue = %venue, "paper engine connected venue");
        Ok(())
    }

    async fn instruments(&self) -> EngineResult<Vec<InstrumentId>> {
        Ok(self.instruments.clone())
    }

    async fn submit_order(&self, command: &OrderCommand) -> EngineResult<()> {
        let now = Utc::now();
        let record = OrderRecord {
            client_order_id: command.client_order_id.clone(),
            venue_order_id: None,
            instrument_id: command.instrument_id.clone(),
            side: command.side,
            order_type: command.order_type,
            status: OrderStatus::Submitted,
            quantity: command.quantity,
            price: command.price,
            filled_quantity: Decimal::ZERO,
            average_fill_price: None,
            ts_created: now,
            ts_updated: now,
        };
        self.orders
            .lock()
            .await
            .insert(command.client_order_id.clone(), record);
        debug!(order_id = %command.client_order_id, "paper engine recorded order");
        Ok(())
    }

    async fn cancel_order(&self, client_order_id: &ClientOrderId) -> EngineResult<()> {
        let mut orders = self.orders.lock().await;
        let record = orders
            .get_mut(client_order_id)
            .ok_or_else(|| EngineError::OrderNotFound(client_order_id.to_string()))?;
        record.status = OrderStatus::Cancelled;
        record.ts_updated = Utc::now();
        Ok(())
    }

    async fn account_balances(&self, _venue: &Venue) -> EngineResult<Vec<AccountBalance>> {
        // Paper engine holds no funds
        Ok(Vec::new())
    }

    async fn positions(&self, _venue: &Venue) -> EngineResult<Vec<Position>> {
        // Orders never fill, so no positions accrue
        Ok(Vec::new())
    }

    async fn orders(&self, client_order_ids: &[ClientOrderId]) -> EngineResult<Vec<OrderRecord>> {
        let orders = self.orders.lock().await;
        Ok(client_order_ids
            .iter()
            .filter_map(|id| orders.get(id).cloned())
            .collect())
    }
}

/// Factory producing [`PaperEngine`] handles.
#[derive(Debug, Default)]
pub struct PaperEngineFactory;

#[async_trait]
impl EngineFactory for PaperEngineFactory {
    async fn build(&self, config: &EngineConfig) -> EngineResult<Arc<dyn EngineHandle>> {
        let engine = PaperEngine::new(config)?;
        info!(trader_id = %engine.trader_id, "paper engine built");
        Ok(Arc::new(engine))
    }
}

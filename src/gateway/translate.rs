//! Command translation: one engine call per validated command.
//!
//! The translator builds the engine call's argument record and nothing
//! else; it obtains the engine handle fresh per command so a handle
//! replaced between requests is always observed consistently.

use tracing::{error, info, warn};

use crate::domain::{ClientOrderId, InstrumentId, OrderType, TimeInForce, Venue};
use crate::engine::{
    AccountBalance, EngineError, OrderCommand, OrderRecord, Position,
};
use crate::error::{GatewayError, Result};
use crate::validation::ValidatedCommand;

use super::idgen::ClientOrderIdGenerator;
use super::lifecycle::LifecycleManager;

/// Typed result of a translated command, rendered into the envelope by the
/// response mapper.
#[derive(Debug)]
pub enum CommandOutput {
    Initialized {
        trader_id: String,
    },
    VenueConnected {
        venue: Venue,
    },
    Instruments(Vec<InstrumentId>),
    OrderSubmitted {
        order_id: ClientOrderId,
        order_type: OrderType,
    },
    CancelRequested {
        order_id: ClientOrderId,
    },
    Account(Vec<AccountBalance>),
    Positions(Vec<Position>),
    OrderStatuses {
        orders: Vec<OrderRecord>,
        not_found: Vec<ClientOrderId>,
    },
}

pub async fn execute(
    command: ValidatedCommand,
    lifecycle: &LifecycleManager,
    ids: &ClientOrderIdGenerator,
) -> Result<CommandOutput> {
    match command {
        ValidatedCommand::Initialize(config) => {
            let outcome = lifecycle.initialize(&config).await?;
            Ok(CommandOutput::Initialized {
                trader_id: outcome.trader_id,
            })
        }
        ValidatedCommand::Connect { venue, credentials } => {
            let handle = lifecycle.require_initialized().await?;
            info!(venue = %venue, "connecting venue");
            handle
                .connect_venue(&venue, &credentials)
                .await
                .map_err(|e| engine_failure("failed to connect venue", e))?;
            Ok(CommandOutput::VenueConnected { venue })
        }
        ValidatedCommand::InstrumentsQuery { venue, symbol } => {
            let handle = lifecycle.require_initialized().await?;
            let mut instruments = handle
                .instruments()
                .await
                .map_err(|e| engine_failure("failed to get instruments", e))?;
            // Filters are pure post-retrieval refinements
            if let Some(venue) = &venue {
                instruments.retain(|id| id.venue() == venue);
            }
            if let Some(symbol) = &symbol {
                let needle = symbol.to_ascii_uppercase();
                instruments.retain(|id| id.symbol().to_ascii_uppercase().contains(&needle));
            }
            info!(count = instruments.len(), "instruments retrieved");
            Ok(CommandOutput::Instruments(instruments))
        }
        ValidatedCommand::SubmitMarketOrder {
            instrument_id,
            side,
            quantity,
            client_order_id,
        } => {
            let handle = lifecycle.require_initialized().await?;
            let order_id =
                client_order_id.unwrap_or_else(|| ids.generate(&instrument_id));
            let command = OrderCommand {
                client_order_id: order_id.clone(),
                instrument_id,
                side,
                order_type: OrderType::Market,
                quantity,
                price: None,
                time_in_force: TimeInForce::default(),
            };
            info!(
                order_id = %order_id,
                instrument_id = %command.instrument_id,
                side = %side,
                quantity = %quantity,
                "submitting market order"
            );
            handle
                .submit_order(&command)
                .await
                .map_err(|e| engine_failure("failed to submit market order", e))?;
            Ok(CommandOutput::OrderSubmitted {
                order_id,
                order_type: OrderType::Market,
            })
        }
        ValidatedCommand::SubmitLimitOrder {
            instrument_id,
            side,
            quantity,
            price,
            time_in_force,
            client_order_id,
        } => {
            let handle = lifecycle.require_initialized().await?;
            let order_id =
                client_order_id.unwrap_or_else(|| ids.generate(&instrument_id));
            let command = OrderCommand {
                client_order_id: order_id.clone(),
                instrument_id,
                side,
                order_type: OrderType::Limit,
                quantity,
                price: Some(price),
                time_in_force,
            };
            info!(
                order_id = %order_id,
                instrument_id = %command.instrument_id,
                side = %side,
                quantity = %quantity,
                price = %price,
                time_in_force = %time_in_force,
                "submitting limit order"
            );
            handle
                .submit_order(&command)
                .await
                .map_err(|e| engine_failure("failed to submit limit order", e))?;
            Ok(CommandOutput::OrderSubmitted {
                order_id,
                order_type: OrderType::Limit,
            })
        }
        ValidatedCommand::CancelOrder { client_order_id } => {
            let handle = lifecycle.require_initialized().await?;
            info!(order_id = %client_order_id, "submitting cancel");
            handle
                .cancel_order(&client_order_id)
                .await
                .map_err(|e| engine_failure("failed to cancel order", e))?;
            Ok(CommandOutput::CancelRequested {
                order_id: client_order_id,
            })
        }
        ValidatedCommand::AccountQuery { venue } => {
            let handle = lifecycle.require_initialized().await?;
            let balances = handle
                .account_balances(&venue)
                .await
                .map_err(|e| engine_failure("failed to get account info", e))?;
            info!(venue = %venue, count = balances.len(), "balances retrieved");
            Ok(CommandOutput::Account(balances))
        }
        ValidatedCommand::PositionQuery {
            venue,
            instrument_id,
        } => {
            let handle = lifecycle.require_initialized().await?;
            let mut positions = handle
                .positions(&venue)
                .await
                .map_err(|e| engine_failure("failed to get positions", e))?;
            if let Some(instrument_id) = &instrument_id {
                positions.retain(|p| &p.instrument_id == instrument_id);
            }
            info!(venue = %venue, count = positions.len(), "positions retrieved");
            Ok(CommandOutput::Positions(positions))
        }
        ValidatedCommand::OrderStatusQuery { client_order_ids } => {
            let handle = lifecycle.require_initialized().await?;
            let orders = handle
                .orders(&client_order_ids)
                .await
                .map_err(|e| engine_failure("failed to get order status", e))?;
            let found: std::collections::HashSet<&str> =
                orders.iter().map(|o| o.client_order_id.as_str()).collect();
            let not_found: Vec<ClientOrderId> = client_order_ids
                .iter()
                .filter(|id| !found.contains(id.as_str()))
                .cloned()
                .collect();
            if !not_found.is_empty() {
                warn!(?not_found, "order status requested for unknown ids");
            }
            Ok(CommandOutput::OrderStatuses { orders, not_found })
        }
    }
}

/// Re-express an engine failure in the gateway taxonomy. Unknown-identifier
/// failures map to `NotFound`; everything else is an `EngineError` logged
/// with full context here, at the translation boundary.
fn engine_failure(context: &str, err: EngineError) -> GatewayError {
    match err {
        EngineError::OrderNotFound(id) => GatewayError::NotFound(format!("order {id}")),
        other => {
            error!(error = %other, "{context}");
            GatewayError::Engine(format!("{context}: {other}"))
        }
    }
}

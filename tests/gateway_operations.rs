//! End-to-end gateway tests against a counting stub engine.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use tiller::config::{EngineConfig, GatewayConfig};
use tiller::domain::{
    ClientOrderId, InstrumentId, OrderSide, OrderStatus, OrderType, Venue, VenueCredentials,
};
use tiller::engine::{
    AccountBalance, EngineError, EngineFactory, EngineHandle, EngineResult, OrderCommand,
    OrderRecord, Position,
};
use tiller::gateway::Gateway;

/// Test double that records every call so tests can assert the engine was
/// (or was not) reached.
#[derive(Default)]
struct StubEngine {
    submitted: tokio::sync::Mutex<Vec<OrderCommand>>,
    submit_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl StubEngine {
    fn record(command: &OrderCommand) -> OrderRecord {
        let now = Utc::now();
        OrderRecord {
            client_order_id: command.client_order_id.clone(),
            venue_order_id: Some(format!("V-{}", command.client_order_id)),
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
        }
    }
}

#[async_trait]
impl EngineHandle for StubEngine {
    fn trader_id(&self) -> String {
        "TRADER-001".to_string()
    }

    async fn connect_venue(
        &self,
        _venue: &Venue,
        _credentials: &VenueCredentials,
    ) -> EngineResult<()> {
        Ok(())
    }

    async fn instruments(&self) -> EngineResult<Vec<InstrumentId>> {
        Ok(vec![
            InstrumentId::from_str("BTCUSDT.BINANCE").expect("instrument"),
            InstrumentId::from_str("ETHUSDT.BINANCE").expect("instrument"),
        ])
    }

    async fn submit_order(&self, command: &OrderCommand) -> EngineResult<()> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().await.push(command.clone());
        Ok(())
    }

    async fn cancel_order(&self, client_order_id: &ClientOrderId) -> EngineResult<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        let submitted = self.submitted.lock().await;
        if submitted
            .iter()
            .any(|c| c.client_order_id == *client_order_id)
        {
            Ok(())
        } else {
            Err(EngineError::OrderNotFound(client_order_id.to_string()))
        }
    }

    async fn account_balances(&self, _venue: &Venue) -> EngineResult<Vec<AccountBalance>> {
        Ok(vec![AccountBalance {
            asset: "USDT".to_string(),
            currency: "USDT".to_string(),
            total: dec!(1000.00000000),
            available: dec!(999.50000000),
        }])
    }

    async fn positions(&self, _venue: &Venue) -> EngineResult<Vec<Position>> {
        Ok(vec![
            Position {
                instrument_id: InstrumentId::from_str("BTCUSDT.BINANCE").expect("instrument"),
                quantity: dec!(1.50000000),
                average_entry_price: dec!(42000.10),
                unrealized_pnl: dec!(12.34),
                realized_pnl: dec!(0.00),
            },
            Position {
                instrument_id: InstrumentId::from_str("ETHUSDT.BINANCE").expect("instrument"),
                quantity: dec!(2),
                average_entry_price: dec!(2500),
                unrealized_pnl: dec!(-1.10),
                realized_pnl: dec!(5.00),
            },
        ])
    }

    async fn orders(&self, client_order_ids: &[ClientOrderId]) -> EngineResult<Vec<OrderRecord>> {
        let submitted = self.submitted.lock().await;
        Ok(client_order_ids
            .iter()
            .filter_map(|id| {
                submitted
                    .iter()
                    .find(|c| c.client_order_id == *id)
                    .map(Self::record)
            })
            .collect())
    }
}

struct StubFactory {
    engine: Arc<StubEngine>,
    build_calls: AtomicUsize,
}

impl StubFactory {
    fn new(engine: Arc<StubEngine>) -> Self {
        Self {
            engine,
            build_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EngineFactory for StubFactory {
    async fn build(&self, _config: &EngineConfig) -> EngineResult<Arc<dyn EngineHandle>> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.engine.clone())
    }
}

/// Factory whose every build attempt fails.
struct BrokenFactory;

#[async_trait]
impl EngineFactory for BrokenFactory {
    async fn build(&self, _config: &EngineConfig) -> EngineResult<Arc<dyn EngineHandle>> {
        Err(EngineError::Connectivity("venue unreachable".to_string()))
    }
}

struct Fixture {
    gateway: Gateway,
    engine: Arc<StubEngine>,
    factory: Arc<StubFactory>,
}

fn fixture() -> Fixture {
    let engine = Arc::new(StubEngine::default());
    let factory = Arc::new(StubFactory::new(engine.clone()));
    let gateway = Gateway::new(&GatewayConfig::default(), factory.clone());
    Fixture {
        gateway,
        engine,
        factory,
    }
}

async fn initialized() -> Fixture {
    let f = fixture();
    let response = f.gateway.handle("initialize", json!({})).await;
    assert_eq!(status(&response), "success");
    f
}

fn status(envelope: &tiller::ResponseEnvelope) -> String {
    serde_json::to_value(envelope).expect("serialize")["status"]
        .as_str()
        .expect("status string")
        .to_string()
}

fn as_json(envelope: &tiller::ResponseEnvelope) -> Value {
    serde_json::to_value(envelope).expect("serialize")
}

#[tokio::test]
async fn every_operation_except_initialize_requires_initialization() {
    let f = fixture();
    for name in Gateway::operations().filter(|n| *n != "initialize") {
        let response = f.gateway.handle(name, json!({})).await;
        let json = as_json(&response);
        assert_eq!(json["status"], "error", "operation {name}");
        assert_eq!(json["error_kind"], "not_initialized", "operation {name}");
    }
    assert_eq!(f.factory.build_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn initialize_twice_warns_with_unchanged_trader_id() {
    let f = fixture();

    let first = as_json(&f.gateway.handle("initialize", json!({})).await);
    assert_eq!(first["status"], "success");
    assert_eq!(first["payload"]["trader_id"], "TRADER-001");

    let second = as_json(&f.gateway.handle("initialize", json!({})).await);
    assert_eq!(second["status"], "warning");
    assert_eq!(second["error_kind"], "already_initialized");
    assert_eq!(second["payload"]["trader_id"], first["payload"]["trader_id"]);

    assert_eq!(f.factory.build_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_initialize_leaves_gateway_retryable() {
    let gateway = Gateway::new(&GatewayConfig::default(), Arc::new(BrokenFactory));

    let response = as_json(&gateway.handle("initialize", json!({})).await);
    assert_eq!(response["status"], "error");
    assert_eq!(response["error_kind"], "engine_error");

    // Still answers subsequent requests, still uninitialized
    let next = as_json(&gateway.handle("get_instruments", json!({})).await);
    assert_eq!(next["error_kind"], "not_initialized");
}

#[tokio::test]
async fn market_order_lower_case_side_succeeds() {
    let f = initialized().await;
    let response = as_json(
        &f.gateway
            .handle(
                "submit_market_order",
                json!({
                    "instrument_id": "BTCUSDT.BINANCE",
                    "side": "buy",
                    "quantity": "0.01"
                }),
            )
            .await,
    );
    assert_eq!(response["status"], "success");
    assert!(response["payload"]["order_id"].is_string());

    let submitted = f.engine.submitted.lock().await;
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].side, OrderSide::Buy);
    assert_eq!(submitted[0].quantity, dec!(0.01));
    assert_eq!(submitted[0].order_type, OrderType::Market);
}

#[tokio::test]
async fn market_order_with_hold_side_is_a_validation_error() {
    let f = initialized().await;
    let response = as_json(
        &f.gateway
            .handle(
                "submit_market_order",
                json!({
                    "instrument_id": "BTCUSDT.BINANCE",
                    "side": "HOLD",
                    "quantity": "0.01"
                }),
            )
            .await,
    );
    assert_eq!(response["status"], "error");
    assert_eq!(response["error_kind"], "validation_error");
    assert_eq!(f.engine.submit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn limit_order_without_price_never_reaches_the_engine() {
    let f = initialized().await;
    let response = as_json(
        &f.gateway
            .handle(
                "submit_limit_order",
                json!({
                    "instrument_id": "BTCUSDT.BINANCE",
                    "side": "SELL",
                    "quantity": "1.5"
                }),
            )
            .await,
    );
    assert_eq!(response["status"], "error");
    assert_eq!(response["error_kind"], "validation_error");
    assert_eq!(f.engine.submit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generated_order_ids_are_distinct_back_to_back() {
    let f = initialized().await;
    let params = json!({
        "instrument_id": "BTCUSDT.BINANCE",
        "side": "BUY",
        "quantity": "0.01"
    });

    let first = as_json(&f.gateway.handle("submit_market_order", params.clone()).await);
    let second = as_json(&f.gateway.handle("submit_market_order", params).await);
    assert_eq!(first["status"], "success");
    assert_eq!(second["status"], "success");
    assert_ne!(
        first["payload"]["order_id"],
        second["payload"]["order_id"]
    );
}

#[tokio::test]
async fn caller_supplied_order_id_round_trips() {
    let f = initialized().await;
    let response = as_json(
        &f.gateway
            .handle(
                "submit_limit_order",
                json!({
                    "instrument_id": "BTCUSDT.BINANCE",
                    "side": "BUY",
                    "quantity": "0.5",
                    "price": "41000.00",
                    "client_order_id": "my-order-7",
                    "time_in_force": "ioc"
                }),
            )
            .await,
    );
    assert_eq!(response["status"], "success");
    assert_eq!(response["payload"]["order_id"], "my-order-7");

    let submitted = f.engine.submitted.lock().await;
    assert_eq!(submitted[0].price, Some(dec!(41000.00)));
}

#[tokio::test]
async fn cancel_of_known_order_succeeds() {
    let f = initialized().await;
    f.gateway
        .handle(
            "submit_market_order",
            json!({
                "instrument_id": "BTCUSDT.BINANCE",
                "side": "BUY",
                "quantity": "1",
                "client_order_id": "A"
            }),
        )
        .await;

    let response = as_json(
        &f.gateway
            .handle("cancel_order", json!({ "client_order_id": "A" }))
            .await,
    );
    assert_eq!(response["status"], "success");
    assert_eq!(f.engine.cancel_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancel_of_unknown_order_is_not_found() {
    let f = initialized().await;
    let response = as_json(
        &f.gateway
            .handle("cancel_order", json!({ "client_order_id": "ghost" }))
            .await,
    );
    assert_eq!(response["status"], "error");
    assert_eq!(response["error_kind"], "not_found");
}

#[tokio::test]
async fn account_info_serializes_exact_decimal_strings() {
    let f = initialized().await;
    let response = as_json(
        &f.gateway
            .handle("get_account_info", json!({ "venue": "binance" }))
            .await,
    );
    assert_eq!(response["status"], "success");
    let balance = &response["payload"]["balances"][0];
    assert_eq!(balance["asset"], "USDT");
    assert_eq!(balance["total"], "1000.00000000");
    assert_eq!(balance["available"], "999.50000000");
}

#[tokio::test]
async fn positions_round_trip_decimals_exactly() {
    let f = initialized().await;
    let response = as_json(
        &f.gateway
            .handle("get_positions", json!({ "venue": "BINANCE" }))
            .await,
    );
    assert_eq!(response["status"], "success");
    let positions = response["payload"]["positions"]
        .as_array()
        .expect("positions array");
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0]["quantity"], "1.50000000");
    assert_eq!(positions[0]["average_entry_price"], "42000.10");
}

#[tokio::test]
async fn positions_filter_by_instrument_is_client_side() {
    let f = initialized().await;
    let response = as_json(
        &f.gateway
            .handle(
                "get_positions",
                json!({ "venue": "BINANCE", "instrument_id": "ETHUSDT.BINANCE" }),
            )
            .await,
    );
    let positions = response["payload"]["positions"]
        .as_array()
        .expect("positions array");
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0]["instrument_id"], "ETHUSDT.BINANCE");
}

#[tokio::test]
async fn order_status_surfaces_unmatched_ids_in_payload() {
    let f = initialized().await;
    f.gateway
        .handle(
            "submit_market_order",
            json!({
                "instrument_id": "BTCUSDT.BINANCE",
                "side": "BUY",
                "quantity": "1",
                "client_order_id": "A"
            }),
        )
        .await;

    let response = as_json(
        &f.gateway
            .handle("get_order_status", json!({ "client_order_ids": ["A", "B"] }))
            .await,
    );
    assert_eq!(response["status"], "success");
    let orders = response["payload"]["orders"].as_array().expect("orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["client_order_id"], "A");
    assert_eq!(orders[0]["status"], "SUBMITTED");
    assert_eq!(orders[0]["quantity"], "1");
    assert_eq!(response["payload"]["not_found"], json!(["B"]));
}

#[tokio::test]
async fn instruments_query_supports_symbol_filter() {
    let f = initialized().await;
    let response = as_json(
        &f.gateway
            .handle("get_instruments", json!({ "symbol": "eth" }))
            .await,
    );
    assert_eq!(response["status"], "success");
    assert_eq!(
        response["payload"]["instruments"],
        json!(["ETHUSDT.BINANCE"])
    );
}

#[tokio::test]
async fn connect_venue_requires_credentials() {
    let f = initialized().await;
    let missing = as_json(
        &f.gateway
            .handle("connect_venue", json!({ "venue": "BINANCE" }))
            .await,
    );
    assert_eq!(missing["error_kind"], "validation_error");

    let ok = as_json(
        &f.gateway
            .handle(
                "connect_venue",
                json!({
                    "venue": "binance",
                    "credentials": { "api_key": "k", "api_secret": "s" }
                }),
            )
            .await,
    );
    assert_eq!(ok["status"], "success");
    assert!(ok["message"].as_str().expect("message").contains("BINANCE"));
}

#[tokio::test]
async fn unknown_operation_name_is_a_validation_error() {
    let f = initialized().await;
    let response = as_json(&f.gateway.handle("submit_iceberg_order", json!({})).await);
    assert_eq!(response["status"], "error");
    assert_eq!(response["error_kind"], "validation_error");
}

#[tokio::test]
async fn gateway_stays_usable_after_an_engine_failure() {
    struct FlakyEngine(StubEngine, AtomicUsize);

    #[async_trait]
    impl EngineHandle for FlakyEngine {
        fn trader_id(&self) -> String {
            self.0.trader_id()
        }
        async fn connect_venue(
            &self,
            venue: &Venue,
            credentials: &VenueCredentials,
        ) -> EngineResult<()> {
            self.0.connect_venue(venue, credentials).await
        }
        async fn instruments(&self) -> EngineResult<Vec<InstrumentId>> {
            self.0.instruments().await
        }
        async fn submit_order(&self, command: &OrderCommand) -> EngineResult<()> {
            if self.1.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(EngineError::Rejected("insufficient margin".to_string()))
            } else {
                self.0.submit_order(command).await
            }
        }
        async fn cancel_order(&self, id: &ClientOrderId) -> EngineResult<()> {
            self.0.cancel_order(id).await
        }
        async fn account_balances(&self, venue: &Venue) -> EngineResult<Vec<AccountBalance>> {
            self.0.account_balances(venue).await
        }
        async fn positions(&self, venue: &Venue) -> EngineResult<Vec<Position>> {
            self.0.positions(venue).await
        }
        async fn orders(&self, ids: &[ClientOrderId]) -> EngineResult<Vec<OrderRecord>> {
            self.0.orders(ids).await
        }
    }

    struct FlakyFactory;

    #[async_trait]
    impl EngineFactory for FlakyFactory {
        async fn build(&self, _config: &EngineConfig) -> EngineResult<Arc<dyn EngineHandle>> {
            Ok(Arc::new(FlakyEngine(
                StubEngine::default(),
                AtomicUsize::new(0),
            )))
        }
    }

    let gateway = Gateway::new(&GatewayConfig::default(), Arc::new(FlakyFactory));
    gateway.handle("initialize", json!({})).await;

    let params = json!({
        "instrument_id": "BTCUSDT.BINANCE",
        "side": "BUY",
        "quantity": "1"
    });
    let first = as_json(&gateway.handle("submit_market_order", params.clone()).await);
    assert_eq!(first["status"], "error");
    assert_eq!(first["error_kind"], "engine_error");

    let second = as_json(&gateway.handle("submit_market_order", params).await);
    assert_eq!(second["status"], "success");
}

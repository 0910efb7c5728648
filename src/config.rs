use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gateway process configuration, layered from an optional file and
/// `TILLER_`-prefixed environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub orders: OrderIdConfig,
}

impl GatewayConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(Environment::with_prefix("TILLER").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Tracing filter directive, overridable via RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info,tiller=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderIdConfig {
    /// Prefix for generated client order ids
    #[serde(default = "default_order_id_prefix")]
    pub id_prefix: String,
}

fn default_order_id_prefix() -> String {
    "tlr".to_string()
}

impl Default for OrderIdConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_order_id_prefix(),
        }
    }
}

/// Engine configuration carried by the `initialize` operation.
///
/// Deserialized from the request parameters; unknown fields are rejected so
/// a misspelled key surfaces as a validation error instead of silently
/// falling back to a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default = "default_trader_id")]
    pub trader_id: String,
    /// Instruments the engine should make available, `SYMBOL.VENUE` form
    #[serde(default)]
    pub instruments: Vec<String>,
    #[serde(default)]
    pub data_engine: DataEngineConfig,
    #[serde(default)]
    pub risk_engine: RiskEngineConfig,
    #[serde(default)]
    pub exec_engine: ExecEngineConfig,
}

fn default_trader_id() -> String {
    "TRADER-001".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trader_id: default_trader_id(),
            instruments: Vec::new(),
            data_engine: DataEngineConfig::default(),
            risk_engine: RiskEngineConfig::default(),
            exec_engine: ExecEngineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataEngineConfig {
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskEngineConfig {
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    /// Bypass pre-trade risk checks (paper/backtest only)
    #[serde(default)]
    pub bypass: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecEngineConfig {
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    #[serde(default = "default_reconciliation")]
    pub reconciliation: bool,
}

fn default_queue_size() -> usize {
    10_000
}

fn default_reconciliation() -> bool {
    true
}

impl Default for DataEngineConfig {
    fn default() -> Self {
        Self {
            queue_size: default_queue_size(),
        }
    }
}

impl Default for RiskEngineConfig {
    fn default() -> Self {
        Self {
            queue_size: default_queue_size(),
            bypass: false,
        }
    }
}

impl Default for ExecEngineConfig {
    fn default() -> Self {
        Self {
            queue_size: default_queue_size(),
            reconciliation: default_reconciliation(),
        }
    }
}

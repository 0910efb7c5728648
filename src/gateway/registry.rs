use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;

/// The fixed operation table.
///
/// Every operation the transport can invoke is a variant here; dispatch is
/// an exhaustive match, so a new operation that misses a validator or
/// translator arm fails to compile rather than missing at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    ConnectVenue,
    GetInstruments,
    SubmitMarketOrder,
    SubmitLimitOrder,
    CancelOrder,
    GetAccountInfo,
    GetPositions,
    GetOrderStatus,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Initialize,
        Operation::ConnectVenue,
        Operation::GetInstruments,
        Operation::SubmitMarketOrder,
        Operation::SubmitLimitOrder,
        Operation::CancelOrder,
        Operation::GetAccountInfo,
        Operation::GetPositions,
        Operation::GetOrderStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::ConnectVenue => "connect_venue",
            Operation::GetInstruments => "get_instruments",
            Operation::SubmitMarketOrder => "submit_market_order",
            Operation::SubmitLimitOrder => "submit_limit_order",
            Operation::CancelOrder => "cancel_order",
            Operation::GetAccountInfo => "get_account_info",
            Operation::GetPositions => "get_positions",
            Operation::GetOrderStatus => "get_order_status",
        }
    }

    /// True for the one operation allowed before the engine exists.
    pub fn allowed_uninitialized(&self) -> bool {
        matches!(self, Operation::Initialize)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = GatewayError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == raw.trim())
            .ok_or_else(|| GatewayError::Validation(format!("unknown operation '{raw}'")))
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Trading venue name, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Venue(String);

impl Venue {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instrument identifier in `SYMBOL.VENUE` form, e.g. `BTCUSDT.BINANCE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrumentId {
    symbol: String,
    venue: Venue,
}

impl InstrumentId {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn venue(&self) -> &Venue {
        &self.venue
    }
}

impl FromStr for InstrumentId {
    type Err = GatewayError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (symbol, venue) = raw.rsplit_once('.').ok_or_else(|| {
            GatewayError::Validation(format!(
                "invalid instrument_id '{raw}': expected SYMBOL.VENUE"
            ))
        })?;
        if symbol.is_empty() || venue.is_empty() {
            return Err(GatewayError::Validation(format!(
                "invalid instrument_id '{raw}': expected SYMBOL.VENUE"
            )));
        }
        Ok(Self {
            symbol: symbol.to_string(),
            venue: Venue::new(venue),
        })
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.symbol, self.venue)
    }
}

impl Serialize for InstrumentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InstrumentId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Client-assigned order identifier, unique within a session.
///
/// Caller-supplied values pass through unmodified; generated values come
/// from [`crate::gateway::ClientOrderIdGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Venue API credentials, passed opaquely to the engine.
///
/// BTreeMap keeps key order stable for logging and comparison; values are
/// never logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueCredentials(BTreeMap<String, String>);

impl VenueCredentials {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

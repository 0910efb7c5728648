//! Domain value types shared across the gateway.

mod instrument;
mod order;

pub use instrument::{ClientOrderId, InstrumentId, Venue, VenueCredentials};
pub use order::{OrderSide, OrderStatus, OrderType, TimeInForce};

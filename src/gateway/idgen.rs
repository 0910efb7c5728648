use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::{ClientOrderId, InstrumentId};

/// Generates client order ids when the caller omits one.
///
/// Shape: `{prefix}-{symbol}-{millis}-{seq}`. The process-wide sequence
/// counter keeps ids unique within a session even when two orders for the
/// same instrument land in the same millisecond; caller-supplied ids are
/// never touched or deduplicated.
pub struct ClientOrderIdGenerator {
    prefix: String,
    seq: AtomicU64,
}

impl ClientOrderIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn generate(&self, instrument_id: &InstrumentId) -> ClientOrderId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        ClientOrderId::new(format!(
            "{}-{}-{}-{}",
            self.prefix,
            instrument_id.symbol(),
            millis,
            seq
        ))
    }
}

//! Engine handle abstraction and the built-in paper engine.

mod paper;
mod traits;

pub use paper::{PaperEngine, PaperEngineFactory};
pub use traits::{
    AccountBalance, EngineError, EngineFactory, EngineHandle, EngineResult, OrderCommand,
    OrderRecord, Position,
};

#[cfg(test)]
pub use traits::{MockEngineFactory, MockEngineHandle};

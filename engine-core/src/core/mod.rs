//! Core domain types and the engine's error taxonomy.

pub mod errors;
pub mod types;

pub use errors::EngineError;
pub use types::{ExecutionReport, HistoricalBar, Order, OrderStatus, OrderType, Side, Tick};

//! Event-driven equities trading engine core.
//!
//! ## Architecture
//! - A typed [`Event`] bus feeds a bounded, many-producer/single-consumer
//!   [`EventQueue`].
//! - [`EngineCore`] is the single consumer; it is the only component that
//!   mutates the [`OrderManager`].
//! - The [`ScriptingInterface`] is an out-of-process messaging boundary:
//!   inbound commands become Events, outbound ticks/bars are published.
//! - [`MarketDataHandler`] and [`ExecutionHandler`] are contracts for
//!   producing market data and placing orders; concrete adapters (mock CSV
//!   feed, live broker gateway) implement them without holding a pointer
//!   back into the engine.
//!
//! ## Core Modules
//! - `core`: domain types (`Order`, `ExecutionReport`, `Tick`, ...) and the error taxonomy
//! - `event`: the typed event bus
//! - `queue`: the bounded MPSC event queue
//! - `order_manager`: order admission, fill accounting, position keeping
//! - `engine`: the event loop
//! - `scripting`: the pub/sub wire protocol and its transport
//! - `market_data` / `execution`: adapter contracts and the mock/live implementations
//! - `config`: layered configuration loading
//! - `utils`: logging setup

pub mod config;
pub mod core;
pub mod engine;
pub mod event;
pub mod execution;
pub mod market_data;
pub mod order_manager;
pub mod queue;
pub mod scripting;
pub mod utils;

pub use core::{EngineError, ExecutionReport, HistoricalBar, Order, OrderStatus, OrderType, Side, Tick};
pub use engine::EngineCore;
pub use event::{EngineMode, Event, HistoricalDataRequest};
pub use execution::{ExecutionHandler, LiveExecutionHandler, LoopbackExecutionHandler};
pub use market_data::{BrokerClient, BrokerEvent, LiveGatewayAdapter, MarketDataHandler, MockMarketDataHandler};
pub use order_manager::OrderManager;
pub use queue::{EventQueue, EventSender};
pub use scripting::ScriptingInterface;

/// Commonly used types, re-exported for downstream crates that wire the
/// engine together (the `engine-cli` binary chief among them).
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::core::{EngineError, ExecutionReport, HistoricalBar, Order, OrderStatus, OrderType, Side, Tick};
    pub use crate::engine::EngineCore;
    pub use crate::event::{EngineMode, Event, HistoricalDataRequest};
    pub use crate::execution::{ExecutionHandler, LiveExecutionHandler, LoopbackExecutionHandler};
    pub use crate::market_data::{BrokerClient, BrokerEvent, LiveGatewayAdapter, MarketDataHandler, MockMarketDataHandler};
    pub use crate::order_manager::OrderManager;
    pub use crate::queue::{EventQueue, EventSender};
    pub use crate::scripting::ScriptingInterface;
}

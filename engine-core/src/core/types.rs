//! Core trading types: orders, execution reports, ticks and bars.
//!
//! These types are plain value structs — the engine never hands out a mutable
//! reference to one. `Order` is the only type with a lifecycle beyond "produced,
//! consumed once, discarded": it is admitted once by the [`crate::order_manager::OrderManager`]
//! and thereafter mutated only through [`ExecutionReport`]s applied on the event
//! loop thread.

use std::fmt;
use std::time::SystemTime;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type. `limit_price` on [`Order`] is only meaningful when this is `Limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
        }
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderStatus {
    New,
    PendingNew,
    Confirmed,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PendingNew => "PENDING_NEW",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

/// A client order. Constructed externally with `order_id = 0`; the
/// [`crate::order_manager::OrderManager`] assigns the real id on admission and owns
/// every subsequent mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: u64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub quantity: f64,
    pub limit_price: f64,
    pub filled_quantity: f64,
    pub avg_fill_price: f64,
    pub creation_timestamp: SystemTime,
}

impl Order {
    /// Build a new, unadmitted order (`order_id = 0`, `status = New`, no fills yet).
    pub fn new(symbol: impl Into<String>, side: Side, order_type: OrderType, quantity: f64) -> Self {
        Self {
            order_id: 0,
            symbol: symbol.into(),
            side,
            order_type,
            status: OrderStatus::New,
            quantity,
            limit_price: 0.0,
            filled_quantity: 0.0,
            avg_fill_price: 0.0,
            creation_timestamp: SystemTime::now(),
        }
    }

    pub fn with_limit_price(mut self, price: f64) -> Self {
        self.limit_price = price;
        self
    }
}

/// A broker notification about the state of one order. Refers to exactly one
/// [`Order`] by `order_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub report_id: u64,
    pub order_id: u64,
    pub symbol: String,
    pub new_status: OrderStatus,
    pub fill_quantity: f64,
    pub fill_price: f64,
    pub execution_timestamp: SystemTime,
}

/// A single market-data observation. Immutable once created.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    pub size: u64,
    #[serde(skip)]
    pub timestamp: Option<SystemTime>,
}

/// An OHLCV aggregate over a labeled time interval. Immutable.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoricalBar {
    pub symbol: String,
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

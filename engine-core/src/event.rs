//! The typed event bus.
//!
//! `Event` is the single wire format flowing through the [`crate::queue::EventQueue`].
//! Every producer — the scripting listener, the market-data handler, the
//! execution handler's broker adapter, the signal handler — constructs one of
//! these and pushes it; the engine core is the only consumer.

use crate::core::{ExecutionReport, HistoricalBar, Order, Tick};

/// A historical-data request parsed off the wire. Carried as its own variant
/// rather than a raw JSON blob so the engine core never re-parses a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalDataRequest {
    pub symbol: String,
    pub end_date: String,
    pub duration: String,
    pub bar_size: String,
}

/// The tagged value carried on the event queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Tick(Tick),
    OrderRequest(Order),
    ExecutionReport(ExecutionReport),
    NextValidId(u64),
    SubscribeRequest(String),
    HistoricalDataRequest(HistoricalDataRequest),
    HistoricalBar(HistoricalBar),
    Shutdown,
}

/// The engine's run mode, fixed once at startup.
///
/// In `Mock`, `SubscribeRequest` is a no-op (logged) and the `MOCK` wire topic
/// triggers the mock market-data adapter's start hook instead of a live
/// subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Mock,
    Live,
}

impl std::fmt::Display for EngineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineMode::Mock => write!(f, "mock"),
            EngineMode::Live => write!(f, "live"),
        }
    }
}

impl std::str::FromStr for EngineMode {
    type Err = crate::core::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mock" => Ok(EngineMode::Mock),
            "live" => Ok(EngineMode::Live),
            other => Err(crate::core::EngineError::ConfigMalformed {
                reason: format!("engine_settings.mode must be \"mock\" or \"live\", got {other:?}"),
            }),
        }
    }
}

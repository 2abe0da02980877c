//! JSON schemas for the two-frame (topic, payload) wire protocol and the
//! parsing/serialization functions that cross it.

use crate::core::{EngineError, HistoricalBar, Order, OrderType, Side, Tick};
use crate::event::{Event, HistoricalDataRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

pub const TOPIC_SUBSCRIBE: &str = "SUBSCRIBE";
pub const TOPIC_CREATE_ORDER: &str = "CREATE_ORDER";
pub const TOPIC_REQUEST_HISTORY: &str = "REQUEST_HISTORY";
pub const TOPIC_MOCK: &str = "MOCK";

pub fn tick_topic(symbol: &str) -> String {
    format!("TICK.{symbol}")
}

pub fn history_topic(symbol: &str) -> String {
    format!("HISTORY.{symbol}")
}

#[derive(Serialize)]
struct TickData {
    symbol: String,
    price: f64,
    size: u64,
}

#[derive(Serialize)]
struct TickMessage {
    timestamp: String,
    data: TickData,
}

/// Encode an outbound `TICK.<symbol>` payload. `timestamp` is emitted as a
/// string, matching the original `ScriptingInterface::publish_tick`'s
/// `std::to_string(... .count())`.
pub fn encode_tick(tick: &Tick) -> Result<String, EngineError> {
    let timestamp = tick
        .timestamp
        .unwrap_or(UNIX_EPOCH)
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .to_string();

    let message = TickMessage {
        timestamp,
        data: TickData {
            symbol: tick.symbol.clone(),
            price: tick.price,
            size: tick.size,
        },
    };
    serde_json::to_string(&message).map_err(|e| EngineError::InvalidMessage {
        topic: Some(tick_topic(&tick.symbol)),
        reason: e.to_string(),
    })
}

/// Encode an outbound `HISTORY.<symbol>` payload.
pub fn encode_history(bar: &HistoricalBar) -> Result<String, EngineError> {
    serde_json::to_string(bar).map_err(|e| EngineError::InvalidMessage {
        topic: Some(history_topic(&bar.symbol)),
        reason: e.to_string(),
    })
}

fn invalid(topic: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidMessage {
        topic: Some(topic.to_string()),
        reason: reason.into(),
    }
}

/// Parse a `SUBSCRIBE` payload `{topic: "TICK.<sym>"}` into a `SubscribeRequest` event.
fn parse_subscribe(payload: &[u8]) -> Result<Event, EngineError> {
    #[derive(Deserialize)]
    struct Payload {
        topic: String,
    }
    let parsed: Payload = serde_json::from_slice(payload)
        .map_err(|e| invalid(TOPIC_SUBSCRIBE, e.to_string()))?;
    Ok(Event::SubscribeRequest(parsed.topic))
}

fn parse_side(raw: &str) -> Option<Side> {
    match raw {
        "BUY" => Some(Side::Buy),
        "SELL" => Some(Side::Sell),
        _ => None,
    }
}

fn parse_order_type(raw: &str) -> Option<OrderType> {
    match raw {
        "MARKET" => Some(OrderType::Market),
        "LIMIT" => Some(OrderType::Limit),
        _ => None,
    }
}

/// Parse a `CREATE_ORDER` payload into an `OrderRequest` event. The fields may
/// be nested under a `payload` key or sit at the root of the object.
fn parse_create_order(payload: &[u8]) -> Result<Event, EngineError> {
    let root: Value =
        serde_json::from_slice(payload).map_err(|e| invalid(TOPIC_CREATE_ORDER, e.to_string()))?;
    let fields = root.get("payload").unwrap_or(&root);

    let symbol = fields
        .get("symbol")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(TOPIC_CREATE_ORDER, "missing field `symbol`"))?;
    let quantity = fields
        .get("quantity")
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid(TOPIC_CREATE_ORDER, "missing field `quantity`"))?;
    let side_str = fields
        .get("side")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(TOPIC_CREATE_ORDER, "missing field `side`"))?;
    let side = parse_side(side_str)
        .ok_or_else(|| invalid(TOPIC_CREATE_ORDER, format!("unrecognized side {side_str:?}")))?;
    let order_type_str = fields
        .get("order_type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(TOPIC_CREATE_ORDER, "missing field `order_type`"))?;
    let order_type = parse_order_type(order_type_str).ok_or_else(|| {
        invalid(TOPIC_CREATE_ORDER, format!("unrecognized order_type {order_type_str:?}"))
    })?;

    let mut order = Order::new(symbol, side, order_type, quantity);
    if order_type == OrderType::Limit {
        let limit_price = fields.get("limit_price").and_then(Value::as_f64).unwrap_or(0.0);
        order = order.with_limit_price(limit_price);
    }

    Ok(Event::OrderRequest(order))
}

/// Parse a `REQUEST_HISTORY` payload into a `HistoricalDataRequest` event.
fn parse_request_history(payload: &[u8]) -> Result<Event, EngineError> {
    #[derive(Deserialize)]
    struct Payload {
        symbol: String,
        #[serde(default)]
        end_date: String,
        #[serde(default = "default_duration")]
        duration: String,
        #[serde(default = "default_bar_size")]
        bar_size: String,
    }
    fn default_duration() -> String {
        "1 W".to_string()
    }
    fn default_bar_size() -> String {
        "1 day".to_string()
    }

    let parsed: Payload = serde_json::from_slice(payload)
        .map_err(|e| invalid(TOPIC_REQUEST_HISTORY, e.to_string()))?;
    Ok(Event::HistoricalDataRequest(HistoricalDataRequest {
        symbol: parsed.symbol,
        end_date: parsed.end_date,
        duration: parsed.duration,
        bar_size: parsed.bar_size,
    }))
}

/// What an inbound wire message resolves to: a queued `Event`, or a direct
/// mock-feed start signal (§4.4 — `MOCK` never becomes an `Event`).
#[derive(Debug)]
pub enum InboundCommand {
    Queued(Event),
    StartMockFeed,
}

/// Decode one (topic, payload) frame pair. Returns `Err` for malformed JSON,
/// an unknown topic, or a recognized-but-invalid payload — callers log and
/// drop on `Err`, matching the parsing policy in §4.4.
pub fn decode_inbound(topic: &str, payload: &[u8]) -> Result<InboundCommand, EngineError> {
    match topic {
        TOPIC_SUBSCRIBE => parse_subscribe(payload).map(InboundCommand::Queued),
        TOPIC_CREATE_ORDER => parse_create_order(payload).map(InboundCommand::Queued),
        TOPIC_REQUEST_HISTORY => parse_request_history(payload).map(InboundCommand::Queued),
        TOPIC_MOCK => Ok(InboundCommand::StartMockFeed),
        other => Err(invalid(other, "unrecognized topic")),
    }
}

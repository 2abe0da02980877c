//! Error taxonomy for the trading engine.
//!
//! Every kind named in the error handling design maps to one variant here.
//! Startup-only failures (reading a config file, binding a socket that should
//! exist) are free to propagate as `anyhow::Error` via `?`; everything that a
//! caller on the hot path might want to match on is a named variant instead.

use thiserror::Error;

/// Engine-level error kinds. None of these cross a thread boundary as a panic —
/// producer threads confine failures to logging and, where applicable, a
/// lifecycle transition (see the concurrency model).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration file not found: {path}")]
    ConfigMissing { path: String },

    #[error("configuration malformed: {reason}")]
    ConfigMalformed { reason: String },

    #[error("malformed or unrecognized inbound message on topic {topic:?}: {reason}")]
    InvalidMessage { topic: Option<String>, reason: String },

    #[error("execution report referenced unknown order {order_id}")]
    UnknownOrder { order_id: u64 },

    #[error("order rejected at admission: {reason}")]
    InvalidOrder { reason: String },

    #[error("no live adapter set for {operation}")]
    GatewayUnavailable { operation: &'static str },

    #[error("broker adapter error {code}: {message}")]
    BrokerError { code: i32, message: String },

    #[error("connection to broker gateway lost: {reason}")]
    ConnectionLost { reason: String },
}

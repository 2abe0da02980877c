//! Execution Handler contract.
//!
//! A single capability, `place_order`. The contract is deliberately
//! fire-and-forget: the broker's response to a placed order always arrives
//! later as an [`Event::ExecutionReport`] on the event queue, never as a
//! direct return value from `place_order`.

use crate::core::Order;
use crate::event::Event;
use crate::market_data::BrokerClient;
use crate::queue::EventSender;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::error;

pub trait ExecutionHandler: Send {
    fn place_order(&mut self, order: Order);
}

/// Hands orders to the broker adapter underlying the live market-data gateway.
/// Shares the same [`BrokerClient`] the adapter uses to poll callbacks so
/// placing an order and receiving its fills go through one connection.
pub struct LiveExecutionHandler {
    client: Arc<Mutex<Box<dyn BrokerClient>>>,
}

impl LiveExecutionHandler {
    pub fn new(client: Arc<Mutex<Box<dyn BrokerClient>>>) -> Self {
        Self { client }
    }
}

impl ExecutionHandler for LiveExecutionHandler {
    fn place_order(&mut self, order: Order) {
        self.client.lock().place_order(&order);
    }
}

/// Posts a synthetic `ExecutionReport` for every order placed, used when
/// exercising the engine without a live broker connection. Not part of the
/// broker contract proper — a convenience for mock-mode wiring where no live
/// adapter exists to ever emit a real fill.
pub struct LoopbackExecutionHandler {
    sender: EventSender,
    next_report_id: u64,
}

impl LoopbackExecutionHandler {
    pub fn new(sender: EventSender) -> Self {
        Self { sender, next_report_id: 1 }
    }
}

impl ExecutionHandler for LoopbackExecutionHandler {
    fn place_order(&mut self, order: Order) {
        if order.order_id == 0 {
            error!("loopback execution handler received an unadmitted order (id=0)");
            return;
        }
        let report_id = self.next_report_id;
        self.next_report_id += 1;
        self.sender.push(Event::ExecutionReport(crate::core::ExecutionReport {
            report_id,
            order_id: order.order_id,
            symbol: order.symbol,
            new_status: crate::core::OrderStatus::Filled,
            fill_quantity: order.quantity,
            fill_price: order.limit_price,
            execution_timestamp: std::time::SystemTime::now(),
        }));
    }
}

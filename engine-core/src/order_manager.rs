//! Order & Position Manager.
//!
//! Authoritative store of orders and per-symbol net positions. All mutating
//! operations (`admit`, `apply_report`, `set_next_order_id`) are invoked
//! exclusively by the engine core on its own thread; `order` and `position`
//! are safe to call from any thread — they take the same short-held lock the
//! mutators use and return a snapshot.

use crate::core::{EngineError, ExecutionReport, Order, OrderStatus, Side};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, warn};

struct Store {
    orders: HashMap<u64, Order>,
    positions: HashMap<String, f64>,
}

/// The Order & Position Manager.
pub struct OrderManager {
    next_order_id: AtomicU64,
    store: Mutex<Store>,
}

impl OrderManager {
    pub fn new() -> Self {
        Self {
            next_order_id: AtomicU64::new(1),
            store: Mutex::new(Store {
                orders: HashMap::new(),
                positions: HashMap::new(),
            }),
        }
    }

    /// Assign the next monotonic id, stamp it onto `order`, store it, return the id.
    ///
    /// Rejects `quantity <= 0` or an empty `symbol` with [`EngineError::InvalidOrder`];
    /// the order is not admitted and no id is consumed.
    pub fn admit(&self, mut order: Order) -> Result<u64, EngineError> {
        if order.quantity <= 0.0 {
            return Err(EngineError::InvalidOrder {
                reason: format!("quantity must be positive, got {}", order.quantity),
            });
        }
        if order.symbol.trim().is_empty() {
            return Err(EngineError::InvalidOrder {
                reason: "symbol must not be empty".to_string(),
            });
        }

        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        order.order_id = id;

        let mut store = self.store.lock();
        store.orders.insert(id, order);
        Ok(id)
    }

    /// Apply a broker execution report to the order it targets.
    ///
    /// If the order is unknown, logs [`EngineError::UnknownOrder`] and returns —
    /// this is non-fatal. `fill_quantity == 0` reports are status-only: they
    /// update `status` but skip the weighted-average and position arithmetic
    /// entirely (avoids a zero-denominator average and avoids zeroing
    /// `avg_fill_price` on an ack-only report).
    pub fn apply_report(&self, report: ExecutionReport) {
        let mut store = self.store.lock();
        let Some(order) = store.orders.get_mut(&report.order_id) else {
            error!(order_id = report.order_id, "{}", EngineError::UnknownOrder { order_id: report.order_id });
            return;
        };

        order.status = report.new_status;

        if report.fill_quantity == 0.0 {
            return;
        }

        let old_filled = order.filled_quantity;
        let new_filled = old_filled + report.fill_quantity;

        if new_filled > order.quantity {
            warn!(
                order_id = report.order_id,
                quantity = order.quantity,
                new_filled,
                "ExcessFill: report overfills order; applying actual fill quantity anyway"
            );
        }

        let old_total_value = order.avg_fill_price * old_filled;
        let new_fill_value = report.fill_price * report.fill_quantity;
        order.avg_fill_price = if new_filled > 0.0 {
            (old_total_value + new_fill_value) / new_filled
        } else {
            0.0
        };
        order.filled_quantity = new_filled;

        let symbol = order.symbol.clone();
        let side = order.side;
        let position = store.positions.entry(symbol).or_insert(0.0);
        match side {
            Side::Buy => *position += report.fill_quantity,
            Side::Sell => *position -= report.fill_quantity,
        }
    }

    /// Snapshot of the order by id. Panics-free: returns `None` if unknown.
    pub fn order(&self, order_id: u64) -> Option<Order> {
        self.store.lock().orders.get(&order_id).cloned()
    }

    /// Net position for `symbol`, 0 if no fills have been applied on it.
    pub fn position(&self, symbol: &str) -> f64 {
        self.store.lock().positions.get(symbol).copied().unwrap_or(0.0)
    }

    /// Seed the monotonic id counter to `max(current, n)`, used to align with
    /// an external broker's id space after a `NextValidId` callback.
    pub fn set_next_order_id(&self, n: u64) {
        self.next_order_id.fetch_max(n, Ordering::SeqCst);
    }
}

impl Default for OrderManager {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Regardless of how a quantity is split across partial fills at the
        /// same price, the weighted average settles on that price and the
        /// running total never exceeds the sum of the fills applied.
        #[test]
        fn weighted_average_stays_within_fill_prices(
            price in 1.0f64..10_000.0,
            fills in prop::collection::vec(0.1f64..100.0, 1..10),
        ) {
            let mgr = OrderManager::new();
            let total: f64 = fills.iter().sum();
            let id = mgr.admit(Order::new("AAPL", Side::Buy, crate::core::OrderType::Market, total)).unwrap();

            let mut filled_so_far = 0.0;
            for qty in &fills {
                filled_so_far += qty;
                mgr.apply_report(ExecutionReport {
                    report_id: 0,
                    order_id: id,
                    symbol: "AAPL".to_string(),
                    new_status: OrderStatus::PartiallyFilled,
                    fill_quantity: *qty,
                    fill_price: price,
                    execution_timestamp: std::time::SystemTime::now(),
                });
            }

            let snapshot = mgr.order(id).unwrap();
            prop_assert!((snapshot.avg_fill_price - price).abs() < 1e-6);
            prop_assert!((snapshot.filled_quantity - filled_so_far).abs() < 1e-6);
            prop_assert!((mgr.position("AAPL") - filled_so_far).abs() < 1e-6);
        }

        /// Order ids admitted in sequence are always strictly increasing,
        /// independent of the symbols or quantities admitted.
        #[test]
        fn admitted_ids_are_strictly_increasing(
            quantities in prop::collection::vec(0.01f64..1_000.0, 1..20),
        ) {
            let mgr = OrderManager::new();
            let mut last = 0;
            for qty in quantities {
                let id = mgr.admit(Order::new("MSFT", Side::Buy, crate::core::OrderType::Market, qty)).unwrap();
                prop_assert!(id > last);
                last = id;
            }
        }
    }
}

//! Engine Core: the single-consumer event loop.
//!
//! The only component permitted to mutate the [`OrderManager`]. Holds at most
//! one market-data adapter and one execution handler, both supplied by the
//! entry point at construction — no adapter ever holds a pointer back into
//! this struct, only a sender handle into the event queue.

use crate::core::{EngineError, Order};
use crate::event::{Event, EngineMode, HistoricalDataRequest};
use crate::execution::ExecutionHandler;
use crate::market_data::MarketDataHandler;
use crate::order_manager::OrderManager;
use crate::queue::{EventQueue, EventSender};
use crate::scripting::ScriptingInterface;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub struct EngineCore {
    mode: EngineMode,
    queue: EventQueue,
    order_manager: Arc<OrderManager>,
    scripting: ScriptingInterface,
    market_data: Option<Arc<Mutex<Box<dyn MarketDataHandler>>>>,
    execution: Option<Box<dyn ExecutionHandler>>,
    running: Arc<AtomicBool>,
}

impl EngineCore {
    pub fn new(mode: EngineMode, scripting: ScriptingInterface) -> Self {
        Self {
            mode,
            queue: EventQueue::default(),
            order_manager: Arc::new(OrderManager::new()),
            scripting,
            market_data: None,
            execution: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn set_market_data_handler(&mut self, handler: Box<dyn MarketDataHandler>) {
        self.market_data = Some(Arc::new(Mutex::new(handler)));
    }

    pub fn set_execution_handler(&mut self, handler: Box<dyn ExecutionHandler>) {
        self.execution = Some(handler);
    }

    /// A handle producers (adapters, the scripting listener, the signal
    /// handler) can clone and hold onto without any reference back into `self`.
    pub fn sender(&self) -> EventSender {
        self.queue.sender()
    }

    pub fn order(&self, order_id: u64) -> Option<Order> {
        self.order_manager.order(order_id)
    }

    pub fn position(&self, symbol: &str) -> f64 {
        self.order_manager.position(symbol)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Post a `Shutdown` event. Safe to call from any thread, including a
    /// signal handler — it only touches the queue, no I/O or logging.
    pub fn stop(&self) {
        self.queue.push(Event::Shutdown);
    }

    /// Connect the market-data adapter, if one is set, before entering the loop.
    pub fn connect_market_data(&mut self) -> Result<(), EngineError> {
        match &self.market_data {
            Some(handler) => handler.lock().connect(),
            None => Ok(()),
        }
    }

    /// Start the Scripting Interface and run the event loop until `Shutdown`.
    pub fn run(&mut self) -> Result<(), EngineError> {
        let sender = self.queue.sender();
        let market_data_for_mock = self.market_data.clone();
        let on_mock_start: Arc<dyn Fn() + Send + Sync> = Arc::new(move || match &market_data_for_mock {
            Some(handler) => handler.lock().start_data_feed(),
            None => warn!("{}", EngineError::GatewayUnavailable { operation: "start_data_feed" }),
        });

        self.scripting.start(sender, on_mock_start)?;
        self.running.store(true, Ordering::SeqCst);
        info!(mode = %self.mode, "engine core running");

        loop {
            match self.queue.wait_pop() {
                Event::Shutdown => break,
                Event::Tick(tick) => {
                    if let Err(e) = self.scripting.publish_tick(&tick) {
                        warn!(%e, "failed to publish tick");
                    }
                }
                Event::OrderRequest(order) => self.handle_order_request(order),
                Event::ExecutionReport(report) => self.order_manager.apply_report(report),
                Event::NextValidId(id) => self.order_manager.set_next_order_id(id),
                Event::SubscribeRequest(topic) => self.handle_subscribe(&topic),
                Event::HistoricalDataRequest(req) => self.handle_historical_request(req),
                Event::HistoricalBar(bar) => {
                    if let Err(e) = self.scripting.publish_bar(&bar) {
                        warn!(%e, "failed to publish historical bar");
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.scripting.stop();
        if let Some(handler) = &self.market_data {
            handler.lock().disconnect();
        }
        info!("engine core stopped");
        Ok(())
    }

    fn handle_order_request(&mut self, order: Order) {
        let symbol = order.symbol.clone();
        match self.order_manager.admit(order.clone()) {
            Ok(order_id) => {
                info!(order_id, symbol = %symbol, "order admitted");
                match &mut self.execution {
                    Some(handler) => {
                        let mut admitted = order;
                        admitted.order_id = order_id;
                        handler.place_order(admitted);
                    }
                    None => warn!("{}", EngineError::GatewayUnavailable { operation: "place_order" }),
                }
            }
            Err(e) => warn!(%e, "order rejected"),
        }
    }

    fn handle_subscribe(&mut self, topic: &str) {
        match &self.market_data {
            Some(handler) => handler.lock().subscribe_to_symbol(topic),
            None => warn!("{}", EngineError::GatewayUnavailable { operation: "subscribe_to_symbol" }),
        }
    }

    fn handle_historical_request(&mut self, req: HistoricalDataRequest) {
        match &self.market_data {
            Some(handler) => handler.lock().request_historical(req),
            None => warn!("{}", EngineError::GatewayUnavailable { operation: "request_historical" }),
        }
    }
}

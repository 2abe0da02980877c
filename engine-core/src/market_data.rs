//! Market-Data Handler contract.
//!
//! `MarketDataHandler` is the lifecycle every feed must support. The optional
//! capabilities (`start_data_feed`, `subscribe_to_symbol`, `request_historical`)
//! default to logging "not supported" so an adapter only needs to override the
//! ones it actually implements — the engine core calls them unconditionally
//! and never needs to downcast or probe for a capability first.

use crate::core::{EngineError, ExecutionReport, HistoricalBar, Order, Tick};
use crate::event::{Event, HistoricalDataRequest};
use crate::queue::EventSender;
use parking_lot::Mutex;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

pub trait MarketDataHandler: Send {
    fn connect(&mut self) -> Result<(), EngineError>;
    fn disconnect(&mut self);

    fn start_data_feed(&mut self) {
        warn!("start_data_feed: not supported by this market-data adapter");
    }

    fn subscribe_to_symbol(&mut self, _topic: &str) {
        warn!("subscribe_to_symbol: not supported by this market-data adapter");
    }

    fn request_historical(&mut self, _req: HistoricalDataRequest) {
        warn!("request_historical: not supported by this market-data adapter");
    }
}

/// Reads `symbol,price,size` rows from a CSV file on a background thread,
/// sleeping 500ms between rows. The feed does not start at `connect()` — only
/// `start_data_feed()` spawns the reader — so a `MOCK` wire command can gate
/// it independently of connection lifecycle.
pub struct MockMarketDataHandler {
    csv_path: PathBuf,
    sender: EventSender,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockMarketDataHandler {
    pub fn new(csv_path: impl Into<PathBuf>, sender: EventSender) -> Self {
        Self {
            csv_path: csv_path.into(),
            sender,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    fn parse_row(line: &str) -> Option<Tick> {
        let fields: Vec<&str> = line.splitn(3, ',').collect();
        if fields.len() != 3 {
            return None;
        }
        let symbol = fields[0].trim();
        let price: f64 = fields[1].trim().parse().ok()?;
        let size: u64 = fields[2].trim().parse().ok()?;
        if symbol.is_empty() {
            return None;
        }
        Some(Tick {
            symbol: symbol.to_string(),
            price,
            size,
            timestamp: Some(std::time::SystemTime::now()),
        })
    }
}

impl MarketDataHandler for MockMarketDataHandler {
    fn connect(&mut self) -> Result<(), EngineError> {
        info!(path = %self.csv_path.display(), "mock market-data adapter connected (feed not started)");
        Ok(())
    }

    fn disconnect(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn start_data_feed(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("mock data feed already running, ignoring duplicate start signal");
            return;
        }

        let path = self.csv_path.clone();
        let sender = self.sender.clone();
        let running = Arc::clone(&self.running);

        self.handle = Some(thread::spawn(move || {
            let file = match std::fs::File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "mock feed: failed to open CSV file");
                    running.store(false, Ordering::SeqCst);
                    return;
                }
            };
            let reader = BufReader::new(file);

            for line in reader.lines() {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!(error = %e, "mock feed: failed to read line, skipping");
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Self::parse_row(&line) {
                    Some(tick) => sender.push(Event::Tick(tick)),
                    None => warn!(row = %line, "mock feed: unparseable row, skipping"),
                }
                thread::sleep(Duration::from_millis(500));
            }

            running.store(false, Ordering::SeqCst);
            info!("mock feed: reached end of CSV file");
        }));
    }
}

/// The closed set of inbound broker callbacks this crate understands. The
/// concrete wire-level client (framing, authentication, the rest of the
/// broker's callback surface) lives outside this crate; `BrokerClient` is the
/// seam it is adapted through.
#[derive(Debug, Clone)]
pub enum BrokerEvent {
    NextValidId(u64),
    Tick(Tick),
    ExecutionReport(ExecutionReport),
    HistoricalBar(HistoricalBar),
    Error { code: i32, message: String },
    ConnectionClosed,
}

/// What a live broker gateway client must expose for [`LiveGatewayAdapter`]
/// to drive it. A real implementation of this trait (authenticating,
/// framing requests, demultiplexing callbacks) is out of scope here.
pub trait BrokerClient: Send {
    fn connect(&mut self) -> Result<(), EngineError>;
    fn disconnect(&mut self);
    fn request_market_data(&mut self, symbol: &str, delayed: bool);
    fn request_historical(&mut self, req: &HistoricalDataRequest);
    fn place_order(&mut self, order: &Order);
    /// Block up to `timeout` for the next broker callback; `None` on timeout.
    fn next_event(&mut self, timeout: Duration) -> Option<BrokerEvent>;
}

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Adapts a [`BrokerClient`] into the engine's [`MarketDataHandler`] contract.
/// `connect()` blocks until the broker's `nextValidId` handshake callback
/// arrives or the handshake timeout elapses.
pub struct LiveGatewayAdapter {
    client: Arc<Mutex<Box<dyn BrokerClient>>>,
    sender: EventSender,
    running: Arc<AtomicBool>,
    reader_handle: Option<JoinHandle<()>>,
    delayed_data: Arc<AtomicBool>,
    handshake_timeout: Duration,
}

impl LiveGatewayAdapter {
    pub fn new(client: Box<dyn BrokerClient>, sender: EventSender) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
            sender,
            running: Arc::new(AtomicBool::new(false)),
            reader_handle: None,
            delayed_data: Arc::new(AtomicBool::new(false)),
            handshake_timeout: HANDSHAKE_TIMEOUT,
        }
    }

    /// Shortens the handshake timeout; exposed so tests can exercise the
    /// timeout path without paying the production 10s bound.
    #[cfg(test)]
    fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

impl MarketDataHandler for LiveGatewayAdapter {
    fn connect(&mut self) -> Result<(), EngineError> {
        self.client.lock().connect()?;
        self.running.store(true, Ordering::SeqCst);

        let (handshake_tx, handshake_rx) = crossbeam::channel::bounded::<()>(1);
        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        let running = Arc::clone(&self.running);
        let delayed_data = Arc::clone(&self.delayed_data);
        let mut handshake_tx = Some(handshake_tx);

        let handle = thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                let event = client.lock().next_event(Duration::from_millis(200));
                match event {
                    Some(BrokerEvent::NextValidId(id)) => {
                        sender.push(Event::NextValidId(id));
                        if let Some(tx) = handshake_tx.take() {
                            delayed_data.store(true, Ordering::SeqCst);
                            let _ = tx.send(());
                        }
                    }
                    Some(BrokerEvent::Tick(tick)) => sender.push(Event::Tick(tick)),
                    Some(BrokerEvent::ExecutionReport(report)) => {
                        sender.push(Event::ExecutionReport(report))
                    }
                    Some(BrokerEvent::HistoricalBar(bar)) => sender.push(Event::HistoricalBar(bar)),
                    Some(BrokerEvent::Error { code, message }) => {
                        error!("{}", EngineError::BrokerError { code, message });
                    }
                    Some(BrokerEvent::ConnectionClosed) => {
                        warn!("{}", EngineError::ConnectionLost {
                            reason: "broker closed the connection".to_string(),
                        });
                        running.store(false, Ordering::SeqCst);
                    }
                    None => {}
                }
            }
        });

        match handshake_rx.recv_timeout(self.handshake_timeout) {
            Ok(()) => {
                self.reader_handle = Some(handle);
                Ok(())
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                self.client.lock().disconnect();
                Err(EngineError::ConnectionLost {
                    reason: "nextValidId handshake timed out after 10s".to_string(),
                })
            }
        }
    }

    fn disconnect(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.join();
        }
        self.client.lock().disconnect();
    }

    fn subscribe_to_symbol(&mut self, topic: &str) {
        let delayed = self.delayed_data.load(Ordering::SeqCst);
        let symbol = topic.strip_prefix("TICK.").unwrap_or(topic);
        self.client.lock().request_market_data(symbol, delayed);
    }

    fn request_historical(&mut self, req: HistoricalDataRequest) {
        self.client.lock().request_historical(&req);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::EventQueue;
    use std::io::Write;

    #[test]
    fn mock_feed_parses_valid_rows_and_skips_bad_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "AAPL,150.25,100").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not,a,valid,row,at,all").unwrap();
        writeln!(file, "MSFT,300.0,50").unwrap();
        file.flush().unwrap();

        let queue = EventQueue::new(16);
        let mut handler = MockMarketDataHandler::new(file.path(), queue.sender());
        handler.connect().unwrap();
        handler.start_data_feed();

        let first = queue.wait_pop_timeout(Duration::from_secs(2)).unwrap();
        match first {
            Event::Tick(tick) => {
                assert_eq!(tick.symbol, "AAPL");
                assert_eq!(tick.price, 150.25);
                assert_eq!(tick.size, 100);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let second = queue.wait_pop_timeout(Duration::from_secs(2)).unwrap();
        match second {
            Event::Tick(tick) => assert_eq!(tick.symbol, "MSFT"),
            other => panic!("unexpected event: {other:?}"),
        }

        handler.disconnect();
    }

    #[test]
    fn mock_feed_does_not_start_on_connect() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "AAPL,150.25,100").unwrap();
        file.flush().unwrap();

        let queue = EventQueue::new(16);
        let mut handler = MockMarketDataHandler::new(file.path(), queue.sender());
        handler.connect().unwrap();

        assert!(queue.wait_pop_timeout(Duration::from_millis(200)).is_none());
        handler.disconnect();
    }

    struct StubBrokerClient {
        events: Vec<BrokerEvent>,
    }

    impl BrokerClient for StubBrokerClient {
        fn connect(&mut self) -> Result<(), EngineError> {
            Ok(())
        }
        fn disconnect(&mut self) {}
        fn request_market_data(&mut self, _symbol: &str, _delayed: bool) {}
        fn request_historical(&mut self, _req: &HistoricalDataRequest) {}
        fn place_order(&mut self, _order: &Order) {}
        fn next_event(&mut self, _timeout: Duration) -> Option<BrokerEvent> {
            if self.events.is_empty() {
                std::thread::sleep(Duration::from_millis(10));
                None
            } else {
                Some(self.events.remove(0))
            }
        }
    }

    #[test]
    fn live_adapter_completes_handshake_before_connect_returns() {
        let queue = EventQueue::new(16);
        let client = Box::new(StubBrokerClient {
            events: vec![BrokerEvent::NextValidId(42)],
        });
        let mut adapter = LiveGatewayAdapter::new(client, queue.sender());
        adapter.connect().unwrap();

        match queue.wait_pop_timeout(Duration::from_secs(1)).unwrap() {
            Event::NextValidId(id) => assert_eq!(id, 42),
            other => panic!("unexpected event: {other:?}"),
        }
        adapter.disconnect();
    }

    #[test]
    fn live_adapter_fails_connect_when_handshake_never_arrives() {
        let queue = EventQueue::new(16);
        let client = Box::new(StubBrokerClient { events: vec![] });
        let mut adapter =
            LiveGatewayAdapter::new(client, queue.sender()).with_handshake_timeout(Duration::from_millis(100));

        let err = adapter.connect().unwrap_err();
        assert!(matches!(err, EngineError::ConnectionLost { .. }));
    }
}

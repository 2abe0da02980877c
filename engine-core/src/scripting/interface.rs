//! Publish/subscribe transport binding the Scripting Interface's two sockets
//! and driving the inbound listener thread.
//!
//! The listener's cancellation avoids the fixed-latency poll/sleep loop of
//! the original (`recv(dontwait)` then `sleep(100ms)`): a second, inproc PAIR
//! socket is polled alongside the subscribe socket, and `stop()` wakes the
//! listener by sending on it. `zmq::poll` blocks until either socket is
//! readable, so shutdown latency is bounded only by wakeup delivery, not by a
//! sleep interval.

use crate::core::{EngineError, HistoricalBar, Tick};
use crate::event::Event;
use crate::queue::EventSender;
use crate::scripting::wire::{self, InboundCommand};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

static WAKEUP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn transport_error(context: &'static str, e: zmq::Error) -> EngineError {
    EngineError::ConnectionLost {
        reason: format!("{context}: {e}"),
    }
}

pub struct ScriptingInterface {
    context: zmq::Context,
    publish_endpoint: String,
    subscribe_endpoint: String,
    publisher: Option<zmq::Socket>,
    wakeup: Option<zmq::Socket>,
    listener: Option<JoinHandle<()>>,
}

impl ScriptingInterface {
    pub fn new(publish_endpoint: impl Into<String>, subscribe_endpoint: impl Into<String>) -> Self {
        Self {
            context: zmq::Context::new(),
            publish_endpoint: publish_endpoint.into(),
            subscribe_endpoint: subscribe_endpoint.into(),
            publisher: None,
            wakeup: None,
            listener: None,
        }
    }

    /// Bind both sockets, subscribe to every topic, and spawn the listener
    /// thread. `on_mock_start` is invoked (from the listener thread) whenever
    /// a `MOCK` command arrives — the engine supplies either the mock
    /// adapter's start hook or a no-op warning, depending on its run mode.
    pub fn start(
        &mut self,
        sender: EventSender,
        on_mock_start: Arc<dyn Fn() + Send + Sync>,
    ) -> Result<(), EngineError> {
        let publisher = self
            .context
            .socket(zmq::PUB)
            .map_err(|e| transport_error("creating publish socket", e))?;
        publisher
            .bind(&self.publish_endpoint)
            .map_err(|e| transport_error("binding publish socket", e))?;

        let subscriber = self
            .context
            .socket(zmq::SUB)
            .map_err(|e| transport_error("creating subscribe socket", e))?;
        subscriber
            .bind(&self.subscribe_endpoint)
            .map_err(|e| transport_error("binding subscribe socket", e))?;
        subscriber
            .set_subscribe(b"")
            .map_err(|e| transport_error("subscribing to all topics", e))?;

        let wakeup_url = format!(
            "inproc://scripting-wakeup-{}",
            WAKEUP_COUNTER.fetch_add(1, Ordering::SeqCst)
        );
        let wakeup_recv = self
            .context
            .socket(zmq::PAIR)
            .map_err(|e| transport_error("creating wakeup socket", e))?;
        wakeup_recv
            .bind(&wakeup_url)
            .map_err(|e| transport_error("binding wakeup socket", e))?;
        let wakeup_send = self
            .context
            .socket(zmq::PAIR)
            .map_err(|e| transport_error("creating wakeup sender", e))?;
        wakeup_send
            .connect(&wakeup_url)
            .map_err(|e| transport_error("connecting wakeup sender", e))?;

        info!(
            publish = %self.publish_endpoint,
            subscribe = %self.subscribe_endpoint,
            "scripting interface bound"
        );

        let handle = thread::spawn(move || listen(subscriber, wakeup_recv, sender, on_mock_start));

        self.publisher = Some(publisher);
        self.wakeup = Some(wakeup_send);
        self.listener = Some(handle);
        Ok(())
    }

    /// Wake the listener, join it, and drop both bound sockets.
    pub fn stop(&mut self) {
        if let Some(wakeup) = self.wakeup.take() {
            if let Err(e) = wakeup.send("", 0) {
                warn!(error = %e, "failed to signal scripting listener shutdown");
            }
        }
        if let Some(handle) = self.listener.take() {
            let _ = handle.join();
        }
        self.publisher = None;
        info!("scripting interface stopped");
    }

    pub fn is_running(&self) -> bool {
        self.publisher.is_some()
    }

    /// Publish a `TICK.<symbol>` message. Called only from the event-loop
    /// thread, so the two-frame send is never interleaved with another publish.
    pub fn publish_tick(&self, tick: &Tick) -> Result<(), EngineError> {
        let publisher = self.publisher.as_ref().ok_or(EngineError::GatewayUnavailable {
            operation: "publish_tick",
        })?;
        let topic = wire::tick_topic(&tick.symbol);
        let payload = wire::encode_tick(tick)?;
        publisher
            .send(topic.as_bytes(), zmq::SNDMORE)
            .map_err(|e| transport_error("sending tick topic frame", e))?;
        publisher
            .send(payload.as_bytes(), 0)
            .map_err(|e| transport_error("sending tick payload frame", e))?;
        Ok(())
    }

    /// Publish a `HISTORY.<symbol>` message.
    pub fn publish_bar(&self, bar: &HistoricalBar) -> Result<(), EngineError> {
        let publisher = self.publisher.as_ref().ok_or(EngineError::GatewayUnavailable {
            operation: "publish_bar",
        })?;
        let topic = wire::history_topic(&bar.symbol);
        let payload = wire::encode_history(bar)?;
        publisher
            .send(topic.as_bytes(), zmq::SNDMORE)
            .map_err(|e| transport_error("sending history topic frame", e))?;
        publisher
            .send(payload.as_bytes(), 0)
            .map_err(|e| transport_error("sending history payload frame", e))?;
        Ok(())
    }
}

impl Drop for ScriptingInterface {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

fn listen(
    subscriber: zmq::Socket,
    wakeup: zmq::Socket,
    sender: EventSender,
    on_mock_start: Arc<dyn Fn() + Send + Sync>,
) {
    loop {
        let mut items = [subscriber.as_poll_item(zmq::POLLIN), wakeup.as_poll_item(zmq::POLLIN)];
        if let Err(e) = zmq::poll(&mut items, -1) {
            warn!(error = %e, "scripting listener poll failed, stopping");
            return;
        }

        if items[1].is_readable() {
            let _ = wakeup.recv_bytes(0);
            debug!("scripting listener received shutdown wakeup");
            return;
        }

        if !items[0].is_readable() {
            continue;
        }

        let topic = match subscriber.recv_bytes(0) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to receive topic frame, dropping message");
                continue;
            }
        };
        let payload = match subscriber.recv_bytes(0) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to receive payload frame, dropping message");
                continue;
            }
        };

        let topic_str = String::from_utf8_lossy(&topic);
        match wire::decode_inbound(&topic_str, &payload) {
            Ok(InboundCommand::Queued(event)) => sender.push(event),
            Ok(InboundCommand::StartMockFeed) => on_mock_start(),
            Err(e) => warn!(%e, "dropping malformed inbound message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::EventQueue;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[test]
    fn create_order_round_trips_over_the_wire() {
        let queue = EventQueue::new(16);
        let mut interface = ScriptingInterface::new(
            "inproc://test-pub-1",
            "inproc://test-sub-1",
        );
        // inproc endpoints require both ends to share one zmq::Context; bind
        // happens inside start(), so connect a throwaway publisher on the
        // same context to drive the command socket.
        let client = interface.context.socket(zmq::PUB).unwrap();

        interface
            .start(queue.sender(), Arc::new(|| {}))
            .unwrap();
        client.connect("inproc://test-sub-1").unwrap();
        // Give the SUB side a moment to complete its connect handshake.
        thread::sleep(Duration::from_millis(100));

        client
            .send("CREATE_ORDER", zmq::SNDMORE)
            .unwrap();
        client
            .send(r#"{"symbol":"AAPL","side":"BUY","order_type":"MARKET","quantity":50}"#, 0)
            .unwrap();

        let event = queue.wait_pop_timeout(Duration::from_secs(2)).unwrap();
        match event {
            Event::OrderRequest(order) => {
                assert_eq!(order.symbol, "AAPL");
                assert_eq!(order.quantity, 50.0);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        interface.stop();
    }

    #[test]
    fn mock_topic_invokes_callback_without_enqueuing_an_event() {
        let queue = EventQueue::new(16);
        let mut interface = ScriptingInterface::new("inproc://test-pub-2", "inproc://test-sub-2");
        let client = interface.context.socket(zmq::PUB).unwrap();

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = Arc::clone(&called);

        interface
            .start(queue.sender(), Arc::new(move || called_clone.store(true, Ordering::SeqCst)))
            .unwrap();
        client.connect("inproc://test-sub-2").unwrap();
        thread::sleep(Duration::from_millis(100));

        client.send("MOCK", zmq::SNDMORE).unwrap();
        client.send("{}", 0).unwrap();

        thread::sleep(Duration::from_millis(200));
        assert!(called.load(Ordering::SeqCst));
        assert!(queue.try_pop().is_none());

        interface.stop();
    }

    #[test]
    fn stop_joins_listener_promptly_without_pending_messages() {
        let queue = EventQueue::new(16);
        let mut interface = ScriptingInterface::new("inproc://test-pub-3", "inproc://test-sub-3");
        interface.start(queue.sender(), Arc::new(|| {})).unwrap();

        let start = std::time::Instant::now();
        interface.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}

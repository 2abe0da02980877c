//! Bounded, many-producer/single-consumer event queue.
//!
//! FIFO per producer: events pushed by the same producer thread are observed
//! by the consumer in push order. Events from different producers interleave,
//! but each event is observed exactly once. The bound exists only to apply
//! backpressure under a flooded feed — a producer blocks on `push` rather than
//! the queue growing without limit.

use crate::event::Event;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::time::Duration;

/// Queue depth chosen generously above the rate any single producer in this
/// engine (mock CSV feed, scripting listener, one broker adapter) can sustain;
/// a full queue indicates a consumer stall, not normal backpressure.
pub const DEFAULT_CAPACITY: usize = 4096;

/// A cloneable handle producers use to post events. Holding only a `Sender`
/// (never a reference back into the engine) is what keeps market-data and
/// execution adapters from needing a backpointer into `EngineCore`.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Push an event. Blocks the caller only if the queue is at capacity.
    pub fn push(&self, event: Event) {
        if let Err(TrySendError::Full(event)) = self.inner.try_send(event) {
            // Queue is saturated: fall back to a blocking send so the producer
            // applies backpressure instead of the queue growing unbounded.
            let _ = self.inner.send(event);
        }
    }
}

/// The consumer side, owned exclusively by the engine core.
pub struct EventQueue {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// A new handle producers can clone and hold onto.
    pub fn sender(&self) -> EventSender {
        EventSender { inner: self.sender.clone() }
    }

    /// Push directly from the consumer side (used to post `Shutdown`).
    pub fn push(&self, event: Event) {
        EventSender { inner: self.sender.clone() }.push(event);
    }

    /// Block until an event is available.
    pub fn wait_pop(&self) -> Event {
        // The queue always holds its own sender alive, so `recv()` never
        // observes a disconnected channel during normal operation.
        self.receiver.recv().expect("event queue sender dropped unexpectedly")
    }

    /// Block until an event is available or `timeout` elapses.
    pub fn wait_pop_timeout(&self, timeout: Duration) -> Option<Event> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

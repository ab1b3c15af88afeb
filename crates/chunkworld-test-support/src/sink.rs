//! Test sinks — mock `SessionSink` implementations for tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chunkworld_core::session::{Delivery, SessionSink};
use chunkworld_core::snapshot::ChunkSnapshot;

/// A sink that accepts every payload and records it decoded.
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<ChunkSnapshot>>,
}

impl RecordingSink {
    /// Creates a new recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every snapshot received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn snapshots(&self) -> Vec<ChunkSnapshot> {
        self.received.lock().unwrap().clone()
    }

    /// Returns the most recent snapshot, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn last(&self) -> Option<ChunkSnapshot> {
        self.received.lock().unwrap().last().cloned()
    }

    /// Forgets everything received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        self.received.lock().unwrap().clear();
    }
}

#[async_trait]
impl SessionSink for RecordingSink {
    async fn deliver(&self, payload: Arc<str>) -> Delivery {
        let snapshot: ChunkSnapshot =
            serde_json::from_str(&payload).expect("hub sent a malformed snapshot");
        self.received.lock().unwrap().push(snapshot);
        Delivery::Delivered
    }
}

/// A sink whose client has gone away: every delivery fails.
#[derive(Debug, Default)]
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    /// Creates a new failing sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many deliveries were attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionSink for FailingSink {
    async fn deliver(&self, _payload: Arc<str>) -> Delivery {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Delivery::Failed
    }
}

/// A sink that accepts payloads until its client is dropped mid-session.
#[derive(Debug, Default)]
pub struct DroppableSink {
    dropped: AtomicBool,
    delivered: AtomicUsize,
}

impl DroppableSink {
    /// Creates a sink whose client is still connected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later delivery fail.
    pub fn drop_client(&self) {
        self.dropped.store(true, Ordering::SeqCst);
    }

    /// Returns how many deliveries succeeded.
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionSink for DroppableSink {
    async fn deliver(&self, _payload: Arc<str>) -> Delivery {
        if self.dropped.load(Ordering::SeqCst) {
            return Delivery::Failed;
        }
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Delivery::Delivered
    }
}

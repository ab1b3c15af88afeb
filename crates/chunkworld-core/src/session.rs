//! Session handles and the outbound delivery seam.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

/// Opaque identifier of one connected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of handing one payload to a session's client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The payload was accepted for sending.
    Delivered,
    /// The client is gone; the session should be disconnected.
    Failed,
}

/// Outbound endpoint of a session, supplied by the transport on connect.
#[async_trait]
pub trait SessionSink: Send + Sync + fmt::Debug {
    /// Hands an encoded snapshot to the client.
    async fn deliver(&self, payload: Arc<str>) -> Delivery;
}

//! WebSocket transport. Each socket becomes one hub session for its lifetime.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::{Router, routing::get};
use chunkworld_core::session::{Delivery, SessionId, SessionSink};
use chunkworld_hub::{Command, Hub};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Snapshots buffered per socket before the client counts as unreachable.
const OUTBOUND_QUEUE: usize = 32;

/// Hands payloads to the socket's writer half without waiting on the socket.
/// A full queue means the peer stopped reading, which fails the delivery so
/// the hub disconnects the session.
#[derive(Debug)]
struct ChannelSink {
    tx: mpsc::Sender<Arc<str>>,
}

#[async_trait]
impl SessionSink for ChannelSink {
    async fn deliver(&self, payload: Arc<str>) -> Delivery {
        match self.tx.try_send(payload) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => {
                warn!("outbound queue full, dropping slow client");
                Delivery::Failed
            }
            Err(TrySendError::Closed(_)) => Delivery::Failed,
        }
    }
}

/// GET /ws
async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state.hub))
}

async fn run_session(mut socket: WebSocket, hub: Arc<Hub>) {
    let session = SessionId::new();
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);

    match hub.connect(session, Arc::new(ChannelSink { tx })).await {
        Ok(()) => pump(&mut socket, &hub, session, rx).await,
        Err(err) => error!(%session, error = %err, "failed to connect session"),
    }

    if let Err(err) = hub.disconnect(session).await {
        error!(%session, error = %err, "failed to disconnect session");
    }
    info!(%session, "socket closed");
}

/// Relays outbound snapshots and inbound commands until either side ends.
async fn pump(
    socket: &mut WebSocket,
    hub: &Hub,
    session: SessionId,
    mut rx: mpsc::Receiver<Arc<str>>,
) {
    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(payload) = outbound else { break };
                if socket.send(Message::Text(payload.to_string().into())).await.is_err() {
                    debug!(%session, "socket write failed");
                    break;
                }
            }
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let Some(command) = Command::from_message(text.as_str()) else {
                        continue;
                    };
                    if let Err(err) = hub.apply(session, command).await {
                        error!(%session, error = %err, "command failed");
                        break;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Returns the WebSocket router.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(upgrade))
}

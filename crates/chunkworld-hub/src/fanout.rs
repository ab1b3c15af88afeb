//! Broadcast fanout.
//!
//! Snapshots are encoded from the live grid at send time, under the lock, and
//! delivered after it is released. Sessions whose delivery fails are collected
//! and forced through the regular disconnect path once the pass is over; the
//! chunks they vacate are queued for another pass.

use std::collections::VecDeque;
use std::sync::Arc;

use chunkworld_core::chunk_id::ChunkId;
use chunkworld_core::error::WorldError;
use chunkworld_core::session::{Delivery, SessionId, SessionSink};
use chunkworld_core::snapshot::ChunkSnapshot;
use tracing::{error, warn};

use crate::hub::{Hub, World};

type Recipient = (SessionId, Arc<dyn SessionSink>);

impl World {
    fn encode(&self, chunk: ChunkId) -> Result<Option<Arc<str>>, WorldError> {
        let Some(grid) = self.chunks.get(&chunk) else {
            return Ok(None);
        };
        Ok(Some(ChunkSnapshot::capture(chunk, grid).to_json()?.into()))
    }

    /// Copies the watcher set of `chunk` so delivery can proceed while the
    /// set itself keeps changing.
    fn recipients(&self, chunk: ChunkId) -> Vec<Recipient> {
        self.watchers
            .get(&chunk)
            .into_iter()
            .flatten()
            .filter_map(|id| {
                self.sessions
                    .get(id)
                    .map(|state| (*id, Arc::clone(&state.sink)))
            })
            .collect()
    }
}

impl Hub {
    /// Sends the live state of `chunk` to every watcher, then disconnects
    /// each watcher whose delivery failed.
    ///
    /// # Errors
    ///
    /// Returns the first encoding error; the pass still reaches every other
    /// watcher. A failed forced disconnect is logged, not returned.
    pub async fn broadcast(&self, chunk: ChunkId) -> Result<(), WorldError> {
        self.fanout(vec![chunk]).await
    }

    pub(crate) async fn fanout(&self, chunks: Vec<ChunkId>) -> Result<(), WorldError> {
        let mut pending = VecDeque::from(chunks);
        let mut first_error = None;

        while let Some(chunk) = pending.pop_front() {
            let failed = match self.deliver_chunk(chunk).await {
                Ok(failed) => failed,
                Err(err) => {
                    error!(%chunk, error = %err, "failed to encode chunk snapshot");
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            for session in failed {
                match self.detach(session).await {
                    Ok(Some(vacated)) if !pending.contains(&vacated) => {
                        pending.push_back(vacated);
                    }
                    Ok(_) => {}
                    // Not the caller's session, so its failure stays here.
                    Err(err) => {
                        error!(%session, error = %err, "failed to disconnect unreachable session");
                    }
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Delivers the chunk `session` stands in to that session alone.
    pub(crate) async fn send_current_chunk(&self, session: SessionId) -> Result<(), WorldError> {
        let (payload, sink) = {
            let world = self.world.lock().await;
            let Some(state) = world.sessions.get(&session) else {
                return Ok(());
            };
            let Some(payload) = world.encode(state.location().chunk)? else {
                return Ok(());
            };
            (payload, Arc::clone(&state.sink))
        };

        if deliver_all(&payload, vec![(session, sink)]).await.is_empty() {
            return Ok(());
        }
        match self.detach(session).await? {
            Some(vacated) => self.fanout(vec![vacated]).await,
            None => Ok(()),
        }
    }

    /// Returns the watchers of `chunk` whose delivery failed.
    async fn deliver_chunk(&self, chunk: ChunkId) -> Result<Vec<SessionId>, WorldError> {
        let (payload, recipients) = {
            let world = self.world.lock().await;
            let Some(payload) = world.encode(chunk)? else {
                return Ok(Vec::new());
            };
            (payload, world.recipients(chunk))
        };
        Ok(deliver_all(&payload, recipients).await)
    }
}

async fn deliver_all(payload: &Arc<str>, recipients: Vec<Recipient>) -> Vec<SessionId> {
    let mut failed = Vec::new();
    for (session, sink) in recipients {
        if sink.deliver(Arc::clone(payload)).await == Delivery::Failed {
            warn!(%session, "snapshot delivery failed");
            failed.push(session);
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use chunkworld_core::cell::Cell;
    use chunkworld_core::chunk_id::ChunkId;
    use chunkworld_core::grid::WIDTH;
    use chunkworld_core::session::SessionId;
    use chunkworld_test_support::{
        DroppableSink, FailingSink, MemoryChunkStore, RecordingSink, SequenceRng,
    };
    use std::sync::Arc;

    use crate::hub::Hub;

    #[tokio::test]
    async fn test_failed_delivery_forces_disconnect_and_restores_ground() {
        // Arrange
        let store = Arc::new(MemoryChunkStore::new());
        let hub = Hub::new(
            store.clone(),
            Box::new(SequenceRng::new(vec![1, 1, 0, 0, 0, 2, 2, 3, 3, 3])),
        );
        let (healthy, dropped) = (SessionId::new(), SessionId::new());
        let healthy_sink = Arc::new(RecordingSink::new());
        let dropped_sink = Arc::new(FailingSink::new());
        hub.connect(healthy, healthy_sink.clone()).await.unwrap();

        // Act: the newcomer's own spawn broadcast fails.
        hub.connect(dropped, dropped_sink.clone()).await.unwrap();

        // Assert
        assert_eq!(dropped_sink.attempts(), 1);
        assert_eq!(hub.location(dropped).await, None);
        assert_eq!(hub.watchers(ChunkId::ROOT).await, vec![healthy]);
        assert_eq!(hub.cell(ChunkId::ROOT, 2, 2).await, Some(Cell::EMPTY));
        assert_eq!(store.stored(ChunkId::ROOT).unwrap().get(2, 2), Cell::EMPTY);
        assert_eq!(
            healthy_sink.last().unwrap().data[2 * WIDTH + 2],
            Cell::EMPTY.to_byte()
        );
    }

    #[tokio::test]
    async fn test_failed_delivery_restores_ground_exactly_once() {
        // Arrange
        let store = Arc::new(MemoryChunkStore::new());
        let hub = Hub::new(
            store.clone(),
            Box::new(SequenceRng::new(vec![7, 7, 1, 1, 1])),
        );
        let dropped = SessionId::new();
        hub.connect(dropped, Arc::new(FailingSink::new()))
            .await
            .unwrap();
        let saves = store.saved_ids().len();

        // Act: the transport notices the drop later and disconnects too.
        hub.disconnect(dropped).await.unwrap();

        // Assert
        assert_eq!(store.saved_ids().len(), saves);
        assert_eq!(hub.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_watcher_despite_one_failure() {
        // Arrange
        let store = Arc::new(MemoryChunkStore::new());
        let hub = Hub::new(
            store.clone(),
            Box::new(SequenceRng::new(vec![
                1, 1, 0, 0, 0, 2, 2, 0, 0, 0, 3, 3, 0, 0, 0,
            ])),
        );
        let (a, b) = (SessionId::new(), SessionId::new());
        let sink_a = Arc::new(RecordingSink::new());
        let sink_b = Arc::new(RecordingSink::new());
        hub.connect(a, sink_a.clone()).await.unwrap();
        hub.connect(b, sink_b.clone()).await.unwrap();
        sink_a.clear();
        sink_b.clear();

        // Act
        hub.connect(SessionId::new(), Arc::new(FailingSink::new()))
            .await
            .unwrap();

        // Assert: each healthy watcher saw the arrival, then the vacancy.
        for sink in [&sink_a, &sink_b] {
            let seen = sink.snapshots();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[0].data[3 * WIDTH + 3], Cell::EMPTY.with_occupant().to_byte());
            assert_eq!(seen[1].data[3 * WIDTH + 3], Cell::EMPTY.to_byte());
        }
        assert_eq!(hub.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_unpersisted_forced_disconnect_does_not_fail_the_broadcast() {
        // Arrange
        let store = Arc::new(MemoryChunkStore::new());
        let hub = Hub::new(
            store.clone(),
            Box::new(SequenceRng::new(vec![1, 1, 0, 0, 0, 2, 2, 0, 0, 0])),
        );
        let (healthy, dropped) = (SessionId::new(), SessionId::new());
        let healthy_sink = Arc::new(RecordingSink::new());
        let dropped_sink = Arc::new(DroppableSink::new());
        hub.connect(healthy, healthy_sink.clone()).await.unwrap();
        hub.connect(dropped, dropped_sink.clone()).await.unwrap();
        healthy_sink.clear();
        dropped_sink.drop_client();
        store.fail_saves(true);

        // Act
        let result = hub.broadcast(ChunkId::ROOT).await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(dropped_sink.delivered(), 1);
        assert_eq!(healthy_sink.snapshots().len(), 1);
        assert_eq!(hub.location(dropped).await, None);
        assert_eq!(hub.watchers(ChunkId::ROOT).await, vec![healthy]);
        assert!(hub.cell(ChunkId::ROOT, 2, 2).await.unwrap().is_occupied());
    }

    #[tokio::test]
    async fn test_broadcast_of_unknown_chunk_is_noop() {
        // Arrange
        let store = Arc::new(MemoryChunkStore::new());
        let hub = Hub::new(store.clone(), Box::new(SequenceRng::new(vec![])));

        // Act / Assert
        hub.broadcast(ChunkId::from_coords(9, 9)).await.unwrap();
        assert!(store.saved_ids().is_empty());
    }
}

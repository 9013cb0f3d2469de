use crate::use_cases::WorldUpdate;

use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;
use sync_protocol::{EntityData, EntityId, ServerMessage, encode_server_message};
use tokio::sync::{broadcast, watch};
use tracing::{error, warn};

/// One encoded message plus the entity it concerns.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityFrame {
    pub id: EntityId,
    pub frame: Utf8Bytes,
}

/// Every live entity as CREATE_OR_UPDATE frames, ordered by id.
pub type Snapshot = Arc<[EntityFrame]>;

/// What connections receive from the serializer.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldFrame {
    Upsert(EntityFrame),
    Destroy(EntityFrame),
    // Deltas were lost upstream; connections must rebuild from the snapshot.
    Resync,
}

/// Turns world updates into wire frames once, shared by every connection.
///
/// Each update refreshes the latest snapshot first, then fans out the changed
/// entities followed by one DESTROY per removed id. After falling behind the
/// world, the next update is published as a snapshot plus `Resync` instead of
/// deltas, because the skipped updates' changes and removals are gone.
pub async fn world_update_serializer(
    mut updates: broadcast::Receiver<WorldUpdate>,
    frames_tx: broadcast::Sender<WorldFrame>,
    snapshot_tx: watch::Sender<Snapshot>,
) {
    let mut resync_pending = false;
    loop {
        let update = match updates.recv().await {
            Ok(update) => update,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "serializer fell behind the world; forcing resync");
                resync_pending = true;
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world update stream ended; serializer stopping");
                return;
            }
        };

        let snapshot: Vec<EntityFrame> =
            update.entities.into_iter().filter_map(entity_frame).collect();
        // Stored even with no subscribers so later joiners start from it.
        snapshot_tx.send_replace(Arc::from(snapshot));

        // No subscribers is fine; connections come and go.
        if resync_pending {
            resync_pending = false;
            let _ = frames_tx.send(WorldFrame::Resync);
            continue;
        }

        let changed = update
            .changed
            .into_iter()
            .filter_map(entity_frame)
            .map(WorldFrame::Upsert);
        let destroyed = update
            .removed
            .into_iter()
            .filter_map(destroy_frame)
            .map(WorldFrame::Destroy);
        for frame in changed.chain(destroyed) {
            let _ = frames_tx.send(frame);
        }
    }
}

pub(crate) fn entity_frame(data: EntityData) -> Option<EntityFrame> {
    let id = data.id.clone();
    let frame = encode_frame(&ServerMessage::CreateOrUpdate(data))?;
    Some(EntityFrame { id, frame })
}

pub(crate) fn destroy_frame(id: EntityId) -> Option<EntityFrame> {
    let frame = encode_frame(&ServerMessage::Destroy { id: id.clone() })?;
    Some(EntityFrame { id, frame })
}

fn encode_frame(message: &ServerMessage) -> Option<Utf8Bytes> {
    encode_server_message(message)
        .inspect_err(|e| {
            error!(error = %e, event_type = ?message.event_type(), "dropping unencodable message");
        })
        .ok()
        .map(Utf8Bytes::from)
}

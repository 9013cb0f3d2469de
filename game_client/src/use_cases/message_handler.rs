// Applies inbound entity messages to the registry.

use crate::domain::{EntityChange, EntityRegistry, RegistryChange};
use sync_protocol::{ClientRole, GamePhase, ProtocolError, ServerMessage, decode_server_message};
use tracing::{debug, warn};

/// What one inbound frame amounts to once entity messages are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Changed(EntityChange),
    Phase(GamePhase),
    Identity { client_id: String, role: ClientRole },
    // Malformed, unknown, or a no-op for the registry.
    Ignored,
}

/// Sole writer of the entity registry.
#[derive(Debug, Default)]
pub struct MessageHandler {
    registry: EntityRegistry,
}

impl MessageHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Decodes and dispatches one frame. Bad frames are logged and dropped.
    pub fn handle_text(&mut self, text: &str) -> Inbound {
        match decode_server_message(text) {
            Ok(message) => self.dispatch(message),
            Err(err) => {
                log_dropped(&err, text.len());
                Inbound::Ignored
            }
        }
    }

    /// Applies entity messages; session messages are handed back untouched.
    pub fn dispatch(&mut self, message: ServerMessage) -> Inbound {
        match message {
            ServerMessage::PhaseChange { phase } => Inbound::Phase(phase),
            ServerMessage::Identity { client_id, role } => Inbound::Identity { client_id, role },
            entity => self
                .apply_message(entity)
                .map_or(Inbound::Ignored, Inbound::Changed),
        }
    }

    /// Applies one typed message; returns what changed, if anything.
    pub fn apply_message(&mut self, message: ServerMessage) -> Option<EntityChange> {
        match message {
            ServerMessage::CreateOrUpdate(data) => {
                let id = data.id.clone();
                let change = match self.registry.upsert(data) {
                    RegistryChange::Created => EntityChange::Created(id),
                    RegistryChange::Updated => EntityChange::Updated(id),
                };
                Some(change)
            }
            ServerMessage::Destroy { id } => match self.registry.remove(&id) {
                Some(_) => Some(EntityChange::Destroyed(id)),
                None => {
                    // Late or duplicate destroy, or an entity we never materialized.
                    debug!(entity_id = %id, "destroy for unknown entity ignored");
                    None
                }
            },
            other @ (ServerMessage::PhaseChange { .. } | ServerMessage::Identity { .. }) => {
                warn!(event_type = ?other.event_type(), "unhandled message in entity handler");
                None
            }
        }
    }
}

fn log_dropped(err: &ProtocolError, bytes: usize) {
    if err.is_unknown_event() {
        warn!(error = %err, "unhandled event type; dropping message");
    } else {
        warn!(error = %err, bytes, "failed to parse server message; dropping");
    }
}

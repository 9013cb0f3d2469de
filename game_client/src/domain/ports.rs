use crate::domain::presentation::PresentationContext;
use crate::domain::registry::EntityRegistry;
use std::fmt;
use sync_protocol::{EntityId, GamePhase};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    // The transport is gone; nothing queued after this will be delivered.
    Closed,
    // Outbound queue is full; the message was dropped.
    Full,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Closed => write!(f, "connection closed"),
            ConnectionError::Full => write!(f, "outbound queue full"),
        }
    }
}

impl std::error::Error for ConnectionError {}

// Port for the persistent bidirectional socket. The core never owns its lifecycle.
pub trait Connection {
    fn send(&self, text: String) -> Result<(), ConnectionError>;
}

// The writer task owns the socket sink and drains this queue.
impl Connection for mpsc::Sender<String> {
    fn send(&self, text: String) -> Result<(), ConnectionError> {
        self.try_send(text).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => ConnectionError::Full,
            mpsc::error::TrySendError::Closed(_) => ConnectionError::Closed,
        })
    }
}

/// Registry mutation reported to the render collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityChange {
    Created(EntityId),
    Updated(EntityId),
    Destroyed(EntityId),
}

// Port for the presentation layer. It reads the registry; it never writes to it.
pub trait RenderSink {
    fn initialize_phase(&mut self, phase: GamePhase, context: &PresentationContext);
    fn entity_changed(&mut self, change: &EntityChange, registry: &EntityRegistry);
    fn connectivity_lost(&mut self);
}

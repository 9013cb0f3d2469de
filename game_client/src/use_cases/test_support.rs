use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sync_protocol::GamePhase;

use crate::domain::{
    Connection, ConnectionError, EntityChange, EntityRegistry, PresentationContext, RenderSink,
};

// Shared outbound log so tests can inspect what the session sent after handing it a clone.
#[derive(Clone, Default)]
pub(crate) struct RecordingConnection {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    full: Arc<AtomicBool>,
}

impl RecordingConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }

    // Simulates the transport going away.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    // Simulates a backed-up outbound queue.
    pub(crate) fn set_full(&self, full: bool) {
        self.full.store(full, Ordering::SeqCst);
    }
}

impl Connection for RecordingConnection {
    fn send(&self, text: String) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }
        if self.full.load(Ordering::SeqCst) {
            return Err(ConnectionError::Full);
        }
        self.sent.lock().expect("sent mutex poisoned").push(text);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RenderCall {
    InitializePhase(GamePhase, PresentationContext),
    // Registry size observed at notification time.
    EntityChanged(EntityChange, usize),
    ConnectivityLost,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingRender {
    pub(crate) calls: Vec<RenderCall>,
}

impl RenderSink for RecordingRender {
    fn initialize_phase(&mut self, phase: GamePhase, context: &PresentationContext) {
        self.calls
            .push(RenderCall::InitializePhase(phase, context.clone()));
    }

    fn entity_changed(&mut self, change: &EntityChange, registry: &EntityRegistry) {
        self.calls
            .push(RenderCall::EntityChanged(change.clone(), registry.len()));
    }

    fn connectivity_lost(&mut self) {
        self.calls.push(RenderCall::ConnectivityLost);
    }
}

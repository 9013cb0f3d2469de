// Use-case level inputs/outputs for the game loop.

use sync_protocol::{ClientEventType, ClientRole, EntityData, EntityId};

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join { client_id: String, role: ClientRole },
    Leave { client_id: String },
    Input { client_id: String, event: ClientEventType },
}

/// Entity changes produced by one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldUpdate {
    pub tick: u64,
    pub changed: Vec<EntityData>,
    pub removed: Vec<EntityId>,
    // Full entity set after this tick, for join and lag recovery.
    pub entities: Vec<EntityData>,
}

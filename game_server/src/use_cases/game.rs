use super::types::{GameEvent, WorldUpdate};
use crate::domain::systems::movement::{self, MovementConfig};
use crate::domain::{PlayerTuning, WorldBounds, WorldEntity};

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use sync_protocol::{EntityId, GamePhase};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct WorldSettings {
    pub tick_interval: Duration,
    // Time spent in the lobby before gameplay is announced.
    pub gameplay_countdown: Duration,
    pub player: PlayerTuning,
    pub bounds: WorldBounds,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1000 / 60),
            gameplay_countdown: Duration::from_secs(3),
            player: PlayerTuning::default(),
            bounds: WorldBounds::default(),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct TickOutcome {
    pub phase: Option<GamePhase>,
    pub update: Option<WorldUpdate>,
}

/// The authoritative entity set. Only the world task mutates it.
pub struct World {
    settings: WorldSettings,
    entities: BTreeMap<EntityId, WorldEntity>,
    // Entities to broadcast at the end of the current tick.
    dirty: BTreeSet<EntityId>,
    removed: Vec<EntityId>,
    phase: GamePhase,
    elapsed: Duration,
    tick: u64,
    next_slot: usize,
}

impl World {
    pub fn new(settings: WorldSettings) -> Self {
        Self {
            settings,
            entities: BTreeMap::new(),
            dirty: BTreeSet::new(),
            removed: Vec::new(),
            phase: GamePhase::Lobby,
            elapsed: Duration::ZERO,
            tick: 0,
            next_slot: 0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn entity(&self, id: &EntityId) -> Option<&WorldEntity> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Join { client_id, role } => {
                if !role.accepts_input() {
                    info!(%client_id, ?role, "spectator joined");
                    return;
                }

                let id = EntityId::new(client_id);
                if self.entities.contains_key(&id) {
                    warn!(entity_id = %id, "duplicate join ignored");
                    return;
                }

                let entity =
                    WorldEntity::spawn(id.clone(), self.next_slot, &self.settings.player, self.settings.bounds);
                self.next_slot = self.next_slot.wrapping_add(1);
                info!(entity_id = %id, x = entity.position.x, y = entity.position.y, "player joined");
                self.entities.insert(id.clone(), entity);
                self.dirty.insert(id);
            }
            GameEvent::Leave { client_id } => {
                let id = EntityId::new(client_id);
                if self.entities.remove(&id).is_some() {
                    info!(entity_id = %id, "player left");
                    self.dirty.remove(&id);
                    self.removed.push(id);
                } else {
                    debug!(entity_id = %id, "leave for client without entity");
                }
            }
            GameEvent::Input { client_id, event } => {
                let id = EntityId::new(client_id);
                match self.entities.get_mut(&id) {
                    Some(entity) => {
                        if entity.apply_input(event) {
                            self.dirty.insert(id);
                        }
                    }
                    None => debug!(entity_id = %id, ?event, "input for unknown entity"),
                }
            }
        }
    }

    /// Advances the world by `dt` and collects what clients need to hear about.
    pub fn step(&mut self, dt: Duration) -> TickOutcome {
        self.tick += 1;
        let mut outcome = TickOutcome::default();

        if self.phase == GamePhase::Lobby {
            self.elapsed += dt;
            if self.elapsed >= self.settings.gameplay_countdown {
                self.phase = GamePhase::Gameplay;
                info!(tick = self.tick, "gameplay started");
                outcome.phase = Some(self.phase);
            }
        }

        // Movement only runs once gameplay is live.
        if self.phase == GamePhase::Gameplay {
            let cfg = MovementConfig {
                move_speed: self.settings.player.move_speed,
                walk_frames: self.settings.player.walk_frames,
                bounds: self.settings.bounds,
            };
            let dt = dt.as_secs_f32();
            for (id, entity) in self.entities.iter_mut() {
                if movement::tick_entity(entity, dt, cfg) {
                    self.dirty.insert(id.clone());
                }
            }
        }

        if self.dirty.is_empty() && self.removed.is_empty() {
            return outcome;
        }

        let changed = std::mem::take(&mut self.dirty)
            .into_iter()
            .filter_map(|id| self.entities.get(&id).map(WorldEntity::to_data))
            .collect();
        outcome.update = Some(WorldUpdate {
            tick: self.tick,
            changed,
            removed: std::mem::take(&mut self.removed),
            entities: self.entities.values().map(WorldEntity::to_data).collect(),
        });
        outcome
    }
}

pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    phase_tx: watch::Sender<GamePhase>,
    settings: WorldSettings,
) {
    let tick_interval = settings.tick_interval;
    let mut world = World::new(settings);
    phase_tx.send_replace(world.phase());

    // Drive the fixed-step game loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        interval.tick().await;

        loop {
            match input_rx.try_recv() {
                Ok(event) => world.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("input channel closed; world task exiting");
                    return;
                }
            }
        }

        let outcome = world.step(tick_interval);
        if let Some(phase) = outcome.phase {
            phase_tx.send_replace(phase);
        }
        if let Some(update) = outcome.update {
            // No receivers just means nobody is connected.
            let _ = world_tx.send(update);
        }
    }
}

// Authoritative entity state owned by the world task.

use crate::domain::tuning::{PlayerTuning, WorldBounds};
use sync_protocol::{
    Animation, ClientEventType, ComponentSet, Control, Direction, EntityData, EntityId, KeyEdge,
    Position, Sprite,
};

pub const IDLE_SEQUENCE: &str = "idle";
pub const WALK_SEQUENCE: &str = "walk";

/// A player-controlled entity. Every component is always present server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldEntity {
    pub id: EntityId,
    pub control: Control,
    pub position: Position,
    pub sprite: Sprite,
    pub animation: Animation,
}

impl WorldEntity {
    /// Spawns in slot `slot` along the bottom of the playfield.
    pub fn spawn(id: EntityId, slot: usize, tuning: &PlayerTuning, bounds: WorldBounds) -> Self {
        let width = (bounds.max_x - bounds.min_x).max(tuning.spawn_spacing);
        let columns = ((width / tuning.spawn_spacing) as usize).max(1);
        let x = bounds.min_x + tuning.spawn_spacing * ((slot % columns) as f32 + 0.5);
        let y = bounds.min_y + tuning.spawn_spacing * 0.5;

        Self {
            id,
            control: Control::default(),
            position: Position {
                x: bounds.clamp_x(x),
                y: bounds.clamp_y(y),
            },
            sprite: Sprite {
                url: tuning.sprite_url.clone(),
                pixel_ratio: tuning.pixel_ratio,
            },
            animation: Animation {
                sequence: IDLE_SEQUENCE.to_string(),
                current_frame: 0,
            },
        }
    }

    /// Applies one input edge to the control flags. Returns true if a flag flipped.
    pub fn apply_input(&mut self, event: ClientEventType) -> bool {
        let (direction, edge) = event.edge();
        let held = matches!(edge, KeyEdge::Pressed);
        let flag = match direction {
            Direction::Left => &mut self.control.left,
            Direction::Right => &mut self.control.right,
            Direction::Up => &mut self.control.up,
            Direction::Down => &mut self.control.down,
            Direction::Attack => &mut self.control.attack,
        };

        let changed = *flag != held;
        *flag = held;
        changed
    }

    pub fn to_data(&self) -> EntityData {
        EntityData {
            id: self.id.clone(),
            components: ComponentSet {
                control: Some(self.control),
                position: Some(self.position),
                sprite: Some(self.sprite.clone()),
                animation: Some(self.animation.clone()),
            },
        }
    }
}

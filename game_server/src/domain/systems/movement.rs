use crate::domain::state::{IDLE_SEQUENCE, WALK_SEQUENCE, WorldEntity};
use crate::domain::tuning::WorldBounds;

#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub move_speed: f32,
    pub walk_frames: u32,
    pub bounds: WorldBounds,
}

/// Advances one entity by `dt` seconds. Returns true if anything visible changed.
pub fn tick_entity(entity: &mut WorldEntity, dt: f32, cfg: MovementConfig) -> bool {
    let control = entity.control;
    // Opposing keys cancel out.
    let dx = axis(control.right, control.left);
    let dy = axis(control.up, control.down);

    let before = entity.position;
    entity.position.x = cfg.bounds.clamp_x(before.x + dx * cfg.move_speed * dt);
    entity.position.y = cfg.bounds.clamp_y(before.y + dy * cfg.move_speed * dt);
    let moved = entity.position != before;

    let animation = &mut entity.animation;
    if moved {
        if animation.sequence != WALK_SEQUENCE {
            animation.sequence = WALK_SEQUENCE.to_string();
            animation.current_frame = 0;
        } else {
            animation.current_frame = (animation.current_frame + 1) % cfg.walk_frames.max(1);
        }
        true
    } else if animation.sequence != IDLE_SEQUENCE {
        animation.sequence = IDLE_SEQUENCE.to_string();
        animation.current_frame = 0;
        true
    } else {
        false
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

// Gameplay tuning for the demo world.

/// Playfield in world units; origin bottom-left, y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: 1280.0,
            min_y: 0.0,
            max_y: 720.0,
        }
    }
}

impl WorldBounds {
    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(self.min_x, self.max_x)
    }

    pub fn clamp_y(&self, y: f32) -> f32 {
        y.clamp(self.min_y, self.max_y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTuning {
    // World units per second.
    pub move_speed: f32,
    pub sprite_url: String,
    pub pixel_ratio: f32,
    // Frames in the walk clip before it loops.
    pub walk_frames: u32,
    // Horizontal gap between consecutive spawn slots.
    pub spawn_spacing: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_speed: 240.0,
            sprite_url: "static/player.png".to_string(),
            pixel_ratio: 1.0,
            walk_frames: 8,
            spawn_spacing: 96.0,
        }
    }
}

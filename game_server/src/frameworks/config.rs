use std::{env, path::PathBuf, time::Duration};

// Runtime/server constants (gameplay tuning lives in the domain).

pub fn http_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080)
}

pub fn static_dir() -> PathBuf {
    env::var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("public"))
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);
// Lobby time before gameplay is announced.
pub const GAMEPLAY_COUNTDOWN: Duration = Duration::from_secs(3);
// World units per second for held movement keys.
pub const MOVE_SPEED: f32 = 240.0;

// Domain layer: authoritative entity state and the rules that move it.

pub mod state;
pub mod systems;
pub mod tuning;

pub use state::WorldEntity;
pub use tuning::{PlayerTuning, WorldBounds};

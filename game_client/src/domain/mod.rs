// Domain layer: entity mirror, input vocabulary, presentation descriptions and ports.

pub mod assets;
pub mod input;
pub mod ports;
pub mod presentation;
pub mod registry;

pub use assets::{Asset, AssetCatalog, AssetKind, ResourceNotFound};
pub use input::{InputEvent, KeyCode, KeyState};
pub use ports::{Connection, ConnectionError, EntityChange, RenderSink};
pub use presentation::{PresentationContext, ScreenSize};
pub use registry::{Entity, EntityRegistry, RegistryChange};

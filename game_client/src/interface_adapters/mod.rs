// Interface adapters: websocket transport, asset loading, input source and render output.

pub mod assets;
pub mod input;
pub mod net;
pub mod render;

pub use assets::{AssetLoadError, load_assets};
pub use input::{parse_input_line, spawn_stdin_reader};
pub use net::{Identity, NetError};
pub use render::LogRender;

// Wire protocol and component model shared by the game client and server.

pub mod codec;
pub mod components;
pub mod error;
pub mod protocol;

pub use codec::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
};
pub use components::{Animation, ComponentSet, Control, Position, Sprite};
pub use error::ProtocolError;
pub use protocol::{
    ClientEventType, ClientMessage, ClientRole, Direction, EntityData, EntityId, GamePhase,
    KeyEdge, ServerEventType, ServerMessage,
};

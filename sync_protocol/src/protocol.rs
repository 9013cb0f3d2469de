// Shared vocabulary between client and server: closed event enumerations and message shapes.

use crate::components::ComponentSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Events the server emits to clients.
///
/// Entity lifecycle (`CreateOrUpdate`, `Destroy`) plus the two session events used to
/// announce identity and phase changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEventType {
    CreateOrUpdate,
    Destroy,
    PhaseChange,
    Identity,
}

/// Input-edge events a client emits to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEventType {
    LeftKeyDown,
    LeftKeyUp,
    RightKeyDown,
    RightKeyUp,
    UpKeyDown,
    UpKeyUp,
    DownKeyDown,
    DownKeyUp,
    AttackKeyDown,
    AttackKeyUp,
}

/// Capability class of a connected participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientRole {
    #[default]
    Player,
    Spectator,
}

impl ClientRole {
    /// Only players route keyboard input into the translator.
    pub fn accepts_input(self) -> bool {
        matches!(self, ClientRole::Player)
    }
}

/// Server-announced stage that drives client (re)initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Lobby,
    Gameplay,
    Ended,
}

/// Semantic direction behind a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    Attack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEdge {
    Pressed,
    Released,
}

impl Direction {
    pub fn key_down_event(self) -> ClientEventType {
        match self {
            Direction::Left => ClientEventType::LeftKeyDown,
            Direction::Right => ClientEventType::RightKeyDown,
            Direction::Up => ClientEventType::UpKeyDown,
            Direction::Down => ClientEventType::DownKeyDown,
            Direction::Attack => ClientEventType::AttackKeyDown,
        }
    }

    pub fn key_up_event(self) -> ClientEventType {
        match self {
            Direction::Left => ClientEventType::LeftKeyUp,
            Direction::Right => ClientEventType::RightKeyUp,
            Direction::Up => ClientEventType::UpKeyUp,
            Direction::Down => ClientEventType::DownKeyUp,
            Direction::Attack => ClientEventType::AttackKeyUp,
        }
    }
}

impl ClientEventType {
    /// Splits an event back into the direction and edge it encodes.
    pub fn edge(self) -> (Direction, KeyEdge) {
        match self {
            ClientEventType::LeftKeyDown => (Direction::Left, KeyEdge::Pressed),
            ClientEventType::LeftKeyUp => (Direction::Left, KeyEdge::Released),
            ClientEventType::RightKeyDown => (Direction::Right, KeyEdge::Pressed),
            ClientEventType::RightKeyUp => (Direction::Right, KeyEdge::Released),
            ClientEventType::UpKeyDown => (Direction::Up, KeyEdge::Pressed),
            ClientEventType::UpKeyUp => (Direction::Up, KeyEdge::Released),
            ClientEventType::DownKeyDown => (Direction::Down, KeyEdge::Pressed),
            ClientEventType::DownKeyUp => (Direction::Down, KeyEdge::Released),
            ClientEventType::AttackKeyDown => (Direction::Attack, KeyEdge::Pressed),
            ClientEventType::AttackKeyUp => (Direction::Attack, KeyEdge::Released),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// An entity's serialized component set, as carried in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    pub id: EntityId,
    #[serde(flatten)]
    pub components: ComponentSet,
}

/// Identifies the entity a destroy message targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePayload {
    pub phase: GamePhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPayload {
    pub client_id: String,
    pub role: ClientRole,
}

/// Typed form of every message the server may send.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    CreateOrUpdate(EntityData),
    Destroy { id: EntityId },
    PhaseChange { phase: GamePhase },
    Identity { client_id: String, role: ClientRole },
}

impl ServerMessage {
    pub fn event_type(&self) -> ServerEventType {
        match self {
            ServerMessage::CreateOrUpdate(_) => ServerEventType::CreateOrUpdate,
            ServerMessage::Destroy { .. } => ServerEventType::Destroy,
            ServerMessage::PhaseChange { .. } => ServerEventType::PhaseChange,
            ServerMessage::Identity { .. } => ServerEventType::Identity,
        }
    }
}

/// A discrete input-edge event, identified by the emitting client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessage {
    pub event_type: ClientEventType,
    pub client_id: String,
}

// Edge-triggered translation of raw key transitions into protocol messages.

use crate::domain::{KeyCode, KeyState};
use sync_protocol::{ClientEventType, ClientMessage, Direction, KeyEdge};
use tracing::trace;

#[derive(Debug)]
pub struct InputTranslator {
    client_id: String,
    keys: KeyState,
}

impl InputTranslator {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            keys: KeyState::default(),
        }
    }

    pub fn key_state(&self) -> KeyState {
        self.keys
    }

    /// Returns a message only on an idle to pressed transition; repeats yield `None`.
    pub fn on_key_down(&mut self, key: KeyCode) -> Option<ClientMessage> {
        let direction = key.direction()?;
        let flag = self.flag_mut(direction)?;
        if *flag {
            return None;
        }
        *flag = true;
        Some(self.message(direction.key_down_event()))
    }

    /// Returns a message only on a pressed to idle transition.
    pub fn on_key_up(&mut self, key: KeyCode) -> Option<ClientMessage> {
        let direction = key.direction()?;
        let flag = self.flag_mut(direction)?;
        if !*flag {
            return None;
        }
        *flag = false;
        Some(self.message(direction.key_up_event()))
    }

    /// Undoes the edge recorded for `event_type` when its message never left,
    /// so the next key event produces it again.
    pub fn rollback(&mut self, event_type: ClientEventType) {
        let (direction, edge) = event_type.edge();
        if let Some(flag) = self.flag_mut(direction) {
            *flag = edge == KeyEdge::Released;
        }
    }

    fn flag_mut(&mut self, direction: Direction) -> Option<&mut bool> {
        match direction {
            Direction::Left => Some(&mut self.keys.left_is_down),
            Direction::Right => Some(&mut self.keys.right_is_down),
            Direction::Up | Direction::Down | Direction::Attack => {
                // Reserved: mapped but not yet sent to the server.
                trace!(?direction, "input direction not wired");
                None
            }
        }
    }

    fn message(&self, event_type: ClientEventType) -> ClientMessage {
        ClientMessage {
            event_type,
            client_id: self.client_id.clone(),
        }
    }
}

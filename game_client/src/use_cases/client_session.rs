// Client state machine: routes server messages, reacts to phase changes and gates input by role.

use crate::domain::{
    Connection, ConnectionError, EntityRegistry, InputEvent, KeyState, PresentationContext,
    RenderSink, ScreenSize,
};
use crate::use_cases::input_translator::InputTranslator;
use crate::use_cases::message_handler::{Inbound, MessageHandler};
use sync_protocol::{ClientMessage, ClientRole, GamePhase, ServerMessage, encode_client_message};
use tracing::{debug, info, trace, warn};

/// Fixed at construction; the session never mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    // Server-assigned identity, stamped on every outbound message.
    pub client_id: String,
    pub role: ClientRole,
    pub screen: ScreenSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    Uninitialized,
    Active(GamePhase),
}

pub struct ClientSession<C, R> {
    config: SessionConfig,
    connection: C,
    render: R,
    handler: MessageHandler,
    input: InputTranslator,
    phase: ClientPhase,
    connection_lost: bool,
}

impl<C, R> ClientSession<C, R>
where
    C: Connection,
    R: RenderSink,
{
    pub fn new(config: SessionConfig, connection: C, render: R) -> Self {
        let input = InputTranslator::new(config.client_id.clone());
        Self {
            config,
            connection,
            render,
            handler: MessageHandler::new(),
            input,
            phase: ClientPhase::Uninitialized,
            connection_lost: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    pub fn registry(&self) -> &EntityRegistry {
        self.handler.registry()
    }

    pub fn key_state(&self) -> KeyState {
        self.input.key_state()
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn is_connection_lost(&self) -> bool {
        self.connection_lost
    }

    /// Ends the session, releasing the connection and returning the render collaborator.
    pub fn into_render(self) -> R {
        self.render
    }

    /// Inbound frame from the connection. Never fails; bad frames are dropped.
    pub fn on_server_text(&mut self, text: &str) {
        let inbound = self.handler.handle_text(text);
        self.on_inbound(inbound);
    }

    pub fn on_server_message(&mut self, message: ServerMessage) {
        let inbound = self.handler.dispatch(message);
        self.on_inbound(inbound);
    }

    fn on_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Changed(change) => {
                self.render.entity_changed(&change, self.handler.registry());
            }
            Inbound::Phase(phase) => {
                self.enter_phase(phase);
            }
            Inbound::Identity { client_id, role } => {
                // Identity is consumed during the handshake; later repeats change nothing.
                if client_id != self.config.client_id || role != self.config.role {
                    warn!(%client_id, ?role, "identity changed mid-session; ignoring");
                } else {
                    debug!("duplicate identity ignored");
                }
            }
            Inbound::Ignored => {}
        }
    }

    /// Transitions to `phase`, initializing presentation once per transition.
    ///
    /// Returns false when `phase` is already current (duplicate announcement).
    pub fn enter_phase(&mut self, phase: GamePhase) -> bool {
        if self.phase == ClientPhase::Active(phase) {
            debug!(?phase, "phase already active");
            return false;
        }

        info!(from = ?self.phase, to = ?phase, "entering phase");
        self.phase = ClientPhase::Active(phase);
        let context = PresentationContext::for_phase(phase, self.config.screen);
        self.render.initialize_phase(phase, &context);
        true
    }

    /// Raw input from the host platform; only players reach the translator.
    pub fn handle_event(&mut self, event: InputEvent) {
        if !self.config.role.accepts_input() {
            trace!(?event, role = ?self.config.role, "input dropped for role");
            return;
        }

        let message = match event {
            InputEvent::KeyDown(key) => self.input.on_key_down(key),
            InputEvent::KeyUp(key) => self.input.on_key_up(key),
        };

        if let Some(message) = message {
            self.send(&message);
        }
    }

    pub fn on_connection_lost(&mut self) {
        if self.connection_lost {
            return;
        }
        self.connection_lost = true;
        warn!(client_id = %self.config.client_id, "connection lost");
        self.render.connectivity_lost();
    }

    fn send(&mut self, message: &ClientMessage) {
        let text = match encode_client_message(message) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "failed to encode client message");
                return;
            }
        };

        match self.connection.send(text) {
            Ok(()) => debug!(event_type = ?message.event_type, "input sent"),
            Err(ConnectionError::Full) => {
                // Forget the edge so the next key event retries it.
                self.input.rollback(message.event_type);
                warn!(event_type = ?message.event_type, "outbound queue full; dropping input");
            }
            Err(ConnectionError::Closed) => self.on_connection_lost(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityChange, KeyCode};
    use crate::use_cases::test_support::{RecordingConnection, RecordingRender, RenderCall};
    use sync_protocol::{ClientEventType, EntityId, decode_client_message};

    fn session(role: ClientRole) -> ClientSession<RecordingConnection, RecordingRender> {
        ClientSession::new(
            SessionConfig {
                client_id: "client-1".to_string(),
                role,
                screen: ScreenSize {
                    width: 640,
                    height: 480,
                },
            },
            RecordingConnection::new(),
            RecordingRender::default(),
        )
    }

    fn sent_events(connection: &RecordingConnection) -> Vec<ClientEventType> {
        connection
            .sent()
            .iter()
            .map(|text| decode_client_message(text).unwrap().event_type)
            .collect()
    }

    #[test]
    fn when_spectator_presses_a_key_then_no_message_is_sent() {
        let connection = RecordingConnection::new();
        let mut session = ClientSession::new(
            SessionConfig {
                client_id: "watcher".to_string(),
                role: ClientRole::Spectator,
                screen: ScreenSize {
                    width: 640,
                    height: 480,
                },
            },
            connection.clone(),
            RecordingRender::default(),
        );

        session.handle_event(InputEvent::KeyDown(KeyCode::ARROW_LEFT));
        session.handle_event(InputEvent::KeyUp(KeyCode::ARROW_LEFT));

        assert!(connection.sent().is_empty());
        assert_eq!(session.key_state(), KeyState::default());
    }

    #[test]
    fn when_player_holds_a_key_then_one_down_and_one_up_are_sent() {
        let connection = RecordingConnection::new();
        let mut session = ClientSession::new(
            session(ClientRole::Player).config().clone(),
            connection.clone(),
            RecordingRender::default(),
        );

        for _ in 0..10 {
            session.handle_event(InputEvent::KeyDown(KeyCode::ARROW_RIGHT));
        }
        session.handle_event(InputEvent::KeyUp(KeyCode::ARROW_RIGHT));

        assert_eq!(
            sent_events(&connection),
            vec![ClientEventType::RightKeyDown, ClientEventType::RightKeyUp]
        );
        let first = decode_client_message(&connection.sent()[0]).unwrap();
        assert_eq!(first.client_id, "client-1");
    }

    #[test]
    fn when_gameplay_is_announced_repeatedly_then_presentation_initializes_once() {
        let mut session = session(ClientRole::Player);
        let phase_text = r#"{"eventType":"PHASE_CHANGE","data":{"phase":"GAMEPLAY"}}"#;

        session.on_server_text(phase_text);
        session.on_server_text(phase_text);
        session.on_server_text(phase_text);

        assert_eq!(session.phase(), ClientPhase::Active(GamePhase::Gameplay));
        let inits: Vec<_> = session
            .render()
            .calls
            .iter()
            .filter(|call| matches!(call, RenderCall::InitializePhase(..)))
            .collect();
        assert_eq!(inits.len(), 1);
        let RenderCall::InitializePhase(phase, context) = inits[0] else {
            unreachable!();
        };
        assert_eq!(*phase, GamePhase::Gameplay);
        assert_eq!(context.game.as_ref().unwrap().camera.right, 640.0);
    }

    #[test]
    fn when_phase_changes_then_each_transition_initializes_once() {
        let mut session = session(ClientRole::Spectator);

        assert!(session.enter_phase(GamePhase::Lobby));
        assert!(session.enter_phase(GamePhase::Gameplay));
        assert!(!session.enter_phase(GamePhase::Gameplay));
        assert!(session.enter_phase(GamePhase::Ended));

        let phases: Vec<GamePhase> = session
            .render()
            .calls
            .iter()
            .filter_map(|call| match call {
                RenderCall::InitializePhase(phase, _) => Some(*phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![GamePhase::Lobby, GamePhase::Gameplay, GamePhase::Ended]
        );
    }

    #[test]
    fn when_entity_messages_arrive_then_render_is_notified_per_change() {
        let mut session = session(ClientRole::Spectator);

        session.on_server_text(
            r#"{"eventType":"CREATE_OR_UPDATE","data":{"id":"e1","position":{"x":0,"y":0}}}"#,
        );
        session.on_server_text(r#"{"eventType":"DESTROY","data":{"id":"missing"}}"#);
        session.on_server_text(r#"{"eventType":"DESTROY","data":{"id":"e1"}}"#);

        assert_eq!(
            session.render().calls,
            vec![
                RenderCall::EntityChanged(EntityChange::Created(EntityId::from("e1")), 1),
                RenderCall::EntityChanged(EntityChange::Destroyed(EntityId::from("e1")), 0),
            ]
        );
    }

    #[test]
    fn when_unknown_or_malformed_frames_arrive_then_session_keeps_processing() {
        let mut session = session(ClientRole::Player);

        session.on_server_text(r#"{"eventType":"SCOREBOARD","data":{}}"#);
        session.on_server_text("garbage");
        session.on_server_text(
            r#"{"eventType":"CREATE_OR_UPDATE","data":{"id":"e1","position":{"x":1,"y":1}}}"#,
        );

        assert_eq!(session.registry().len(), 1);
        assert_eq!(session.phase(), ClientPhase::Uninitialized);
    }

    #[test]
    fn when_connection_is_closed_then_connectivity_lost_is_signalled_once() {
        let connection = RecordingConnection::new();
        connection.close();
        let mut session = ClientSession::new(
            session(ClientRole::Player).config().clone(),
            connection.clone(),
            RecordingRender::default(),
        );

        session.handle_event(InputEvent::KeyDown(KeyCode::ARROW_LEFT));
        session.on_connection_lost();

        assert!(session.is_connection_lost());
        assert_eq!(session.render().calls, vec![RenderCall::ConnectivityLost]);
    }

    #[test]
    fn when_outbound_queue_is_full_then_the_dropped_press_is_sent_on_retry() {
        let connection = RecordingConnection::new();
        let mut session = ClientSession::new(
            session(ClientRole::Player).config().clone(),
            connection.clone(),
            RecordingRender::default(),
        );

        connection.set_full(true);
        session.handle_event(InputEvent::KeyDown(KeyCode::ARROW_RIGHT));

        assert!(connection.sent().is_empty());
        assert_eq!(session.key_state(), KeyState::default());
        assert!(!session.is_connection_lost());

        connection.set_full(false);
        session.handle_event(InputEvent::KeyDown(KeyCode::ARROW_RIGHT));
        session.handle_event(InputEvent::KeyUp(KeyCode::ARROW_RIGHT));

        assert_eq!(
            sent_events(&connection),
            vec![ClientEventType::RightKeyDown, ClientEventType::RightKeyUp]
        );
    }

    #[test]
    fn when_identity_repeats_then_config_is_unchanged() {
        let mut session = session(ClientRole::Player);

        session.on_server_message(ServerMessage::Identity {
            client_id: "someone-else".to_string(),
            role: ClientRole::Spectator,
        });

        assert_eq!(session.config().client_id, "client-1");
        assert_eq!(session.config().role, ClientRole::Player);
    }
}

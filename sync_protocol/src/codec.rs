// JSON text codec: one object per WebSocket text frame.
//
// Envelopes are parsed with `eventType` as a raw string first so that unknown event
// types surface as `ProtocolError::UnknownEventType` instead of a generic parse error.

use crate::error::ProtocolError;
use crate::protocol::{
    ClientEventType, ClientMessage, EntityData, EntityRef, IdentityPayload,
    PhasePayload, ServerEventType, ServerMessage,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundEnvelope {
    event_type: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClientMessage {
    event_type: String,
    client_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboundEnvelope<'a, T: Serialize> {
    event_type: ServerEventType,
    data: &'a T,
}

fn parse_event_type<T: DeserializeOwned>(raw: String) -> Result<T, ProtocolError> {
    serde_json::from_value(Value::String(raw.clone()))
        .map_err(|_| ProtocolError::UnknownEventType(raw))
}

fn payload<T: DeserializeOwned>(
    event_type: ServerEventType,
    data: Option<Value>,
) -> Result<T, ProtocolError> {
    let data = data.ok_or(ProtocolError::MissingData(event_type))?;
    serde_json::from_value(data)
        .map_err(|source| ProtocolError::InvalidPayload { event_type, source })
}

/// Decodes one inbound (server to client) frame.
pub fn decode_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    let envelope: InboundEnvelope =
        serde_json::from_str(text).map_err(ProtocolError::Malformed)?;
    let event_type: ServerEventType = parse_event_type(envelope.event_type)?;
    let data = envelope.data;

    let message = match event_type {
        ServerEventType::CreateOrUpdate => {
            ServerMessage::CreateOrUpdate(payload::<EntityData>(event_type, data)?)
        }
        ServerEventType::Destroy => {
            let EntityRef { id } = payload(event_type, data)?;
            ServerMessage::Destroy { id }
        }
        ServerEventType::PhaseChange => {
            let PhasePayload { phase } = payload(event_type, data)?;
            ServerMessage::PhaseChange { phase }
        }
        ServerEventType::Identity => {
            let IdentityPayload { client_id, role } = payload(event_type, data)?;
            ServerMessage::Identity { client_id, role }
        }
    };
    Ok(message)
}

fn envelope<T: Serialize>(event_type: ServerEventType, data: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(&OutboundEnvelope { event_type, data }).map_err(ProtocolError::Encode)
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, ProtocolError> {
    let event_type = message.event_type();
    match message {
        ServerMessage::CreateOrUpdate(data) => envelope(event_type, data),
        ServerMessage::Destroy { id } => envelope(event_type, &EntityRef { id: id.clone() }),
        ServerMessage::PhaseChange { phase } => envelope(event_type, &PhasePayload { phase: *phase }),
        ServerMessage::Identity { client_id, role } => envelope(
            event_type,
            &IdentityPayload {
                client_id: client_id.clone(),
                role: *role,
            },
        ),
    }
}

/// Decodes one outbound (client to server) frame.
pub fn decode_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    let raw: RawClientMessage = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;
    let event_type: ClientEventType = parse_event_type(raw.event_type)?;
    Ok(ClientMessage {
        event_type,
        client_id: raw.client_id,
    })
}

pub fn encode_client_message(message: &ClientMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Position;
    use crate::protocol::{ClientRole, EntityId, GamePhase};

    #[test]
    fn when_create_or_update_has_position_then_entity_data_is_decoded() {
        let text = r#"{"eventType":"CREATE_OR_UPDATE","data":{"id":"e1","position":{"x":0,"y":0}}}"#;

        let message = decode_server_message(text).expect("expected message to decode");

        let ServerMessage::CreateOrUpdate(data) = message else {
            panic!("expected CreateOrUpdate, got {message:?}");
        };
        assert_eq!(data.id, EntityId::from("e1"));
        assert_eq!(data.components.position, Some(Position { x: 0.0, y: 0.0 }));
        assert!(data.components.control.is_none());
    }

    #[test]
    fn when_event_type_is_unknown_then_returns_unknown_event_type() {
        let text = r#"{"eventType":"TELEPORT","data":{"id":"e1"}}"#;

        let err = decode_server_message(text).expect_err("expected unknown event type");

        assert!(matches!(&err, ProtocolError::UnknownEventType(raw) if raw == "TELEPORT"));
        assert!(err.is_unknown_event());
    }

    #[test]
    fn when_create_or_update_has_no_data_then_returns_missing_data() {
        let text = r#"{"eventType":"CREATE_OR_UPDATE"}"#;

        let err = decode_server_message(text).expect_err("expected missing data");

        assert!(matches!(
            err,
            ProtocolError::MissingData(ServerEventType::CreateOrUpdate)
        ));
    }

    #[test]
    fn when_data_is_null_then_returns_missing_data() {
        let text = r#"{"eventType":"DESTROY","data":null}"#;

        let err = decode_server_message(text).expect_err("expected missing data");

        assert!(matches!(err, ProtocolError::MissingData(ServerEventType::Destroy)));
    }

    #[test]
    fn when_create_or_update_data_has_no_id_then_returns_invalid_payload() {
        let text = r#"{"eventType":"CREATE_OR_UPDATE","data":{"position":{"x":1,"y":2}}}"#;

        let err = decode_server_message(text).expect_err("expected invalid payload");

        assert!(matches!(
            err,
            ProtocolError::InvalidPayload {
                event_type: ServerEventType::CreateOrUpdate,
                ..
            }
        ));
    }

    #[test]
    fn when_text_is_not_json_then_returns_malformed() {
        let err = decode_server_message("not json").expect_err("expected malformed");

        assert!(matches!(err, ProtocolError::Malformed(_)));
        assert!(!err.is_unknown_event());
    }

    #[test]
    fn when_phase_and_identity_are_encoded_then_they_decode_to_the_same_message() {
        let messages = [
            ServerMessage::PhaseChange {
                phase: GamePhase::Gameplay,
            },
            ServerMessage::Identity {
                client_id: "abc".to_string(),
                role: ClientRole::Spectator,
            },
            ServerMessage::Destroy {
                id: EntityId::from("e9"),
            },
        ];

        for message in messages {
            let text = encode_server_message(&message).expect("expected message to encode");
            let decoded = decode_server_message(&text).expect("expected message to decode");
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn when_identity_is_encoded_then_wire_shape_uses_event_type_and_data() {
        let text = encode_server_message(&ServerMessage::Identity {
            client_id: "abc".to_string(),
            role: ClientRole::Player,
        })
        .unwrap();

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["eventType"], "IDENTITY");
        assert_eq!(value["data"]["clientId"], "abc");
        assert_eq!(value["data"]["role"], "PLAYER");
    }

    #[test]
    fn when_client_message_has_unknown_event_type_then_returns_unknown_event_type() {
        let err = decode_client_message(r#"{"eventType":"JUMP_KEY_DOWN","clientId":"c"}"#)
            .expect_err("expected unknown event type");

        assert!(matches!(err, ProtocolError::UnknownEventType(raw) if raw == "JUMP_KEY_DOWN"));
    }

    #[test]
    fn when_client_message_is_valid_then_it_decodes() {
        let message = decode_client_message(r#"{"eventType":"RIGHT_KEY_DOWN","clientId":"c-7"}"#)
            .expect("expected client message to decode");

        assert_eq!(message.event_type, ClientEventType::RightKeyDown);
        assert_eq!(message.client_id, "c-7");
    }
}

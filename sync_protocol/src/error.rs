use crate::protocol::ServerEventType;
use std::fmt;

/// Failures while turning wire text into typed messages (or back).
#[derive(Debug)]
pub enum ProtocolError {
    // Not JSON, or not an object with an `eventType` string.
    Malformed(serde_json::Error),
    // Valid envelope naming an event this build does not know.
    UnknownEventType(String),
    MissingData(ServerEventType),
    InvalidPayload {
        event_type: ServerEventType,
        source: serde_json::Error,
    },
    Encode(serde_json::Error),
}

impl ProtocolError {
    /// Unknown event types are expected from newer peers; everything else is a parse failure.
    pub fn is_unknown_event(&self) -> bool {
        matches!(self, ProtocolError::UnknownEventType(_))
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Malformed(err) => write!(f, "malformed message: {err}"),
            ProtocolError::UnknownEventType(event_type) => {
                write!(f, "unknown event type: {event_type}")
            }
            ProtocolError::MissingData(event_type) => {
                write!(f, "{event_type:?} message is missing data")
            }
            ProtocolError::InvalidPayload { event_type, source } => {
                write!(f, "invalid {event_type:?} payload: {source}")
            }
            ProtocolError::Encode(err) => write!(f, "failed to encode message: {err}"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Malformed(err)
            | ProtocolError::Encode(err)
            | ProtocolError::InvalidPayload { source: err, .. } => Some(err),
            ProtocolError::UnknownEventType(_) | ProtocolError::MissingData(_) => None,
        }
    }
}

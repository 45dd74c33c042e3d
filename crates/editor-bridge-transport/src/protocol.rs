//! Wire protocol for client-server communication.
//!
//! Frames are JSON objects tagged by a camelCase `type` field. Inbound frames
//! decode into the catalog [`Message`]; outbound frames are [`ClientMessage`].

use editor_bridge_core::{ActiveSessionChanged, Message, MessageKind, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Message from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// This window is now the active one for its session.
    ActiveSessionChanged(ActiveSessionChanged),
}

impl ClientMessage {
    /// Announce `session_id` as active.
    #[must_use]
    pub const fn active_session(session_id: SessionId) -> Self {
        Self::ActiveSessionChanged(ActiveSessionChanged { session_id })
    }
}

/// Inbound frame could not be turned into a message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Frame is not UTF-8")]
    NotUtf8,
    #[error("Frame is not a JSON object")]
    NotAnObject,
    #[error("Frame has no message type")]
    MissingType,
    #[error("Unknown message type: {0}")]
    UnknownType(String),
    #[error("Malformed {kind:?} message: {source}")]
    Malformed {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a text frame.
///
/// # Errors
/// Returns error if the frame is not a known, well-formed message.
pub fn decode(frame: &str) -> Result<Message, DecodeError> {
    let value: Value = serde_json::from_str(frame)?;
    let tag = match &value {
        Value::Object(fields) => fields.get("type").ok_or(DecodeError::MissingType)?,
        _ => return Err(DecodeError::NotAnObject),
    };
    let tag = tag.as_str().ok_or(DecodeError::MissingType)?;
    let kind = MessageKind::from_tag(tag).ok_or_else(|| DecodeError::UnknownType(tag.to_string()))?;

    serde_json::from_value(value).map_err(|source| DecodeError::Malformed { kind, source })
}

/// Decode a binary frame carrying UTF-8 JSON.
///
/// # Errors
/// Returns error if the bytes are not UTF-8 or not a valid message.
pub fn decode_binary(frame: &[u8]) -> Result<Message, DecodeError> {
    let text = std::str::from_utf8(frame).map_err(|_| DecodeError::NotUtf8)?;
    decode(text)
}

/// Encode an outbound message.
///
/// # Errors
/// Returns error if serialization fails.
pub fn encode(message: &ClientMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_decode_create_terminal() {
        let msg = assert_ok!(decode(
            r#"{"type":"createTerminal","name":"build","workingDirectory":"/repo","shellArgs":["-l"],"preserveFocus":false}"#
        ));
        let Message::CreateTerminal(create) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(create.name.as_deref(), Some("build"));
        assert_eq!(create.working_directory.as_deref(), Some("/repo"));
        assert_eq!(create.shell_args, Some(vec!["-l".to_string()]));
        assert!(!create.preserve_focus);
    }

    #[test]
    fn test_decode_execute_command_with_any_arguments() {
        for (frame, expected) in [
            (
                r#"{"type":"executeCommand","command":"go","arguments":"{\"line\":3}"}"#,
                serde_json::json!("{\"line\":3}"),
            ),
            (
                r#"{"type":"executeCommand","command":"go","arguments":{"line":3}}"#,
                serde_json::json!({"line": 3}),
            ),
            (
                r#"{"type":"executeCommand","command":"go","arguments":42}"#,
                serde_json::json!(42),
            ),
        ] {
            let Message::ExecuteCommand(execute) = assert_ok!(decode(frame)) else {
                panic!("Wrong message type");
            };
            assert_eq!(execute.arguments, Some(expected));
        }
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let err = assert_err!(decode(r#"{"type":"formatDisk"}"#));
        assert!(matches!(err, DecodeError::UnknownType(t) if t == "formatDisk"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(assert_err!(decode("not-json")), DecodeError::Json(_)));
        assert!(matches!(assert_err!(decode("[1,2]")), DecodeError::NotAnObject));
        assert!(matches!(assert_err!(decode(r#"{"name":"x"}"#)), DecodeError::MissingType));
        assert!(matches!(
            assert_err!(decode(r#"{"type":"activeSessionChanged"}"#)),
            DecodeError::Malformed {
                kind: MessageKind::ActiveSessionChanged,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_binary() {
        let msg = assert_ok!(decode_binary(br#"{"type":"insertSnippet","name":"fn"}"#));
        assert_eq!(msg.kind(), MessageKind::InsertSnippet);
        assert!(matches!(
            assert_err!(decode_binary(&[0xff, 0xfe])),
            DecodeError::NotUtf8
        ));
    }

    #[test]
    fn test_encode_announcement() {
        let json = assert_ok!(encode(&ClientMessage::active_session(SessionId::new("w-1"))));
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "activeSessionChanged", "sessionId": "w-1"})
        );
    }
}

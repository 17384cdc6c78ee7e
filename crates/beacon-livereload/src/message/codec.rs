//! Frame codec.
//!
//! Encoding produces one JSON object per frame. Decoding never fails out of
//! the caller: a malformed or unknown frame becomes [`Decoded::Unrecognized`]
//! so one bad frame from a buggy intermediary cannot crash the broadcast
//! loop, and unknown future message types are ignored rather than fatal.

use beacon_core::AppResult;

use super::types::WireMessage;

/// Result of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A well-formed, known message.
    Message(WireMessage),
    /// Malformed JSON or an unknown `type` tag.
    Unrecognized {
        /// The `type` tag if the frame was at least a JSON object.
        message_type: Option<String>,
    },
}

/// Encode a message into its JSON frame.
pub fn encode(message: &WireMessage) -> AppResult<String> {
    serde_json::to_string(message).map_err(Into::into)
}

/// Decode one inbound frame. Never panics, never errors.
pub fn decode(frame: &str) -> Decoded {
    match serde_json::from_str::<WireMessage>(frame) {
        Ok(message) => Decoded::Message(message),
        Err(_) => {
            let message_type = serde_json::from_str::<serde_json::Value>(frame)
                .ok()
                .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_owned));
            Decoded::Unrecognized { message_type }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::types::Progress;

    #[test]
    fn round_trips_representative_messages() {
        let messages = [
            WireMessage::Ok,
            WireMessage::StillOk,
            WireMessage::Invalid,
            WireMessage::Close,
            WireMessage::Hash("abc123".into()),
            WireMessage::Errors(vec!["Module not found".into()]),
            WireMessage::Warnings(vec!["deprecated import".into(), "unused export".into()]),
            WireMessage::ProgressUpdate(Progress {
                percent: 73,
                message: "chunk assets".into(),
            }),
            WireMessage::StaticChanged(Some("assets/logo.svg".into())),
            WireMessage::Log("verbose".into()),
        ];

        for message in messages {
            let frame = encode(&message).unwrap();
            assert_eq!(decode(&frame), Decoded::Message(message));
        }
    }

    #[test]
    fn unknown_type_is_unrecognized_with_tag() {
        let decoded = decode(r#"{"type":"totally-new-thing","data":1}"#);
        assert_eq!(
            decoded,
            Decoded::Unrecognized {
                message_type: Some("totally-new-thing".into())
            }
        );
    }

    #[test]
    fn garbage_is_unrecognized_without_tag() {
        assert_eq!(
            decode("not json at all"),
            Decoded::Unrecognized { message_type: None }
        );
        assert_eq!(
            decode(r#"{"no_type_here":true}"#),
            Decoded::Unrecognized { message_type: None }
        );
    }

    #[test]
    fn progress_percent_is_passed_through() {
        let decoded = decode(r#"{"type":"progress-update","data":{"percent":99,"message":"emit"}}"#);
        match decoded {
            Decoded::Message(WireMessage::ProgressUpdate(progress)) => {
                assert_eq!(progress.percent, 99);
            }
            other => panic!("expected progress-update, got {other:?}"),
        }
    }
}

//! Wire message type definitions.
//!
//! Every message on the channel is a JSON object `{ "type": ..., "data": ... }`.
//! The `type` tag is kebab-case; `data` is omitted for payload-less messages.

use serde::{Deserialize, Serialize};

/// One message on the live-reload channel, server → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum WireMessage {
    /// Build finished clean; client may apply the update.
    Ok,
    /// Rebuild produced no emitted assets; nothing to apply.
    StillOk,
    /// Build finished with warnings.
    Warnings(Vec<String>),
    /// Build finished with errors.
    Errors(Vec<String>),
    /// Content hash of the finished build, sent before `ok`.
    Hash(String),
    /// Incremental compiler progress.
    ProgressUpdate(Progress),
    /// Current output was invalidated; a rebuild is coming.
    Invalid,
    /// Server is shutting down; the client should stop reconnecting.
    Close,
    /// A watched static file changed; full reload required.
    StaticChanged(Option<String>),
    /// Client console log level directive.
    Log(String),
}

/// Payload of a `progress-update` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Integer percentage 0-100, passed through from the compiler.
    pub percent: u8,
    /// Short description of the current phase.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_kebab_case() {
        let frame = serde_json::to_string(&WireMessage::StillOk).unwrap();
        assert_eq!(frame, r#"{"type":"still-ok"}"#);

        let frame = serde_json::to_string(&WireMessage::ProgressUpdate(Progress {
            percent: 42,
            message: "sealing".into(),
        }))
        .unwrap();
        assert_eq!(
            frame,
            r#"{"type":"progress-update","data":{"percent":42,"message":"sealing"}}"#
        );
    }

    #[test]
    fn hash_data_is_a_plain_string() {
        let frame = serde_json::to_string(&WireMessage::Hash("abc123".into())).unwrap();
        assert_eq!(frame, r#"{"type":"hash","data":"abc123"}"#);
    }
}

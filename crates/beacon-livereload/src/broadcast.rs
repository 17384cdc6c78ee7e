//! Broadcast controller — turns status transitions into wire messages.
//!
//! One instance per server. Subscribes to the status source, computes the
//! message sequence for each transition, and pushes it through the registry.
//! Also performs the bootstrap unicast: a client connecting mid-idle-period
//! immediately receives the current status instead of waiting for the next
//! build.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use beacon_build::status::{CompilationStatus, StatusSource};

use crate::connection::handle::ConnectionHandle;
use crate::connection::registry::ConnectionRegistry;
use crate::message::codec;
use crate::message::types::{Progress, WireMessage};
use crate::transport::{Frame, send_with_retry};

/// Computes and fans out status messages.
#[derive(Debug)]
pub struct BroadcastController {
    registry: Arc<ConnectionRegistry>,
    status: Arc<StatusSource>,
    retry_delay: Duration,
}

impl BroadcastController {
    /// Create a controller over the given registry and status source.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        status: Arc<StatusSource>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            registry,
            status,
            retry_delay,
        }
    }

    /// The message sequence for a status, in send order.
    ///
    /// Priority: errors dominate warnings; an unforced rebuild that emitted
    /// no assets collapses to `still-ok` (suppresses redundant client work);
    /// everything else is `hash` followed by `ok`. The bootstrap unicast
    /// passes `force = true` so a late joiner always gets the full pair.
    pub fn select_messages(status: &CompilationStatus, force: bool) -> Vec<WireMessage> {
        match status {
            CompilationStatus::Idle => Vec::new(),
            CompilationStatus::Compiling | CompilationStatus::Invalid => {
                vec![WireMessage::Invalid]
            }
            CompilationStatus::Done(outcome) => {
                if !outcome.errors.is_empty() {
                    vec![WireMessage::Errors(outcome.errors.clone())]
                } else if !outcome.warnings.is_empty() {
                    vec![WireMessage::Warnings(outcome.warnings.clone())]
                } else if !force && !outcome.assets_emitted {
                    vec![WireMessage::StillOk]
                } else {
                    vec![
                        WireMessage::Hash(outcome.hash.clone()),
                        WireMessage::Ok,
                    ]
                }
            }
        }
    }

    /// Broadcast the messages for a status transition to every connection.
    pub fn publish(&self, status: &CompilationStatus) {
        for message in Self::select_messages(status, false) {
            self.broadcast_message(&message);
        }
    }

    /// Broadcast an incremental progress report. Not gated by the
    /// done/invalid state machine and never suppressed.
    pub fn publish_progress(&self, percent: u8, message: &str) {
        self.broadcast_message(&WireMessage::ProgressUpdate(Progress {
            percent,
            message: message.to_owned(),
        }));
    }

    /// Broadcast a static-file-changed notification.
    pub fn publish_static_changed(&self, path: Option<&str>) {
        self.broadcast_message(&WireMessage::StaticChanged(path.map(str::to_owned)));
    }

    /// Broadcast a client console log-level directive.
    pub fn publish_log_level(&self, level: &str) {
        self.broadcast_message(&WireMessage::Log(level.to_owned()));
    }

    /// Unicast the current status to one freshly accepted connection.
    ///
    /// Always forced: even a no-op status is resent so the client is never
    /// left without state. An `Idle` status sends nothing — there is nothing
    /// to report before the first build.
    pub async fn bootstrap(&self, handle: &ConnectionHandle) {
        let current = self.status.current();
        for message in Self::select_messages(&current, true) {
            let frame = match codec::encode(&message) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "failed to encode bootstrap message");
                    continue;
                }
            };
            if !send_with_retry(handle, Frame::Data(frame), self.retry_delay).await {
                debug!(conn_id = %handle.id, "bootstrap send failed");
                break;
            }
        }
    }

    fn broadcast_message(&self, message: &WireMessage) {
        let frame = match codec::encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "failed to encode broadcast message");
                return;
            }
        };
        let delivered = self.registry.broadcast(&frame);
        debug!(delivered, "broadcast frame");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_build::status::BuildOutcome;

    fn done(errors: Vec<&str>, warnings: Vec<&str>, assets_emitted: bool) -> CompilationStatus {
        CompilationStatus::Done(BuildOutcome {
            hash: "abc123".into(),
            errors: errors.into_iter().map(String::from).collect(),
            warnings: warnings.into_iter().map(String::from).collect(),
            assets_emitted,
        })
    }

    #[test]
    fn errors_dominate_warnings() {
        let messages =
            BroadcastController::select_messages(&done(vec!["boom"], vec!["meh"], true), false);
        assert_eq!(messages, vec![WireMessage::Errors(vec!["boom".into()])]);
    }

    #[test]
    fn warnings_without_errors() {
        let messages = BroadcastController::select_messages(&done(vec![], vec!["meh"], true), false);
        assert_eq!(messages, vec![WireMessage::Warnings(vec!["meh".into()])]);
    }

    #[test]
    fn clean_build_sends_hash_then_ok() {
        let messages = BroadcastController::select_messages(&done(vec![], vec![], true), false);
        assert_eq!(
            messages,
            vec![WireMessage::Hash("abc123".into()), WireMessage::Ok]
        );
    }

    #[test]
    fn noop_rebuild_collapses_to_still_ok() {
        let messages = BroadcastController::select_messages(&done(vec![], vec![], false), false);
        assert_eq!(messages, vec![WireMessage::StillOk]);
    }

    #[test]
    fn forced_noop_still_sends_full_pair() {
        let messages = BroadcastController::select_messages(&done(vec![], vec![], false), true);
        assert_eq!(
            messages,
            vec![WireMessage::Hash("abc123".into()), WireMessage::Ok]
        );
    }

    #[test]
    fn idle_sends_nothing_even_forced() {
        assert!(BroadcastController::select_messages(&CompilationStatus::Idle, true).is_empty());
    }

    #[test]
    fn invalidation_sends_invalid() {
        let messages = BroadcastController::select_messages(&CompilationStatus::Invalid, false);
        assert_eq!(messages, vec![WireMessage::Invalid]);
    }
}

//! The event surface consumed from the build pipeline.

use serde::{Deserialize, Serialize};

use crate::stats::BuildStats;

/// One event emitted by the compiler collaborator.
///
/// The pipeline itself is external; Beacon only consumes this stream.
/// Events arrive either in-process (embedded compiler driving
/// [`crate::status::StatusSource::handle_event`] directly) or over the
/// build-event intake endpoint as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CompilerEvent {
    /// A new compilation started.
    Compile,
    /// The current output was invalidated (file changed mid-idle).
    Invalid,
    /// A compilation finished with the given stats.
    Done {
        /// Stats object for the finished build.
        stats: BuildStats,
    },
    /// Incremental progress report.
    Progress {
        /// Integer percentage, 0-100, passed through untouched.
        percent: u8,
        /// Short description of the current phase.
        message: String,
    },
}

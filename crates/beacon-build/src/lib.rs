//! # beacon-build
//!
//! Wraps the external compiler collaborator. Provides:
//!
//! - [`stats::BuildStats`] — the per-build stats object the compiler reports
//! - [`events::CompilerEvent`] — the event surface consumed from the pipeline
//! - [`status::StatusSource`] — the status state machine with an explicit,
//!   synchronously-invoked subscription list
//! - [`multi::MultiCompilerSource`] — aggregation for multi-project builds

pub mod events;
pub mod multi;
pub mod stats;
pub mod status;

pub use events::CompilerEvent;
pub use multi::MultiCompilerSource;
pub use stats::{AssetStat, BuildStats};
pub use status::{BuildOutcome, CompilationStatus, StatusSource};

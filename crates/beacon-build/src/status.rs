//! Compilation status state machine.
//!
//! [`StatusSource`] owns the single current [`CompilationStatus`] snapshot
//! and an explicit subscription list. Handlers are invoked synchronously in
//! registration order, so every subscriber observes every transition, in
//! order, without relying on a generic event-emitter library.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::events::CompilerEvent;
use crate::stats::BuildStats;

/// Snapshot of the current compilation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilationStatus {
    /// No build has run yet.
    Idle,
    /// A build is in progress and no previous successful build exists.
    Compiling,
    /// A previously-good build was invalidated; no new stats yet.
    Invalid,
    /// A build finished.
    Done(BuildOutcome),
}

/// The distilled outcome of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Content hash of the build.
    pub hash: String,
    /// Formatted error messages. Non-empty errors dominate warnings.
    pub errors: Vec<String>,
    /// Formatted warning messages.
    pub warnings: Vec<String>,
    /// Whether any asset was actually (re)written this build.
    pub assets_emitted: bool,
}

impl BuildOutcome {
    /// Whether this outcome is error-free.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<&BuildStats> for BuildOutcome {
    fn from(stats: &BuildStats) -> Self {
        Self {
            hash: stats.hash.clone(),
            errors: stats.errors.clone(),
            warnings: stats.warnings.clone(),
            assets_emitted: stats.assets_emitted(),
        }
    }
}

type UpdateHandler = Box<dyn Fn(&CompilationStatus) + Send + Sync>;
type ProgressHandler = Box<dyn Fn(u8, &str) + Send + Sync>;

/// Tracks compiler status and fans transitions out to subscribers.
pub struct StatusSource {
    /// Serializes event handling so transitions are totally ordered as
    /// observed by any single subscriber.
    event_lock: Mutex<()>,
    current: Mutex<CompilationStatus>,
    had_successful_build: AtomicBool,
    update_handlers: Mutex<Vec<UpdateHandler>>,
    progress_handlers: Mutex<Vec<ProgressHandler>>,
}

impl std::fmt::Debug for StatusSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSource").finish()
    }
}

impl StatusSource {
    /// Create a new source in the `Idle` state with no subscribers.
    pub fn new() -> Self {
        Self {
            event_lock: Mutex::new(()),
            current: Mutex::new(CompilationStatus::Idle),
            had_successful_build: AtomicBool::new(false),
            update_handlers: Mutex::new(Vec::new()),
            progress_handlers: Mutex::new(Vec::new()),
        }
    }

    /// Register a status-transition handler, invoked synchronously on every
    /// transition in registration order.
    pub fn on_update(&self, handler: impl Fn(&CompilationStatus) + Send + Sync + 'static) {
        self.update_handlers
            .lock()
            .expect("subscriber list lock poisoned")
            .push(Box::new(handler));
    }

    /// Register a progress handler. Progress reports bypass the status
    /// state machine entirely.
    pub fn on_progress(&self, handler: impl Fn(u8, &str) + Send + Sync + 'static) {
        self.progress_handlers
            .lock()
            .expect("subscriber list lock poisoned")
            .push(Box::new(handler));
    }

    /// The latest status snapshot. Never "empty" — initializes to `Idle`.
    pub fn current(&self) -> CompilationStatus {
        self.current.lock().expect("status lock poisoned").clone()
    }

    /// Feed one compiler event through the state machine.
    pub fn handle_event(&self, event: CompilerEvent) {
        let _ordered = self.event_lock.lock().expect("event lock poisoned");

        match event {
            CompilerEvent::Compile | CompilerEvent::Invalid => {
                let next = if self.had_successful_build.load(Ordering::SeqCst) {
                    CompilationStatus::Invalid
                } else {
                    CompilationStatus::Compiling
                };
                self.transition(next);
            }
            CompilerEvent::Done { stats } => {
                let outcome = BuildOutcome::from(&stats);
                self.had_successful_build
                    .store(outcome.is_clean(), Ordering::SeqCst);
                self.transition(CompilationStatus::Done(outcome));
            }
            CompilerEvent::Progress { percent, message } => {
                let percent = percent.min(100);
                for handler in self
                    .progress_handlers
                    .lock()
                    .expect("subscriber list lock poisoned")
                    .iter()
                {
                    handler(percent, &message);
                }
            }
        }
    }

    fn transition(&self, next: CompilationStatus) {
        {
            let mut current = self.current.lock().expect("status lock poisoned");
            *current = next.clone();
        }
        debug!(status = ?next, "compilation status transition");
        for handler in self
            .update_handlers
            .lock()
            .expect("subscriber list lock poisoned")
            .iter()
        {
            handler(&next);
        }
    }
}

impl Default for StatusSource {
    fn default() -> Self {
        Self::new()
    }
}

//! Multi-project build aggregation.
//!
//! A workspace can run several compilers side by side. Their events fold
//! into one combined [`StatusSource`]: the aggregate build is "done" only
//! once every child compiler has reported, and errors/warnings from all
//! children are concatenated.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::events::CompilerEvent;
use crate::stats::BuildStats;
use crate::status::StatusSource;

struct ChildSlot {
    name: String,
    stats: Option<BuildStats>,
    pending: bool,
}

/// Folds events from several child compilers into one aggregate source.
pub struct MultiCompilerSource {
    aggregate: Arc<StatusSource>,
    children: Mutex<Vec<ChildSlot>>,
}

impl MultiCompilerSource {
    /// Create an aggregator feeding the given status source.
    pub fn new(aggregate: Arc<StatusSource>) -> Arc<Self> {
        Arc::new(Self {
            aggregate,
            children: Mutex::new(Vec::new()),
        })
    }

    /// Register one child compiler and get its event intake.
    ///
    /// All children should be registered before the first build starts;
    /// a child registered mid-build is simply not part of the in-flight
    /// aggregation round.
    pub fn add_compiler(self: &Arc<Self>, name: impl Into<String>) -> CompilerIntake {
        let mut children = self.children.lock().expect("child list lock poisoned");
        children.push(ChildSlot {
            name: name.into(),
            stats: None,
            pending: false,
        });
        CompilerIntake {
            index: children.len() - 1,
            source: Arc::clone(self),
        }
    }

    /// The combined status source.
    pub fn status_source(&self) -> Arc<StatusSource> {
        Arc::clone(&self.aggregate)
    }

    fn child_event(&self, index: usize, event: CompilerEvent) {
        // Decide what to forward while holding the lock, forward after
        // releasing it: aggregate handlers run arbitrary subscriber code.
        let forward = {
            let mut children = self.children.lock().expect("child list lock poisoned");
            match event {
                CompilerEvent::Compile | CompilerEvent::Invalid => {
                    let first_pending = !children.iter().any(|c| c.pending);
                    children[index].pending = true;
                    debug!(compiler = %children[index].name, "child build started");
                    first_pending.then_some(event)
                }
                CompilerEvent::Done { stats } => {
                    children[index].stats = Some(stats);
                    children[index].pending = false;
                    let all_reported =
                        !children.iter().any(|c| c.pending) && children.iter().all(|c| c.stats.is_some());
                    all_reported.then(|| CompilerEvent::Done {
                        stats: combine(&children),
                    })
                }
                CompilerEvent::Progress { .. } => Some(event),
            }
        };

        if let Some(event) = forward {
            self.aggregate.handle_event(event);
        }
    }
}

/// Event intake handle for one child compiler.
pub struct CompilerIntake {
    index: usize,
    source: Arc<MultiCompilerSource>,
}

impl CompilerIntake {
    /// Feed one event from this child compiler.
    pub fn handle_event(&self, event: CompilerEvent) {
        self.source.child_event(self.index, event);
    }
}

fn combine(children: &[ChildSlot]) -> BuildStats {
    let mut combined = BuildStats {
        hash: String::new(),
        errors: Vec::new(),
        warnings: Vec::new(),
        assets: Vec::new(),
    };
    for child in children {
        if let Some(stats) = &child.stats {
            combined.hash.push_str(&stats.hash);
            combined.errors.extend(stats.errors.iter().cloned());
            combined.warnings.extend(stats.warnings.iter().cloned());
            combined.assets.extend(stats.assets.iter().cloned());
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::AssetStat;
    use crate::status::CompilationStatus;

    fn stats(hash: &str, errors: Vec<&str>) -> BuildStats {
        BuildStats {
            hash: hash.to_string(),
            errors: errors.into_iter().map(String::from).collect(),
            warnings: vec![],
            assets: vec![AssetStat {
                name: format!("{hash}.js"),
                emitted: true,
            }],
        }
    }

    #[test]
    fn done_waits_for_all_children() {
        let aggregate = Arc::new(StatusSource::new());
        let multi = MultiCompilerSource::new(Arc::clone(&aggregate));
        let web = multi.add_compiler("web");
        let worker = multi.add_compiler("worker");

        web.handle_event(CompilerEvent::Compile);
        worker.handle_event(CompilerEvent::Compile);
        web.handle_event(CompilerEvent::Done {
            stats: stats("aaa", vec![]),
        });

        // Only one child reported: still compiling.
        assert_eq!(aggregate.current(), CompilationStatus::Compiling);

        worker.handle_event(CompilerEvent::Done {
            stats: stats("bbb", vec![]),
        });

        match aggregate.current() {
            CompilationStatus::Done(outcome) => {
                assert_eq!(outcome.hash, "aaabbb");
                assert!(outcome.is_clean());
                assert!(outcome.assets_emitted);
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[test]
    fn child_errors_concatenate() {
        let aggregate = Arc::new(StatusSource::new());
        let multi = MultiCompilerSource::new(Arc::clone(&aggregate));
        let a = multi.add_compiler("a");
        let b = multi.add_compiler("b");

        a.handle_event(CompilerEvent::Done {
            stats: stats("h1", vec!["a broke"]),
        });
        b.handle_event(CompilerEvent::Done {
            stats: stats("h2", vec!["b broke"]),
        });

        match aggregate.current() {
            CompilationStatus::Done(outcome) => {
                assert_eq!(
                    outcome.errors,
                    vec!["a broke".to_string(), "b broke".to_string()]
                );
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[test]
    fn one_transition_per_build_round_not_per_child() {
        let aggregate = Arc::new(StatusSource::new());
        let multi = MultiCompilerSource::new(Arc::clone(&aggregate));
        let a = multi.add_compiler("a");
        let b = multi.add_compiler("b");

        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        aggregate.on_update(move |_| {
            seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        a.handle_event(CompilerEvent::Compile);
        b.handle_event(CompilerEvent::Compile);

        // One transition for the round, not one per child.
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}

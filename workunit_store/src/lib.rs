// Copyright 2019 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

#![deny(warnings)]
// Enable all clippy lints except for many of the pedantic ones. It's a shame this needs to be copied and pasted across crates, but there doesn't appear to be a way to include inner attributes from a common source.
#![deny(
    clippy::all,
    clippy::default_trait_access,
    clippy::expl_impl_clone_on_copy,
    clippy::if_not_else,
    clippy::needless_continue,
    clippy::unseparated_literal_suffix,
    clippy::used_underscore_binding
)]
// It is often more clear to show that nothing is being moved.
#![allow(clippy::match_ref_pats)]
// Subjective style.
#![allow(
    clippy::len_without_is_empty,
    clippy::redundant_field_names,
    clippy::too_many_arguments
)]
// Default isn't as big a deal as people seem to think it is.
#![allow(clippy::new_without_default, clippy::new_ret_no_self)]
// Arc<Mutex> can be more clear than needing to grok Orderings:
#![allow(clippy::mutex_atomic)]

use std::cell::RefCell;
use std::sync::Arc;
use std::time::SystemTime;

use concrete_time::TimeSpan;
pub use log::Level;
use log::log;
use parking_lot::Mutex;
use rand::thread_rng;
use rand::Rng;

mod rusage;

pub use rusage::ResourceSnapshot;

///
/// A unique id for a single run of the compiler.
///
/// RunIds are not comparable across processes, and only equality is meaningful, not ordering.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct SpanId(u64);

impl SpanId {
    pub fn new() -> SpanId {
        let mut rng = thread_rng();
        SpanId(rng.gen())
    }
}

impl std::fmt::Display for SpanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016.x}", self.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct WorkunitMetadata {
    pub desc: Option<String>,
    pub message: Option<String>,
}

#[derive(Clone, Debug)]
pub enum WorkunitState {
    Started { start_time: SystemTime },
    Completed { time_span: TimeSpan },
}

///
/// A single named phase of the compiler's work (rewrite, automata generation, composition,
/// modularization, a backend invocation, ...), with its parent in the nesting of phases it ran
/// inside of and (once finished) the wall-clock span it took.
///
#[derive(Clone, Debug)]
pub struct Workunit {
    pub name: &'static str,
    pub level: Level,
    pub span_id: SpanId,
    pub parent_id: Option<SpanId>,
    pub state: WorkunitState,
    pub metadata: Option<WorkunitMetadata>,
}

impl Workunit {
    /// If the workunit has completed, its TimeSpan.
    pub fn time_span(&self) -> Option<TimeSpan> {
        match self.state {
            WorkunitState::Started { .. } => None,
            WorkunitState::Completed { time_span } => Some(time_span),
        }
    }

    fn log_starting(&self) {
        if !log::log_enabled!(self.level) {
            return;
        }
        let identifier = self
            .metadata
            .as_ref()
            .and_then(|m| m.desc.as_deref())
            .unwrap_or(self.name);
        log!(self.level, "Starting: {}", identifier);
    }

    fn log_completed(&self) {
        let Some(metadata) = self.metadata.as_ref() else {
            return;
        };
        if !log::log_enabled!(self.level) {
            return;
        }
        let identifier = metadata.desc.as_deref().unwrap_or(self.name);
        let message = metadata
            .message
            .as_ref()
            .map(|s| format!(" - {s}"))
            .unwrap_or_default();
        log!(self.level, "Completed: {}{}", identifier, message);
    }
}

///
/// Per-run accounting of nested workunits. Unlike the incremental build graph this crate was
/// originally written for, this compiler runs one phase at a time on a single thread, so the
/// store holds completed workunits in a flat `Vec` rather than a live, concurrently-updated
/// graph: there is never more than one `Started` workunit per thread at a time other than its
/// ancestors.
///
#[derive(Clone)]
pub struct WorkunitStore {
    max_level: Level,
    completed: Arc<Mutex<Vec<Workunit>>>,
}

impl WorkunitStore {
    pub fn new(max_level: Level) -> WorkunitStore {
        WorkunitStore {
            max_level,
            completed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn max_level(&self) -> Level {
        self.max_level
    }

    ///
    /// Starts a new workunit as a child of the current thread's active workunit (if any), and
    /// returns a guard: completing it is the guard's responsibility, either via `complete_with` or
    /// implicitly via `Drop`.
    ///
    pub fn start_workunit(
        &self,
        name: &'static str,
        level: Level,
        metadata: Option<WorkunitMetadata>,
    ) -> RunningWorkunit {
        let span_id = SpanId::new();
        let parent_id = CURRENT_SPAN.with(|current| *current.borrow());
        let workunit = Workunit {
            name,
            level,
            span_id,
            parent_id,
            state: WorkunitState::Started {
                start_time: SystemTime::now(),
            },
            metadata,
        };
        workunit.log_starting();

        let previous_parent = CURRENT_SPAN.with(|current| current.replace(Some(span_id)));
        RunningWorkunit {
            store: self.clone(),
            workunit: Some(workunit),
            previous_parent,
        }
    }

    fn complete(&self, mut workunit: Workunit, message: Option<String>) {
        let start_time = match workunit.state {
            WorkunitState::Started { start_time } => start_time,
            WorkunitState::Completed { .. } => return,
        };
        workunit.state = WorkunitState::Completed {
            time_span: TimeSpan::since(&start_time),
        };
        if let Some(message) = message {
            workunit
                .metadata
                .get_or_insert_with(WorkunitMetadata::default)
                .message = Some(message);
        }
        workunit.log_completed();
        self.completed.lock().push(workunit);
    }

    /// All workunits completed so far during this run, in completion order.
    pub fn completed_workunits(&self) -> Vec<Workunit> {
        self.completed.lock().clone()
    }
}

thread_local! {
    static CURRENT_SPAN: RefCell<Option<SpanId>> = const { RefCell::new(None) };
}

///
/// An in-flight workunit. Completing it (explicitly via `complete`/`complete_with`, or implicitly
/// by dropping it) records its duration into the owning `WorkunitStore` and restores the parent
/// span that was active before it started.
///
pub struct RunningWorkunit {
    store: WorkunitStore,
    workunit: Option<Workunit>,
    previous_parent: Option<SpanId>,
}

impl RunningWorkunit {
    pub fn span_id(&self) -> SpanId {
        self.workunit.as_ref().expect("workunit already completed").span_id
    }

    pub fn complete(mut self) {
        self.complete_with(None)
    }

    pub fn complete_with(&mut self, message: Option<String>) {
        if let Some(workunit) = self.workunit.take() {
            self.store.complete(workunit, message);
            CURRENT_SPAN.with(|current| current.replace(self.previous_parent));
        }
    }
}

impl Drop for RunningWorkunit {
    fn drop(&mut self) {
        if self.workunit.is_some() {
            self.complete_with(None);
        }
    }
}

#[cfg(test)]
mod tests;

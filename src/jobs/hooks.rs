//! Diagnostic hooks for job lifecycle events
//!
//! A hook only observes. The job never reads anything back from it, so running
//! with or without one executes the same way.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::job::Job;

/// Lifecycle points reported to a [`JobHook`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobEvent {
    /// `start` won the race and spawned the execution task
    StartRequested,
    /// Execution task is about to walk the dependency list
    WaitingOnDependencies,
    /// Dependencies are done, work is being invoked
    Invoking,
    /// Work panicked and the panic was converted into a fault
    Recovered,
    WaitBegin,
    WaitEnd,
}

impl JobEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartRequested => "start",
            Self::WaitingOnDependencies => "wait-dependencies",
            Self::Invoking => "invoke",
            Self::Recovered => "recovered",
            Self::WaitBegin => "wait-begin",
            Self::WaitEnd => "wait-end",
        }
    }
}

/// Observer invoked at job lifecycle points
pub trait JobHook: Send + Sync {
    fn on_event(&self, event: JobEvent, job: &Job);
}

/// Logs every event through `tracing`
pub struct TracingHook;

impl JobHook for TracingHook {
    fn on_event(&self, event: JobEvent, job: &Job) {
        tracing::debug!(job = %job.label(), event = event.label(), "job event");
    }
}

/// One observed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookRecord {
    pub event: JobEvent,
    pub job: String,
    pub at: DateTime<Utc>,
}

/// Collects events in memory, mostly for tests and post-mortems
#[derive(Clone, Default)]
pub struct BufferingHook {
    records: Arc<RwLock<Vec<HookRecord>>>,
}

impl BufferingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<HookRecord> {
        self.records.read().clone()
    }

    /// Events recorded for the job labelled `job`, in arrival order
    pub fn events_for(&self, job: &str) -> Vec<JobEvent> {
        self.records
            .read()
            .iter()
            .filter(|r| r.job == job)
            .map(|r| r.event)
            .collect()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl JobHook for BufferingHook {
    fn on_event(&self, event: JobEvent, job: &Job) {
        self.records.write().push(HookRecord {
            event,
            job: job.label(),
            at: Utc::now(),
        });
    }
}

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dagger_jobs::{JobResult, Work};
use parking_lot::Mutex;

/// Shared execution log written by test jobs
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn joined(log: &Log) -> String {
    log.lock().join(",")
}

/// Work that optionally sleeps, appends `label` to `log`, and returns `label`
pub fn recording(log: &Log, label: &'static str, delay_ms: u64) -> impl Work {
    let log = Arc::clone(log);
    move || {
        let log = Arc::clone(&log);
        async move {
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            log.lock().push(label.to_string());
            JobResult::ok(label.to_string())
        }
    }
}

pub fn no_deps() -> Vec<String> {
    Vec::new()
}

/// Route job logs to the test output; later calls are ignored
pub fn init_logging() {
    let _ = dagger_jobs::init_tracing(tracing::Level::DEBUG);
}

//! Concurrent execution of named job graphs.
//!
//! A [`Job`] runs its work once, after each of its dependencies has finished,
//! on its own Tokio task. Any number of callers may wait on it and all of them
//! see the same [`JobResult`]. A [`Jobs`] registry lets callers declare jobs by
//! name with dependency names in any order; the graph is built lazily when the
//! registry runs. [`Jobs::add_group`] nests a whole registry as one job.
//!
//! ```no_run
//! use dagger_jobs::{JobResult, Jobs};
//!
//! # async fn demo() -> dagger_jobs::Result<()> {
//! let jobs = Jobs::new();
//! jobs.declare("report", ["fetch"], || async { JobResult::ok("report") })?;
//! jobs.declare("fetch", Vec::<String>::new(), || async { JobResult::ok(42i64) })?;
//! let report = jobs.get_named("report").await?;
//! assert!(report.is_ok());
//! # Ok(())
//! # }
//! ```

// Core infrastructure modules
pub mod core {
    pub mod config;
    pub mod errors;
    pub mod logging;
}

pub mod jobs;

// Re-exports for convenience
pub use crate::core::config::JobsConfig;
pub use crate::core::errors::{JobsError, Result};
pub use crate::core::logging::init_tracing;
pub use jobs::*;

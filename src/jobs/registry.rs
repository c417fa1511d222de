//! Name-keyed registry of lazily resolved jobs
//!
//! Jobs are declared by name with dependency names and turned into a concrete
//! graph of [`Job`] handles on first execution, so declaration order does not
//! matter.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::hooks::{JobHook, TracingHook};
use super::job::{Job, Work};
use super::result::{JobFault, JobResult};
use crate::core::config::JobsConfig;
use crate::core::errors::{JobsError, Result};

/// A declared job that has not been built yet
struct PendingJob {
    dependencies: Vec<String>,
    work: Arc<dyn Work>,
}

#[derive(Default)]
struct Entries {
    // declaration order
    pending: IndexMap<String, PendingJob>,
    // resolution order
    resolved: IndexMap<String, Arc<Job>>,
}

/// Registry of named jobs.
///
/// Cloning is cheap and shares the underlying entries.
#[derive(Clone)]
pub struct Jobs {
    entries: Arc<Mutex<Entries>>,
    config: Arc<JobsConfig>,
    hook: Option<Arc<dyn JobHook>>,
}

impl Jobs {
    /// Create an empty registry with default configuration
    pub fn new() -> Self {
        Self::build(JobsConfig::default())
    }

    pub fn with_config(config: JobsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: JobsConfig) -> Self {
        let hook: Option<Arc<dyn JobHook>> = if config.trace_events {
            Some(Arc::new(TracingHook))
        } else {
            None
        };
        Self {
            entries: Arc::new(Mutex::new(Entries::default())),
            config: Arc::new(config),
            hook,
        }
    }

    /// Install a diagnostic hook on every job this registry builds from now on
    pub fn with_hook(mut self, hook: Arc<dyn JobHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn config(&self) -> &JobsConfig {
        &self.config
    }

    /// Declare a job under `name` depending on the jobs named in `dependencies`.
    ///
    /// Dependencies need not be declared yet. Fails if `name` is already taken.
    pub fn declare<N, I, D, W>(&self, name: N, dependencies: I, work: W) -> Result<()>
    where
        N: Into<String>,
        I: IntoIterator<Item = D>,
        D: Into<String>,
        W: Work + 'static,
    {
        let name = name.into();
        let dependencies = dependencies.into_iter().map(Into::into).collect();
        let mut entries = self.entries.lock();
        if entries.pending.contains_key(&name) || entries.resolved.contains_key(&name) {
            return Err(JobsError::duplicate_name(name));
        }
        debug!(registry = %self.config.name, job = %name, "declared job");
        entries.pending.insert(
            name,
            PendingJob {
                dependencies,
                work: Arc::new(work),
            },
        );
        Ok(())
    }

    /// Resolve every pending job and start every resolved job.
    ///
    /// Resolution stops at the first error, but jobs built before it are still
    /// started so a later run never waits on a job nobody spawned.
    pub fn start_all(&self) -> Result<()> {
        let names: Vec<String> = self.entries.lock().pending.keys().cloned().collect();

        let mut outcome = Ok(());
        for name in &names {
            if let Err(err) = self.resolve(name, &mut Vec::new()) {
                outcome = Err(err);
                break;
            }
        }

        let resolved: Vec<Arc<Job>> = self.entries.lock().resolved.values().cloned().collect();
        if !names.is_empty() {
            info!(registry = %self.config.name, jobs = resolved.len(), "starting jobs");
        }
        for job in &resolved {
            job.start();
        }
        outcome
    }

    /// Start everything and wait for every resolved job.
    ///
    /// Returns the resolved jobs in resolution order. Calling it again re-waits
    /// (a no-op for finished jobs) and includes anything declared since.
    pub async fn run_to_completion(&self) -> Result<Vec<Arc<Job>>> {
        self.start_all()?;
        let jobs: Vec<Arc<Job>> = self.entries.lock().resolved.values().cloned().collect();
        match self.config.wait_timeout() {
            Some(timeout) => {
                for job in &jobs {
                    job.wait_timeout(timeout).await?;
                }
            }
            None => {
                for job in &jobs {
                    job.wait().await;
                }
            }
        }
        debug!(registry = %self.config.name, jobs = jobs.len(), "registry run complete");
        Ok(jobs)
    }

    /// Run the registry to completion and return the result of the job `name`.
    ///
    /// An undeclared name yields a [`JobFault::NotFound`] result, not an error.
    pub async fn get_named(&self, name: &str) -> Result<JobResult> {
        self.run_to_completion().await?;
        let result = self.job(name).and_then(|job| job.result());
        Ok(result.unwrap_or_else(|| JobResult::from_fault(JobFault::NotFound(name.to_string()))))
    }

    /// Resolved job handle for `name`, if it has been built
    pub fn job(&self, name: &str) -> Option<Arc<Job>> {
        self.entries.lock().resolved.get(name).cloned()
    }

    /// All declared names, resolved first
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.lock();
        entries
            .resolved
            .keys()
            .chain(entries.pending.keys())
            .cloned()
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        let entries = self.entries.lock();
        entries.pending.contains_key(name) || entries.resolved.contains_key(name)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock();
        entries.pending.len() + entries.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_count(&self) -> usize {
        self.entries.lock().pending.len()
    }

    /// Build the job `name`, resolving its dependencies first.
    ///
    /// The lock is released around each recursive call and reacquired after.
    /// `path` holds the names currently being resolved by this call chain.
    fn resolve(&self, name: &str, path: &mut Vec<String>) -> Result<Arc<Job>> {
        let mut entries = self.entries.lock();
        if let Some(job) = entries.resolved.get(name) {
            return Ok(Arc::clone(job));
        }
        let (dependency_names, work) = match entries.pending.get(name) {
            Some(pending) => (pending.dependencies.clone(), Arc::clone(&pending.work)),
            None => return Err(JobsError::unknown_job(name)),
        };
        if path.iter().any(|n| n == name) {
            let mut cycle = path.clone();
            cycle.push(name.to_string());
            return Err(JobsError::circular(cycle));
        }

        path.push(name.to_string());
        let mut dependencies = Vec::with_capacity(dependency_names.len());
        for dependency in &dependency_names {
            if let Some(job) = entries.resolved.get(dependency) {
                dependencies.push(Arc::clone(job));
            } else if entries.pending.contains_key(dependency) {
                let job = MutexGuard::unlocked(&mut entries, || self.resolve(dependency, path))?;
                dependencies.push(job);
            } else {
                return Err(JobsError::unresolved(dependency.as_str(), name));
            }
        }
        path.pop();

        // A racing resolver may have stored this name while the lock was released.
        if let Some(job) = entries.resolved.get(name) {
            return Ok(Arc::clone(job));
        }

        let job = Job::builder()
            .name(name)
            .dependencies(dependencies)
            .maybe_hook(self.hook.clone())
            .build_shared(work);
        entries.pending.shift_remove(name);
        entries.resolved.insert(name.to_string(), Arc::clone(&job));
        debug!(registry = %self.config.name, job = %name, "resolved job");
        Ok(job)
    }
}

impl Default for Jobs {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Jobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("Jobs")
            .field("name", &self.config.name)
            .field("pending", &entries.pending.keys().collect::<Vec<_>>())
            .field("resolved", &entries.resolved.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::job::JobState;
    use pretty_assertions::assert_eq;

    fn noop() -> impl Work {
        || async { JobResult::empty() }
    }

    #[test]
    fn test_declare_keeps_order_and_rejects_duplicates() {
        let jobs = Jobs::new();
        jobs.declare("b", ["a"], noop()).unwrap();
        jobs.declare("a", Vec::<String>::new(), noop()).unwrap();
        assert_eq!(jobs.names(), vec!["b".to_string(), "a".to_string()]);

        let err = jobs.declare("a", Vec::<String>::new(), noop()).unwrap_err();
        assert!(matches!(err, JobsError::DuplicateName { ref name } if name == "a"));
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn test_resolution_moves_pending_to_resolved() {
        let jobs = Jobs::new();
        jobs.declare("a", ["b"], noop()).unwrap();
        jobs.declare("b", ["c"], noop()).unwrap();
        jobs.declare("c", Vec::<String>::new(), noop()).unwrap();

        let a = jobs.resolve("a", &mut Vec::new()).unwrap();
        assert_eq!(jobs.pending_count(), 0);
        assert_eq!(jobs.names(), vec!["c", "b", "a"]);
        assert_eq!(a.dependencies().len(), 1);
        assert_eq!(a.dependencies()[0].label(), "b");

        // resolving again hands back the same instance
        let again = jobs.resolve("a", &mut Vec::new()).unwrap();
        assert!(Arc::ptr_eq(&a, &again));
    }

    #[test]
    fn test_shared_dependency_is_one_instance() {
        let jobs = Jobs::new();
        jobs.declare("left", ["base"], noop()).unwrap();
        jobs.declare("right", ["base"], noop()).unwrap();
        jobs.declare("base", Vec::<String>::new(), noop()).unwrap();

        let left = jobs.resolve("left", &mut Vec::new()).unwrap();
        let right = jobs.resolve("right", &mut Vec::new()).unwrap();
        assert!(Arc::ptr_eq(&left.dependencies()[0], &right.dependencies()[0]));
    }

    #[test]
    fn test_cycle_is_reported() {
        let jobs = Jobs::new();
        jobs.declare("a", ["b"], noop()).unwrap();
        jobs.declare("b", ["a"], noop()).unwrap();

        let err = jobs.resolve("a", &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "circular dependency detected: a -> b -> a");
        assert_eq!(jobs.pending_count(), 2);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let jobs = Jobs::new();
        jobs.declare("a", ["a"], noop()).unwrap();
        let err = jobs.resolve("a", &mut Vec::new()).unwrap_err();
        assert_eq!(err.category(), "cycle");
    }

    #[test]
    fn test_redeclare_after_resolution_fails() {
        let jobs = Jobs::new();
        jobs.declare("a", Vec::<String>::new(), noop()).unwrap();
        jobs.resolve("a", &mut Vec::new()).unwrap();
        assert!(jobs.declare("a", Vec::<String>::new(), noop()).is_err());
    }

    #[tokio::test]
    async fn test_failed_start_all_still_starts_built_jobs() {
        let jobs = Jobs::new();
        jobs.declare("x", Vec::<String>::new(), noop()).unwrap();
        jobs.declare("y", ["x", "missing"], noop()).unwrap();

        let err = jobs.start_all().unwrap_err();
        assert_eq!(err.category(), "resolution");
        let x = jobs.job("x").unwrap();
        assert_ne!(x.state(), JobState::NotStarted);
        assert_eq!(jobs.pending_count(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = JobsConfig {
            wait_timeout_ms: Some(0),
            ..JobsConfig::default()
        };
        assert!(Jobs::with_config(config).is_err());
    }
}

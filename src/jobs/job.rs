use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use tokio::sync::Notify;
use tracing::{debug, warn};
use uuid::Uuid;

use super::hooks::{JobEvent, JobHook};
use super::result::{JobFault, JobResult};
use crate::core::errors::{JobsError, Result};

/// Job lifecycle with atomic representation.
///
/// Ordering matters: every state at or past `Completing` has a stored result.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobState {
    NotStarted = 0,
    Running = 1,
    /// Result stored, waiters are being released
    Completing = 2,
    Finished = 3,
}

impl JobState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => JobState::NotStarted,
            1 => JobState::Running,
            2 => JobState::Completing,
            _ => JobState::Finished,
        }
    }
}

/// The work a job performs once its dependencies are done.
#[async_trait]
pub trait Work: Send + Sync {
    async fn run(&self) -> JobResult;
}

#[async_trait]
impl<F, Fut> Work for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = JobResult> + Send + 'static,
{
    async fn run(&self) -> JobResult {
        (self)().await
    }
}

/// A schedulable unit of work with a fixed dependency list and a memoized result.
///
/// `start` spawns the execution task at most once; any number of tasks may
/// `wait` and all of them observe the same [`JobResult`]. Jobs never own their
/// dependencies' lifetimes beyond the shared handles they hold.
pub struct Job {
    id: Uuid,
    name: Option<String>,
    dependencies: Vec<Arc<Job>>,
    work: Arc<dyn Work>,
    state: AtomicU8,
    result: RwLock<Option<JobResult>>,
    // Starts at 1: the producer's share, retired by the first waiter to finish.
    waiters: AtomicUsize,
    done: Notify,
    hook: Option<Arc<dyn JobHook>>,
}

impl Job {
    /// Create an unnamed job
    pub fn new<W: Work + 'static>(dependencies: Vec<Arc<Job>>, work: W) -> Arc<Job> {
        Job::builder().dependencies(dependencies).build(work)
    }

    pub fn builder() -> JobBuilder {
        JobBuilder::default()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name if set, otherwise a short form of the id
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let id = self.id.simple().to_string();
                format!("job-{}", &id[..8])
            }
        }
    }

    pub fn dependencies(&self) -> &[Arc<Job>] {
        &self.dependencies
    }

    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True once the result is stored
    pub fn is_done(&self) -> bool {
        self.state() >= JobState::Completing
    }

    /// Non-blocking peek at the stored result
    pub fn result(&self) -> Option<JobResult> {
        self.result.read().clone()
    }

    /// Parties currently registered for the completion signal, producer included
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Acquire)
    }

    /// Spawn the execution task unless some caller already did.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>) {
        if self
            .state
            .compare_exchange(
                JobState::NotStarted as u8,
                JobState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        self.emit(JobEvent::StartRequested);
        let job = Arc::clone(self);
        tokio::spawn(async move {
            job.execute().await;
        });
    }

    /// Block until the result is stored.
    ///
    /// Returns immediately once the job is `Finished`. Never starts the job.
    pub async fn wait(&self) {
        if self.state() == JobState::Finished {
            return;
        }

        self.emit(JobEvent::WaitBegin);
        {
            let _waiter = WaiterGuard::register(&self.waiters);
            self.until_completed().await;
        }
        if self
            .state
            .compare_exchange(
                JobState::Completing as u8,
                JobState::Finished as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.waiters.fetch_sub(1, Ordering::AcqRel);
        }
        self.emit(JobEvent::WaitEnd);
    }

    /// [`Job::wait`] bounded by `timeout`.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| {
                JobsError::timeout(
                    format!("wait for job {}", self.label()),
                    millis(timeout),
                )
            })
    }

    /// Start if needed, wait, and return the stored result.
    pub async fn get(self: &Arc<Self>) -> JobResult {
        self.start();
        self.wait().await;
        self.result.read().clone().unwrap_or_default()
    }

    async fn until_completed(&self) {
        loop {
            let notified = self.done.notified();
            tokio::pin!(notified);
            // Register before checking state so a completion in between is not lost.
            notified.as_mut().enable();
            if self.state() >= JobState::Completing {
                return;
            }
            notified.await;
        }
    }

    async fn execute(&self) {
        self.emit(JobEvent::WaitingOnDependencies);
        debug!(
            job = %self.label(),
            dependencies = self.dependencies.len(),
            "waiting on dependencies"
        );
        for dependency in &self.dependencies {
            dependency.start();
            dependency.wait().await;
        }

        self.emit(JobEvent::Invoking);
        debug!(job = %self.label(), "invoking work");
        let result = match AssertUnwindSafe(self.work.run()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let fault = JobFault::from_panic(payload);
                warn!(job = %self.label(), fault = %fault, "work panicked, recovered as fault");
                self.emit(JobEvent::Recovered);
                JobResult::from_fault(fault)
            }
        };
        self.complete(result);
    }

    fn complete(&self, result: JobResult) {
        let ok = result.is_ok();
        *self.result.write() = Some(result);
        let _ = self.state.compare_exchange(
            JobState::Running as u8,
            JobState::Completing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        debug!(job = %self.label(), ok, "job completed");
        self.done.notify_waiters();
    }

    fn emit(&self, event: JobEvent) {
        if let Some(hook) = &self.hook {
            hook.on_event(event, self);
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .field(
                "dependencies",
                &self.dependencies.iter().map(|d| d.label()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

struct WaiterGuard<'a>(&'a AtomicUsize);

impl<'a> WaiterGuard<'a> {
    fn register(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(count)
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Builder for [`Job`]
#[derive(Default)]
pub struct JobBuilder {
    name: Option<String>,
    dependencies: Vec<Arc<Job>>,
    hook: Option<Arc<dyn JobHook>>,
}

impl JobBuilder {
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn dependency(mut self, job: Arc<Job>) -> Self {
        self.dependencies.push(job);
        self
    }

    pub fn dependencies<I: IntoIterator<Item = Arc<Job>>>(mut self, jobs: I) -> Self {
        self.dependencies.extend(jobs);
        self
    }

    pub fn hook(mut self, hook: Arc<dyn JobHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub(crate) fn maybe_hook(mut self, hook: Option<Arc<dyn JobHook>>) -> Self {
        self.hook = hook;
        self
    }

    pub fn build<W: Work + 'static>(self, work: W) -> Arc<Job> {
        self.build_shared(Arc::new(work))
    }

    pub(crate) fn build_shared(self, work: Arc<dyn Work>) -> Arc<Job> {
        Arc::new(Job {
            id: Uuid::new_v4(),
            name: self.name,
            dependencies: self.dependencies,
            work,
            state: AtomicU8::new(JobState::NotStarted as u8),
            result: RwLock::new(None),
            waiters: AtomicUsize::new(1),
            done: Notify::new(),
            hook: self.hook,
        })
    }
}

//! Embedding a whole registry as a single job of another registry

use std::sync::Arc;

use tracing::warn;

use super::job::Job;
use super::registry::Jobs;
use super::result::JobResult;
use super::value::into_value;
use crate::core::errors::Result;

/// Value produced by a group job: every child job of the sub-registry, finished,
/// in resolution order.
pub type GroupOutput = Vec<Arc<Job>>;

impl Jobs {
    /// Declare `name` as a job with no dependencies whose work runs `group` to
    /// completion.
    ///
    /// The group's value is a [`GroupOutput`]. If any child faulted, the first
    /// fault (in resolution order) becomes the group's fault and the children
    /// are still returned as its value.
    pub fn add_group<N: Into<String>>(&self, name: N, group: Jobs) -> Result<()> {
        let name = name.into();
        let label = name.clone();
        self.declare(name, Vec::<String>::new(), move || {
            let group = group.clone();
            let label = label.clone();
            async move { run_group(&label, &group).await }
        })
    }
}

async fn run_group(label: &str, group: &Jobs) -> JobResult {
    let children = match group.run_to_completion().await {
        Ok(children) => children,
        Err(err) => {
            warn!(group = %label, error = %err, "group could not run");
            return JobResult::failed(format!("group {}: {}", label, err));
        }
    };

    let fault = children
        .iter()
        .find_map(|child| child.result().and_then(|r| r.fault().cloned()));
    if let Some(fault) = &fault {
        warn!(group = %label, fault = %fault, "group child faulted");
    }
    JobResult::new(Some(into_value::<GroupOutput>(children)), fault)
}

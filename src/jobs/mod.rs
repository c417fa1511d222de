//! Jobs, their results, and the registry that wires them into a graph

pub mod group;
pub mod hooks;
pub mod job;
pub mod registry;
pub mod result;
pub mod value;

pub use group::GroupOutput;
pub use hooks::{BufferingHook, HookRecord, JobEvent, JobHook, TracingHook};
pub use job::{Job, JobBuilder, JobState, Work};
pub use registry::Jobs;
pub use result::{JobFault, JobResult};
pub use value::{downcast_ref, into_value, JobValue};

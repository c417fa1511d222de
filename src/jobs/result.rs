use std::any::Any;
use std::fmt;

use thiserror::Error;

use super::value::{downcast_ref, into_value, DebugValue, JobValue};

/// Fault channel of a [`JobResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobFault {
    /// The work returned an error of its own
    #[error("{0}")]
    Failed(String),

    /// The work panicked; carries the panic message
    #[error("{0}")]
    Panicked(String),

    /// A registry lookup named a job that was never declared
    #[error("there is no job named {0}")]
    NotFound(String),
}

impl JobFault {
    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self::Failed(message.into())
    }

    /// Build a fault from a panic payload as returned by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "job panicked".to_string()
        };
        Self::Panicked(message)
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

impl From<anyhow::Error> for JobFault {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(format!("{:#}", err))
    }
}

/// Value/fault pair produced once per job.
///
/// Work normally fills exactly one side. Groups fill both: the list of child
/// jobs plus the first child fault.
#[derive(Clone, Default)]
pub struct JobResult {
    value: Option<JobValue>,
    fault: Option<JobFault>,
}

impl JobResult {
    pub fn new(value: Option<JobValue>, fault: Option<JobFault>) -> Self {
        Self { value, fault }
    }

    /// Successful result carrying `value`
    pub fn ok<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(into_value(value)),
            fault: None,
        }
    }

    /// Successful result without a payload
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_fault(fault: JobFault) -> Self {
        Self {
            value: None,
            fault: Some(fault),
        }
    }

    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self::from_fault(JobFault::failed(message))
    }

    /// Convert an ordinary `Result` returned by application code.
    pub fn from_result<T, E>(result: std::result::Result<T, E>) -> Self
    where
        T: Any + Send + Sync,
        E: Into<JobFault>,
    {
        match result {
            Ok(value) => Self::ok(value),
            Err(err) => Self::from_fault(err.into()),
        }
    }

    pub fn value(&self) -> Option<&JobValue> {
        self.value.as_ref()
    }

    /// Borrow the payload as `T`
    pub fn value_as<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(downcast_ref::<T>)
    }

    pub fn fault(&self) -> Option<&JobFault> {
        self.fault.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.fault.is_none()
    }

    pub fn into_parts(self) -> (Option<JobValue>, Option<JobFault>) {
        (self.value, self.fault)
    }

    /// View as a `Result`, dropping the value when a fault is present.
    pub fn as_result(&self) -> std::result::Result<Option<&JobValue>, &JobFault> {
        match &self.fault {
            Some(fault) => Err(fault),
            None => Ok(self.value.as_ref()),
        }
    }
}

impl fmt::Debug for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobResult")
            .field("value", &self.value.as_ref().map(DebugValue))
            .field("fault", &self.fault)
            .finish()
    }
}

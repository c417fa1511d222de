use thiserror::Error;

/// Unified error type for graph construction and registry operations.
///
/// Faults produced by a job's own work never show up here; they travel inside
/// [`crate::JobResult`]. A `JobsError` means the graph itself is malformed or a
/// bounded wait gave up.
#[derive(Debug, Error)]
pub enum JobsError {
    /// A job name was declared twice in one registry
    #[error("duplicated job name: {name}")]
    DuplicateName { name: String },

    /// A dependency name matches neither a pending nor a resolved job
    #[error("can't resolve job name: {dependency} on {job}")]
    UnresolvedDependency { dependency: String, job: String },

    /// Resolution was asked for a name the registry does not hold
    #[error("unknown job: {name}")]
    UnknownJob { name: String },

    /// Resolution re-entered a name already on its own path
    #[error("circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// A bounded wait elapsed before the job finished
    #[error("operation timed out: {operation} (timeout: {timeout_ms}ms)")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// IO errors
    #[error("IO operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization errors
    #[error("serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl JobsError {
    /// Create a duplicate-name error
    pub fn duplicate_name<S: Into<String>>(name: S) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Create an unresolved-dependency error
    pub fn unresolved<D: Into<String>, J: Into<String>>(dependency: D, job: J) -> Self {
        Self::UnresolvedDependency {
            dependency: dependency.into(),
            job: job.into(),
        }
    }

    pub fn unknown_job<S: Into<String>>(name: S) -> Self {
        Self::UnknownJob { name: name.into() }
    }

    /// Create a cycle error from the resolution path that closed the loop
    pub fn circular<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cycle = path
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CircularDependency { cycle }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io<S: Into<String>>(operation: S, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// True for errors that describe a malformed graph rather than a runtime condition
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName { .. }
                | Self::UnresolvedDependency { .. }
                | Self::UnknownJob { .. }
                | Self::CircularDependency { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::DuplicateName { .. } => "registration",
            Self::UnresolvedDependency { .. } | Self::UnknownJob { .. } => "resolution",
            Self::CircularDependency { .. } => "cycle",
            Self::Timeout { .. } => "timeout",
            Self::Configuration { .. } => "configuration",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, JobsError>;

impl From<serde_json::Error> for JobsError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}

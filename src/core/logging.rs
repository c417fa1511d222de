use tracing::Level;

use crate::core::errors::{JobsError, Result};

/// Install a global `fmt` subscriber at the given level.
///
/// Fails if a global subscriber is already set, which makes repeated calls
/// from tests harmless when the error is ignored.
pub fn init_tracing(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| JobsError::configuration(format!("tracing subscriber: {}", e)))
}

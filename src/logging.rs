//! Logging setup
//!
//! Library code logs through the `log` facade. The fmt subscriber installed
//! here also picks up those records through its `tracing-log` bridge.

use std::str::FromStr;

use tracing::Level;

use crate::domain::{DomainError, DomainResult};

/// Install a global fmt subscriber at `level` ("error" .. "trace").
///
/// Returns `Ok(false)` when a subscriber was already installed.
pub fn init_logging(level: &str) -> DomainResult<bool> {
    let level = Level::from_str(level)
        .map_err(|_| DomainError::InvalidInput(format!("unknown log level '{}'", level)))?;

    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        log::debug!("logging initialised at {}", level);
    }
    Ok(installed)
}

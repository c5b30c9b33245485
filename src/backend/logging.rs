//! Installs a `tracing-subscriber` formatter for the engine's events.
//!
//! Targets: `rcore::promise`, `rcore::missing`, `rcore::extract`,
//! `rcore::replace`, `rcore::coerce`, `rcore::dispatch`, `rcore::eval`.
//! R warnings (partial recycling, NAs introduced by coercion) are `warn!`.

use tracing::debug;

use crate::backend::config::LoggingConfig;
use crate::backend::errors::RResult;

/// Install the global subscriber. Returns `Ok(false)` when one was already
/// installed, which is not an error.
pub fn init_logging(config: &LoggingConfig) -> RResult<bool> {
    let level = config.max_level()?;
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        debug!(target: "rcore::eval", %level, "Logging initialized");
    }
    Ok(installed)
}

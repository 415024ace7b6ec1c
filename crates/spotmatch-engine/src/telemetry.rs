//! Tracing subscriber setup for binaries and tests embedding the engine.

use spotmatch_types::{Result, SpotmatchError};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `info`. `json` selects
/// line-delimited JSON output instead of the human-readable format. Fails
/// if a global subscriber is already installed.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_current_span(false)))
        .with((!json).then(|| fmt::layer().with_target(false)))
        .try_init()
        .map_err(|err| SpotmatchError::Configuration(format!("tracing: {err}")))
}

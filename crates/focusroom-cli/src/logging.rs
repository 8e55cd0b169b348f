//! Logging initialization for the Focusroom CLI.
//!
//! Filter directives come from the `FOCUSROOM_LOG` environment variable
//! (e.g. `FOCUSROOM_LOG=focusroom_core=debug`). Defaults to `warn` so that
//! only recovered storage problems show up during normal use.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "FOCUSROOM_LOG";

/// Install the global subscriber. Logs go to stderr; stdout carries JSON.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "ENSEMBLE_LOG";

static INIT: Once = Once::new();

/// Initialize logging.
///
/// Reads `ENSEMBLE_LOG` for per-module log levels, e.g.
/// `ENSEMBLE_LOG=ensemble_analysis=debug,ensemble_storage=warn`.
/// Falls back to `ensemble=info` if unset or invalid.
///
/// Idempotent: calling it multiple times is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("ensemble=info"));

        // A subscriber may already be installed by the host application.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}

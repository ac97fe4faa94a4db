//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "REQTAGS_LOG";

/// Filter used when `REQTAGS_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "reqtags=info";

static INIT: Once = Once::new();

/// Initialize the auditor's tracing subscriber.
///
/// Reads `REQTAGS_LOG` for per-module log levels, for example
/// `REQTAGS_LOG=reqtags_audit=debug,reqtags_storage=warn`.
///
/// Idempotent. If the host already installed a global subscriber, that one
/// is kept.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}

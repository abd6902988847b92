//! Diagnostic logging set-up.
//!
//! Logs go to stderr so they never mix with the progress output on stdout.
//! `RUST_LOG` takes precedence over the level picked here, e.g.
//! `RUST_LOG=grafana_generate=trace` to see every API request.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Level used when neither `RUST_LOG` nor `--verbose` say otherwise
pub const DEFAULT_LEVEL: &str = "warn";

/// Level selected by `--verbose`
pub fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { DEFAULT_LEVEL }
}

/// Install the global subscriber
///
/// Returns false when a subscriber was already installed.
pub fn init_logging(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}

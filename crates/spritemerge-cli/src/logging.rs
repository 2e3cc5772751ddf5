//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`; user-facing results are
//! printed separately by the commands.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "SPRITEMERGE_LOG";

/// Default filter level for a `-v` count.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// `SPRITEMERGE_LOG` takes precedence over the verbosity flag. Calling this
/// twice is harmless; the second call is ignored.
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

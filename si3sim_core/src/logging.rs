//! Logging setup shared by the si3sim binaries.
//!
//! Output goes to stderr so the sample stream can be piped from stdout.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging at INFO unless RUST_LOG says otherwise
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific default level
///
/// `default_level` is any `EnvFilter` directive (`warn`, `debug`,
/// `si3sim_core=trace`). RUST_LOG still takes precedence.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from an embedding application) is not an error
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Map repeated `-v` flags onto a level, starting from `configured`
pub fn level_for_verbosity(configured: &str, verbosity: u8) -> &str {
    match verbosity {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize logging from a `-v` count
pub fn init_for_verbosity(configured: &str, verbosity: u8) {
    init_with_level(level_for_verbosity(configured, verbosity))
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

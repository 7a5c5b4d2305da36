//! Logging setup.
//!
//! The library only emits `tracing` events; binaries and tests choose a
//! subscriber here.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the process-wide subscriber.
///
/// # Environment
/// - `RUST_LOG`: filter directives (default `info`), e.g.
///   `RUST_LOG=u_workforce=debug`
///
/// Events go to stderr so that plan output on stdout stays clean.
///
/// # Example
/// ```no_run
/// u_workforce::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Installs a verbose subscriber for tests; repeated calls are ignored.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_is_repeatable() {
        init_test();
        init_test();
        tracing::debug!(target: "u_workforce", "subscriber installed");
        assert!(tracing::dispatcher::has_been_set());
    }
}

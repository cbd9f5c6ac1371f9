//! Logging setup for the `phpdomain` binary.
//!
//! Diagnostics go to stderr so rendered documents can be piped from stdout.
//! `--verbose` enables debug output, `--quiet` limits it to errors, and
//! `RUST_LOG` applies otherwise.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("phpdomain=debug")
    } else if quiet {
        EnvFilter::new("phpdomain=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("phpdomain=warn"))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

//! Logging setup built on the `tracing` ecosystem.
//!
//! Library code only emits `tracing` events; embedders call
//! [`init_logger`] once at startup (or install their own subscriber).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Filter resolution order: `verbose` (debug for wpdev crates), `quiet`
/// (errors only), `RUST_LOG`, then info for wpdev crates.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("wpdev_server=debug,wpdev_config=debug")
    } else if quiet {
        EnvFilter::new("wpdev_server=error,wpdev_config=error")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("wpdev_server=info,wpdev_config=info"))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Initialize with a custom filter, for tests and embedders that need
/// precise control.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

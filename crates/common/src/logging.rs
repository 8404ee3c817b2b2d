//! Tracing subscriber setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter from `RUST_LOG`, falling back to `directive`
pub fn filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

/// Install a stderr subscriber. Returns false if one was already installed.
pub fn init(directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter(directive))
        .try_init()
        .is_ok()
}

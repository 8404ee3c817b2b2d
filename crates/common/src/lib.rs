//! Testbed Common Library
//!
//! The fixture registry and polling loop shared by the UI and database
//! fixture factories, plus error, configuration and logging plumbing.

pub mod config;
pub mod error;
pub mod logging;
pub mod poll;
pub mod registry;

// Re-export commonly used types
pub use config::{CollisionPolicy, HarnessConfig, TransactionPolicy};
pub use error::{Error, Result};
pub use poll::{Poll, PollOutcome};
pub use registry::{same_instance, Fixture, Registry};

/// Testbed version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

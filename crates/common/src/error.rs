//! Error types for Testbed

use thiserror::Error;

/// Result type alias using Testbed Error
pub type Result<T> = std::result::Result<T, Error>;

/// Testbed error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Type mismatch: {name} must be a {expected} fixture, got {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Fixture already stored under another name: {name} is registered as {existing}")]
    IdentityConflict { name: String, existing: String },

    #[error("Fixture not found: {kind} {id} is not stored in factory")]
    NotFound { kind: String, id: String },

    #[error("Already exists: {kind} {id}")]
    AlreadyExists { kind: String, id: String },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Operation timeout after {seconds}s: {what}")]
    Timeout { what: String, seconds: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a missing fixture
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// True for failures raised by the database layer
    pub fn is_database(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Sqlite(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_classification() {
        assert!(Error::Database("deadlock".into()).is_database());
        assert!(Error::Sqlite(rusqlite::Error::QueryReturnedNoRows).is_database());
        assert!(!Error::Driver("stale element".into()).is_database());
        assert!(!Error::not_found("Server", "slave").is_database());
    }

    #[test]
    fn test_messages() {
        let err = Error::not_found("Environment", "staging");
        assert_eq!(
            err.to_string(),
            "Fixture not found: Environment staging is not stored in factory"
        );
    }
}

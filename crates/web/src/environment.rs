//! Deployment targets

use serde::{Deserialize, Serialize};

/// An immutable (type, domain) pair such as `staging` at `https://staging.example.com`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(rename = "type")]
    kind: String,
    domain: String,
}

impl Environment {
    pub fn new(kind: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            domain: domain.into().trim_end_matches('/').to_string(),
        }
    }

    /// Environment type, e.g. `staging`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Registry behaviour
    pub registry: RegistryConfig,

    /// Default polling cadence
    pub poll: PollConfig,

    /// Page defaults
    pub page: PageConfig,

    /// Database fixture defaults
    pub data: DataConfig,

    /// Test log output
    pub logging: LoggingConfig,
}

/// What `store` does when a name is already bound to a different fixture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The new fixture replaces the old binding
    #[default]
    Replace,
    /// The store fails with `AlreadyExists`
    Reject,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub on_name_collision: CollisionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Deadline in whole seconds
    pub timeout_secs: u64,

    /// Sleep between evaluations
    pub frequency_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            frequency_ms: 500,
        }
    }
}

impl PollConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn frequency(&self) -> Duration {
        Duration::from_millis(self.frequency_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Per-page wait timeout
    pub timeout_secs: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// How a transaction scope treats a database failure after rolling back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionPolicy {
    /// Roll back, log, then return the error to the caller
    #[default]
    Propagate,
    /// Roll back and log only; the scope yields `None`
    Report,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub transaction_policy: TransactionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for per-test log files
    pub dir: PathBuf,

    /// Filter directive, e.g. `info` or `testbed_web=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            level: "info".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.registry.on_name_collision, CollisionPolicy::Replace);
        assert_eq!(config.page.timeout_secs, 10);
        assert_eq!(config.data.transaction_policy, TransactionPolicy::Propagate);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testbed.toml");
        std::fs::write(
            &path,
            r#"
[registry]
on_name_collision = "reject"

[data]
transaction_policy = "report"
"#,
        )
        .unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.registry.on_name_collision, CollisionPolicy::Reject);
        assert_eq!(config.data.transaction_policy, TransactionPolicy::Report);
        assert_eq!(config.poll.frequency(), Duration::from_millis(500));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("testbed.toml");
        let mut config = HarnessConfig::default();
        config.poll.timeout_secs = 3;
        config.save(&path).unwrap();

        let loaded = HarnessConfig::load(&path).unwrap();
        assert_eq!(loaded.poll.timeout(), Duration::from_secs(3));
    }
}

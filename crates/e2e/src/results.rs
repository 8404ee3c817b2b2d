//! Test result records

use crate::E2eResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::info;

/// One checked value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestRecord {
    pub scenario: String,
    pub actual: Value,
    pub expect: Value,
}

impl TestRecord {
    pub fn passed(&self) -> bool {
        self.actual == self.expect
    }
}

/// Summary written by [`TestResults::write`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<TestRecord>,
}

/// Accumulator of actual/expected pairs, owned by the test that fills it
#[derive(Debug, Clone, Default)]
pub struct TestResults {
    records: Vec<TestRecord>,
}

impl TestResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        scenario: impl Display,
        actual: impl Serialize,
        expect: impl Serialize,
    ) -> E2eResult<&mut Self> {
        self.records.push(TestRecord {
            scenario: scenario.to_string(),
            actual: serde_json::to_value(actual)?,
            expect: serde_json::to_value(expect)?,
        });
        Ok(self)
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.passed()
    }

    /// Records whose actual value differs from the expectation
    pub fn failures(&self) -> impl Iterator<Item = &TestRecord> {
        self.records.iter().filter(|r| !r.passed())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> ResultsSummary {
        ResultsSummary {
            total: self.records.len(),
            passed: self.passed(),
            failed: self.failed(),
            results: self.records.clone(),
        }
    }

    /// Write the summary to `{dir}/test-results.json`
    pub fn write(&self, dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join("test-results.json");
        let json = serde_json::to_string_pretty(&self.summary())?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts() {
        let mut results = TestResults::new();
        results
            .add("title", "Shop", "Shop")
            .unwrap()
            .add("cart total", 3, 4)
            .unwrap()
            .add("badges", vec!["new"], vec!["new"])
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results.passed(), 2);
        assert_eq!(results.failed(), 1);
        assert_eq!(results.failures().next().unwrap().scenario, "cart total");
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut results = TestResults::new();
        results.add("rows", 2, 2).unwrap();

        let path = results.write(&dir.path().join("out")).unwrap();
        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["total"], json!(1));
        assert_eq!(
            written["results"][0],
            json!({"Scenario": "rows", "Actual": 2, "Expect": 2})
        );
    }
}

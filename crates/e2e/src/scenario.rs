//! Data-driven scenarios

use crate::E2eResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of a data-driven test: a summary used as the case id plus its arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub summary: String,
    pub args: Vec<Value>,
}

impl Scenario {
    /// Build a scenario from any serializable argument tuple
    ///
    /// A tuple or sequence becomes one argument per element; any other value
    /// becomes a single argument.
    pub fn new(summary: impl Into<String>, args: impl Serialize) -> E2eResult<Self> {
        let args = match serde_json::to_value(args)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single => vec![single],
        };
        Ok(Self {
            summary: summary.into(),
            args,
        })
    }

    /// Split scenarios into argument rows and their ids, in order
    pub fn parse(scenarios: &[Scenario]) -> (Vec<Vec<Value>>, Vec<String>) {
        scenarios
            .iter()
            .map(|s| (s.args.clone(), s.summary.clone()))
            .unzip()
    }

    /// Typed view of argument `index`
    pub fn arg<T: serde::de::DeserializeOwned>(&self, index: usize) -> E2eResult<Option<T>> {
        match self.args.get(index) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }
}

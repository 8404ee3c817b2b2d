//! Browser automation boundary
//!
//! The factory never talks to a browser itself. It only needs a handle it
//! can stamp onto pages and later swap; everything else goes through
//! [`WebDriver`].

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use testbed_common::{Error, Result};
use tracing::debug;

/// Shared handle to a browser session
pub type DriverHandle = Arc<dyn WebDriver>;

/// Element locator strategies
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
    Id(String),
    Name(String),
    LinkText(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
            Locator::Id(s) => write!(f, "id={}", s),
            Locator::Name(s) => write!(f, "name={}", s),
            Locator::LinkText(s) => write!(f, "link={}", s),
        }
    }
}

/// Operations a browser session must offer
pub trait WebDriver: Send + Sync + fmt::Debug {
    /// Human-readable browser name, e.g. `chrome`
    fn browser(&self) -> &str;

    /// Navigate to an absolute URL
    fn get(&self, url: &str) -> Result<()>;

    /// URL currently loaded
    fn current_url(&self) -> Result<String>;

    /// Whether an element matching `locator` is in the document
    fn is_present(&self, locator: &Locator) -> Result<bool>;

    fn execute_script(&self, script: &str) -> Result<Value>;

    fn quit(&self) -> Result<()>;
}

/// In-process driver that records navigation instead of driving a browser
#[derive(Debug, Default)]
pub struct RecordingDriver {
    browser: String,
    visited: Mutex<Vec<String>>,
    present: Mutex<HashSet<Locator>>,
    closed: Mutex<bool>,
}

impl RecordingDriver {
    pub fn new(browser: &str) -> Self {
        Self {
            browser: browser.to_string(),
            ..Default::default()
        }
    }

    /// Convenience constructor returning a ready [`DriverHandle`]
    pub fn handle(browser: &str) -> DriverHandle {
        Arc::new(Self::new(browser))
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }

    /// Make `locator` resolve from now on
    pub fn insert(&self, locator: Locator) {
        self.present.lock().insert(locator);
    }

    pub fn remove(&self, locator: &Locator) {
        self.present.lock().remove(locator);
    }

    fn ensure_open(&self) -> Result<()> {
        if *self.closed.lock() {
            return Err(Error::Driver(format!("{} session already quit", self.browser)));
        }
        Ok(())
    }
}

impl WebDriver for RecordingDriver {
    fn browser(&self) -> &str {
        &self.browser
    }

    fn get(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        debug!("[{}] GET {}", self.browser, url);
        self.visited.lock().push(url.to_string());
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.visited.lock().last().cloned().unwrap_or_else(|| "about:blank".to_string()))
    }

    fn is_present(&self, locator: &Locator) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.present.lock().contains(locator))
    }

    fn execute_script(&self, script: &str) -> Result<Value> {
        self.ensure_open()?;
        match script.trim() {
            "return document.readyState" => Ok(Value::String("complete".to_string())),
            "return window.location.href" => Ok(Value::String(self.current_url()?)),
            other => Err(Error::Driver(format!("unsupported script: {}", other))),
        }
    }

    fn quit(&self) -> Result<()> {
        *self.closed.lock() = true;
        Ok(())
    }
}

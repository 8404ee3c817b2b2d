//! Page objects

use crate::driver::{DriverHandle, Locator, WebDriver};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use testbed_common::{Error, Poll, PollOutcome, Result};

/// Shared, mutable page as stored in a [`crate::PageFactory`]
pub type PageRef = Arc<RwLock<Page>>;

/// Default per-page wait timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default sleep between wait evaluations
pub const DEFAULT_FREQUENCY: Duration = Duration::from_millis(500);

/// A page of the site under test
///
/// Domain and driver are owned by the factory: they are stamped when the
/// page is added and rewritten whenever the factory switches environment or
/// engine. Timeout and wait frequency are stamped from the factory's
/// configuration unless the page sets its own.
#[derive(Debug)]
pub struct Page {
    path: String,
    domain: Option<String>,
    driver: DriverHandle,
    timeout: Option<Duration>,
    frequency: Option<Duration>,
}

impl Page {
    pub fn new(driver: DriverHandle) -> Self {
        Self {
            path: String::new(),
            domain: None,
            driver,
            timeout: None,
            frequency: None,
        }
    }

    /// Path navigated to by [`Page::open`]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_frequency(mut self, frequency: Duration) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = Some(domain.into());
    }

    pub fn driver(&self) -> &DriverHandle {
        &self.driver
    }

    pub fn set_driver(&mut self, driver: DriverHandle) {
        self.driver = driver;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub(crate) fn has_timeout(&self) -> bool {
        self.timeout.is_some()
    }

    pub fn frequency(&self) -> Duration {
        self.frequency.unwrap_or(DEFAULT_FREQUENCY)
    }

    pub fn set_frequency(&mut self, frequency: Duration) {
        self.frequency = Some(frequency);
    }

    pub(crate) fn has_frequency(&self) -> bool {
        self.frequency.is_some()
    }

    fn poll(&self) -> Poll {
        Poll::new(self.timeout(), self.frequency())
    }

    /// Absolute URL of `uri` under the bound domain
    pub fn url(&self, uri: &str) -> Result<String> {
        let domain = self
            .domain
            .as_deref()
            .ok_or_else(|| Error::Precondition("page has no domain bound".to_string()))?;
        Ok(format!("{}/{}", domain, uri.trim_start_matches('/')))
    }

    /// Navigate the bound driver to `uri` under the bound domain
    pub fn go(&self, uri: &str) -> Result<()> {
        let url = self.url(uri)?;
        self.driver.get(&url)
    }

    /// Navigate to this page's own path
    pub fn open(&self) -> Result<()> {
        self.go(&self.path)
    }

    /// Block for `duration` before the next action
    pub fn sleep(&self, duration: Duration) -> &Self {
        std::thread::sleep(duration);
        self
    }

    /// Poll `condition` for up to the page timeout
    pub fn wait_until(&self, condition: impl FnMut() -> bool) -> PollOutcome {
        self.poll().wait_until_true(condition)
    }

    /// Wait for `locator` to appear, failing with `Error::Timeout`
    pub fn wait_for(&self, locator: &Locator) -> Result<()> {
        let outcome = self
            .poll()
            .try_wait_until_true(|| self.driver.is_present(locator))?;
        outcome.into_result(&locator.to_string()).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::RecordingDriver;

    #[test]
    fn test_go_joins_domain_and_uri() {
        let driver = Arc::new(RecordingDriver::new("chrome"));
        let mut page = Page::new(driver.clone()).with_path("/login");
        page.set_domain("https://a");

        page.go("cart").unwrap();
        page.open().unwrap();
        page.go("").unwrap();
        assert_eq!(
            driver.visited(),
            vec!["https://a/cart", "https://a/login", "https://a/"]
        );
    }

    #[test]
    fn test_go_without_domain_fails() {
        let page = Page::new(RecordingDriver::handle("chrome"));
        assert!(matches!(page.go("x"), Err(Error::Precondition(_))));
    }

    #[test]
    fn test_timeout_defaults() {
        let mut page = Page::new(RecordingDriver::handle("chrome"));
        assert_eq!(page.timeout(), DEFAULT_TIMEOUT);
        assert!(!page.has_timeout());

        page.set_timeout(Duration::from_secs(3));
        assert_eq!(page.timeout(), Duration::from_secs(3));

        assert_eq!(page.frequency(), DEFAULT_FREQUENCY);
        assert!(!page.has_frequency());
        page.set_frequency(Duration::from_millis(50));
        assert_eq!(page.frequency(), Duration::from_millis(50));
    }

    #[test]
    fn test_wait_for_present_element() {
        let driver = Arc::new(RecordingDriver::new("chrome"));
        let spinner = Locator::Css(".done".into());
        driver.insert(spinner.clone());

        let page = Page::new(driver).with_timeout(Duration::from_secs(1));
        page.wait_for(&spinner).unwrap();
    }

    #[test]
    fn test_wait_for_missing_element_times_out() {
        let page = Page::new(RecordingDriver::handle("chrome")).with_timeout(Duration::ZERO);
        let err = page.wait_for(&Locator::Id("never".into())).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn test_wait_for_propagates_driver_failure() {
        let driver = Arc::new(RecordingDriver::new("chrome"));
        driver.quit().unwrap();
        let page = Page::new(driver).with_timeout(Duration::from_secs(5));
        assert!(matches!(page.wait_for(&Locator::Id("x".into())), Err(Error::Driver(_))));
    }
}

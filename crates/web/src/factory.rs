//! Page factory: environments, engines and the pages bound to them

use crate::driver::{DriverHandle, WebDriver};
use crate::environment::Environment;
use crate::page::{Page, PageRef};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use testbed_common::registry::{same_instance, Fixture, Registry};
use testbed_common::{Error, HarnessConfig, Poll, Result};
use tracing::info;

/// Reserved registry name holding the site name; never destroyed
pub const SITE_NAME: &str = "siteName";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiKind {
    Site,
    Environment,
    Engine,
    Page,
}

/// Everything a [`PageFactory`] can hold
#[derive(Debug, Clone)]
pub enum UiFixture {
    Site(Arc<str>),
    Environment(Arc<Environment>),
    Engine(DriverHandle),
    Page(PageRef),
}

impl Fixture for UiFixture {
    type Kind = UiKind;

    fn kind(&self) -> UiKind {
        match self {
            UiFixture::Site(_) => UiKind::Site,
            UiFixture::Environment(_) => UiKind::Environment,
            UiFixture::Engine(_) => UiKind::Engine,
            UiFixture::Page(_) => UiKind::Page,
        }
    }

    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (UiFixture::Site(a), UiFixture::Site(b)) => same_instance(a, b),
            (UiFixture::Environment(a), UiFixture::Environment(b)) => Arc::ptr_eq(a, b),
            (UiFixture::Engine(a), UiFixture::Engine(b)) => same_instance(a, b),
            (UiFixture::Page(a), UiFixture::Page(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Arc<Environment>> for UiFixture {
    fn from(env: Arc<Environment>) -> Self {
        UiFixture::Environment(env)
    }
}

impl From<DriverHandle> for UiFixture {
    fn from(engine: DriverHandle) -> Self {
        UiFixture::Engine(engine)
    }
}

impl From<PageRef> for UiFixture {
    fn from(page: PageRef) -> Self {
        UiFixture::Page(page)
    }
}

/// Registry of one site's environments, browser engines and pages
#[derive(Debug)]
pub struct PageFactory {
    registry: Registry<UiFixture>,
    site: Arc<str>,
    environment: Option<Arc<Environment>>,
    engine: Option<DriverHandle>,
    page_timeout: Duration,
    poll: Poll,
}

impl PageFactory {
    pub fn new(site_name: &str) -> Self {
        Self::with_config(site_name, &HarnessConfig::default())
    }

    pub fn with_config(site_name: &str, config: &HarnessConfig) -> Self {
        let site: Arc<str> = Arc::from(site_name);
        let mut registry = Registry::with_policy(config.registry.on_name_collision);
        registry.pin(SITE_NAME, UiFixture::Site(site.clone()));

        Self {
            registry,
            site,
            environment: None,
            engine: None,
            page_timeout: Duration::from_secs(config.page.timeout_secs),
            poll: Poll::from_config(&config.poll),
        }
    }

    pub fn site_name(&self) -> &str {
        &self.site
    }

    pub fn registry(&self) -> &Registry<UiFixture> {
        &self.registry
    }

    pub fn environment(&self) -> Option<&Arc<Environment>> {
        self.environment.as_ref()
    }

    pub fn engine(&self) -> Option<&DriverHandle> {
        self.engine.as_ref()
    }

    pub fn store_environment(&mut self, name: &str, env: Arc<Environment>) -> Result<&mut Self> {
        self.registry
            .store(name, UiFixture::Environment(env), UiKind::Environment)?;
        Ok(self)
    }

    pub fn store_engine(&mut self, name: &str, engine: DriverHandle) -> Result<&mut Self> {
        self.registry
            .store(name, UiFixture::Engine(engine), UiKind::Engine)?;
        Ok(self)
    }

    /// Build a page on the current engine, bind it to the current environment and store it
    pub fn add_page(
        &mut self,
        name: &str,
        build: impl FnOnce(DriverHandle) -> Page,
    ) -> Result<PageRef> {
        let env = self.environment.clone().ok_or_else(|| {
            Error::Precondition("set an environment before adding pages".to_string())
        })?;
        let engine = self.engine.clone().ok_or_else(|| {
            Error::Precondition("set an engine before adding pages".to_string())
        })?;

        let mut page = build(engine);
        page.set_domain(env.domain());
        if !page.has_timeout() {
            page.set_timeout(self.page_timeout);
        }
        if !page.has_frequency() {
            page.set_frequency(self.poll.frequency());
        }

        let page: PageRef = Arc::new(RwLock::new(page));
        self.registry
            .store(name, UiFixture::Page(page.clone()), UiKind::Page)?;
        Ok(page)
    }

    /// Make a stored, non-current environment current and rebind every page's domain
    pub fn switch_environment(&mut self, env: &Arc<Environment>) -> Result<&mut Self> {
        if !self.environments().iter().any(|e| Arc::ptr_eq(e, env)) {
            return Err(Error::not_found("Environment", env.kind()));
        }

        info!("Switching {} to environment {} ({})", self.site, env.kind(), env.domain());
        self.environment = Some(env.clone());
        for page in self.pages() {
            page.write().set_domain(env.domain());
        }
        Ok(self)
    }

    /// Make a stored, non-current engine current and rebind every page's driver
    pub fn switch_engine(&mut self, engine: &DriverHandle) -> Result<&mut Self> {
        if !self.engines().iter().any(|e| same_instance(e, engine)) {
            return Err(Error::not_found("Engine", engine.browser()));
        }

        info!("Switching {} to engine {}", self.site, engine.browser());
        self.engine = Some(engine.clone());
        for page in self.pages() {
            page.write().set_driver(engine.clone());
        }
        Ok(self)
    }

    pub fn pages(&self) -> Vec<PageRef> {
        self.registry
            .list(UiKind::Page, &[])
            .into_iter()
            .filter_map(|f| match f {
                UiFixture::Page(page) => Some(page),
                _ => None,
            })
            .collect()
    }

    pub fn page(&self, name: &str) -> Option<PageRef> {
        match self.registry.get(name) {
            Some(UiFixture::Page(page)) => Some(page.clone()),
            _ => None,
        }
    }

    /// Stored environments other than the current one
    pub fn environments(&self) -> Vec<Arc<Environment>> {
        let exclude: Vec<UiFixture> = self.environment.iter().cloned().map(Into::into).collect();
        self.registry
            .list(UiKind::Environment, &exclude)
            .into_iter()
            .filter_map(|f| match f {
                UiFixture::Environment(env) => Some(env),
                _ => None,
            })
            .collect()
    }

    /// Stored engines other than the current one
    pub fn engines(&self) -> Vec<DriverHandle> {
        let exclude: Vec<UiFixture> = self.engine.iter().cloned().map(Into::into).collect();
        self.registry
            .list(UiKind::Engine, &exclude)
            .into_iter()
            .filter_map(|f| match f {
                UiFixture::Engine(engine) => Some(engine),
                _ => None,
            })
            .collect()
    }

    /// Remove a stored fixture; the site entry is never removed
    pub fn destroy(&mut self, fixture: impl Into<UiFixture>) -> &mut Self {
        self.registry.destroy(&fixture.into());
        self
    }
}

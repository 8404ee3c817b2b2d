//! Testbed Web Fixtures
//!
//! A [`PageFactory`] owns the environments, browser engines and pages of one
//! site under test. Pages always follow the factory's current environment
//! and engine: switching either rewrites every stored page.
//!
//! ```text
//! PageFactory("shop")
//!   ├── environments: staging, production   (one current)
//!   ├── engines:      chrome, firefox       (one current)
//!   └── pages:        login, cart, ...      → domain + driver of the current pair
//! ```

pub mod driver;
pub mod environment;
pub mod factory;
pub mod page;

pub use driver::{DriverHandle, Locator, RecordingDriver, WebDriver};
pub use environment::Environment;
pub use factory::{PageFactory, UiFixture, UiKind, SITE_NAME};
pub use page::{Page, PageRef};

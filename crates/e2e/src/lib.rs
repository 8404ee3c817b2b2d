//! Testbed test-side helpers
//!
//! Everything a test body reaches for around the fixture factories:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Scenario::parse([...])  -> rows + ids for a case table  │
//! │  TestLog::start(name)    -> {dir}/{name}_{stamp}.log     │
//! │  Stopwatch               -> start, lap(..), elapsed(..)  │
//! │  TestResults             -> {Scenario, Actual, Expect}   │
//! │                             records, written as JSON     │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod results;
pub mod scenario;
pub mod stopwatch;
pub mod testlog;

pub use error::{E2eError, E2eResult};
pub use results::{TestRecord, TestResults};
pub use scenario::Scenario;
pub use stopwatch::{Checkpoint, Stopwatch};
pub use testlog::TestLog;

//! Per-test log files
//!
//! [`TestLog::start`] routes the current thread's `tracing` events into
//! `{dir}/{test}_{YYYYmmdd_HHMMSS}.log`, one `time : LEVEL : message` line per
//! event, until the returned handle is dropped.

use crate::{E2eError, E2eResult};
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use testbed_common::config::LoggingConfig;
use tracing::level_filters::LevelFilter;
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{reload, Registry};

/// `2026-10-18 14:03:07,512 : INFO : message`
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        write!(writer, "{} : {} : ", now, event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Active per-test log; events stop flowing to the file when dropped
pub struct TestLog {
    path: PathBuf,
    level: reload::Handle<LevelFilter, Registry>,
    _guard: DefaultGuard,
}

impl fmt::Debug for TestLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestLog").field("path", &self.path).finish()
    }
}

impl TestLog {
    /// Start logging `test` into a fresh file under `dir` at `info` level
    pub fn start(test: &str, dir: &Path) -> E2eResult<Self> {
        Self::with_level(test, dir, LevelFilter::INFO)
    }

    /// Start logging with directory and level taken from configuration
    pub fn from_config(test: &str, config: &LoggingConfig) -> E2eResult<Self> {
        let level = LevelFilter::from_str(&config.level)
            .map_err(|e| E2eError::Logging(format!("{}: {}", config.level, e)))?;
        Self::with_level(test, &config.dir, level)
    }

    fn with_level(test: &str, dir: &Path, level: LevelFilter) -> E2eResult<Self> {
        std::fs::create_dir_all(dir)?;
        let dir = dir.canonicalize()?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{}_{}.log", test, stamp));

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let (filter, handle) = reload::Layer::new(level);
        let file_layer = tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_writer(Mutex::new(file))
            .with_ansi(false);

        let subscriber = tracing_subscriber::registry().with(filter).with(file_layer);
        let guard = tracing::subscriber::set_default(subscriber);

        Ok(Self {
            path,
            level: handle,
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_level(&self, level: LevelFilter) -> E2eResult<&Self> {
        self.level
            .modify(|current| *current = level)
            .map_err(|e| E2eError::Logging(e.to_string()))?;
        Ok(self)
    }
}

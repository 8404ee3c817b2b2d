//! Connection engine boundary
//!
//! An [`EngineProvider`] turns a descriptor string into an [`Engine`]. Engines
//! hand out two kinds of connection: a high-level [`Connection`] with explicit
//! transaction control, and a [`RawConnection`] driven through a [`Cursor`].

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use testbed_common::Result;

/// Provider-specific engine options, e.g. `busy_timeout_ms`
pub type EngineOptions = BTreeMap<String, Value>;

/// One result row, columns in select order
pub type Row = Vec<Value>;

pub type EngineHandle = Arc<dyn Engine>;

pub trait EngineProvider: Send + Sync + Debug {
    fn create_engine(&self, descriptor: &str, options: &EngineOptions) -> Result<EngineHandle>;
}

pub trait Engine: Send + Sync + Debug {
    /// Descriptor this engine was created from
    fn descriptor(&self) -> &str;

    fn connect(&self) -> Result<Box<dyn Connection>>;

    fn raw_connection(&self) -> Result<Box<dyn RawConnection>>;
}

pub trait Connection: Debug {
    /// Run a statement, returning the affected row count
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize>;

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

pub trait RawConnection: Debug {
    fn cursor(&mut self) -> Result<Box<dyn Cursor>>;

    fn commit(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

pub trait Cursor: Debug {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()>;

    /// Next unread row of the last query
    fn fetchone(&mut self) -> Result<Option<Row>>;

    /// All unread rows of the last query
    fn fetchall(&mut self) -> Result<Vec<Row>>;

    /// Rows affected or returned by the last statement
    fn rowcount(&self) -> usize;
}

//! Bundled SQLite engine provider
//!
//! Handles descriptors of the `sqlite` dialect. The descriptor's database
//! part is the file path (`:memory:` for a private in-memory database);
//! credentials, host and port are ignored.

use crate::descriptor::ConnectionDescriptor;
use crate::engine::{
    Connection, Cursor, Engine, EngineHandle, EngineOptions, EngineProvider, RawConnection, Row,
};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, OpenFlags};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;
use testbed_common::{Error, Result};
use tracing::debug;

pub const DIALECT: &str = "sqlite";

const MEMORY: &str = ":memory:";

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteProvider;

impl EngineProvider for SqliteProvider {
    fn create_engine(&self, descriptor: &str, options: &EngineOptions) -> Result<EngineHandle> {
        let parsed: ConnectionDescriptor = descriptor.parse()?;
        if parsed.dialect != DIALECT {
            return Err(Error::InvalidConfig(format!(
                "sqlite provider cannot open {} databases",
                parsed.dialect
            )));
        }

        let mut engine = SqliteEngine {
            descriptor: descriptor.to_string(),
            path: PathBuf::from(&parsed.database),
            busy_timeout: None,
            read_only: false,
        };

        for (key, value) in options {
            match key.as_str() {
                "busy_timeout_ms" => {
                    let ms = value.as_u64().ok_or_else(|| {
                        Error::InvalidConfig("busy_timeout_ms must be an integer".to_string())
                    })?;
                    engine.busy_timeout = Some(Duration::from_millis(ms));
                }
                "read_only" => {
                    engine.read_only = value.as_bool().ok_or_else(|| {
                        Error::InvalidConfig("read_only must be a boolean".to_string())
                    })?;
                }
                other => {
                    return Err(Error::InvalidConfig(format!(
                        "unknown sqlite engine option: {}",
                        other
                    )))
                }
            }
        }

        debug!("Created sqlite engine for {:?}", engine.path);
        Ok(Arc::new(engine))
    }
}

#[derive(Debug)]
pub struct SqliteEngine {
    descriptor: String,
    path: PathBuf,
    busy_timeout: Option<Duration>,
    read_only: bool,
}

impl SqliteEngine {
    fn open(&self) -> Result<rusqlite::Connection> {
        let conn = if self.path.as_os_str() == MEMORY {
            rusqlite::Connection::open_in_memory()?
        } else if self.read_only {
            rusqlite::Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?
        } else {
            rusqlite::Connection::open(&self.path)?
        };

        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        Ok(conn)
    }
}

impl Engine for SqliteEngine {
    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(SqliteConnection {
            conn: Some(self.open()?),
        }))
    }

    fn raw_connection(&self) -> Result<Box<dyn RawConnection>> {
        Ok(Box::new(SqliteRawConnection {
            conn: Arc::new(Mutex::new(Some(self.open()?))),
        }))
    }
}

fn closed() -> Error {
    Error::Database("connection is closed".to_string())
}

fn close_connection(conn: Option<rusqlite::Connection>) -> Result<()> {
    match conn {
        Some(conn) => conn.close().map_err(|(_, e)| e.into()),
        None => Ok(()),
    }
}

#[derive(Debug)]
pub struct SqliteConnection {
    conn: Option<rusqlite::Connection>,
}

impl SqliteConnection {
    fn live(&self) -> Result<&rusqlite::Connection> {
        self.conn.as_ref().ok_or_else(closed)
    }
}

impl Connection for SqliteConnection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        let conn = self.live()?;
        Ok(conn.execute(sql, params_from_iter(params.iter().map(to_sql)))?)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let conn = self.live()?;
        select(conn, sql, params)
    }

    fn begin(&mut self) -> Result<()> {
        self.live()?.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.live()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.live()?.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        close_connection(self.conn.take())
    }
}

/// Cursor-style connection; statements autocommit unless the caller opens a
/// transaction explicitly
#[derive(Debug)]
pub struct SqliteRawConnection {
    conn: Arc<Mutex<Option<rusqlite::Connection>>>,
}

impl RawConnection for SqliteRawConnection {
    fn cursor(&mut self) -> Result<Box<dyn Cursor>> {
        if self.conn.lock().is_none() {
            return Err(closed());
        }
        Ok(Box::new(SqliteCursor {
            conn: Arc::downgrade(&self.conn),
            rows: VecDeque::new(),
            rowcount: 0,
        }))
    }

    fn commit(&mut self) -> Result<()> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or_else(closed)?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let conn = self.conn.lock().take();
        close_connection(conn)
    }
}

#[derive(Debug)]
pub struct SqliteCursor {
    conn: Weak<Mutex<Option<rusqlite::Connection>>>,
    rows: VecDeque<Row>,
    rowcount: usize,
}

impl Cursor for SqliteCursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        let shared = self.conn.upgrade().ok_or_else(closed)?;
        let guard = shared.lock();
        let conn = guard.as_ref().ok_or_else(closed)?;

        self.rows.clear();
        let mut stmt = conn.prepare(sql)?;
        if stmt.column_count() > 0 {
            drop(stmt);
            self.rows = select(conn, sql, params)?.into();
            self.rowcount = self.rows.len();
        } else {
            self.rowcount = stmt.execute(params_from_iter(params.iter().map(to_sql)))?;
        }
        Ok(())
    }

    fn fetchone(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }

    fn fetchall(&mut self) -> Result<Vec<Row>> {
        Ok(self.rows.drain(..).collect())
    }

    fn rowcount(&self) -> usize {
        self.rowcount
    }
}

fn select(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns = stmt.column_count();
    let rows = stmt.query_map(params_from_iter(params.iter().map(to_sql)), |row| {
        (0..columns)
            .map(|i| row.get::<_, SqlValue>(i))
            .collect::<rusqlite::Result<Vec<_>>>()
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_iter().map(from_sql).collect());
    }
    Ok(out)
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(bytes) => Value::from(bytes),
    }
}

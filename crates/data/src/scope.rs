//! Scoped connections and transactions
//!
//! Each helper hands a resource to a closure and releases it on every exit
//! path: normal return, an error from the closure, or a panic unwinding
//! through it.

use crate::engine::{Connection, Cursor, Engine, RawConnection};
use testbed_common::{Result, TransactionPolicy};
use tracing::{debug, warn};

struct RawGuard(Box<dyn RawConnection>);

impl Drop for RawGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            warn!("Failed to close raw connection: {}", e);
        }
    }
}

struct ConnectionGuard(Box<dyn Connection>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            warn!("Failed to close connection: {}", e);
        }
    }
}

/// Open a driver-level connection and cursor for the duration of `f`
pub fn with_raw_connection<T>(
    engine: &dyn Engine,
    f: impl FnOnce(&mut dyn RawConnection, &mut dyn Cursor) -> Result<T>,
) -> Result<T> {
    let mut raw = RawGuard(engine.raw_connection()?);
    let mut cursor = raw.0.cursor()?;
    debug!("Opened raw connection");
    f(raw.0.as_mut(), cursor.as_mut())
}

/// Open a connection for the duration of `f`
pub fn with_connection<T>(
    engine: &dyn Engine,
    f: impl FnOnce(&mut dyn Connection) -> Result<T>,
) -> Result<T> {
    let mut conn = ConnectionGuard(engine.connect()?);
    debug!("Opened connection");
    f(conn.0.as_mut())
}

struct TransactionGuard<'a> {
    conn: &'a mut dyn Connection,
    finished: bool,
}

impl TransactionGuard<'_> {
    fn rollback(&mut self) {
        self.finished = true;
        if let Err(e) = self.conn.rollback() {
            warn!("Rollback failed: {}", e);
        }
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Rolling back abandoned transaction");
            self.rollback();
        }
    }
}

/// Run `f` inside a transaction on `conn`
///
/// Success commits and yields `Some`. Any failure rolls back exactly once.
/// A database failure is then returned under [`TransactionPolicy::Propagate`]
/// or logged and turned into `Ok(None)` under [`TransactionPolicy::Report`].
/// Other failures are always returned.
pub fn with_transaction<T>(
    conn: &mut dyn Connection,
    policy: TransactionPolicy,
    f: impl FnOnce(&mut dyn Connection) -> Result<T>,
) -> Result<Option<T>> {
    conn.begin()?;
    let mut guard = TransactionGuard {
        conn,
        finished: false,
    };

    let outcome = f(&mut *guard.conn).and_then(|value| {
        guard.conn.commit()?;
        Ok(value)
    });

    match outcome {
        Ok(value) => {
            guard.finished = true;
            Ok(Some(value))
        }
        Err(err) => {
            guard.rollback();
            warn!("Caught error and rolled back transaction: {}", err);
            if err.is_database() && policy == TransactionPolicy::Report {
                Ok(None)
            } else {
                Err(err)
            }
        }
    }
}

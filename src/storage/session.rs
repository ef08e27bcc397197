//! Scoped database sessions
//!
//! Every unit of work runs inside `Database::with_session`: the connection is
//! locked, a transaction is opened, and it is committed only when the work
//! returns `Ok`. Errors and panics drop the transaction uncommitted, which
//! rolls it back, and the lock is released on every exit path.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use log::{error, info};
use rusqlite::Connection;

use crate::error::{ExpenseError, ExpenseResult};

use super::init::initialize_schema;

/// Owner of the single SQLite connection used by the repository
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> ExpenseResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ExpenseError::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            error!(
                "event=db_open module=storage status=error path={} error={}",
                path.display(),
                e
            );
            ExpenseError::Storage(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let db = Self::from_connection(conn)?;
        info!(
            "event=db_open module=storage status=ok path={}",
            path.display()
        );
        Ok(db)
    }

    /// Open a throwaway in-memory database (useful for testing)
    pub fn open_in_memory() -> ExpenseResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> ExpenseResult<Self> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `work` inside a transaction, committing only on success
    pub fn with_session<T, F>(&self, work: F) -> ExpenseResult<T>
    where
        F: FnOnce(&Connection) -> ExpenseResult<T>,
    {
        let mut conn = self.conn.lock().map_err(|e| {
            ExpenseError::Storage(format!("Failed to acquire connection lock: {}", e))
        })?;

        let tx = conn.transaction()?;
        let value = work(&*tx)?;
        tx.commit()?;

        Ok(value)
    }
}

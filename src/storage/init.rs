//! Storage initialization
//!
//! Creates the expense table on first use. Safe to run on every open.

use rusqlite::Connection;

use crate::error::ExpenseResult;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS expenses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT    NOT NULL CHECK (length(description) BETWEEN 1 AND 100),
    category    TEXT             CHECK (category IS NULL OR length(category) <= 50),
    amount      REAL    NOT NULL CHECK (amount > 0),
    date        TEXT    NOT NULL,
    notes       TEXT             CHECK (notes IS NULL OR length(notes) <= 200)
);
CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses (category);
CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses (date);
";

/// Initialize the expense schema on a fresh or existing database
pub fn initialize_schema(conn: &Connection) -> ExpenseResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

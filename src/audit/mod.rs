//! Audit logging for expense changes
//!
//! Records every create, update, delete and bulk import in an append-only
//! audit log, one JSON object per line.
//!
//! - `AuditEntry`: a single entry with timestamp, operation and the expense
//!   before and/or after the change.
//! - `AuditLogger`: appends entries to the log file and reads them back.
//! - `expense_diff`: summarises the fields an update touched.

mod diff;
mod entry;
mod logger;

pub use diff::expense_diff;
pub use entry::{AuditEntry, Operation};
pub use logger::AuditLogger;

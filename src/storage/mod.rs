//! Storage layer for the expense tracker
//!
//! Provides the repository contract for expense records and its embedded
//! SQLite implementation, with scoped transactional sessions.

pub mod init;
pub mod repository;
pub mod session;
pub mod sqlite;

pub use init::initialize_schema;
pub use repository::{CategorySummary, ExpenseRepository};
pub use session::Database;
pub use sqlite::SqliteExpenseRepository;

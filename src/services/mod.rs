//! Service layer for the expense tracker
//!
//! Business logic on top of the repository: CSV import/export and the
//! expense operations used by the command layer.

pub mod csv_service;
pub mod expense;

pub use csv_service::{CsvService, ImportColumns};
pub use expense::{ExpenseService, UpdateExpenseInput};

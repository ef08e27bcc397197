//! Expense Tracker - personal expense tracking from the command line
//!
//! This library provides the core functionality for the `expense` binary:
//! recording expenses in an embedded SQLite database, summarizing them by
//! category or calendar month, and moving them in and out of CSV files.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and user settings
//! - `error`: Custom error types
//! - `logging`: Diagnostic log bootstrap
//! - `models`: The expense record and its field rules
//! - `storage`: Repository contract and its SQLite implementation
//! - `services`: CSV transformation and expense business logic
//! - `audit`: Append-only audit log of changes
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use expense_tracker::services::{CsvService, ExpenseService};
//! use expense_tracker::storage::SqliteExpenseRepository;
//!
//! let repository = SqliteExpenseRepository::open("expenses.db")?;
//! let service = ExpenseService::new(&repository, CsvService::new());
//! service.add("Coffee", 3.5, Some("food"), None)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{ExpenseError, ExpenseResult};

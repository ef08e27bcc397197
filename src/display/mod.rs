//! Display formatting for terminal output
//!
//! Provides utilities for formatting expenses, summaries and audit history
//! for terminal display.

pub mod expense;

pub use expense::{
    format_amount, format_audit_entries, format_category_summary, format_expense_details,
    format_expense_table, format_monthly_summary, sort_newest_first,
};

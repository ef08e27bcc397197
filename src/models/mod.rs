//! Core data models for the expense tracker
//!
//! This module contains the data structures that represent the expense
//! domain and the rules they enforce.

pub mod expense;

pub use expense::{
    normalize_category, Expense, ExpenseId, ExpenseValidationError, MAX_CATEGORY_LEN,
    MAX_DESCRIPTION_LEN, MAX_NOTES_LEN,
};

//! Expense repository contract
//!
//! Defines the operations every storage backend must provide, plus the
//! boundary checks they all share.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Expense, ExpenseId};

/// Total and entry count for a (possibly filtered) set of expenses
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategorySummary {
    pub total: f64,
    pub count: usize,
}

/// Persistence contract for expense records
///
/// Absence is a normal result: `get` returns `None` and `update` on an
/// unknown id succeeds without touching storage. Category arguments are
/// normalized before filtering, so lookups are case-insensitive.
pub trait ExpenseRepository {
    /// Fetch one expense by id
    fn get(&self, id: ExpenseId) -> ExpenseResult<Option<Expense>>;

    /// Persist a new expense and return its assigned id
    fn add(&self, expense: &Expense) -> ExpenseResult<ExpenseId>;

    /// Persist many expenses as one unit, returning how many were stored
    fn bulk_import(&self, expenses: &[Expense]) -> ExpenseResult<usize>;

    /// Hard-delete a previously persisted expense
    fn delete(&self, expense: &Expense) -> ExpenseResult<()>;

    /// Overwrite the stored record with the same id, field by field.
    /// A non-positive amount keeps the stored amount.
    fn update(&self, expense: &Expense) -> ExpenseResult<()>;

    /// List expenses in storage order, optionally filtered by category
    fn list(&self, category: Option<&str>) -> ExpenseResult<Vec<Expense>>;

    /// Sum and count expenses, optionally filtered by category
    fn category_summary(&self, category: Option<&str>) -> ExpenseResult<CategorySummary>;

    /// Expenses dated within the given calendar month
    fn monthly_summary(&self, month: u32, year: i32) -> ExpenseResult<Vec<Expense>>;
}

/// Reject identifiers that can never name a stored row
pub fn validate_expense_id(id: ExpenseId) -> ExpenseResult<()> {
    if id < 1 {
        return Err(ExpenseError::InvalidArgument(format!(
            "Expense ID must be greater than 0, got {}",
            id
        )));
    }
    Ok(())
}

/// Reject records that would violate the stored-row constraints
pub fn ensure_well_formed(expense: &Expense) -> ExpenseResult<()> {
    expense
        .validate()
        .map_err(|e| ExpenseError::TypeMismatch(e.to_string()))
}

/// Like `ensure_well_formed`, but a non-positive amount is allowed since
/// updates treat it as "keep the stored amount"
pub fn ensure_updatable(expense: &Expense) -> ExpenseResult<()> {
    expense
        .validate_text_fields()
        .map_err(|e| ExpenseError::TypeMismatch(e.to_string()))
}

/// Return the id of a record that must already be persisted
pub fn ensure_persisted(expense: &Expense) -> ExpenseResult<ExpenseId> {
    let id = expense.id.ok_or_else(|| {
        ExpenseError::TypeMismatch(format!("Expense '{}' has not been saved", expense))
    })?;
    validate_expense_id(id)?;
    Ok(id)
}

/// Half-open `[start, end)` bounds of a calendar month
pub fn month_bounds(month: u32, year: i32) -> ExpenseResult<(NaiveDateTime, NaiveDateTime)> {
    if !(1..=12).contains(&month) {
        return Err(ExpenseError::InvalidArgument(format!(
            "Month must be between 1 and 12, got {}",
            month
        )));
    }

    let invalid_year = || ExpenseError::InvalidArgument(format!("Year {} is out of range", year));

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid_year)?;
    let end = if month == 12 {
        year.checked_add(1)
            .and_then(|next_year| NaiveDate::from_ymd_opt(next_year, 1, 1))
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid_year)?;

    let start = start.and_hms_opt(0, 0, 0).ok_or_else(invalid_year)?;
    let end = end.and_hms_opt(0, 0, 0).ok_or_else(invalid_year)?;
    Ok((start, end))
}

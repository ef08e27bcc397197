//! Expense service
//!
//! Business logic used by the command layer: argument checks, partial
//! updates, delete-by-id, bulk import from CSV, and audit recording.

use std::path::Path;

use chrono::{Datelike, Local};
use log::{info, warn};

use crate::audit::{AuditEntry, AuditLogger};
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Expense, ExpenseId};
use crate::storage::{CategorySummary, ExpenseRepository};

use super::csv_service::CsvService;

/// Input for a partial update
///
/// Blank text fields and non-positive amounts leave the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl UpdateExpenseInput {
    /// Whether any field would change a stored expense
    pub fn is_empty(&self) -> bool {
        non_blank(&self.description).is_none()
            && non_blank(&self.category).is_none()
            && non_blank(&self.notes).is_none()
            && !self.amount.is_some_and(|a| a > 0.0)
    }
}

/// Service for expense management
pub struct ExpenseService<'a> {
    repository: &'a dyn ExpenseRepository,
    csv: CsvService,
    audit: Option<&'a AuditLogger>,
}

impl<'a> ExpenseService<'a> {
    /// Create a new expense service without an audit log
    pub fn new(repository: &'a dyn ExpenseRepository, csv: CsvService) -> Self {
        Self {
            repository,
            csv,
            audit: None,
        }
    }

    /// Record every change in `audit`
    pub fn with_audit(mut self, audit: &'a AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// CSV collaborator used for import and export
    pub fn csv(&self) -> &CsvService {
        &self.csv
    }

    /// Record a new expense dated now
    pub fn add(
        &self,
        description: &str,
        amount: f64,
        category: Option<&str>,
        notes: Option<&str>,
    ) -> ExpenseResult<Expense> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ExpenseError::InvalidArgument(format!(
                "Amount must be greater than 0, got {}",
                amount
            )));
        }

        let mut expense = Expense::new(description.trim(), amount);
        if let Some(category) = category {
            expense = expense.with_category(category.trim());
        }
        if let Some(notes) = notes {
            expense = expense.with_notes(notes.trim());
        }

        expense
            .validate()
            .map_err(|e| ExpenseError::InvalidArgument(e.to_string()))?;

        let id = self.repository.add(&expense)?;
        let stored = Expense {
            id: Some(id),
            ..expense.normalized()
        };

        info!("event=expense_add module=service status=ok id={}", id);
        self.record(AuditEntry::create(&stored));

        Ok(stored)
    }

    /// Get an expense by ID, failing when it does not exist
    pub fn get(&self, id: ExpenseId) -> ExpenseResult<Expense> {
        self.repository
            .get(id)?
            .ok_or_else(|| ExpenseError::expense_not_found(id))
    }

    /// Apply the supplied fields of `input` to an existing expense
    pub fn update(&self, id: ExpenseId, input: UpdateExpenseInput) -> ExpenseResult<Expense> {
        let before = self.get(id)?;
        let mut after = before.clone();

        if let Some(description) = non_blank(&input.description) {
            after.description = description.to_string();
        }
        if let Some(amount) = input.amount.filter(|a| *a > 0.0) {
            after.amount = amount;
        }
        if let Some(category) = non_blank(&input.category) {
            after.category = Some(category.to_string());
        }
        if let Some(notes) = non_blank(&input.notes) {
            after.notes = Some(notes.to_string());
        }

        after
            .validate()
            .map_err(|e| ExpenseError::InvalidArgument(e.to_string()))?;

        self.repository.update(&after)?;
        let after = after.normalized();

        info!("event=expense_update module=service status=ok id={}", id);
        self.record(AuditEntry::update(&before, &after));

        Ok(after)
    }

    /// Delete an expense by ID, returning the removed record
    pub fn delete(&self, id: ExpenseId) -> ExpenseResult<Expense> {
        let expense = self.get(id)?;
        self.repository.delete(&expense)?;

        info!("event=expense_delete module=service status=ok id={}", id);
        self.record(AuditEntry::delete(&expense));

        Ok(expense)
    }

    /// Import every valid row of a CSV file, returning how many were stored
    pub fn bulk_import(&self, file: &Path) -> ExpenseResult<usize> {
        let expenses = self.csv.import_expenses(file)?;
        let count = self.repository.bulk_import(&expenses)?;

        info!(
            "event=expense_bulk_import module=service status=ok file={} count={}",
            file.display(),
            count
        );
        self.record(AuditEntry::import(file.display().to_string(), count));

        Ok(count)
    }

    pub fn list(&self, category: Option<&str>) -> ExpenseResult<Vec<Expense>> {
        self.repository.list(category)
    }

    pub fn category_summary(&self, category: Option<&str>) -> ExpenseResult<CategorySummary> {
        self.repository.category_summary(category)
    }

    pub fn monthly_summary(&self, month: u32, year: i32) -> ExpenseResult<Vec<Expense>> {
        self.repository.monthly_summary(month, year)
    }

    /// Sum of the amounts in `expenses`
    pub fn monthly_total(expenses: &[Expense]) -> f64 {
        expenses.iter().map(|e| e.amount).sum()
    }

    /// The current local year, used when a month is given without one
    pub fn current_year() -> i32 {
        Local::now().year()
    }

    fn record(&self, entry: AuditEntry) {
        let Some(audit) = self.audit else {
            return;
        };
        if let Err(e) = audit.log(&entry) {
            warn!(
                "event=audit_write module=service status=error operation={} error={}",
                entry.operation, e
            );
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

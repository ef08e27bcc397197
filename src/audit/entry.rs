//! Audit entry data structures
//!
//! Defines the operation kinds and the entry format written to the audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Expense, ExpenseId};

use super::diff::expense_diff;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Expense was recorded
    Create,
    /// Expense was changed
    Update,
    /// Expense was removed
    Delete,
    /// A batch of expenses was loaded from a file
    Import,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Import => write!(f, "IMPORT"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Type of operation performed
    pub operation: Operation,

    /// ID of the affected expense (absent for imports)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_id: Option<ExpenseId>,

    /// Description of the affected expense, or the import source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Expense before the operation (updates and deletes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Expense>,

    /// Expense after the operation (creates and updates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Expense>,

    /// Human-readable diff summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,

    /// Number of records written by an import
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
}

impl AuditEntry {
    fn blank(operation: Operation) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            expense_id: None,
            label: None,
            before: None,
            after: None,
            diff_summary: None,
            record_count: None,
        }
    }

    /// Entry for a newly stored expense
    pub fn create(expense: &Expense) -> Self {
        Self {
            expense_id: expense.id,
            label: Some(expense.description.clone()),
            after: Some(expense.clone()),
            ..Self::blank(Operation::Create)
        }
    }

    /// Entry for a changed expense, with a diff of the touched fields
    pub fn update(before: &Expense, after: &Expense) -> Self {
        Self {
            expense_id: after.id.or(before.id),
            label: Some(after.description.clone()),
            diff_summary: expense_diff(before, after),
            before: Some(before.clone()),
            after: Some(after.clone()),
            ..Self::blank(Operation::Update)
        }
    }

    /// Entry for a removed expense
    pub fn delete(expense: &Expense) -> Self {
        Self {
            expense_id: expense.id,
            label: Some(expense.description.clone()),
            before: Some(expense.clone()),
            ..Self::blank(Operation::Delete)
        }
    }

    /// Entry for a bulk import from `source`
    pub fn import(source: impl Into<String>, record_count: usize) -> Self {
        Self {
            label: Some(source.into()),
            record_count: Some(record_count),
            ..Self::blank(Operation::Import)
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation
        );

        if let Some(id) = self.expense_id {
            output.push_str(&format!(" #{}", id));
        }

        if let Some(label) = &self.label {
            output.push_str(&format!(" ({})", label));
        }

        if let Some(count) = self.record_count {
            output.push_str(&format!(" {} records", count));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}

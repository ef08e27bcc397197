//! Diff generation for audit logging
//!
//! Summarises which expense fields an update touched.

use crate::models::Expense;

/// Generate a human-readable diff between two versions of an expense
///
/// Returns `None` when nothing changed.
pub fn expense_diff(before: &Expense, after: &Expense) -> Option<String> {
    let mut changes = Vec::new();

    if before.description != after.description {
        changes.push(format!(
            "description: {} -> {}",
            format_text(&before.description),
            format_text(&after.description)
        ));
    }

    if before.category != after.category {
        changes.push(format!(
            "category: {} -> {}",
            format_optional(before.category.as_deref()),
            format_optional(after.category.as_deref())
        ));
    }

    if before.amount != after.amount {
        changes.push(format!(
            "amount: {:.2} -> {:.2}",
            before.amount, after.amount
        ));
    }

    if before.date != after.date {
        changes.push(format!(
            "date: {} -> {}",
            before.date.format("%Y-%m-%d %H:%M:%S"),
            after.date.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    if before.notes != after.notes {
        changes.push(format!(
            "notes: {} -> {}",
            format_optional(before.notes.as_deref()),
            format_optional(after.notes.as_deref())
        ));
    }

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn format_optional(value: Option<&str>) -> String {
    value.map(format_text).unwrap_or_else(|| "(none)".to_string())
}

/// Quote a value, truncating long strings
fn format_text(value: &str) -> String {
    if value.chars().count() > 50 {
        let head: String = value.chars().take(47).collect();
        format!("\"{}...\"", head)
    } else {
        format!("\"{}\"", value)
    }
}

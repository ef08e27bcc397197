//! Expense display formatting
//!
//! Renders expenses as terminal tables and summaries.

use chrono::NaiveDate;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use crate::audit::AuditEntry;
use crate::models::Expense;
use crate::storage::CategorySummary;

/// One table row per expense
#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

impl ExpenseRow {
    fn new(expense: &Expense, currency: &str) -> Self {
        Self {
            id: expense.id.map(|id| id.to_string()).unwrap_or_default(),
            date: expense.date.format("%Y-%m-%d").to_string(),
            description: truncate(&expense.description, 40),
            category: expense.category.clone().unwrap_or_else(|| "-".into()),
            amount: format_amount(expense.amount, currency),
            notes: truncate(expense.notes.as_deref().unwrap_or(""), 30),
        }
    }
}

/// Format an amount with the currency symbol and two decimals
pub fn format_amount(amount: f64, currency: &str) -> String {
    format!("{}{:.2}", currency, amount)
}

/// Order expenses newest first (ties broken by highest id)
pub fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
}

/// Format expenses as a table, in the order given
pub fn format_expense_table(expenses: &[Expense], currency: &str) -> String {
    if expenses.is_empty() {
        return "No expenses found\n".to_string();
    }

    let rows: Vec<ExpenseRow> = expenses
        .iter()
        .map(|e| ExpenseRow::new(e, currency))
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .modify(Columns::single(4), Alignment::right());

    format!("{}\n", table)
}

/// Format a single expense for display after it was added or changed
pub fn format_expense_details(expense: &Expense, currency: &str) -> String {
    let mut output = String::new();

    if let Some(id) = expense.id {
        output.push_str(&format!("Expense:     #{}\n", id));
    }
    output.push_str(&format!("Description: {}\n", expense.description));
    output.push_str(&format!(
        "Amount:      {}\n",
        format_amount(expense.amount, currency)
    ));
    output.push_str(&format!(
        "Category:    {}\n",
        expense.category.as_deref().unwrap_or("(none)")
    ));
    output.push_str(&format!(
        "Date:        {}\n",
        expense.date.format("%Y-%m-%d %H:%M")
    ));
    if let Some(notes) = &expense.notes {
        output.push_str(&format!("Notes:       {}\n", notes));
    }

    output
}

/// Format a category summary
pub fn format_category_summary(
    category: Option<&str>,
    summary: &CategorySummary,
    currency: &str,
) -> String {
    let label = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("All categories");

    format!(
        "Summary for {}\n  Entries: {}\n  Total:   {}\n",
        label,
        summary.count,
        format_amount(summary.total, currency)
    )
}

/// Format a month's expenses with a heading and total line
pub fn format_monthly_summary(
    month: u32,
    year: i32,
    expenses: &[Expense],
    total: f64,
    currency: &str,
) -> String {
    let mut output = format!("Expenses for {}\n", month_label(month, year));
    output.push_str(&format_expense_table(expenses, currency));
    output.push_str(&format!("Total: {}\n", format_amount(total, currency)));
    output
}

/// Format audit entries, oldest first
pub fn format_audit_entries(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return "No history recorded\n".to_string();
    }

    let mut output = String::new();
    for entry in entries {
        output.push_str(&entry.format_human_readable());
        output.push('\n');
    }
    output
}

fn month_label(month: u32, year: i32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{:02}/{}", month, year))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

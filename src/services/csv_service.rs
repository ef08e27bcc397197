//! CSV transformation service
//!
//! Maps expenses to and from flat CSV files. All three export flavours share
//! the same directory and filename defaulting, and the column layouts below
//! are the on-disk contract.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use csv::{Reader, ReaderBuilder, StringRecord, Trim, Writer};
use log::{info, warn};

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::Expense;

/// Columns of a full expense export
pub const EXPENSE_HEADERS: [&str; 6] = ["ID", "Description", "Category", "Amount", "Date", "Notes"];

/// Columns of a category summary export
pub const SUMMARY_HEADERS: [&str; 4] = ["Category", "Total", "Entries", "Exported On"];

/// Columns of a monthly summary export
pub const MONTHLY_HEADERS: [&str; 5] = ["ID", "Description", "Category", "Amount", "Date"];

/// Timestamp used in generated filenames (sortable)
const FILE_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d";
const EXPORTED_ON_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Positions of the recognised columns in an import file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportColumns {
    pub description: usize,
    pub amount: usize,
    pub category: Option<usize>,
    pub notes: Option<usize>,
}

impl ImportColumns {
    /// Locate columns by case-insensitive header name
    ///
    /// Fails with `MalformedInput` naming every missing required column.
    pub fn from_headers(headers: &StringRecord) -> ExpenseResult<Self> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            positions
                .entry(header.trim().to_lowercase())
                .or_insert(idx);
        }

        let missing: Vec<&str> = ["description", "amount"]
            .into_iter()
            .filter(|name| !positions.contains_key(*name))
            .collect();

        if !missing.is_empty() {
            return Err(ExpenseError::MalformedInput(format!(
                "File must contain required columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            description: positions["description"],
            amount: positions["amount"],
            category: positions.get("category").copied(),
            notes: positions.get("notes").copied(),
        })
    }
}

/// Service for CSV import and export
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvService;

impl CsvService {
    /// Create a new CSV service
    pub fn new() -> Self {
        Self
    }

    /// Export expenses, one row each, returning the written path
    pub fn export_expenses(
        &self,
        expenses: &[Expense],
        directory: &Path,
        filename: Option<&str>,
    ) -> ExpenseResult<PathBuf> {
        let path = resolve_export_path(directory, filename, || {
            format!("expenses_{}", file_timestamp())
        })?;

        let mut writer = Writer::from_path(&path)?;
        writer.write_record(EXPENSE_HEADERS)?;

        for expense in expenses {
            writer.write_record([
                format_id(expense),
                expense.description.clone(),
                expense.category.clone().unwrap_or_default(),
                format_amount(expense.amount),
                expense.date.format(EXPORT_DATE_FORMAT).to_string(),
                expense.notes.clone().unwrap_or_default(),
            ])?;
        }

        writer.flush()?;
        info!(
            "event=csv_export module=csv status=ok kind=expenses rows={} path={}",
            expenses.len(),
            path.display()
        );
        Ok(path)
    }

    /// Export a single summary row, returning the written path
    pub fn export_summary(
        &self,
        category: Option<&str>,
        total: f64,
        count: usize,
        directory: &Path,
        filename: Option<&str>,
        exported_on: Option<NaiveDateTime>,
    ) -> ExpenseResult<PathBuf> {
        let path = resolve_export_path(directory, filename, || {
            format!("summary_{}", file_timestamp())
        })?;

        let exported_on = exported_on.unwrap_or_else(|| Local::now().naive_local());
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("All");

        let mut writer = Writer::from_path(&path)?;
        writer.write_record(SUMMARY_HEADERS)?;
        writer.write_record([
            category.to_string(),
            format_amount(total),
            count.to_string(),
            exported_on.format(EXPORTED_ON_FORMAT).to_string(),
        ])?;

        writer.flush()?;
        info!(
            "event=csv_export module=csv status=ok kind=summary path={}",
            path.display()
        );
        Ok(path)
    }

    /// Export a month's expenses followed by a trailing "Total" row
    pub fn export_monthly_summary(
        &self,
        expenses: &[Expense],
        total: f64,
        year: i32,
        month: u32,
        directory: &Path,
        filename: Option<&str>,
    ) -> ExpenseResult<PathBuf> {
        let path = resolve_export_path(directory, filename, || {
            format!("monthly_{}_{:02}_{}", year, month, file_timestamp())
        })?;

        let mut writer = Writer::from_path(&path)?;
        writer.write_record(MONTHLY_HEADERS)?;

        for expense in expenses {
            writer.write_record([
                format_id(expense),
                expense.description.clone(),
                expense.category.clone().unwrap_or_default(),
                format_amount(expense.amount),
                expense.date.format(EXPORT_DATE_FORMAT).to_string(),
            ])?;
        }

        writer.write_record([
            String::new(),
            "Total".to_string(),
            String::new(),
            format_amount(total),
            String::new(),
        ])?;

        writer.flush()?;
        info!(
            "event=csv_export module=csv status=ok kind=monthly rows={} path={}",
            expenses.len() + 1,
            path.display()
        );
        Ok(path)
    }

    /// Read expenses from a CSV file
    ///
    /// Every imported record is stamped with the import time. Rows that do not
    /// form a valid expense are skipped with a warning.
    pub fn import_expenses(&self, file: &Path) -> ExpenseResult<Vec<Expense>> {
        if !file.exists() {
            return Err(ExpenseError::file_not_found(format!(
                "Could not locate file at {}",
                file.display()
            )));
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::Headers)
            .from_path(file)?;

        let imported_at = Local::now().naive_local();
        let parsed = self.parse_csv_from_reader(&mut reader, imported_at)?;

        let mut expenses = Vec::with_capacity(parsed.len());
        let mut skipped = 0;
        for (idx, result) in parsed.into_iter().enumerate() {
            match result {
                Ok(expense) => expenses.push(expense),
                Err(reason) => {
                    skipped += 1;
                    warn!(
                        "event=csv_import_row module=csv status=skipped file={} row={} reason={}",
                        file.display(),
                        idx + 1,
                        reason
                    );
                }
            }
        }

        info!(
            "event=csv_import module=csv status=ok file={} imported={} skipped={}",
            file.display(),
            expenses.len(),
            skipped
        );
        Ok(expenses)
    }

    /// Parse every data row of a CSV reader into an expense or a reason
    pub fn parse_csv_from_reader<R: Read>(
        &self,
        reader: &mut Reader<R>,
        imported_at: NaiveDateTime,
    ) -> ExpenseResult<Vec<Result<Expense, String>>> {
        let columns = ImportColumns::from_headers(reader.headers()?)?;

        let mut results = Vec::new();
        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    results.push(Err(format!("Error reading CSV record: {}", e)));
                    continue;
                }
            };
            results.push(parse_record(&record, &columns, imported_at));
        }
        Ok(results)
    }
}

/// Build one expense from a CSV record
fn parse_record(
    record: &StringRecord,
    columns: &ImportColumns,
    imported_at: NaiveDateTime,
) -> Result<Expense, String> {
    // Cells keep their whitespace; only blankness is judged on trimmed text
    let description = record.get(columns.description).unwrap_or("");
    let amount = parse_amount(record.get(columns.amount).unwrap_or(""))?;

    let mut expense = Expense::new(description, amount).with_date(imported_at);
    if let Some(category) = columns.category.and_then(|col| record.get(col)) {
        expense = expense.with_category(category);
    }
    if let Some(notes) = columns.notes.and_then(|col| record.get(col)) {
        expense = expense.with_notes(notes);
    }

    expense.validate().map_err(|e| e.to_string())?;
    Ok(expense)
}

/// Coerce an amount cell to a float; blank cells count as zero
fn parse_amount(cell: &str) -> Result<f64, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.parse::<f64>()
        .map_err(|e| format!("Could not parse amount '{}': {}", cell, e))
}

fn resolve_export_path(
    directory: &Path,
    filename: Option<&str>,
    default_stem: impl FnOnce() -> String,
) -> ExpenseResult<PathBuf> {
    fs::create_dir_all(directory).map_err(|e| {
        ExpenseError::Export(format!(
            "Failed to create directory {}: {}",
            directory.display(),
            e
        ))
    })?;

    let stem = match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) => name.to_string(),
        None => default_stem(),
    };

    Ok(directory.join(format!("{}.csv", stem)))
}

fn file_timestamp() -> String {
    Local::now().format(FILE_TIMESTAMP_FORMAT).to_string()
}

fn format_id(expense: &Expense) -> String {
    expense.id.map(|id| id.to_string()).unwrap_or_default()
}

/// Shortest text that parses back to the same float
fn format_amount(amount: f64) -> String {
    amount.to_string()
}

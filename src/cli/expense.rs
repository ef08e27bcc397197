//! Expense CLI commands
//!
//! Implements the expense subcommands on top of `ExpenseService`.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::config::Settings;
use crate::display::{
    format_category_summary, format_expense_details, format_expense_table,
    format_monthly_summary, sort_newest_first,
};
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::ExpenseId;
use crate::services::{ExpenseService, UpdateExpenseInput};

/// Options shared by the commands that can write a CSV file
#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Also export the result to CSV
    #[arg(short, long)]
    pub export: bool,
    /// Directory for the CSV file (defaults to the configured export dir)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,
    /// File name without extension (defaults to a timestamped name)
    #[arg(short, long)]
    pub filename: Option<String>,
}

/// Expense subcommands
#[derive(Subcommand, Debug)]
pub enum ExpenseCommands {
    /// Record a new expense
    Add {
        /// What the money was spent on
        description: String,
        /// Amount spent (must be greater than 0)
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Category name
        #[arg(short, long)]
        category: Option<String>,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Import expenses from a CSV file
    Bulk {
        /// CSV file with at least Description and Amount columns
        file: PathBuf,
    },
    /// Delete an expense
    Delete {
        /// Expense ID
        id: ExpenseId,
    },
    /// Change fields of an existing expense
    Update {
        /// Expense ID
        id: ExpenseId,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New amount (ignored unless greater than 0)
        #[arg(short, long, allow_negative_numbers = true)]
        amount: Option<f64>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List expenses, newest first
    List {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Show total and count of expenses
    Summary {
        /// Only summarize this category
        #[arg(short, long)]
        category: Option<String>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Show the expenses of one month
    Month {
        /// Month number (1-12)
        #[arg(value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
        /// Year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
        #[command(flatten)]
        export: ExportArgs,
    },
}

/// Handle an expense command
pub fn handle_expense_command(
    service: &ExpenseService<'_>,
    settings: &Settings,
    cmd: ExpenseCommands,
) -> ExpenseResult<()> {
    let currency = settings.currency_symbol.as_str();

    match cmd {
        ExpenseCommands::Add {
            description,
            amount,
            category,
            notes,
        } => {
            let expense =
                service.add(&description, amount, category.as_deref(), notes.as_deref())?;
            println!("Added expense");
            print!("{}", format_expense_details(&expense, currency));
        }

        ExpenseCommands::Bulk { file } => {
            let count = service.bulk_import(&file)?;
            println!("Imported {} expenses from {}", count, file.display());
        }

        ExpenseCommands::Delete { id } => {
            let expense = service.delete(id)?;
            println!("Deleted expense #{} ({})", id, expense.description);
        }

        ExpenseCommands::Update {
            id,
            description,
            amount,
            category,
            notes,
        } => {
            let input = UpdateExpenseInput {
                description,
                amount,
                category,
                notes,
            };
            if input.is_empty() {
                let expense = service.get(id)?;
                println!("Nothing to change for expense #{}", id);
                print!("{}", format_expense_details(&expense, currency));
                return Ok(());
            }
            let expense = service.update(id, input)?;
            println!("Updated expense");
            print!("{}", format_expense_details(&expense, currency));
        }

        ExpenseCommands::List { category, export } => {
            let mut expenses = service.list(category.as_deref())?;
            sort_newest_first(&mut expenses);
            print!("{}", format_expense_table(&expenses, currency));

            if export.export {
                let directory = resolve_export_dir(export.directory.as_deref(), settings)?;
                let path = service.csv().export_expenses(
                    &expenses,
                    &directory,
                    export.filename.as_deref(),
                )?;
                println!("Exported to {}", path.display());
            }
        }

        ExpenseCommands::Summary { category, export } => {
            let summary = service.category_summary(category.as_deref())?;
            print!(
                "{}",
                format_category_summary(category.as_deref(), &summary, currency)
            );

            if export.export {
                let directory = resolve_export_dir(export.directory.as_deref(), settings)?;
                let path = service.csv().export_summary(
                    category.as_deref(),
                    summary.total,
                    summary.count,
                    &directory,
                    export.filename.as_deref(),
                    None,
                )?;
                println!("Exported to {}", path.display());
            }
        }

        ExpenseCommands::Month {
            month,
            year,
            export,
        } => {
            let year = year.unwrap_or_else(ExpenseService::current_year);
            let expenses = service.monthly_summary(month, year)?;
            let total = ExpenseService::monthly_total(&expenses);
            print!(
                "{}",
                format_monthly_summary(month, year, &expenses, total, currency)
            );

            if export.export {
                let directory = resolve_export_dir(export.directory.as_deref(), settings)?;
                let path = service.csv().export_monthly_summary(
                    &expenses,
                    total,
                    year,
                    month,
                    &directory,
                    export.filename.as_deref(),
                )?;
                println!("Exported to {}", path.display());
            }
        }
    }

    Ok(())
}

/// Pick the export directory: explicit flag, then settings, then the cwd
pub fn resolve_export_dir(directory: Option<&Path>, settings: &Settings) -> ExpenseResult<PathBuf> {
    if let Some(directory) = directory {
        return Ok(directory.to_path_buf());
    }
    if let Some(directory) = &settings.export_dir {
        return Ok(directory.clone());
    }
    std::env::current_dir().map_err(|e| {
        ExpenseError::Export(format!("Could not determine current directory: {}", e))
    })
}

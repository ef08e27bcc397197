use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use expense_tracker::audit::AuditLogger;
use expense_tracker::cli::{handle_expense_command, ExpenseCommands};
use expense_tracker::config::{ExpensePaths, Settings};
use expense_tracker::display::format_audit_entries;
use expense_tracker::logging::{init_logging, normalize_level};
use expense_tracker::services::{CsvService, ExpenseService};
use expense_tracker::storage::SqliteExpenseRepository;

#[derive(Parser)]
#[command(
    name = "expense",
    version,
    about = "Personal expense tracker",
    long_about = "Record expenses in a local SQLite database, summarize them by \
                  category or month, and move them in and out of CSV files."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Expense(ExpenseCommands),

    /// Show recent changes from the audit log
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show or change configuration
    Config {
        /// Default directory for CSV exports
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// Currency symbol shown next to amounts
        #[arg(long)]
        currency: Option<String>,
        /// Diagnostic log level (error, warn, info, debug, trace)
        #[arg(long)]
        log_level: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = ExpensePaths::new()?;
    paths
        .ensure_directories()
        .context("Failed to prepare data directory")?;
    let mut settings = Settings::load_or_create(&paths)?;

    if let Err(e) = init_logging(&settings.log_level, &paths.log_dir()) {
        eprintln!("Warning: diagnostic logging disabled: {}", e);
    }

    let repository = SqliteExpenseRepository::open(paths.database_file()).with_context(|| {
        format!(
            "Failed to open database at {}",
            paths.database_file().display()
        )
    })?;
    let audit = AuditLogger::new(paths.audit_log());
    let service = ExpenseService::new(&repository, CsvService::new()).with_audit(&audit);

    match cli.command {
        Some(Commands::Expense(cmd)) => {
            handle_expense_command(&service, &settings, cmd)?;
        }
        Some(Commands::History { limit }) => {
            let entries = audit.read_recent(limit)?;
            print!("{}", format_audit_entries(&entries));
        }
        Some(Commands::Config {
            export_dir,
            currency,
            log_level,
        }) => {
            let mut changed = false;
            if let Some(dir) = export_dir {
                settings.export_dir = Some(dir);
                changed = true;
            }
            if let Some(symbol) = currency {
                settings.currency_symbol = symbol;
                changed = true;
            }
            if let Some(level) = log_level {
                settings.log_level = normalize_level(&level)?.to_string();
                changed = true;
            }
            if changed {
                settings.save(&paths)?;
                println!("Settings saved");
                println!();
            }

            println!("Expense Tracker Configuration");
            println!("=============================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Database:       {}", paths.database_file().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!("Log directory:  {}", paths.log_dir().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Log level:       {}", settings.log_level);
            match &settings.export_dir {
                Some(dir) => println!("  Export dir:      {}", dir.display()),
                None => println!("  Export dir:      (current directory)"),
            }
        }
        None => {
            println!("Expense Tracker - personal expense tracking");
            println!();
            println!("Run 'expense --help' for usage information.");
        }
    }

    Ok(())
}

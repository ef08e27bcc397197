//! Diagnostic logging bootstrap
//!
//! Installs the `log` backend once per process: size-rotated files in the
//! configured log directory, with warnings and errors duplicated to stderr.
//! Messages use a flat `event=... module=... status=...` key/value layout.

use std::path::{Path, PathBuf};

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::info;
use once_cell::sync::OnceCell;

use crate::error::{ExpenseError, ExpenseResult};

const LOG_FILE_BASENAME: &str = "expense";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Initialize logging at `level`, writing into `log_dir`
///
/// Repeating the call with the same level and directory is a no-op; any
/// other combination after the first success is rejected.
///
/// # Errors
/// - `level` is not one of trace, debug, info, warn, error.
/// - `log_dir` is empty or cannot be created.
/// - The logger backend fails to start.
pub fn init_logging(level: &str, log_dir: &Path) -> ExpenseResult<()> {
    let level = normalize_level(level)?;
    if log_dir.as_os_str().is_empty() {
        return Err(ExpenseError::Config("log directory cannot be empty".into()));
    }

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, log_dir))?;

    if state.log_dir != log_dir {
        return Err(ExpenseError::Config(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            state.log_dir.display(),
            log_dir.display()
        )));
    }
    if state.level != level {
        return Err(ExpenseError::Config(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, level
        )));
    }

    Ok(())
}

/// Active `(level, log_dir)`, or `None` before initialization
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_dir.clone()))
}

fn start_logger(level: &'static str, log_dir: &Path) -> ExpenseResult<LoggingState> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        ExpenseError::Io(format!(
            "failed to create log directory `{}`: {}",
            log_dir.display(),
            e
        ))
    })?;

    let logger = Logger::try_with_str(level)
        .map_err(|e| ExpenseError::Config(format!("invalid log level `{}`: {}", level, e)))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::Direct)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|e| ExpenseError::Config(format!("failed to start logger: {}", e)))?;

    info!(
        "event=app_start module=logging status=ok version={} level={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        level,
        log_dir.display()
    );

    Ok(LoggingState {
        level,
        log_dir: log_dir.to_path_buf(),
        _logger: logger,
    })
}

/// Map a level name to the one the backend expects
pub fn normalize_level(level: &str) -> ExpenseResult<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(ExpenseError::Config(format!(
            "unsupported log level `{}`; expected trace|debug|info|warn|error",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert!(normalize_level("verbose").is_err());
    }

    #[test]
    fn test_rejects_bad_arguments_before_starting() {
        assert!(init_logging("loud", Path::new("/tmp")).is_err());
        assert!(init_logging("info", Path::new("")).is_err());
    }

    // The only test that starts the global logger
    #[test]
    fn test_init_is_idempotent_and_rejects_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");
        let other_dir = temp_dir.path().join("other");

        init_logging("info", &log_dir).unwrap();
        init_logging("info", &log_dir).unwrap();
        assert!(log_dir.is_dir());

        let level_error = init_logging("debug", &log_dir).unwrap_err();
        assert!(level_error.to_string().contains("refusing to switch"));

        let dir_error = init_logging("info", &other_dir).unwrap_err();
        assert!(dir_error.to_string().contains("refusing to switch"));

        let (level, dir) = logging_status().unwrap();
        assert_eq!(level, "info");
        assert_eq!(dir, log_dir);
    }
}

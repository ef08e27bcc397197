//! SQLite-backed expense repository
//!
//! Each operation acquires a scoped session from `Database`, so a call either
//! commits in full or leaves storage untouched.

use chrono::NaiveDateTime;
use log::debug;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{normalize_category, Expense, ExpenseId};

use super::repository::{
    ensure_persisted, ensure_updatable, ensure_well_formed, month_bounds, validate_expense_id, CategorySummary,
    ExpenseRepository,
};
use super::session::Database;

const EXPENSE_SELECT_SQL: &str = "SELECT id, description, category, amount, date, notes FROM expenses";

/// Stored timestamp layout; fixed width so text order matches time order
const STORAGE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";
const STORAGE_DATE_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Expense repository backed by an embedded SQLite database
pub struct SqliteExpenseRepository {
    db: Database,
}

impl SqliteExpenseRepository {
    /// Create a repository over an opened database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open a file-backed repository
    pub fn open(path: impl AsRef<std::path::Path>) -> ExpenseResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Open an in-memory repository (useful for testing)
    pub fn open_in_memory() -> ExpenseResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

impl ExpenseRepository for SqliteExpenseRepository {
    fn get(&self, id: ExpenseId) -> ExpenseResult<Option<Expense>> {
        validate_expense_id(id)?;

        self.db.with_session(|conn| {
            let expense = conn
                .query_row(
                    &format!("{EXPENSE_SELECT_SQL} WHERE id = ?1"),
                    [id],
                    parse_expense_row,
                )
                .optional()?;
            Ok(expense)
        })
    }

    fn add(&self, expense: &Expense) -> ExpenseResult<ExpenseId> {
        let expense = expense.normalized();
        ensure_well_formed(&expense)?;

        let id = self.db.with_session(|conn| insert_expense(conn, &expense))?;
        debug!("event=expense_add module=storage status=ok id={}", id);
        Ok(id)
    }

    fn bulk_import(&self, expenses: &[Expense]) -> ExpenseResult<usize> {
        let normalized: Vec<Expense> = expenses.iter().map(Expense::normalized).collect();
        for expense in &normalized {
            ensure_well_formed(expense)?;
        }

        let count = self.db.with_session(|conn| {
            for expense in &normalized {
                insert_expense(conn, expense)?;
            }
            Ok(normalized.len())
        })?;

        debug!(
            "event=expense_bulk_import module=storage status=ok count={}",
            count
        );
        Ok(count)
    }

    fn delete(&self, expense: &Expense) -> ExpenseResult<()> {
        let id = ensure_persisted(expense)?;

        let removed = self
            .db
            .with_session(|conn| Ok(conn.execute("DELETE FROM expenses WHERE id = ?1", [id])?))?;

        debug!(
            "event=expense_delete module=storage status=ok id={} removed={}",
            id, removed
        );
        Ok(())
    }

    fn update(&self, expense: &Expense) -> ExpenseResult<()> {
        let id = ensure_persisted(expense)?;
        let expense = expense.normalized();
        ensure_updatable(&expense)?;

        // A non-positive amount keeps the stored one
        let amount = Some(expense.amount).filter(|_| expense.has_valid_amount());

        let changed = self.db.with_session(|conn| {
            Ok(conn.execute(
                "UPDATE expenses
                 SET
                    category = ?1,
                    description = ?2,
                    amount = COALESCE(?3, amount),
                    date = ?4,
                    notes = ?5
                 WHERE id = ?6",
                params![
                    expense.category.as_deref(),
                    expense.description.as_str(),
                    amount,
                    format_storage_date(&expense.date),
                    expense.notes.as_deref(),
                    id,
                ],
            )?)
        })?;

        // An unknown id is not an error; the update simply touches nothing.
        debug!(
            "event=expense_update module=storage status=ok id={} changed={}",
            id, changed
        );
        Ok(())
    }

    fn list(&self, category: Option<&str>) -> ExpenseResult<Vec<Expense>> {
        let category = category.and_then(normalize_category);

        self.db.with_session(|conn| match &category {
            Some(category) => query_expenses(
                conn,
                &format!("{EXPENSE_SELECT_SQL} WHERE category = ?1 ORDER BY id"),
                params![category],
            ),
            None => query_expenses(conn, &format!("{EXPENSE_SELECT_SQL} ORDER BY id"), []),
        })
    }

    fn category_summary(&self, category: Option<&str>) -> ExpenseResult<CategorySummary> {
        let category = category.and_then(normalize_category);

        let (total, count) = self.db.with_session(|conn| {
            let read = |row: &Row<'_>| -> rusqlite::Result<(f64, i64)> {
                Ok((row.get(0)?, row.get(1)?))
            };
            let sums = match &category {
                Some(category) => conn.query_row(
                    "SELECT COALESCE(SUM(amount), 0.0), COUNT(*) FROM expenses WHERE category = ?1",
                    [category],
                    read,
                )?,
                None => conn.query_row(
                    "SELECT COALESCE(SUM(amount), 0.0), COUNT(*) FROM expenses",
                    [],
                    read,
                )?,
            };
            Ok(sums)
        })?;

        let count = usize::try_from(count)
            .map_err(|e| ExpenseError::Storage(format!("Invalid row count {}: {}", count, e)))?;

        Ok(CategorySummary { total, count })
    }

    fn monthly_summary(&self, month: u32, year: i32) -> ExpenseResult<Vec<Expense>> {
        let (start, end) = month_bounds(month, year)?;

        self.db.with_session(|conn| {
            query_expenses(
                conn,
                &format!("{EXPENSE_SELECT_SQL} WHERE date >= ?1 AND date < ?2 ORDER BY id"),
                params![format_storage_date(&start), format_storage_date(&end)],
            )
        })
    }
}

fn insert_expense(conn: &Connection, expense: &Expense) -> ExpenseResult<ExpenseId> {
    conn.execute(
        "INSERT INTO expenses (description, category, amount, date, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            expense.description.as_str(),
            expense.category.as_deref(),
            expense.amount,
            format_storage_date(&expense.date),
            expense.notes.as_deref(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn query_expenses<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> ExpenseResult<Vec<Expense>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, parse_expense_row)?;

    let mut expenses = Vec::new();
    for expense in rows {
        expenses.push(expense?);
    }
    Ok(expenses)
}

fn parse_expense_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let date_text: String = row.get("date")?;
    let date = NaiveDateTime::parse_from_str(&date_text, STORAGE_DATE_PARSE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Expense {
        id: Some(row.get("id")?),
        description: row.get("description")?,
        category: row.get("category")?,
        amount: row.get("amount")?,
        date,
        notes: row.get("notes")?,
    })
}

fn format_storage_date(date: &NaiveDateTime) -> String {
    date.format(STORAGE_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repo() -> SqliteExpenseRepository {
        SqliteExpenseRepository::open_in_memory().unwrap()
    }

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap()
    }

    #[test]
    fn test_add_and_get() {
        let repo = create_test_repo();
        let expense = Expense::new("Groceries", 25.50)
            .with_category("Food")
            .with_notes("Weekly trip");

        let id = repo.add(&expense).unwrap();
        let loaded = repo.get(id).unwrap().unwrap();

        assert_eq!(loaded.id, Some(id));
        assert_eq!(Expense { id: None, ..loaded }, expense);
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let repo = create_test_repo();
        let first = repo.add(&Expense::new("A", 1.0)).unwrap();
        let second = repo.add(&Expense::new("B", 2.0)).unwrap();
        assert!(first >= 1);
        assert!(second > first);
    }

    #[test]
    fn test_add_normalizes_category() {
        let repo = create_test_repo();
        let id = repo
            .add(&Expense::new("Pizza", 14.0).with_category("FOOD"))
            .unwrap();
        let loaded = repo.get(id).unwrap().unwrap();
        assert_eq!(loaded.category.as_deref(), Some("Food"));
    }

    #[test]
    fn test_add_rejects_malformed_expense() {
        let repo = create_test_repo();
        let err = repo.add(&Expense::new("Refund", -3.0)).unwrap_err();
        assert!(matches!(err, ExpenseError::TypeMismatch(_)));
        assert!(repo.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_get_missing_returns_none() {
        let repo = create_test_repo();
        assert!(repo.get(99).unwrap().is_none());
    }

    #[test]
    fn test_get_rejects_non_positive_id() {
        let repo = create_test_repo();
        assert!(repo.get(0).unwrap_err().is_invalid_argument());
        assert!(repo.get(-1).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_delete() {
        let repo = create_test_repo();
        let id = repo
            .add(&Expense::new("Groceries", 25.50).with_category("Food"))
            .unwrap();
        let expense = repo.get(id).unwrap().unwrap();

        repo.delete(&expense).unwrap();
        assert!(repo.get(id).unwrap().is_none());
    }

    #[test]
    fn test_delete_requires_persisted_expense() {
        let repo = create_test_repo();
        let err = repo.delete(&Expense::new("Unsaved", 5.0)).unwrap_err();
        assert!(matches!(err, ExpenseError::TypeMismatch(_)));
    }

    #[test]
    fn test_update_overwrites_fields() {
        let repo = create_test_repo();
        let id = repo
            .add(&Expense::new("Coffee", 3.0).with_category("drinks"))
            .unwrap();

        let mut expense = repo.get(id).unwrap().unwrap();
        expense.description = "Flat white".to_string();
        expense.amount = 12.5;
        expense.category = Some("cafe".to_string());
        expense.notes = Some("oat milk".to_string());
        expense.date = at(2025, 2, 3);
        repo.update(&expense).unwrap();

        let loaded = repo.get(id).unwrap().unwrap();
        assert_eq!(loaded.description, "Flat white");
        assert_eq!(loaded.amount, 12.5);
        assert_eq!(loaded.category.as_deref(), Some("Cafe"));
        assert_eq!(loaded.notes.as_deref(), Some("oat milk"));
        assert_eq!(loaded.date, at(2025, 2, 3));
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let repo = create_test_repo();
        repo.add(&Expense::new("Coffee", 3.0)).unwrap();

        let mut ghost = Expense::new("Ghost", 9.0);
        ghost.id = Some(404);
        repo.update(&ghost).unwrap();

        let all = repo.list(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].description, "Coffee");
    }

    #[test]
    fn test_update_with_zero_amount_keeps_amount() {
        let repo = create_test_repo();
        let id = repo.add(&Expense::new("Coffee", 3.0)).unwrap();

        let mut expense = repo.get(id).unwrap().unwrap();
        expense.description = "Tea".to_string();
        expense.amount = 0.0;
        repo.update(&expense).unwrap();

        let stored = repo.get(id).unwrap().unwrap();
        assert_eq!(stored.description, "Tea");
        assert_eq!(stored.amount, 3.0);

        expense.amount = -2.0;
        expense.notes = Some("Green".to_string());
        repo.update(&expense).unwrap();

        let stored = repo.get(id).unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("Green"));
        assert_eq!(stored.amount, 3.0);
    }

    #[test]
    fn test_update_rejects_blank_description() {
        let repo = create_test_repo();
        let id = repo.add(&Expense::new("Coffee", 3.0)).unwrap();

        let mut expense = repo.get(id).unwrap().unwrap();
        expense.description = "  ".to_string();
        assert!(matches!(
            repo.update(&expense),
            Err(ExpenseError::TypeMismatch(_))
        ));
        assert_eq!(repo.get(id).unwrap().unwrap().description, "Coffee");
    }

    #[test]
    fn test_bulk_import() {
        let repo = create_test_repo();
        let expenses = vec![
            Expense::new("Rent", 900.0).with_category("housing"),
            Expense::new("Power", 80.0).with_category("Utilities"),
            Expense::new("Water", 30.0),
        ];

        assert_eq!(repo.bulk_import(&expenses).unwrap(), 3);

        let stored = repo.list(None).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0].category.as_deref(), Some("Housing"));
    }

    #[test]
    fn test_bulk_import_is_all_or_nothing() {
        let repo = create_test_repo();
        let expenses = vec![
            Expense::new("Rent", 900.0),
            Expense::new("Broken", 0.0),
            Expense::new("Water", 30.0),
        ];

        let err = repo.bulk_import(&expenses).unwrap_err();
        assert!(matches!(err, ExpenseError::TypeMismatch(_)));
        assert!(repo.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_bulk_import_empty() {
        let repo = create_test_repo();
        assert_eq!(repo.bulk_import(&[]).unwrap(), 0);
    }

    #[test]
    fn test_list_in_storage_order() {
        let repo = create_test_repo();
        repo.add(&Expense::new("Later", 1.0).with_date(at(2025, 5, 1)))
            .unwrap();
        repo.add(&Expense::new("Earlier", 2.0).with_date(at(2024, 5, 1)))
            .unwrap();

        let all = repo.list(None).unwrap();
        let names: Vec<_> = all.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(names, vec!["Later", "Earlier"]);
    }

    #[test]
    fn test_list_filters_by_category_case_insensitively() {
        let repo = create_test_repo();
        repo.add(&Expense::new("Pizza", 14.0).with_category("food"))
            .unwrap();
        repo.add(&Expense::new("Bus", 2.5).with_category("transport"))
            .unwrap();
        repo.add(&Expense::new("Salad", 9.0).with_category("FOOD"))
            .unwrap();

        assert_eq!(repo.list(Some("food")).unwrap().len(), 2);
        assert_eq!(repo.list(Some("FoOd")).unwrap().len(), 2);
        assert_eq!(repo.list(Some("travel")).unwrap().len(), 0);
        assert_eq!(repo.list(None).unwrap().len(), 3);
    }

    #[test]
    fn test_category_summary() {
        let repo = create_test_repo();
        repo.add(&Expense::new("Pizza", 14.0).with_category("food"))
            .unwrap();
        repo.add(&Expense::new("Salad", 9.5).with_category("Food"))
            .unwrap();
        repo.add(&Expense::new("Bus", 2.5).with_category("transport"))
            .unwrap();

        let lower = repo.category_summary(Some("food")).unwrap();
        let upper = repo.category_summary(Some("FOOD")).unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.total, 23.5);
        assert_eq!(lower.count, 2);

        let all = repo.category_summary(None).unwrap();
        assert_eq!(all.total, 26.0);
        assert_eq!(all.count, 3);
    }

    #[test]
    fn test_category_summary_with_no_matches() {
        let repo = create_test_repo();
        assert_eq!(
            repo.category_summary(Some("food")).unwrap(),
            CategorySummary {
                total: 0.0,
                count: 0
            }
        );
        assert_eq!(
            repo.category_summary(None).unwrap(),
            CategorySummary::default()
        );
    }

    #[test]
    fn test_monthly_summary() {
        let repo = create_test_repo();
        repo.add(&Expense::new("Jan rent", 900.0).with_date(at(2025, 1, 1)))
            .unwrap();
        repo.add(&Expense::new("Feb rent", 900.0).with_date(at(2025, 2, 1)))
            .unwrap();
        repo.add(&Expense::new("Feb food", 50.0).with_date(at(2025, 2, 28)))
            .unwrap();
        repo.add(&Expense::new("Last Feb", 10.0).with_date(at(2024, 2, 10)))
            .unwrap();

        let feb = repo.monthly_summary(2, 2025).unwrap();
        let names: Vec<_> = feb.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(names, vec!["Feb rent", "Feb food"]);

        assert!(repo.monthly_summary(3, 2025).unwrap().is_empty());
    }

    #[test]
    fn test_monthly_summary_month_edges() {
        let repo = create_test_repo();
        let last_moment = NaiveDate::from_ymd_opt(2025, 12, 31)
            .unwrap()
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .unwrap();
        let new_year = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        repo.add(&Expense::new("NYE", 5.0).with_date(last_moment))
            .unwrap();
        repo.add(&Expense::new("NYD", 6.0).with_date(new_year))
            .unwrap();

        let december = repo.monthly_summary(12, 2025).unwrap();
        assert_eq!(december.len(), 1);
        assert_eq!(december[0].description, "NYE");
        assert_eq!(december[0].date, last_moment);

        let january = repo.monthly_summary(1, 2026).unwrap();
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].description, "NYD");
    }

    #[test]
    fn test_monthly_summary_rejects_invalid_month() {
        let repo = create_test_repo();
        assert!(repo.monthly_summary(0, 2025).unwrap_err().is_invalid_argument());
        assert!(repo
            .monthly_summary(13, 2025)
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn test_file_backed_repository_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("expenses.db");

        let id = {
            let repo = SqliteExpenseRepository::open(&path).unwrap();
            repo.add(&Expense::new("Books", 40.0)).unwrap()
        };

        let repo = SqliteExpenseRepository::open(&path).unwrap();
        assert_eq!(repo.get(id).unwrap().unwrap().description, "Books");
    }

    #[test]
    fn test_storage_date_format_round_trips() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4)
            .unwrap()
            .and_hms_nano_opt(9, 8, 7, 123_456_789)
            .unwrap();
        let text = format_storage_date(&date);
        assert_eq!(text, "2025-07-04 09:08:07.123456789");
        assert_eq!(
            NaiveDateTime::parse_from_str(&text, STORAGE_DATE_PARSE_FORMAT).unwrap(),
            date
        );
    }
}

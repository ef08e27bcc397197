//! Expense model
//!
//! Represents one discrete spending event, along with the field limits and
//! category normalization rules shared by storage and CSV import.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage-assigned expense identifier (SQLite rowid)
pub type ExpenseId = i64;

/// Maximum length of an expense description
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Maximum length of a category name
pub const MAX_CATEGORY_LEN: usize = 50;

/// Maximum length of free-form notes
pub const MAX_NOTES_LEN: usize = 200;

/// A single expense record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Identifier assigned by storage; `None` until the record is persisted
    pub id: Option<ExpenseId>,

    /// What the money was spent on
    pub description: String,

    /// Optional category, stored in normalized form ("Food")
    pub category: Option<String>,

    /// Amount spent, always positive once stored
    pub amount: f64,

    /// When the expense was recorded
    pub date: NaiveDateTime,

    /// Free-form notes
    pub notes: Option<String>,
}

impl Expense {
    /// Create a new, unsaved expense dated now
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        Self {
            id: None,
            description: description.into(),
            category: None,
            amount,
            date: Local::now().naive_local(),
            notes: None,
        }
    }

    /// Set the category (blank values clear it)
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_blank(category.into());
        self
    }

    /// Set the notes (blank values clear them)
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_blank(notes.into());
        self
    }

    /// Override the timestamp
    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = date;
        self
    }

    /// Check whether the record has been persisted
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Check the record against the field constraints
    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        self.validate_text_fields()?;
        if !self.has_valid_amount() {
            return Err(ExpenseValidationError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }

    /// Whether the amount is finite and greater than zero
    pub fn has_valid_amount(&self) -> bool {
        self.amount.is_finite() && self.amount > 0.0
    }

    /// Check description, category and notes, ignoring the amount
    pub fn validate_text_fields(&self) -> Result<(), ExpenseValidationError> {
        if self.description.trim().is_empty() {
            return Err(ExpenseValidationError::EmptyDescription);
        }
        let description_len = self.description.chars().count();
        if description_len > MAX_DESCRIPTION_LEN {
            return Err(ExpenseValidationError::DescriptionTooLong(description_len));
        }

        if let Some(category) = &self.category {
            if category.chars().count() > MAX_CATEGORY_LEN {
                return Err(ExpenseValidationError::CategoryTooLong(
                    category.chars().count(),
                ));
            }
        }

        if let Some(notes) = &self.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(ExpenseValidationError::NotesTooLong(notes.chars().count()));
            }
        }

        Ok(())
    }

    /// Return a copy with the category in its stored form
    pub fn normalized(&self) -> Self {
        let mut expense = self.clone();
        expense.category = self.category.as_deref().and_then(normalize_category);
        expense
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{} {} ({:.2})", id, self.description, self.amount),
            None => write!(f, "{} ({:.2})", self.description, self.amount),
        }
    }
}

/// Normalize a category for storage and filtering
///
/// Lower-cases the whole value, then upper-cases the first character, so
/// "food", "FOOD" and "fOoD" all become "Food". Blank input yields `None`.
pub fn normalize_category(category: &str) -> Option<String> {
    let trimmed = category.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;

    let mut normalized: String = first.to_uppercase().collect();
    normalized.push_str(&chars.as_str().to_lowercase());
    Some(normalized)
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Validation errors for expenses
#[derive(Debug, Clone, PartialEq)]
pub enum ExpenseValidationError {
    EmptyDescription,
    DescriptionTooLong(usize),
    NonPositiveAmount(f64),
    CategoryTooLong(usize),
    NotesTooLong(usize),
}

impl fmt::Display for ExpenseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "Expense description cannot be empty"),
            Self::DescriptionTooLong(len) => write!(
                f,
                "Expense description too long ({} chars, max {})",
                len, MAX_DESCRIPTION_LEN
            ),
            Self::NonPositiveAmount(amount) => {
                write!(f, "Expense amount must be greater than 0, got {}", amount)
            }
            Self::CategoryTooLong(len) => write!(
                f,
                "Category too long ({} chars, max {})",
                len, MAX_CATEGORY_LEN
            ),
            Self::NotesTooLong(len) => {
                write!(f, "Notes too long ({} chars, max {})", len, MAX_NOTES_LEN)
            }
        }
    }
}

impl std::error::Error for ExpenseValidationError {}

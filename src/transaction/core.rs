//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, transaction::form::FieldErrors};

// ============================================================================
// MODELS
// ============================================================================

/// The prefix used for identifiers that have not been confirmed by the persistence service.
const PLACEHOLDER_PREFIX: &str = "local-";

/// An opaque, unique identifier for a [Transaction].
///
/// Authoritative IDs are assigned by the persistence service. While a new transaction waits for
/// confirmation it carries a placeholder ID, see [TransactionId::placeholder].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap an ID issued by the persistence service.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh authoritative ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create the placeholder ID for the `sequence`-th optimistic insert.
    pub fn placeholder(sequence: u64) -> Self {
        Self(format!("{PLACEHOLDER_PREFIX}{sequence}"))
    }

    /// Whether this ID is a local placeholder rather than one issued by the persistence service.
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl ToSql for TransactionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for TransactionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(TransactionId)
    }
}

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money that was earned.
    Income,
    /// Money that was spent.
    Expense,
}

impl TransactionType {
    /// The lowercase name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// The error returned when parsing a string that is neither "income" nor "expense".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not a transaction type, expected \"income\" or \"expense\"")]
pub struct ParseTransactionTypeError(String);

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(ParseTransactionTypeError(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A text description of what the transaction was for.
    pub title: String,
    /// The amount of money spent or earned, always greater than zero.
    pub amount: f64,
    /// Whether the amount counts towards income or expenses.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The user-defined grouping key, e.g. "Groceries" or "Salary".
    pub category: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// A validated transaction that has not been saved yet.
///
/// Create drafts with [TransactionDraft::new] or via
/// [TransactionForm::validate](crate::transaction::TransactionForm::validate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// A text description of what the transaction was for.
    pub title: String,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// Whether the amount counts towards income or expenses.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The user-defined grouping key.
    pub category: String,
    /// When the transaction happened, `None` lets the persistence service use the creation time.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub date: Option<OffsetDateTime>,
}

impl TransactionDraft {
    /// Create a draft, checking that the text fields are not empty and `amount` is positive.
    ///
    /// # Errors
    /// Returns the [FieldErrors] for every field that is invalid.
    pub fn new(
        title: &str,
        amount: f64,
        transaction_type: TransactionType,
        category: &str,
    ) -> Result<Self, FieldErrors> {
        let draft = Self {
            title: title.to_owned(),
            amount,
            transaction_type,
            category: category.to_owned(),
            date: None,
        }
        .trimmed();

        draft.check()?;

        Ok(draft)
    }

    /// Remove leading and trailing whitespace from the title and category.
    ///
    /// Categories are compared exactly, so " Food" and "Food" would otherwise be different
    /// categories.
    pub fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_owned();
        self.category = self.category.trim().to_owned();
        self
    }

    /// Set the date of the transaction.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Check the draft invariants.
    ///
    /// Drafts can be deserialized from untrusted input, so the persistence service calls this
    /// before saving.
    ///
    /// # Errors
    /// Returns the [FieldErrors] for every field that is invalid.
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }

        if !self.amount.is_finite() {
            errors.push("amount", "Amount must be a number");
        } else if self.amount <= 0.0 {
            errors.push("amount", "Amount must be greater than zero");
        }

        if self.category.trim().is_empty() {
            errors.push("category", "Category is required");
        }

        errors.into_result()
    }

    /// Turn the draft into a [Transaction] with the given `id`.
    ///
    /// The date defaults to `now` if the draft does not have one.
    pub fn into_transaction(self, id: TransactionId, now: OffsetDateTime) -> Transaction {
        Transaction {
            id,
            title: self.title,
            amount: self.amount,
            transaction_type: self.transaction_type,
            category: self.category,
            date: self.date.unwrap_or(now),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Save a new transaction in the database, assigning it a fresh ID.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    draft: TransactionDraft,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = draft.into_transaction(TransactionId::generate(), OffsetDateTime::now_utc());

    connection.execute(
        "INSERT INTO \"transaction\" (id, title, amount, type, category, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            &transaction.id,
            &transaction.title,
            transaction.amount,
            transaction.transaction_type,
            &transaction.category,
            transaction.date,
        ),
    )?;

    Ok(transaction)
}

/// Get every transaction in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, title, amount, type, category, date FROM \"transaction\" ORDER BY rowid",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

type RowsAffected = usize;

/// Delete the transaction with `id`, returning how many rows were deleted.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(id: &TransactionId, connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id",
            &[(":id", id)],
        )
        .map_err(|err| err.into())
}

/// Delete every transaction, returning how many rows were deleted.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_all_transactions(connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute("DELETE FROM \"transaction\"", ())
        .map_err(|err| err.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY NOT NULL,
                title TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category TEXT NOT NULL,
                date TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let amount = row.get(2)?;
    let transaction_type = row.get(3)?;
    let category = row.get(4)?;
    let date = row.get(5)?;

    Ok(Transaction {
        id,
        title,
        amount,
        transaction_type,
        category,
        date,
    })
}

// ============================================================================
// TESTS
// ============================================================================

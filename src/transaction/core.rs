//! Defines the core data models and database queries for transactions.
//!
//! A transaction may reference one of the user's assets. In that case the
//! asset's stored value mirrors the ledger: income adds to the asset, an
//! expense subtracts from it. [create_transaction], [update_transaction] and
//! [delete_transaction] apply the ledger write and the asset adjustment in a
//! single SQL transaction, so the two can never drift apart.

use std::{fmt::Display, ops::RangeInclusive};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    asset::core::adjust_asset_value,
    category::core::get_category,
    database_id::DatabaseId,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction records money coming in or going out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money earned or received.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The string stored in the database for this transaction type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Parse a transaction type from its database string.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if `value` is not a known transaction type.
    pub fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(Error::NotFound),
        }
    }

    /// The effect of a transaction of this type on a linked asset's value.
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        }
    }

    /// The category type a category must have to label this transaction.
    pub fn category_type(&self) -> crate::category::CategoryType {
        match self {
            TransactionType::Income => crate::category::CategoryType::Income,
            TransactionType::Expense => crate::category::CategoryType::Expense,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "Income"),
            TransactionType::Expense => write!(f, "Expense"),
        }
    }
}

/// An income or expense, i.e. an event where money was either earned or
/// spent.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The ID of the user who owns the transaction.
    pub user_id: UserID,
    /// The amount of money earned or spent, always non-negative.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The ID of the category labelling the transaction.
    pub category_id: Option<DatabaseId>,
    /// The ID of the asset whose balance mirrors this transaction.
    pub asset_id: Option<DatabaseId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, transaction_type: TransactionType, date: Date) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            transaction_type,
            date,
            description: None,
            category_id: None,
            asset_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The amount of money earned or spent, must be non-negative.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// When the transaction happened. Must not be in the future, the
    /// endpoints enforce this against the current date.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The ID of the category labelling the transaction.
    pub category_id: Option<DatabaseId>,
    /// The ID of the asset whose balance mirrors this transaction.
    pub asset_id: Option<DatabaseId>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<DatabaseId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the linked asset for the transaction.
    pub fn asset_id(mut self, asset_id: Option<DatabaseId>) -> Self {
        self.asset_id = asset_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                transaction_type TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT,
                category_id INTEGER,
                asset_id INTEGER,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON DELETE SET NULL,
                FOREIGN KEY(asset_id) REFERENCES asset(id) ON DELETE SET NULL
                )",
        (),
    )?;

    // Composite index used by the budget spend queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date
         ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, transaction_type, date, description, category_id, asset_id";

/// Validate the builder and check the category reference, when given.
fn validate_transaction(
    builder: &TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    if builder.amount < 0.0 {
        return Err(Error::NegativeAmount(builder.amount));
    }

    if let Some(category_id) = builder.category_id {
        let category = get_category(category_id, user_id, connection)
            .map_err(|_| Error::InvalidCategory(Some(category_id)))?;

        if category.category_type != builder.transaction_type.category_type() {
            return Err(Error::CategoryTypeMismatch);
        }
    }

    Ok(())
}

/// Insert a transaction row without touching any linked asset.
///
/// Most callers want [create_transaction], which also mirrors the amount onto
/// the linked asset. This function exists for callers that manage the asset
/// balance themselves within an enclosing SQL transaction, such as
/// settlement.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the amount is negative,
/// - [Error::InvalidCategory] if the category does not belong to the user,
/// - [Error::CategoryTypeMismatch] if the category's type does not match,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_transaction(&builder, user_id, connection)?;

    connection.execute(
        "INSERT INTO \"transaction\"
             (user_id, amount, transaction_type, date, description, category_id, asset_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            user_id.as_i64(),
            builder.amount,
            builder.transaction_type.as_str(),
            builder.date,
            &builder.description,
            builder.category_id,
            builder.asset_id,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Transaction {
        id,
        user_id,
        amount: builder.amount,
        transaction_type: builder.transaction_type,
        date: builder.date,
        description: builder.description,
        category_id: builder.category_id,
        asset_id: builder.asset_id,
    })
}

/// Create a transaction and mirror its amount onto the linked asset, if any.
///
/// Both writes happen in a single SQL transaction.
///
/// # Errors
/// In addition to the errors of [insert_transaction], this function will
/// return an [Error::UpdateMissingAsset] if the linked asset does not refer
/// to an asset owned by the user.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = rusqlite::Transaction::new_unchecked(
        connection,
        rusqlite::TransactionBehavior::Immediate,
    )?;

    let transaction = insert_transaction(builder, user_id, &sql_transaction)?;

    if let Some(asset_id) = transaction.asset_id {
        adjust_asset_value(
            asset_id,
            transaction.transaction_type.signed(transaction.amount),
            user_id,
            &sql_transaction,
        )?;
    }

    sql_transaction.commit()?;

    Ok(transaction)
}

/// Overwrite the transaction with `transaction_id` using the builder's
/// fields, reversing the old transaction's effect on its linked asset before
/// applying the new one.
///
/// All writes happen in a single SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `transaction_id` does not refer to
///   a transaction owned by the user,
/// - or any of the errors of [create_transaction].
pub fn update_transaction(
    transaction_id: DatabaseId,
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = rusqlite::Transaction::new_unchecked(
        connection,
        rusqlite::TransactionBehavior::Immediate,
    )?;

    let old = get_transaction(transaction_id, user_id, &sql_transaction)
        .map_err(|_| Error::UpdateMissingTransaction)?;

    validate_transaction(&builder, user_id, &sql_transaction)?;

    if let Some(asset_id) = old.asset_id {
        adjust_asset_value(
            asset_id,
            -old.transaction_type.signed(old.amount),
            user_id,
            &sql_transaction,
        )?;
    }

    sql_transaction.execute(
        "UPDATE \"transaction\"
         SET amount = ?1, transaction_type = ?2, date = ?3, description = ?4,
             category_id = ?5, asset_id = ?6, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?7 AND user_id = ?8",
        (
            builder.amount,
            builder.transaction_type.as_str(),
            builder.date,
            &builder.description,
            builder.category_id,
            builder.asset_id,
            transaction_id,
            user_id.as_i64(),
        ),
    )?;

    if let Some(asset_id) = builder.asset_id {
        adjust_asset_value(
            asset_id,
            builder.transaction_type.signed(builder.amount),
            user_id,
            &sql_transaction,
        )?;
    }

    sql_transaction.commit()?;

    Ok(Transaction {
        id: transaction_id,
        user_id,
        amount: builder.amount,
        transaction_type: builder.transaction_type,
        date: builder.date,
        description: builder.description,
        category_id: builder.category_id,
        asset_id: builder.asset_id,
    })
}

/// Delete the transaction with `transaction_id`, reversing its effect on its
/// linked asset.
///
/// Both writes happen in a single SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `transaction_id` does not refer to
///   a transaction owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    transaction_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = rusqlite::Transaction::new_unchecked(
        connection,
        rusqlite::TransactionBehavior::Immediate,
    )?;

    let old = get_transaction(transaction_id, user_id, &sql_transaction)
        .map_err(|_| Error::DeleteMissingTransaction)?;

    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (transaction_id, user_id.as_i64()),
    )?;

    if let Some(asset_id) = old.asset_id {
        adjust_asset_value(
            asset_id,
            -old.transaction_type.signed(old.amount),
            user_id,
            &sql_transaction,
        )?;
    }

    sql_transaction.commit()?;

    Ok(())
}

/// Retrieve the transaction with `transaction_id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `transaction_id` does not refer to a transaction
///   owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    transaction_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &transaction_id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the user's transactions, most recent first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = :user_id
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Income and expense totals over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransactionSummary {
    /// The total amount of money received.
    pub income: f64,
    /// The total amount of money spent.
    pub expense: f64,
}

impl TransactionSummary {
    /// Income minus expenses.
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

/// Sum the user's income and expenses over `date_range` (inclusive).
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_transaction_summary(
    date_range: RangeInclusive<Date>,
    user_id: UserID,
    connection: &Connection,
) -> Result<TransactionSummary, Error> {
    connection
        .query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN transaction_type = 'income' THEN amount END), 0.0),
                COALESCE(SUM(CASE WHEN transaction_type = 'expense' THEN amount END), 0.0)
             FROM \"transaction\"
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3",
            (user_id.as_i64(), date_range.start(), date_range.end()),
            |row| {
                Ok(TransactionSummary {
                    income: row.get(0)?,
                    expense: row.get(1)?,
                })
            },
        )
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let amount = row.get(2)?;
    let raw_type: String = row.get(3)?;
    let date = row.get(4)?;
    let description = row.get(5)?;
    let category_id = row.get(6)?;
    let asset_id = row.get(7)?;

    let transaction_type = TransactionType::from_str(&raw_type).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown transaction type {raw_type:?}").into(),
        )
    })?;

    Ok(Transaction {
        id,
        user_id: UserID::new(raw_user_id),
        amount,
        transaction_type,
        date,
        description,
        category_id,
        asset_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================

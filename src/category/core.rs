//! Defines the core data models and database queries for categories.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an error if `name` is an empty string or only
    /// whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.trim().is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.trim().to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a category applies to income or expense transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    /// The category is for money coming in, e.g. 'Wages'.
    Income,
    /// The category is for money going out, e.g. 'Groceries'.
    Expense,
}

impl CategoryType {
    /// The string stored in the database for this category type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }

    /// Parse a category type from its database string.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if `value` is not a known category type.
    pub fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            _ => Err(Error::NotFound),
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryType::Income => write!(f, "Income"),
            CategoryType::Expense => write!(f, "Expense"),
        }
    }
}

/// A label for income and expense transactions, e.g. 'Groceries', 'Wages'.
///
/// Each user has their own set of categories. A category name may be reused
/// across types, so 'Other' can exist as both an income and an expense
/// category, but not twice within the same type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: DatabaseId,
    /// The ID of the user who owns the category.
    pub user_id: UserID,
    /// The name of the category.
    pub name: CategoryName,
    /// Whether the category applies to income or expenses.
    pub category_type: CategoryType,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                category_type TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                UNIQUE(user_id, name, category_type)
                )",
        (),
    )?;

    Ok(())
}

/// Create a category in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategory] if the user already has a category with the
///   same name and type,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    name: CategoryName,
    category_type: CategoryType,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .execute(
            "INSERT INTO category (user_id, name, category_type) VALUES (?1, ?2, ?3)",
            (user_id.as_i64(), name.as_ref(), category_type.as_str()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCategory(name.to_string()),
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        user_id,
        name,
        category_type,
    })
}

/// Retrieve the category with `category_id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `category_id` does not refer to a category owned by
///   the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(
    category_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, category_type FROM category
             WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_category_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the user's categories ordered by type and then name.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, category_type FROM category
             WHERE user_id = :user_id
             ORDER BY category_type, name COLLATE NOCASE",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the user's categories of a single type ordered by name.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_categories_by_type(
    category_type: CategoryType,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, category_type FROM category
             WHERE user_id = ?1 AND category_type = ?2
             ORDER BY name COLLATE NOCASE",
        )?
        .query_map(
            (user_id.as_i64(), category_type.as_str()),
            map_category_row,
        )?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Delete the category with `category_id` belonging to `user_id`.
///
/// Transactions that used the category keep their rows, their category is set
/// to null by the foreign key on the transaction table.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingCategory] if `category_id` does not refer to a
///   category owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(
    category_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let raw_name: String = row.get(2)?;
    let raw_type: String = row.get(3)?;

    let category_type = CategoryType::from_str(&raw_type).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown category type {raw_type:?}").into(),
        )
    })?;

    Ok(Category {
        id,
        user_id: UserID::new(raw_user_id),
        name: CategoryName::new_unchecked(&raw_name),
        category_type,
    })
}

// ============================================================================
// TESTS
// ============================================================================

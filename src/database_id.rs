//! The integer ID type used for all database rows.

/// The ID of a row in the application database.
pub type DatabaseId = i64;

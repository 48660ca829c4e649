//! Category management for income and expense transactions.
//!
//! This module contains everything related to categories:
//! - The `Category` model and the `CategoryName` and `CategoryType` types
//! - Database functions for storing, querying and deleting categories
//! - View handlers for the category pages and the dropdown options fragment

mod categories_page;
pub(crate) mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod options_endpoint;

pub use categories_page::get_categories_page;
pub use core::{
    Category, CategoryName, CategoryType, create_category, create_category_table, delete_category,
    get_categories, get_categories_by_type, get_category,
};
pub use create_endpoint::create_category_endpoint;
pub use create_page::get_create_category_page;
pub use delete_endpoint::delete_category_endpoint;
pub use options_endpoint::{category_options, get_category_options};

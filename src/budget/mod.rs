//! Budgets cap spending per week, month, or year, optionally scoped to a
//! single expense category. Spending against a budget is derived from the
//! transaction ledger at read time.

mod budgets_page;
pub(crate) mod core;
pub(crate) mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;

pub use budgets_page::get_budgets_page;
pub use core::create_budget_table;
pub use create_endpoint::create_budget_endpoint;
pub use create_page::get_new_budget_page;
pub use delete_endpoint::delete_budget_endpoint;
pub use edit_endpoint::edit_budget_endpoint;
pub use edit_page::get_edit_budget_page;

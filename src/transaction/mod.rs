//! Everything for recording income and expenses: the domain types and
//! database functions, the pages for listing, creating and editing
//! transactions, and the endpoints the pages talk to.

pub(crate) mod core;
pub(crate) mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod transactions_page;

pub use core::{
    Transaction, TransactionSummary, TransactionType, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, get_transaction_summary,
    get_transactions, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_new_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use transactions_page::get_transactions_page;

//! Nestegg is a web app for tracking your net worth, income and expenses,
//! and budgets.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod asset;
mod auth;
mod budget;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod forms;
mod html;
mod internal_server_error;
mod log_in;
mod log_out;
mod logging;
mod navigation;
mod not_found;
mod password;
mod price;
mod register_user;
mod routing;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use price::PriceClient;
pub use routing::build_router;
pub use user::{User, UserID, create_user, get_user_by_id};

use crate::{
    alert::Alert, database_id::DatabaseId, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Either the user ID or expiry cookie is missing from the cookie jar in
    /// the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email used during registration already belongs to a user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// A negative value was written to an asset.
    ///
    /// Asset values are stored as non-negative magnitudes for every type,
    /// including debts and receivables. Aggregation is the only place where
    /// debt rows are negated.
    #[error("asset values must not be negative, got {0}")]
    NegativeValue(f64),

    /// A negative amount was used to create a transaction.
    ///
    /// Whether money moved in or out is carried by the transaction type,
    /// amounts are always non-negative magnitudes.
    #[error("transaction amounts must not be negative, got {0}")]
    NegativeAmount(f64),

    /// A settlement payment was zero or negative.
    #[error("settlement payments must be greater than zero, got {0}")]
    InvalidPaymentAmount(f64),

    /// A settlement was requested for an asset that is neither a debt nor a
    /// receivable.
    #[error("only debts and receivables can be settled")]
    NotSettleable,

    /// The category ID used to create a transaction did not match one of the
    /// user's categories.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<DatabaseId>),

    /// The category's type (income/expense) does not match the transaction's.
    #[error("the category type does not match the transaction type")]
    CategoryTypeMismatch,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The category name already exists for this user and type.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategory(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The price API request failed or returned an unusable response.
    #[error("could not fetch prices: {0}")]
    PriceApi(String),

    /// The price API responded but had no price for the given coin.
    #[error("no price found for coin \"{0}\"")]
    PriceNotFound(String),

    /// Tried to delete an asset that does not exist
    #[error("tried to delete an asset that is not in the database")]
    DeleteMissingAsset,

    /// Tried to update an asset that does not exist
    #[error("tried to update an asset that is not in the database")]
    UpdateMissingAsset,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::InvalidCategory(None)
            }
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::FutureDate(date) => Alert::error(
                "Invalid transaction date",
                &format!("{date} is a date in the future, which is not allowed."),
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::NegativeValue(value) => Alert::error(
                "Invalid value",
                &format!(
                    "Values must not be negative, got {value}. Debts and receivables are \
                    entered as positive amounts and subtracted automatically."
                ),
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::NegativeAmount(amount) => Alert::error(
                "Invalid amount",
                &format!(
                    "Amounts must not be negative, got {amount}. Use the income and expense \
                    types to record the direction of the money."
                ),
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::InvalidPaymentAmount(amount) => Alert::error(
                "Invalid payment amount",
                &format!("Payments must be greater than zero, got {amount}."),
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::NotSettleable => Alert::error(
                "Cannot settle this asset",
                "Only debts and receivables can be settled.",
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::InvalidCategory(category_id) => Alert::error(
                "Invalid category",
                &format!("Could not find a category with the ID {category_id:?}"),
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::CategoryTypeMismatch => Alert::error(
                "Invalid category",
                "The category type does not match the transaction type. \
                Pick an income category for income and an expense category for expenses.",
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::EmptyCategoryName => Alert::error(
                "Invalid category name",
                "The category name cannot be empty.",
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::DuplicateCategory(name) => Alert::error(
                "Duplicate category",
                &format!("The category \"{name}\" already exists."),
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::PriceApi(details) => Alert::error(
                "Could not fetch prices",
                &format!("The price service could not be reached: {details}. Try again later."),
            )
            .into_response_with_status(StatusCode::BAD_GATEWAY),
            Error::PriceNotFound(coin_id) => Alert::error(
                "Price not found",
                &format!("The price service has no price for \"{coin_id}\". Check the coin ID."),
            )
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::UpdateMissingAsset => {
                Alert::error("Could not update asset", "The asset could not be found.")
                    .into_response_with_status(StatusCode::NOT_FOUND)
            }
            Error::DeleteMissingAsset => Alert::error(
                "Could not delete asset",
                "The asset could not be found. \
                Try refreshing the page to see if the asset has already been deleted.",
            )
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::UpdateMissingTransaction => Alert::error(
                "Could not update transaction",
                "The transaction could not be found.",
            )
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::DeleteMissingTransaction => Alert::error(
                "Could not delete transaction",
                "The transaction could not be found. \
                Try refreshing the page to see if the transaction has already been deleted.",
            )
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::DeleteMissingCategory => Alert::error(
                "Could not delete category",
                "The category could not be found. \
                Try refreshing the page to see if the category has already been deleted.",
            )
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::UpdateMissingBudget => {
                Alert::error("Could not update budget", "The budget could not be found.")
                    .into_response_with_status(StatusCode::NOT_FOUND)
            }
            Error::DeleteMissingBudget => Alert::error(
                "Could not delete budget",
                "The budget could not be found. \
                Try refreshing the page to see if the budget has already been deleted.",
            )
            .into_response_with_status(StatusCode::NOT_FOUND),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
                .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

//! Endpoint for updating an existing transaction.
//!
//! Updating reverses the old transaction's effect on any linked asset and
//! applies the new one inside a single database transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    endpoints,
    transaction::{Transaction, core::update_transaction, create_endpoint::TransactionForm},
    user::UserID,
};

/// The state needed to update a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that overwrites the transaction with `transaction_id`
/// using the submitted form values.
pub async fn edit_transaction_endpoint(
    Path(transaction_id): Path<DatabaseId>,
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    if form.date > OffsetDateTime::now_utc().date() {
        tracing::error!("Tried to update a transaction to a future date");

        return Error::FutureDate(form.date).into_alert_response();
    }

    let builder = Transaction::build(form.amount, form.transaction_type, form.date)
        .description(form.description)
        .category_id(form.category_id)
        .asset_id(form.asset_id);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_transaction(transaction_id, builder, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Failed to update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

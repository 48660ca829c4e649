//! Endpoint for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    endpoints,
    forms::empty_string_as_none_text,
    transaction::{Transaction, TransactionType, core::create_transaction},
    user::UserID,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or updating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The amount of money earned or spent, as a non-negative magnitude.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// The date when the transaction occurred.
    pub date: Date,
    /// Text detailing the transaction.
    #[serde(default, deserialize_with = "empty_string_as_none_text")]
    pub description: Option<String>,
    /// The category the transaction belongs to.
    #[serde(default)]
    pub category_id: Option<DatabaseId>,
    /// The asset whose balance this transaction moves.
    #[serde(default)]
    pub asset_id: Option<DatabaseId>,
}

/// A route handler for creating a new transaction, redirects to the
/// transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    if form.date > OffsetDateTime::now_utc().date() {
        tracing::error!("Tried to create a transaction with a future date");

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

    if let Err(error) = create_transaction(builder, user_id, &connection) {
        tracing::error!("could not create transaction: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        PasswordHash,
        asset::{Asset, AssetType, create_asset, get_assets},
        category::{CategoryName, CategoryType, create_category},
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
        transaction::{TransactionType, get_transactions},
        user::{UserID, create_user},
    };

    use super::{CreateTransactionState, TransactionForm, create_transaction_endpoint};

    fn get_test_state() -> (CreateTransactionState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            CreateTransactionState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user_id) = get_test_state();
        let category = {
            let connection = state.db_connection.lock().unwrap();
            create_category(
                CategoryName::new_unchecked("Groceries"),
                CategoryType::Expense,
                user_id,
                &connection,
            )
            .expect("Could not create test category")
        };
        let form = TransactionForm {
            amount: 12.3,
            transaction_type: TransactionType::Expense,
            date: date!(2025 - 08 - 01),
            description: Some("test transaction".to_owned()),
            category_id: Some(category.id),
            asset_id: None,
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let transactions = get_transactions(user_id, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, 12.3);
        assert_eq!(transactions[0].category_id, Some(category.id));
    }

    #[tokio::test]
    async fn future_date_is_rejected() {
        let (state, user_id) = get_test_state();
        let tomorrow = OffsetDateTime::now_utc().date() + Duration::days(1);
        let form = TransactionForm {
            amount: 12.3,
            transaction_type: TransactionType::Expense,
            date: tomorrow,
            description: None,
            category_id: None,
            asset_id: None,
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        let transactions = get_transactions(user_id, &connection).unwrap();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn linked_asset_balance_moves_with_the_transaction() {
        let (state, user_id) = get_test_state();
        let asset = {
            let connection = state.db_connection.lock().unwrap();
            create_asset(
                Asset::build("Checking", AssetType::SpendingAccount, 100.0),
                user_id,
                &connection,
            )
            .expect("Could not create test asset")
        };
        let form = TransactionForm {
            amount: 30.0,
            transaction_type: TransactionType::Expense,
            date: date!(2025 - 08 - 01),
            description: None,
            category_id: None,
            asset_id: Some(asset.id),
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let assets = get_assets(user_id, &connection).unwrap();
        assert_eq!(assets[0].value, 70.0);
    }

    #[tokio::test]
    async fn mismatched_category_type_is_rejected() {
        let (state, user_id) = get_test_state();
        let category = {
            let connection = state.db_connection.lock().unwrap();
            create_category(
                CategoryName::new_unchecked("Wages"),
                CategoryType::Income,
                user_id,
                &connection,
            )
            .expect("Could not create test category")
        };
        let form = TransactionForm {
            amount: 12.3,
            transaction_type: TransactionType::Expense,
            date: date!(2025 - 08 - 01),
            description: None,
            category_id: Some(category.id),
            asset_id: None,
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

//! Endpoint for settling a debt or receivable.
//!
//! Settlement updates the balance and records the matching ledger
//! transaction in a single database transaction, so a failure part way
//! through leaves both untouched.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    asset::{SettlementPayment, core::settle_asset},
    database_id::DatabaseId,
    endpoints,
    forms::empty_string_as_none,
    user::UserID,
};

/// The state needed to settle an asset.
#[derive(Debug, Clone)]
pub struct SettleAssetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettleAssetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Whether to settle the full balance or pay off part of it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Pay off the whole outstanding balance.
    Full,
    /// Pay off part of the balance.
    Partial,
}

/// The form data for settling a debt or receivable.
#[derive(Debug, Deserialize)]
pub struct SettleForm {
    /// Whether this is a full or partial settlement.
    pub payment_type: PaymentType,
    /// The payment amount, required for partial settlements.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub amount: Option<f64>,
}

/// A route handler that records a settlement payment against a debt or
/// receivable.
pub async fn settle_asset_endpoint(
    Path(asset_id): Path<DatabaseId>,
    State(state): State<SettleAssetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<SettleForm>,
) -> Response {
    let payment = match form.payment_type {
        PaymentType::Full => SettlementPayment::Full,
        PaymentType::Partial => match form.amount {
            Some(amount) => SettlementPayment::Partial(amount),
            None => return Error::InvalidPaymentAmount(0.0).into_alert_response(),
        },
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let today = OffsetDateTime::now_utc().date();

    match settle_asset(asset_id, payment, today, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::ASSETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Failed to settle asset {asset_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod settle_asset_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        asset::{Asset, AssetType, core::get_asset, create_asset},
        database_id::DatabaseId,
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
        transaction::get_transactions,
        user::{UserID, create_user},
    };

    use super::{PaymentType, SettleAssetState, SettleForm, settle_asset_endpoint};

    fn get_test_state() -> (SettleAssetState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            SettleAssetState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    fn create_debt(state: &SettleAssetState, user_id: UserID, value: f64) -> DatabaseId {
        let connection = state.db_connection.lock().unwrap();
        create_asset(
            Asset::build("Car loan", AssetType::Debt, value),
            user_id,
            &connection,
        )
        .expect("Could not create test asset")
        .id
    }

    #[tokio::test]
    async fn full_settlement_zeroes_balance_and_records_expense() {
        let (state, user_id) = get_test_state();
        let asset_id = create_debt(&state, user_id, 300.0);
        let form = SettleForm {
            payment_type: PaymentType::Full,
            amount: None,
        };

        let response = settle_asset_endpoint(
            Path(asset_id),
            State(state.clone()),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ASSETS_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let asset = get_asset(asset_id, user_id, &connection).unwrap();
        assert_eq!(asset.value, 0.0);

        let transactions = get_transactions(user_id, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, 300.0);
    }

    #[tokio::test]
    async fn partial_settlement_reduces_balance() {
        let (state, user_id) = get_test_state();
        let asset_id = create_debt(&state, user_id, 300.0);
        let form = SettleForm {
            payment_type: PaymentType::Partial,
            amount: Some(100.0),
        };

        let response = settle_asset_endpoint(
            Path(asset_id),
            State(state.clone()),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let asset = get_asset(asset_id, user_id, &connection).unwrap();
        assert_eq!(asset.value, 200.0);
    }

    #[tokio::test]
    async fn partial_settlement_without_amount_is_rejected() {
        let (state, user_id) = get_test_state();
        let asset_id = create_debt(&state, user_id, 300.0);
        let form = SettleForm {
            payment_type: PaymentType::Partial,
            amount: None,
        };

        let response =
            settle_asset_endpoint(Path(asset_id), State(state.clone()), Extension(user_id), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        let asset = get_asset(asset_id, user_id, &connection).unwrap();
        assert_eq!(asset.value, 300.0, "balance must be untouched");
    }

    #[tokio::test]
    async fn settling_a_spending_account_is_rejected() {
        let (state, user_id) = get_test_state();
        let asset_id = {
            let connection = state.db_connection.lock().unwrap();
            create_asset(
                Asset::build("Checking", AssetType::SpendingAccount, 1000.0),
                user_id,
                &connection,
            )
            .expect("Could not create test asset")
            .id
        };
        let form = SettleForm {
            payment_type: PaymentType::Full,
            amount: None,
        };

        let response =
            settle_asset_endpoint(Path(asset_id), State(state.clone()), Extension(user_id), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        let transactions = get_transactions(user_id, &connection).unwrap();
        assert!(transactions.is_empty(), "no ledger entry should be written");
    }
}

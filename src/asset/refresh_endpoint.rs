//! Endpoint for refreshing the prices of all crypto holdings.
//!
//! The new prices are fetched first and then applied in a single database
//! transaction, so a failed fetch leaves every holding untouched.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, TransactionBehavior};

use crate::{
    AppState, Error,
    alert::Alert,
    asset::{AssetType, core::get_assets_by_type},
    endpoints,
    price::PriceClient,
    user::UserID,
};

/// The state needed to refresh crypto prices.
#[derive(Debug, Clone)]
pub struct RefreshPricesState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub price_client: PriceClient,
}

impl FromRef<AppState> for RefreshPricesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            price_client: state.price_client.clone(),
        }
    }
}

/// A route handler that updates every crypto holding with a coin ID to the
/// latest spot price.
pub async fn refresh_prices_endpoint(
    State(state): State<RefreshPricesState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    // The coin IDs are collected and the lock released before the fetch, so
    // the database is not held up by a slow API.
    let coin_ids = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        match get_assets_by_type(AssetType::Crypto, user_id, &connection) {
            Ok(assets) => {
                let mut coin_ids = assets
                    .into_iter()
                    .filter_map(|asset| asset.coin_id)
                    .collect::<Vec<_>>();
                coin_ids.sort_unstable();
                coin_ids.dedup();
                coin_ids
            }
            Err(error) => {
                tracing::error!("Failed to retrieve crypto assets: {error}");
                return error.into_alert_response();
            }
        }
    };

    if coin_ids.is_empty() {
        return Alert::SuccessSimple {
            message: "No crypto holdings with a coin ID to refresh".to_owned(),
        }
        .into_response();
    }

    let prices = match state.price_client.get_prices(&coin_ids).await {
        Ok(prices) => prices,
        Err(error) => {
            tracing::error!("Failed to fetch prices: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match apply_refreshed_prices(&prices, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::ASSETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Failed to apply refreshed prices: {error}");
            error.into_alert_response()
        }
    }
}

/// Write the fetched prices to every matching crypto holding.
///
/// The value of each holding is recalculated as quantity times the new unit
/// price, treating a missing quantity as one unit. All rows are updated in
/// one database transaction.
pub(super) fn apply_refreshed_prices(
    prices: &HashMap<String, f64>,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    for (coin_id, price) in prices {
        sql_transaction.execute(
            "UPDATE asset
             SET current_price = ?1,
                 value = COALESCE(quantity, 1.0) * ?1,
                 updated_at = CURRENT_TIMESTAMP
             WHERE user_id = ?2 AND asset_type = 'crypto' AND coin_id = ?3",
            (price, user_id.as_i64(), coin_id),
        )?;
    }

    sql_transaction.commit()?;

    Ok(())
}

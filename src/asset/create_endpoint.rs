//! Endpoint for creating a new asset or liability.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    asset::{Asset, AssetType, core::create_asset},
    endpoints,
    forms::{empty_string_as_none, empty_string_as_none_text},
    user::UserID,
};

/// The state needed to create an asset.
#[derive(Debug, Clone)]
pub struct CreateAssetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAssetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or updating an asset.
#[derive(Debug, Deserialize)]
pub struct AssetForm {
    /// The display name of the asset.
    pub name: String,
    /// What kind of asset this is.
    pub asset_type: AssetType,
    /// The current value. When left blank it is derived from the quantity
    /// and current price.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub value: Option<f64>,
    /// The currency code, defaults to USD.
    #[serde(default, deserialize_with = "empty_string_as_none_text")]
    pub currency: Option<String>,
    /// Free-form notes about the asset.
    #[serde(default, deserialize_with = "empty_string_as_none_text")]
    pub description: Option<String>,
    /// How many units are held (crypto).
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub quantity: Option<f64>,
    /// The unit price paid (crypto).
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub buy_price: Option<f64>,
    /// The current unit price (crypto).
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub current_price: Option<f64>,
    /// The CoinGecko coin ID used for price refreshes (crypto).
    #[serde(default, deserialize_with = "empty_string_as_none_text")]
    pub coin_id: Option<String>,
}

impl AssetForm {
    /// The value to store for this asset.
    ///
    /// An explicit value wins. Otherwise the value is derived from the
    /// quantity and current price when both are given, falling back to zero.
    pub(super) fn resolved_value(&self) -> f64 {
        match (self.value, self.quantity, self.current_price) {
            (Some(value), _, _) => value,
            (None, Some(quantity), Some(current_price)) => quantity * current_price,
            _ => 0.0,
        }
    }
}

/// A route handler that creates a new asset from a form submission.
pub async fn create_asset_endpoint(
    State(state): State<CreateAssetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<AssetForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let value = form.resolved_value();
    let mut builder = Asset::build(&form.name, form.asset_type, value)
        .description(form.description)
        .quantity(form.quantity)
        .buy_price(form.buy_price)
        .current_price(form.current_price)
        .coin_id(form.coin_id);

    if let Some(currency) = &form.currency {
        builder = builder.currency(currency);
    }

    match create_asset(builder, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::ASSETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Failed to create asset: {error}");
            error.into_alert_response()
        }
    }
}

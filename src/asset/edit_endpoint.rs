//! Endpoint for updating an existing asset.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    asset::{Asset, core::update_asset, create_endpoint::AssetForm},
    database_id::DatabaseId,
    endpoints,
    user::UserID,
};

/// The state needed to update an asset.
#[derive(Debug, Clone)]
pub struct EditAssetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAssetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that overwrites the asset with `asset_id` using the
/// submitted form values.
pub async fn edit_asset_endpoint(
    Path(asset_id): Path<DatabaseId>,
    State(state): State<EditAssetState>,
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

    match update_asset(asset_id, builder, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::ASSETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Failed to update asset {asset_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod edit_asset_endpoint_tests {
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
        user::{UserID, create_user},
    };

    use super::{EditAssetState, edit_asset_endpoint};

    fn get_test_state() -> (EditAssetState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            EditAssetState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    async fn submit(
        state: EditAssetState,
        user_id: UserID,
        asset_id: DatabaseId,
        query: &str,
    ) -> axum::response::Response {
        let form = serde_urlencoded::from_str(query).expect("Could not parse test form");

        edit_asset_endpoint(Path(asset_id), State(state), Extension(user_id), Form(form)).await
    }

    #[tokio::test]
    async fn can_update_asset() {
        let (state, user_id) = get_test_state();
        let asset = {
            let connection = state.db_connection.lock().unwrap();
            create_asset(
                Asset::build("Checking", AssetType::SpendingAccount, 1000.0),
                user_id,
                &connection,
            )
            .expect("Could not create test asset")
        };

        let response = submit(
            state.clone(),
            user_id,
            asset.id,
            "name=Everyday+account&asset_type=spending_account&value=1500",
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ASSETS_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let updated = get_asset(asset.id, user_id, &connection).unwrap();
        assert_eq!(updated.name, "Everyday account");
        assert_eq!(updated.value, 1500.0);
    }

    #[tokio::test]
    async fn updating_missing_asset_returns_not_found() {
        let (state, user_id) = get_test_state();

        let response = submit(
            state,
            user_id,
            DatabaseId::from(999),
            "name=Ghost&asset_type=cash&value=1",
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn negative_value_is_rejected() {
        let (state, user_id) = get_test_state();
        let asset = {
            let connection = state.db_connection.lock().unwrap();
            create_asset(
                Asset::build("Car loan", AssetType::Debt, 300.0),
                user_id,
                &connection,
            )
            .expect("Could not create test asset")
        };

        let response = submit(
            state.clone(),
            user_id,
            asset.id,
            "name=Car+loan&asset_type=debt&value=-50",
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        let unchanged = get_asset(asset.id, user_id, &connection).unwrap();
        assert_eq!(unchanged.value, 300.0);
    }
}

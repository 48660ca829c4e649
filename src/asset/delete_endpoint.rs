//! Asset deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, alert::Alert, asset::core::delete_asset, database_id::DatabaseId,
    user::UserID,
};

/// The state needed for deleting an asset.
#[derive(Debug, Clone)]
pub struct DeleteAssetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAssetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle asset deletion. Returns a success alert or an error.
///
/// Transactions that referenced the asset keep their ledger rows, only the
/// link to the asset is cleared.
pub async fn delete_asset_endpoint(
    Path(asset_id): Path<DatabaseId>,
    State(state): State<DeleteAssetState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_asset(asset_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Asset deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingAsset) => Error::DeleteMissingAsset.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting asset {asset_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

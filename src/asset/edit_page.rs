//! Displays the form for editing an existing asset.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    asset::{core::get_asset, create_page::asset_form},
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the edit asset page.
#[derive(Debug, Clone)]
pub struct EditAssetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAssetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that renders the edit form for the asset with `asset_id`.
pub async fn get_edit_asset_page(
    Path(asset_id): Path<DatabaseId>,
    State(state): State<EditAssetPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let asset = get_asset(asset_id, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve asset {asset_id}: {error}"))?;

    let nav_bar = NavBar::new(endpoints::ASSETS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            section class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "Edit Asset" }

                (asset_form(
                    &format_endpoint(endpoints::EDIT_ASSET, asset.id),
                    "Save",
                    Some(&asset),
                ))
            }
        }
    );

    Ok(base("Edit Asset", &[dollar_input_styles()], &content).into_response())
}

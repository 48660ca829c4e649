//! Displays the form for settling a debt or receivable.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    asset::{Asset, AssetType, core::get_asset},
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, format_currency,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the settle asset page.
#[derive(Debug, Clone)]
pub struct SettleAssetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettleAssetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn settle_form(asset: &Asset) -> Markup {
    let action_url = format_endpoint(endpoints::SETTLE_ASSET, asset.id);
    let outcome = match asset.asset_type {
        AssetType::Debt => "The payment is recorded as an expense.",
        _ => "The payment is recorded as income.",
    };

    html!(
        form
            class="space-y-4 w-full"
            hx-post=(action_url)
            hx-target-error="#alert-container"
        {
            p
            {
                "Outstanding balance: "
                strong { (format_currency(asset.value)) }
            }

            fieldset class=(FORM_RADIO_GROUP_STYLE)
            {
                legend class=(FORM_LABEL_STYLE) { "Payment" }

                label class="flex items-center gap-3"
                {
                    input
                        type="radio"
                        name="payment_type"
                        value="full"
                        class=(FORM_RADIO_INPUT_STYLE)
                        checked;
                    span class=(FORM_RADIO_LABEL_STYLE) { "Settle in full" }
                }

                label class="flex items-center gap-3"
                {
                    input
                        type="radio"
                        name="payment_type"
                        value="partial"
                        class=(FORM_RADIO_INPUT_STYLE);
                    span class=(FORM_RADIO_LABEL_STYLE) { "Partial payment" }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount (partial payments only)" }
                div class="input-wrapper w-full"
                {
                    input
                        type="number"
                        name="amount"
                        id="amount"
                        class=(FORM_TEXT_INPUT_STYLE)
                        step="0.01"
                        min="0.01";
                }
            }

            p class="text-xs text-gray-500 dark:text-gray-400" { (outcome) }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                "Record Payment"
            }
        }
    )
}

/// A route handler that renders the settlement form for a debt or receivable.
///
/// Requests for assets that cannot be settled are rejected before the form is
/// shown.
pub async fn get_settle_asset_page(
    Path(asset_id): Path<DatabaseId>,
    State(state): State<SettleAssetPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let asset = get_asset(asset_id, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve asset {asset_id}: {error}"))?;

    if !asset.asset_type.is_settleable() {
        return Err(Error::NotFound);
    }

    let nav_bar = NavBar::new(endpoints::ASSETS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            section class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "Settle '" (asset.name) "'" }

                (settle_form(&asset))
            }
        }
    );

    Ok(base("Settle Asset", &[dollar_input_styles()], &content).into_response())
}

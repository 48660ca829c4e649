//! Displays the form for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    asset::{Asset, get_assets},
    category::{Category, CategoryType, category_options, get_categories_by_type},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles,
    },
    navigation::NavBar,
    transaction::{Transaction, TransactionType},
    user::UserID,
};

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form for creating or editing a transaction.
///
/// Switching between income and expense reloads the category dropdown via
/// HTMX so it only offers categories of the matching type.
pub(super) fn transaction_form(
    action_url: &str,
    submit_label: &str,
    transaction: Option<&Transaction>,
    categories: &[Category],
    assets: &[Asset],
    today: Date,
) -> Markup {
    let selected_type = transaction
        .map(|transaction| transaction.transaction_type)
        .unwrap_or(TransactionType::Expense);
    let date = transaction
        .map(|transaction| transaction.date)
        .unwrap_or(today);

    let type_radio = |transaction_type: TransactionType, label: &str| {
        let mut options_url = format!(
            "{}?category_type={}",
            endpoints::CATEGORY_OPTIONS,
            transaction_type.as_str()
        );
        if let Some(category_id) = transaction.and_then(|transaction| transaction.category_id) {
            options_url.push_str(&format!("&selected={category_id}"));
        }

        html!(
            label class="flex items-center gap-3"
            {
                input
                    type="radio"
                    name="transaction_type"
                    value=(transaction_type.as_str())
                    class=(FORM_RADIO_INPUT_STYLE)
                    checked[selected_type == transaction_type]
                    hx-get=(options_url)
                    hx-target="#category_id"
                    hx-swap="innerHTML";
                span class=(FORM_RADIO_LABEL_STYLE) { (label) }
            }
        )
    };

    html!(
        form
            class="space-y-4 w-full"
            hx-post=(action_url)
            hx-target-error="#alert-container"
        {
            fieldset class=(FORM_RADIO_GROUP_STYLE)
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                (type_radio(TransactionType::Expense, "Expense"))
                (type_radio(TransactionType::Income, "Income"))
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                div class="input-wrapper w-full"
                {
                    input
                        type="number"
                        name="amount"
                        id="amount"
                        class=(FORM_TEXT_INPUT_STYLE)
                        value=[transaction.map(|transaction| transaction.amount)]
                        step="0.01"
                        min="0.01"
                        required;
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    type="date"
                    name="date"
                    id="date"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(date)
                    max=(today)
                    required;
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description (optional)" }
                input
                    type="text"
                    name="description"
                    id="description"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=[transaction.and_then(|transaction| transaction.description.as_deref())];
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                select
                    name="category_id"
                    id="category_id"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (category_options(
                        categories,
                        transaction.and_then(|transaction| transaction.category_id),
                    ))
                }
            }

            div
            {
                label for="asset_id" class=(FORM_LABEL_STYLE) { "Linked asset (optional)" }
                select
                    name="asset_id"
                    id="asset_id"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "No linked asset" }

                    @for asset in assets {
                        option
                            value=(asset.id)
                            selected[transaction
                                .and_then(|transaction| transaction.asset_id)
                                == Some(asset.id)]
                        {
                            (asset.name)
                        }
                    }
                }
                p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                {
                    "The balance of the linked asset moves with this transaction."
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                (submit_label)
            }
        }
    )
}

/// A route handler that renders the new transaction page.
pub async fn get_new_transaction_page(
    State(state): State<NewTransactionPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    // The form starts on the expense type, so offer expense categories.
    let categories = get_categories_by_type(CategoryType::Expense, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let assets = get_assets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve assets: {error}"))?;

    let today = OffsetDateTime::now_utc().date();
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            section class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "New Transaction" }

                (transaction_form(
                    endpoints::TRANSACTIONS_API,
                    "Create",
                    None,
                    &categories,
                    &assets,
                    today,
                ))
            }
        }
    );

    Ok(base("New Transaction", &[dollar_input_styles()], &content).into_response())
}

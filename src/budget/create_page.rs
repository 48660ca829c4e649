//! Displays the form for creating a new budget.

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
    budget::core::{BUDGET_PERIODS, Budget},
    category::{Category, CategoryType, get_categories_by_type},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base, dollar_input_styles,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the new budget page.
#[derive(Debug, Clone)]
pub struct NewBudgetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form for creating or editing a budget.
///
/// Only expense categories are offered, budgets cap spending.
pub(super) fn budget_form(
    action_url: &str,
    submit_label: &str,
    budget: Option<&Budget>,
    categories: &[Category],
    today: Date,
) -> Markup {
    let start_date = budget.map(|budget| budget.start_date).unwrap_or(today);

    html!(
        form
            class="space-y-4 w-full"
            hx-post=(action_url)
            hx-target-error="#alert-container"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }
                input
                    type="text"
                    name="name"
                    id="name"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(budget.map(|budget| budget.name.as_str()).unwrap_or_default())
                    required
                    autofocus;
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount per period" }
                div class="input-wrapper w-full"
                {
                    input
                        type="number"
                        name="amount"
                        id="amount"
                        class=(FORM_TEXT_INPUT_STYLE)
                        value=[budget.map(|budget| budget.amount)]
                        step="0.01"
                        min="0"
                        required;
                }
            }

            div
            {
                label for="period" class=(FORM_LABEL_STYLE) { "Period" }
                select
                    name="period"
                    id="period"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for period in BUDGET_PERIODS {
                        option
                            value=(period.as_str())
                            selected[budget.map(|budget| budget.period) == Some(period)]
                        {
                            (period)
                        }
                    }
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                select
                    name="category_id"
                    id="category_id"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All spending" }

                    @for category in categories {
                        option
                            value=(category.id)
                            selected[budget.and_then(|budget| budget.category_id)
                                == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "Start date" }
                input
                    type="date"
                    name="start_date"
                    id="start_date"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(start_date)
                    required;
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "End date (optional)" }
                input
                    type="date"
                    name="end_date"
                    id="end_date"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=[budget.and_then(|budget| budget.end_date)];
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                (submit_label)
            }
        }
    )
}

/// A route handler that renders the new budget page.
pub async fn get_new_budget_page(
    State(state): State<NewBudgetPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories_by_type(CategoryType::Expense, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let today = OffsetDateTime::now_utc().date();
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            section class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "New Budget" }

                (budget_form(endpoints::BUDGETS_API, "Create", None, &categories, today))
            }
        }
    );

    Ok(base("New Budget", &[dollar_input_styles()], &content).into_response())
}

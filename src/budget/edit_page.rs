//! Displays the form for editing an existing budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    budget::{core::get_budget, create_page::budget_form},
    category::{CategoryType, get_categories_by_type},
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the edit budget page.
#[derive(Debug, Clone)]
pub struct EditBudgetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that renders the edit form for the budget with
/// `budget_id`.
pub async fn get_edit_budget_page(
    Path(budget_id): Path<DatabaseId>,
    State(state): State<EditBudgetPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_budget(budget_id, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve budget {budget_id}: {error}"))?;

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
                h1 class="text-xl font-bold" { "Edit Budget" }

                (budget_form(
                    &format_endpoint(endpoints::EDIT_BUDGET, budget.id),
                    "Save",
                    Some(&budget),
                    &categories,
                    today,
                ))
            }
        }
    );

    Ok(base("Edit Budget", &[dollar_input_styles()], &content).into_response())
}

#[cfg(test)]
mod edit_budget_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        budget::core::{Budget, BudgetPeriod, create_budget},
        db::initialize,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_valid_html, must_get_form,
            parse_html_document,
        },
        user::{UserID, create_user},
    };

    use super::{EditBudgetPageState, get_edit_budget_page};

    fn get_test_state() -> (EditBudgetPageState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            EditBudgetPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn form_is_prefilled_with_budget_values() {
        let (state, user_id) = get_test_state();
        let budget = {
            let connection = state.db_connection.lock().unwrap();
            create_budget(
                Budget::build("Eating out", 200.0, BudgetPeriod::Monthly, date!(2025 - 01 - 15)),
                user_id,
                &connection,
            )
            .expect("Could not create test budget")
        };

        let response = get_edit_budget_page(Path(budget.id), State(state), Extension(user_id))
            .await
            .expect("Could not get edit budget page");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::EDIT_BUDGET, budget.id),
            "hx-post",
        );
        assert_form_input_with_value(&form, "name", "text", "Eating out");
        assert_form_input_with_value(&form, "start_date", "date", "2025-01-15");
    }

    #[tokio::test]
    async fn another_users_budget_is_not_found() {
        let (state, user_id) = get_test_state();
        let budget = {
            let connection = state.db_connection.lock().unwrap();
            let other_user = create_user(
                "other@example.com",
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .expect("Could not create test user");

            create_budget(
                Budget::build("Eating out", 200.0, BudgetPeriod::Monthly, date!(2025 - 01 - 15)),
                other_user.id,
                &connection,
            )
            .expect("Could not create test budget")
        };

        let result = get_edit_budget_page(Path(budget.id), State(state), Extension(user_id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}

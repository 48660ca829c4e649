//! Endpoint for updating an existing budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    budget::{
        core::{Budget, update_budget},
        create_endpoint::BudgetForm,
    },
    database_id::DatabaseId,
    endpoints,
    user::UserID,
};

/// The state needed to update a budget.
#[derive(Debug, Clone)]
pub struct EditBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that overwrites the budget with `budget_id` using the
/// submitted form values.
pub async fn edit_budget_endpoint(
    Path(budget_id): Path<DatabaseId>,
    State(state): State<EditBudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let builder = Budget::build(&form.name, form.amount, form.period, form.start_date)
        .category_id(form.category_id)
        .end_date(form.end_date);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_budget(budget_id, builder, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Failed to update budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod edit_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        PasswordHash,
        budget::core::{Budget, BudgetPeriod, create_budget, get_budget},
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
        user::{UserID, create_user},
    };

    use super::{BudgetForm, EditBudgetState, edit_budget_endpoint};

    fn get_test_state() -> (EditBudgetState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            EditBudgetState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn can_update_budget() {
        let (state, user_id) = get_test_state();
        let budget = {
            let connection = state.db_connection.lock().unwrap();
            create_budget(
                Budget::build("Eating out", 200.0, BudgetPeriod::Monthly, date!(2025 - 01 - 01)),
                user_id,
                &connection,
            )
            .expect("Could not create test budget")
        };
        let form = BudgetForm {
            name: "Takeaways".to_owned(),
            amount: 150.0,
            period: BudgetPeriod::Weekly,
            category_id: None,
            start_date: date!(2025 - 02 - 01),
            end_date: Some(date!(2025 - 12 - 31)),
        };

        let response = edit_budget_endpoint(
            Path(budget.id),
            State(state.clone()),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::BUDGETS_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let updated = get_budget(budget.id, user_id, &connection).unwrap();
        assert_eq!(updated.name, "Takeaways");
        assert_eq!(updated.period, BudgetPeriod::Weekly);
        assert_eq!(updated.end_date, Some(date!(2025 - 12 - 31)));
    }

    #[tokio::test]
    async fn updating_missing_budget_returns_not_found() {
        let (state, user_id) = get_test_state();
        let form = BudgetForm {
            name: "Ghost".to_owned(),
            amount: 1.0,
            period: BudgetPeriod::Monthly,
            category_id: None,
            start_date: date!(2025 - 01 - 01),
            end_date: None,
        };

        let response =
            edit_budget_endpoint(Path(999), State(state), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

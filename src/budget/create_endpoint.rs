//! Endpoint for creating a new budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    budget::core::{Budget, BudgetPeriod, create_budget},
    database_id::DatabaseId,
    endpoints,
    user::UserID,
};

/// The state needed to create a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or updating a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    /// The display name of the budget.
    pub name: String,
    /// The spending cap per period.
    pub amount: f64,
    /// How often the budget resets.
    pub period: BudgetPeriod,
    /// The category the budget caps, empty for all spending.
    #[serde(default)]
    pub category_id: Option<DatabaseId>,
    /// The first day of the first period.
    pub start_date: Date,
    /// The last day the budget applies.
    #[serde(default)]
    pub end_date: Option<Date>,
}

/// A route handler for creating a new budget, redirects to the budgets view
/// on success.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
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

    if let Err(error) = create_budget(builder, user_id, &connection) {
        tracing::error!("could not create budget: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

//! Endpoint returning the category `<option>` fragment for transaction forms.
//!
//! The transaction forms reload their category dropdown whenever the user
//! switches between income and expense, so the dropdown only ever offers
//! categories whose type matches the transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::{Category, CategoryType, core::get_categories_by_type},
    database_id::DatabaseId,
    user::UserID,
};

/// The state needed for the category options fragment.
#[derive(Debug, Clone)]
pub struct CategoryOptionsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryOptionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the category options fragment.
#[derive(Debug, Deserialize)]
pub struct CategoryOptionsQuery {
    /// The type of category to list.
    pub category_type: CategoryType,
    /// The category to preselect, if any.
    #[serde(default)]
    pub selected: Option<DatabaseId>,
}

/// Render `<option>` elements for the user's categories of the given type.
pub fn category_options(categories: &[Category], selected: Option<DatabaseId>) -> Markup {
    html! {
        option value="" { "Select a category" }

        @for category in categories {
            option value=(category.id) selected[selected == Some(category.id)]
            {
                (category.name)
            }
        }
    }
}

/// A route handler that returns the category dropdown options for the given
/// category type.
pub async fn get_category_options(
    State(state): State<CategoryOptionsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<CategoryOptionsQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories_by_type(query.category_type, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(category_options(&categories, query.selected).into_response())
}

#[cfg(test)]
mod category_options_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::{Query, State}};
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        category::{CategoryName, CategoryType, create_category, get_category_options},
        db::initialize,
        test_utils::{assert_valid_html, parse_html_fragment},
        user::{UserID, create_user},
    };

    use super::{CategoryOptionsQuery, CategoryOptionsState};

    fn get_test_state() -> (CategoryOptionsState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            CategoryOptionsState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn options_only_include_matching_type() {
        let (state, user_id) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_category(
                CategoryName::new_unchecked("Wages"),
                CategoryType::Income,
                user_id,
                &connection,
            )
            .expect("Could not create test category");
            create_category(
                CategoryName::new_unchecked("Groceries"),
                CategoryType::Expense,
                user_id,
                &connection,
            )
            .expect("Could not create test category");
        }
        let query = CategoryOptionsQuery {
            category_type: CategoryType::Income,
            selected: None,
        };

        let response = get_category_options(State(state), Extension(user_id), Query(query))
            .await
            .expect("Could not get category options");

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let option_selector = scraper::Selector::parse("option").unwrap();
        let labels = html
            .select(&option_selector)
            .map(|option| option.text().collect::<String>())
            .collect::<Vec<_>>();

        assert_eq!(labels, vec!["Select a category", "Wages"]);
    }

    #[tokio::test]
    async fn options_preselect_given_category() {
        let (state, user_id) = get_test_state();
        let category = {
            let connection = state.db_connection.lock().unwrap();
            create_category(
                CategoryName::new_unchecked("Wages"),
                CategoryType::Income,
                user_id,
                &connection,
            )
            .expect("Could not create test category")
        };
        let query = CategoryOptionsQuery {
            category_type: CategoryType::Income,
            selected: Some(category.id),
        };

        let response = get_category_options(State(state), Extension(user_id), Query(query))
            .await
            .expect("Could not get category options");

        let html = parse_html_fragment(response).await;
        let selected_selector = scraper::Selector::parse("option[selected]").unwrap();
        let selected = html.select(&selected_selector).collect::<Vec<_>>();

        assert_eq!(selected.len(), 1, "want 1 selected option");
        assert_eq!(
            selected[0].text().collect::<String>(),
            "Wages",
            "want 'Wages' to be selected"
        );
    }
}

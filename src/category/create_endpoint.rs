//! Defines the endpoint for creating a new category.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    category::{CategoryName, CategoryType, core::create_category},
    user::UserID,
};

/// The state needed to create a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The name of the category.
    pub name: String,
    /// Whether the category is for income or expenses.
    pub category_type: CategoryType,
}

/// A route handler for creating a new category, redirects to the categories
/// view on success.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_category(name, form.category_type, user_id, &connection) {
        tracing::error!("could not create category: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use axum::Form;
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        category::{
            CategoryType, create_category_endpoint,
            create_endpoint::{CategoryForm, CreateCategoryState},
            get_categories,
        },
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
        user::{UserID, create_user},
    };

    fn get_test_state() -> (CreateCategoryState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            CreateCategoryState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn can_create_category() {
        let (state, user_id) = get_test_state();
        let form = CategoryForm {
            name: "Groceries".to_string(),
            category_type: CategoryType::Expense,
        };

        let response =
            create_category_endpoint(State(state.clone()), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let categories = get_categories(user_id, &connection).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_ref(), "Groceries");
        assert_eq!(categories[0].category_type, CategoryType::Expense);
    }

    #[tokio::test]
    async fn create_category_fails_on_empty_name() {
        let (state, user_id) = get_test_state();
        let form = CategoryForm {
            name: "".to_string(),
            category_type: CategoryType::Expense,
        };

        let response = create_category_endpoint(State(state), Extension(user_id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_category_fails_on_duplicate_name() {
        let (state, user_id) = get_test_state();
        let form = CategoryForm {
            name: "Groceries".to_string(),
            category_type: CategoryType::Expense,
        };
        create_category_endpoint(State(state.clone()), Extension(user_id), Form(form))
            .await
            .into_response();

        let duplicate_form = CategoryForm {
            name: "Groceries".to_string(),
            category_type: CategoryType::Expense,
        };
        let response =
            create_category_endpoint(State(state), Extension(user_id), Form(duplicate_form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

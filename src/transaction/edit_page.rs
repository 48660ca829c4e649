//! Displays the form for editing an existing transaction.

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
    asset::get_assets,
    category::get_categories_by_type,
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    transaction::{core::get_transaction, create_page::transaction_form},
    user::UserID,
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that renders the edit form for the transaction with
/// `transaction_id`.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<DatabaseId>,
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection).inspect_err(
        |error| tracing::error!("Failed to retrieve transaction {transaction_id}: {error}"),
    )?;

    let categories = get_categories_by_type(
        transaction.transaction_type.category_type(),
        user_id,
        &connection,
    )
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
                h1 class="text-xl font-bold" { "Edit Transaction" }

                (transaction_form(
                    &format_endpoint(endpoints::EDIT_TRANSACTION, transaction.id),
                    "Save",
                    Some(&transaction),
                    &categories,
                    &assets,
                    today,
                ))
            }
        }
    );

    Ok(base("Edit Transaction", &[dollar_input_styles()], &content).into_response())
}

#[cfg(test)]
mod edit_transaction_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        category::{CategoryName, CategoryType, create_category},
        db::initialize,
        endpoints::{self, format_endpoint},
        test_utils::{assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document},
        transaction::{Transaction, TransactionType, create_transaction},
        user::{UserID, create_user},
    };

    use super::{EditTransactionPageState, get_edit_transaction_page};

    fn get_test_state() -> (EditTransactionPageState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            EditTransactionPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn form_is_prefilled_and_preselects_category() {
        let (state, user_id) = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            let category = create_category(
                CategoryName::new_unchecked("Groceries"),
                CategoryType::Expense,
                user_id,
                &connection,
            )
            .expect("Could not create test category");

            create_transaction(
                Transaction::build(25.0, TransactionType::Expense, date!(2025 - 08 - 01))
                    .category_id(Some(category.id)),
                user_id,
                &connection,
            )
            .expect("Could not create test transaction")
        };

        let response =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(user_id))
                .await
                .expect("Could not get edit transaction page");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::EDIT_TRANSACTION, transaction.id),
            "hx-post",
        );

        let selected_selector = scraper::Selector::parse("option[selected]").unwrap();
        let selected = html
            .select(&selected_selector)
            .next()
            .expect("No preselected category found")
            .text()
            .collect::<String>();
        assert_eq!(selected, "Groceries");
    }

    #[tokio::test]
    async fn another_users_transaction_is_not_found() {
        let (state, user_id) = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            let other_user = create_user(
                "other@example.com",
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .expect("Could not create test user");

            create_transaction(
                Transaction::build(25.0, TransactionType::Expense, date!(2025 - 08 - 01)),
                other_user.id,
                &connection,
            )
            .expect("Could not create test transaction")
        };

        let result =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(user_id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}

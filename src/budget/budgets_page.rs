//! Displays the user's budgets with the amount spent in the current period.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

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
    budget::core::{Budget, budget_spent, current_period_window, get_budgets},
    category::{CategoryName, get_categories},
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base,
        edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A budget together with its derived state for the current period.
struct BudgetCard {
    budget: Budget,
    /// The current period window, `None` when the budget is not active.
    window: Option<(Date, Date)>,
    /// The amount spent in the current period.
    spent: f64,
}

/// Render an overview of the user's budgets.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = OffsetDateTime::now_utc().date();

    let cards = get_budgets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve budgets: {error}"))?
        .into_iter()
        .map(|budget| {
            let window = current_period_window(&budget, today);
            let spent = match window {
                Some(window) => budget_spent(&budget, window, user_id, &connection)?,
                None => 0.0,
            };

            Ok(BudgetCard {
                budget,
                window,
                spent,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let category_names = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect::<HashMap<_, _>>();

    Ok(budgets_view(&cards, &category_names).into_response())
}

fn budget_card(card: &BudgetCard, category_names: &HashMap<DatabaseId, CategoryName>) -> Markup {
    let budget = &card.budget;
    let edit_url = format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id);
    let delete_url = format_endpoint(endpoints::DELETE_BUDGET, budget.id);
    let confirm_message = format!(
        "Are you sure you want to delete the budget '{}'? This cannot be undone.",
        budget.name
    );

    let percent_spent = if budget.amount > 0.0 {
        ((card.spent / budget.amount) * 100.0).min(100.0)
    } else {
        100.0
    };
    let over_budget = card.spent > budget.amount;
    let bar_color = if over_budget {
        "bg-red-600"
    } else {
        "bg-blue-600"
    };

    html!(
        div class=(CARD_STYLE) data-budget-card="true"
        {
            div class="flex justify-between items-start"
            {
                div
                {
                    h2 class="font-bold" { (budget.name) }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        (budget.period)
                        " · "
                        @if let Some(name) = budget
                            .category_id
                            .and_then(|category_id| category_names.get(&category_id))
                        {
                            span class=(BADGE_STYLE) { (name) }
                        } @else {
                            "All spending"
                        }
                    }
                }

                div class="flex gap-4"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &confirm_message,
                        "closest [data-budget-card='true']",
                        "outerHTML",
                    ))
                }
            }

            @match card.window {
                Some((window_start, window_end)) => {
                    p class="text-sm mt-2"
                    {
                        (format_currency(card.spent))
                        " of "
                        (format_currency(budget.amount))
                        " spent between "
                        (window_start)
                        " and "
                        (window_end)
                    }

                    div class="w-full bg-gray-200 rounded-full h-2.5 dark:bg-gray-700 mt-2"
                    {
                        div
                            class={ (bar_color) " h-2.5 rounded-full" }
                            style={ "width: " (percent_spent) "%" }
                        {}
                    }

                    @if over_budget {
                        p class="text-sm text-red-600 dark:text-red-400 mt-1"
                        {
                            "Over budget by "
                            (format_currency(card.spent - budget.amount))
                        }
                    }
                }
                None => {
                    p class="text-sm text-gray-500 dark:text-gray-400 mt-2"
                    {
                        "Not active"
                    }
                }
            }
        }
    )
}

fn budgets_view(
    cards: &[BudgetCard],
    category_names: &HashMap<DatabaseId, CategoryName>,
) -> Markup {
    let new_budget_route = endpoints::NEW_BUDGET_VIEW;
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-3xl lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Budgets" }

                    a href=(new_budget_route) class=(LINK_STYLE)
                    {
                        "Add Budget"
                    }
                }

                @for card in cards {
                    (budget_card(card, category_names))
                }

                @if cards.is_empty() {
                    p class="text-gray-500 dark:text-gray-400"
                    {
                        "No budgets found. Add a budget "
                        a href=(new_budget_route) class=(LINK_STYLE)
                        {
                            "here"
                        }
                        "."
                    }
                }
            }
        }
    );

    base("Budgets", &[], &content)
}

#[cfg(test)]
mod budgets_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        PasswordHash,
        budget::core::{Budget, BudgetPeriod, create_budget},
        db::initialize,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
        transaction::{Transaction, TransactionType, create_transaction},
        user::{UserID, create_user},
    };

    use super::{BudgetsPageState, get_budgets_page};

    fn get_test_state() -> (BudgetsPageState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            BudgetsPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn page_shows_spent_amount_for_current_period() {
        let (state, user_id) = get_test_state();
        let today = OffsetDateTime::now_utc().date();
        {
            let connection = state.db_connection.lock().unwrap();
            create_budget(
                Budget::build("Everything", 100.0, BudgetPeriod::Monthly, today - Duration::days(5)),
                user_id,
                &connection,
            )
            .expect("Could not create test budget");
            create_transaction(
                Transaction::build(30.0, TransactionType::Expense, today - Duration::days(1)),
                user_id,
                &connection,
            )
            .expect("Could not create test transaction");
        }

        let response = get_budgets_page(State(state), Extension(user_id))
            .await
            .expect("Could not get budgets page");

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let card_selector = scraper::Selector::parse("[data-budget-card='true']").unwrap();
        let card_text = html
            .select(&card_selector)
            .next()
            .expect("No budget card found")
            .text()
            .collect::<String>();
        assert!(
            card_text.contains("$30.00 of $100.00 spent"),
            "got {card_text:?}"
        );
    }

    #[tokio::test]
    async fn budget_that_has_not_started_is_shown_as_inactive() {
        let (state, user_id) = get_test_state();
        let today = OffsetDateTime::now_utc().date();
        {
            let connection = state.db_connection.lock().unwrap();
            create_budget(
                Budget::build(
                    "Next year",
                    100.0,
                    BudgetPeriod::Yearly,
                    today + Duration::days(30),
                ),
                user_id,
                &connection,
            )
            .expect("Could not create test budget");
        }

        let response = get_budgets_page(State(state), Extension(user_id))
            .await
            .expect("Could not get budgets page");
        let html = parse_html_document(response).await;

        let card_selector = scraper::Selector::parse("[data-budget-card='true']").unwrap();
        let card_text = html
            .select(&card_selector)
            .next()
            .expect("No budget card found")
            .text()
            .collect::<String>();
        assert!(card_text.contains("Not active"), "got {card_text:?}");
    }
}

//! The landing page for logged in users: net worth plus recent income and
//! expense totals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    asset::{NetWorthSummary, core::get_assets, summarize_assets},
    endpoints,
    html::{CARD_STYLE, PAGE_CONTAINER_STYLE, base, currency_rounded_with_tooltip},
    navigation::NavBar,
    transaction::{TransactionSummary, get_transaction_summary},
    user::UserID,
};

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the dashboard page with the user's net worth and transaction
/// summaries for the last 30 days and the last 12 months.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let assets = get_assets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve assets: {error}"))?;
    let net_worth = summarize_assets(&assets);

    let today = OffsetDateTime::now_utc().date();
    let monthly_summary =
        get_transaction_summary(today - Duration::days(30)..=today, user_id, &connection)
            .inspect_err(|error| {
                tracing::error!("Failed to retrieve monthly summary: {error}")
            })?;
    let yearly_summary =
        get_transaction_summary(today - Duration::days(365)..=today, user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve yearly summary: {error}"))?;

    Ok(dashboard_view(&net_worth, &monthly_summary, &yearly_summary).into_response())
}

fn dashboard_view(
    net_worth: &NetWorthSummary,
    monthly_summary: &TransactionSummary,
    yearly_summary: &TransactionSummary,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                div class=(CARD_STYLE)
                {
                    h2 class="text-sm text-gray-500 dark:text-gray-400" { "Net Worth" }
                    p class="text-2xl font-bold" data-summary="net-worth"
                    {
                        (currency_rounded_with_tooltip(net_worth.net_worth))
                    }

                    a href=(endpoints::ASSETS_VIEW) class="text-sm text-blue-600
                        hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                    {
                        "View assets"
                    }
                }

                (summary_section("Last 30 Days", "monthly", monthly_summary))

                (summary_section("Last 12 Months", "yearly", yearly_summary))
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn summary_section(heading: &str, id: &str, summary: &TransactionSummary) -> Markup {
    html!(
        section class="space-y-2" data-summary=(id)
        {
            h2 class="text-lg font-bold" { (heading) }

            div class="grid grid-cols-3 gap-4"
            {
                div class=(CARD_STYLE)
                {
                    h3 class="text-sm text-gray-500 dark:text-gray-400" { "Income" }
                    p class="text-2xl font-bold text-green-600 dark:text-green-500"
                    {
                        (currency_rounded_with_tooltip(summary.income))
                    }
                }

                div class=(CARD_STYLE)
                {
                    h3 class="text-sm text-gray-500 dark:text-gray-400" { "Expenses" }
                    p class="text-2xl font-bold text-red-600 dark:text-red-500"
                    {
                        (currency_rounded_with_tooltip(summary.expense))
                    }
                }

                div class=(CARD_STYLE)
                {
                    h3 class="text-sm text-gray-500 dark:text-gray-400" { "Net" }
                    p class="text-2xl font-bold"
                    {
                        (currency_rounded_with_tooltip(summary.net()))
                    }
                }
            }
        }
    )
}

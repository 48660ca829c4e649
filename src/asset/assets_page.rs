//! Displays the user's assets and liabilities with net worth summaries.

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
    asset::{
        ASSET_TYPES, Asset, AssetType, NetWorthSummary, core::get_assets, summarize_assets,
    },
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, currency_rounded_with_tooltip,
        edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the assets listing page.
#[derive(Debug, Clone)]
pub struct AssetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AssetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the assets page.
#[derive(Debug, Deserialize)]
pub struct AssetsPageQuery {
    /// Only show assets of this type.
    #[serde(default, rename = "type")]
    pub asset_type: Option<AssetType>,
}

/// Render the assets page, optionally filtered to one asset type.
///
/// The net worth and per-type summary cards always cover every asset, the
/// filter only narrows the listing below them.
pub async fn get_assets_page(
    State(state): State<AssetsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<AssetsPageQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let assets = get_assets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve assets: {error}"))?;

    let summary = summarize_assets(&assets);

    Ok(assets_view(&assets, &summary, query.asset_type).into_response())
}

fn assets_view(assets: &[Asset], summary: &NetWorthSummary, filter: Option<AssetType>) -> Markup {
    let new_asset_route = endpoints::NEW_ASSET_VIEW;
    let nav_bar = NavBar::new(endpoints::ASSETS_VIEW).into_html();
    let has_crypto = assets
        .iter()
        .any(|asset| asset.asset_type == AssetType::Crypto && asset.coin_id.is_some());

    let listed = assets
        .iter()
        .filter(|asset| filter.is_none_or(|filter| asset.asset_type == filter))
        .collect::<Vec<_>>();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Assets" }

                    div class="flex gap-4 items-center"
                    {
                        @if has_crypto {
                            button
                                type="button"
                                class=(BUTTON_SECONDARY_STYLE)
                                hx-post=(endpoints::REFRESH_PRICES)
                                hx-target-error="#alert-container"
                            {
                                "Refresh Prices"
                            }
                        }

                        a href=(new_asset_route) class=(LINK_STYLE)
                        {
                            "Add Asset"
                        }
                    }
                }

                (summary_cards(summary))

                (filter_links(filter))

                (assets_table(&listed, new_asset_route))
            }
        }
    );

    base("Assets", &[], &content)
}

fn summary_cards(summary: &NetWorthSummary) -> Markup {
    html!(
        div class="grid grid-cols-2 md:grid-cols-4 gap-4"
        {
            div class=(CARD_STYLE)
            {
                h2 class="text-sm text-gray-500 dark:text-gray-400" { "Net Worth" }
                p class="text-2xl font-bold" data-summary="net-worth"
                {
                    (currency_rounded_with_tooltip(summary.net_worth))
                }
            }

            @for asset_type in ASSET_TYPES {
                @if let Some(subtotal) = summary.by_type.get(&asset_type) {
                    div class=(CARD_STYLE)
                    {
                        h2 class="text-sm text-gray-500 dark:text-gray-400" { (asset_type) }
                        p class="text-2xl font-bold"
                        {
                            @if asset_type.is_debt() {
                                "-" (currency_rounded_with_tooltip(*subtotal))
                            } @else {
                                (currency_rounded_with_tooltip(*subtotal))
                            }
                        }
                    }
                }
            }
        }
    )
}

fn filter_links(filter: Option<AssetType>) -> Markup {
    let filter_link = |label: &str, url: &str, active: bool| {
        html!(
            a
                href=(url)
                class=(if active { "font-bold underline" } else { LINK_STYLE })
            {
                (label)
            }
        )
    };

    html!(
        nav class="flex flex-wrap gap-3 text-sm" aria-label="Filter assets by type"
        {
            (filter_link("All", endpoints::ASSETS_VIEW, filter.is_none()))

            @for asset_type in ASSET_TYPES {
                (filter_link(
                    &asset_type.to_string(),
                    &format!("{}?type={}", endpoints::ASSETS_VIEW, asset_type.as_str()),
                    filter == Some(asset_type),
                ))
            }
        }
    )
}

fn assets_table(assets: &[&Asset], new_asset_route: &str) -> Markup {
    let table_row = |asset: &Asset| {
        let edit_url = format_endpoint(endpoints::EDIT_ASSET_VIEW, asset.id);
        let delete_url = format_endpoint(endpoints::DELETE_ASSET, asset.id);
        let confirm_message = format!(
            "Are you sure you want to delete '{}'? This cannot be undone.",
            asset.name
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (asset.name)

                    @if let Some(coin_id) = &asset.coin_id {
                        span class="ml-2 text-xs text-gray-500 dark:text-gray-400"
                        { "(" (coin_id) ")" }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (asset.asset_type)
                }

                td class="px-6 py-4 text-right"
                {
                    @if asset.asset_type.is_debt() {
                        "-" (format_currency(asset.value))
                    } @else {
                        (format_currency(asset.value))
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        @if asset.asset_type.is_settleable() {
                            a
                                href=(format_endpoint(endpoints::SETTLE_ASSET_VIEW, asset.id))
                                class=(LINK_STYLE)
                            {
                                "Settle"
                            }
                        }

                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    html!(
        section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
        {
            table class="w-full text-sm text-left rtl:text-right
                text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE)
                        {
                            "Name"
                        }
                        th scope="col" class=(TABLE_CELL_STYLE)
                        {
                            "Type"
                        }
                        th scope="col" class="px-6 py-3 text-right"
                        {
                            "Value"
                        }
                        th scope="col" class=(TABLE_CELL_STYLE)
                        {
                            "Actions"
                        }
                    }
                }

                tbody
                {
                    @for asset in assets {
                        (table_row(asset))
                    }

                    @if assets.is_empty() {
                        tr
                        {
                            td
                                colspan="4"
                                class="px-6 py-4 text-center
                                    text-gray-500 dark:text-gray-400"
                            {
                                "No assets found. Add an asset "
                                a href=(new_asset_route) class=(LINK_STYLE)
                                {
                                    "here"
                                }
                                "."
                            }
                        }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod assets_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
    };
    use rusqlite::Connection;
    use scraper::Html;

    use crate::{
        PasswordHash,
        asset::{Asset, AssetType, create_asset, get_assets_page},
        db::initialize,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
        user::{UserID, create_user},
    };

    use super::{AssetsPageQuery, AssetsPageState};

    fn get_test_state() -> (AssetsPageState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            AssetsPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    async fn render_page(
        state: AssetsPageState,
        user_id: UserID,
        filter: Option<AssetType>,
    ) -> Html {
        let response = get_assets_page(
            State(state),
            Extension(user_id),
            Query(AssetsPageQuery { asset_type: filter }),
        )
        .await
        .expect("Could not get assets page");

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    #[tokio::test]
    async fn net_worth_subtracts_debts() {
        let (state, user_id) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_asset(
                Asset::build("Checking", AssetType::SpendingAccount, 1000.0),
                user_id,
                &connection,
            )
            .expect("Could not create asset");
            create_asset(
                Asset::build("Car loan", AssetType::Debt, 300.0),
                user_id,
                &connection,
            )
            .expect("Could not create asset");
        }

        let html = render_page(state, user_id, None).await;

        let selector = scraper::Selector::parse("p[data-summary='net-worth']").unwrap();
        let net_worth = html
            .select(&selector)
            .next()
            .expect("No net worth card found")
            .text()
            .collect::<String>();
        assert_eq!(net_worth.trim(), "$700");
    }

    #[tokio::test]
    async fn type_filter_narrows_listing_but_not_summary() {
        let (state, user_id) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_asset(
                Asset::build("Checking", AssetType::SpendingAccount, 1000.0),
                user_id,
                &connection,
            )
            .expect("Could not create asset");
            create_asset(
                Asset::build("Bitcoin", AssetType::Crypto, 500.0),
                user_id,
                &connection,
            )
            .expect("Could not create asset");
        }

        let html = render_page(state, user_id, Some(AssetType::Crypto)).await;

        let row_selector = scraper::Selector::parse("tbody th[scope='row']").unwrap();
        let names = html
            .select(&row_selector)
            .map(|row| row.text().collect::<String>().trim().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Bitcoin"]);

        let summary_selector = scraper::Selector::parse("p[data-summary='net-worth']").unwrap();
        let net_worth = html
            .select(&summary_selector)
            .next()
            .expect("No net worth card found")
            .text()
            .collect::<String>();
        assert_eq!(net_worth.trim(), "$1,500", "summary must cover all assets");
    }

    #[tokio::test]
    async fn settle_link_only_shown_for_debts_and_receivables() {
        let (state, user_id) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_asset(
                Asset::build("Checking", AssetType::SpendingAccount, 1000.0),
                user_id,
                &connection,
            )
            .expect("Could not create asset");
            create_asset(
                Asset::build("Car loan", AssetType::Debt, 300.0),
                user_id,
                &connection,
            )
            .expect("Could not create asset");
        }

        let html = render_page(state, user_id, None).await;

        let link_selector = scraper::Selector::parse("a[href]").unwrap();
        let settle_links = html
            .select(&link_selector)
            .filter(|link| {
                link.value()
                    .attr("href")
                    .is_some_and(|href| href.ends_with("/settle"))
            })
            .count();
        assert_eq!(settle_links, 1, "want exactly 1 settle link");
    }

    #[tokio::test]
    async fn refresh_prices_button_only_shown_with_crypto() {
        let (state, user_id) = get_test_state();

        let html = render_page(state.clone(), user_id, None).await;
        let button_selector = scraper::Selector::parse("button[hx-post]").unwrap();
        assert_eq!(html.select(&button_selector).count(), 0);

        {
            let connection = state.db_connection.lock().unwrap();
            create_asset(
                Asset::build("Bitcoin", AssetType::Crypto, 500.0)
                    .coin_id(Some("bitcoin".to_owned())),
                user_id,
                &connection,
            )
            .expect("Could not create asset");
        }

        let html = render_page(state, user_id, None).await;
        assert_eq!(html.select(&button_selector).count(), 1);
    }
}

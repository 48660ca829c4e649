//! Displays the form for creating a new asset or liability.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    asset::{ASSET_TYPES, Asset, DEFAULT_CURRENCY},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base, dollar_input_styles,
    },
    navigation::NavBar,
};

/// The form for creating or editing an asset.
///
/// When `asset` is given the inputs are prefilled with its current values,
/// otherwise the form starts blank with the default currency.
pub(super) fn asset_form(action_url: &str, submit_label: &str, asset: Option<&Asset>) -> Markup {
    let name = asset.map(|asset| asset.name.as_str()).unwrap_or_default();
    let currency = asset
        .map(|asset| asset.currency.as_str())
        .unwrap_or(DEFAULT_CURRENCY);
    let selected_type = asset.map(|asset| asset.asset_type);

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
                    value=(name)
                    required
                    autofocus;
            }

            div
            {
                label for="asset_type" class=(FORM_LABEL_STYLE) { "Type" }
                select
                    name="asset_type"
                    id="asset_type"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for asset_type in ASSET_TYPES {
                        option
                            value=(asset_type.as_str())
                            selected[selected_type == Some(asset_type)]
                        {
                            (asset_type)
                        }
                    }
                }
            }

            div
            {
                label for="value" class=(FORM_LABEL_STYLE) { "Value" }
                div class="input-wrapper w-full"
                {
                    input
                        type="number"
                        name="value"
                        id="value"
                        class=(FORM_TEXT_INPUT_STYLE)
                        value=[asset.map(|asset| asset.value)]
                        step="0.01"
                        min="0";
                }
                p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                {
                    "Enter debts and money owed to you as positive amounts. \
                    For crypto holdings this can be left blank and it will be \
                    calculated from the quantity and current price."
                }
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }
                input
                    type="text"
                    name="currency"
                    id="currency"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(currency)
                    maxlength="8";
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description (optional)" }
                textarea
                    name="description"
                    id="description"
                    class=(FORM_TEXT_INPUT_STYLE)
                    rows="2"
                {
                    @if let Some(description) = asset.and_then(|asset| asset.description.as_deref())
                    {
                        (description)
                    }
                }
            }

            fieldset class="space-y-4 border border-gray-300 dark:border-gray-600 rounded p-4"
            {
                legend class="text-sm font-medium px-1" { "Crypto details (optional)" }

                div
                {
                    label for="coin_id" class=(FORM_LABEL_STYLE) { "Coin ID" }
                    input
                        type="text"
                        name="coin_id"
                        id="coin_id"
                        class=(FORM_TEXT_INPUT_STYLE)
                        value=[asset.and_then(|asset| asset.coin_id.as_deref())]
                        placeholder="e.g. bitcoin";
                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        "The CoinGecko ID used to refresh the price of this holding."
                    }
                }

                div
                {
                    label for="quantity" class=(FORM_LABEL_STYLE) { "Quantity" }
                    input
                        type="number"
                        name="quantity"
                        id="quantity"
                        class=(FORM_TEXT_INPUT_STYLE)
                        value=[asset.and_then(|asset| asset.quantity)]
                        step="any"
                        min="0";
                }

                div
                {
                    label for="buy_price" class=(FORM_LABEL_STYLE) { "Buy price" }
                    div class="input-wrapper w-full"
                    {
                        input
                            type="number"
                            name="buy_price"
                            id="buy_price"
                            class=(FORM_TEXT_INPUT_STYLE)
                            value=[asset.and_then(|asset| asset.buy_price)]
                            step="any"
                            min="0";
                    }
                }

                div
                {
                    label for="current_price" class=(FORM_LABEL_STYLE) { "Current price" }
                    div class="input-wrapper w-full"
                    {
                        input
                            type="number"
                            name="current_price"
                            id="current_price"
                            class=(FORM_TEXT_INPUT_STYLE)
                            value=[asset.and_then(|asset| asset.current_price)]
                            step="any"
                            min="0";
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                (submit_label)
            }
        }
    )
}

/// A route handler that renders the new asset page.
pub async fn get_new_asset_page() -> Response {
    let nav_bar = NavBar::new(endpoints::ASSETS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            section class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "New Asset" }

                (asset_form(endpoints::ASSETS_API, "Create", None))
            }
        }
    );

    base("New Asset", &[dollar_input_styles()], &content).into_response()
}

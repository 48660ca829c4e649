//! Defines the route handler for the page for creating a new category.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    navigation::NavBar,
};

pub(crate) fn create_category_view() -> Markup {
    let create_category_route = endpoints::CATEGORIES_API;
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(create_category_route)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Category" }

                div
                {
                    label
                        for="name"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Name"
                    }

                    input
                        name="name"
                        id="name"
                        type="text"
                        placeholder="e.g. Groceries"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                fieldset
                {
                    legend class=(FORM_LABEL_STYLE) { "Type" }

                    div class=(FORM_RADIO_GROUP_STYLE)
                    {
                        div class="flex items-center gap-2"
                        {
                            input
                                type="radio"
                                name="category_type"
                                id="category-type-expense"
                                value="expense"
                                checked
                                class=(FORM_RADIO_INPUT_STYLE);

                            label
                                for="category-type-expense"
                                class=(FORM_RADIO_LABEL_STYLE)
                            {
                                "Expense"
                            }
                        }

                        div class="flex items-center gap-2"
                        {
                            input
                                type="radio"
                                name="category_type"
                                id="category-type-income"
                                value="income"
                                class=(FORM_RADIO_INPUT_STYLE);

                            label
                                for="category-type-income"
                                class=(FORM_RADIO_LABEL_STYLE)
                            {
                                "Income"
                            }
                        }
                    }
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Create Category"
                }
            }
        }
    };

    base("Create Category", &[], &content)
}

/// Renders the page for creating a category.
pub async fn get_create_category_page() -> Response {
    create_category_view().into_response()
}

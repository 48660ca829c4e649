//! Alert fragments for displaying success and error messages to the client.
//!
//! Alerts are rendered as HTMX out-of-band swaps targeting the alert
//! container that [crate::html::base] places at the bottom of every page, so
//! any endpoint response can carry an alert alongside its main content.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

const SUCCESS_STYLE: &str = "flex items-start justify-between gap-4 p-4 mb-4 \
    text-sm text-green-800 rounded-lg bg-green-50 shadow \
    dark:bg-gray-800 dark:text-green-400";

const ERROR_STYLE: &str = "flex items-start justify-between gap-4 p-4 mb-4 \
    text-sm text-red-800 rounded-lg bg-red-50 shadow \
    dark:bg-gray-800 dark:text-red-400";

/// A success or error message to display to the user.
pub enum Alert {
    /// An error with a summary and a longer explanation.
    Error {
        /// A short summary of what went wrong.
        message: String,
        /// What happened and what the user can do about it.
        details: String,
    },
    /// An error with only a summary.
    ErrorSimple {
        /// A short summary of what went wrong.
        message: String,
    },
    /// A success message with a summary and a longer explanation.
    Success {
        /// A short summary of what succeeded.
        message: String,
        /// Extra detail about the outcome.
        details: String,
    },
    /// A success message with only a summary.
    SuccessSimple {
        /// A short summary of what succeeded.
        message: String,
    },
}

impl Alert {
    /// Create an error alert with a summary and details.
    pub fn error(message: &str, details: &str) -> Self {
        Alert::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a success alert with a summary and details.
    pub fn success(message: &str, details: &str) -> Self {
        Alert::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Render the alert as an out-of-band swap for the alert container.
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
            Alert::ErrorSimple { message } => (ERROR_STYLE, message, None),
            Alert::Success { message, details } => (SUCCESS_STYLE, message, Some(details)),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, None),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(style) role="alert"
                {
                    div
                    {
                        p class="font-medium" { (message) }

                        @if let Some(details) = details
                        {
                            @if !details.is_empty()
                            {
                                p { (details) }
                            }
                        }
                    }

                    button
                        type="button"
                        class="shrink-0 font-bold cursor-pointer"
                        aria-label="Dismiss"
                        onclick="document.getElementById('alert-container').classList.add('hidden')"
                    {
                        "✕"
                    }
                }
            }
        }
    }

    /// Render the alert as an HTTP response with the given status code.
    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_response_with_status(StatusCode::OK)
    }
}

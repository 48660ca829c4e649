//! Helpers for deserializing HTML form submissions.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, de};

/// Deserialize an optional form field, treating the empty string as `None`.
///
/// HTML forms submit unfilled inputs as empty strings, which serde would
/// otherwise reject for non-string types such as `Option<f64>`.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value = Option::<String>::deserialize(deserializer)?;

    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Deserialize an optional text field, treating the empty string as `None`.
///
/// Leading and trailing whitespace is trimmed.
pub fn empty_string_as_none_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;

    Ok(value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty()))
}

#[cfg(test)]
mod forms_tests {
    use serde::Deserialize;

    use super::{empty_string_as_none, empty_string_as_none_text};

    #[derive(Debug, Deserialize)]
    struct TestForm {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        amount: Option<f64>,
        #[serde(default, deserialize_with = "empty_string_as_none_text")]
        description: Option<String>,
    }

    #[test]
    fn empty_strings_become_none() {
        let form: TestForm = serde_urlencoded::from_str("amount=&description=").unwrap();

        assert_eq!(form.amount, None);
        assert_eq!(form.description, None);
    }

    #[test]
    fn missing_fields_become_none() {
        let form: TestForm = serde_urlencoded::from_str("").unwrap();

        assert_eq!(form.amount, None);
        assert_eq!(form.description, None);
    }

    #[test]
    fn filled_fields_parse() {
        let form: TestForm =
            serde_urlencoded::from_str("amount=12.5&description=+groceries+").unwrap();

        assert_eq!(form.amount, Some(12.5));
        assert_eq!(form.description.as_deref(), Some("groceries"));
    }

    #[test]
    fn unparseable_numbers_are_rejected() {
        let result: Result<TestForm, _> = serde_urlencoded::from_str("amount=abc");

        assert!(result.is_err());
    }
}

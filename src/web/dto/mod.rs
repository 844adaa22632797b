pub mod admin;
pub mod auth;
pub mod courses;
pub mod lessons;
pub mod users;

use crate::web::{WebError, WebResult};

/// Required text field: must be present and not blank. Returned as sent.
pub(crate) fn required(field: &str, value: Option<String>) -> WebResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(WebError::validation_missing(field)),
    }
}

/// Like [`required`], but the stored value is trimmed.
pub(crate) fn required_trimmed(field: &str, value: Option<String>) -> WebResult<String> {
    required(field, value).map(|v| v.trim().to_string())
}

/// Optional patch of a required field: absent is fine, blank is not.
pub(crate) fn non_blank(field: &str, value: Option<String>) -> WebResult<Option<String>> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(WebError::validation_invalid(field, "must not be empty"))
        }
        other => Ok(other),
    }
}

pub(crate) fn non_negative(field: &str, value: Option<i32>) -> WebResult<Option<i32>> {
    match value {
        Some(v) if v < 0 => Err(WebError::validation_invalid(field, "must not be negative")),
        other => Ok(other),
    }
}

pub(crate) fn parse_id(field: &str, value: &str) -> WebResult<uuid::Uuid> {
    value
        .trim()
        .parse()
        .map_err(|_| WebError::validation_invalid(field, "must be a valid id"))
}

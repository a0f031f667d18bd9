//! Input validation shared by the handlers.
//!
//! All of these run before the store is touched. A missing or malformed field is a
//! client error (`BadRequest`), never an authorization failure; registration fields
//! are the exception and fail with `NotAcceptable` through `validator`.

use validator::ValidationError;

use crate::error::AppError;

/// Returns the trimmed value of a required text field.
pub fn required_text(value: Option<&str>, field: &str) -> Result<String, AppError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(AppError::BadRequest(format!("{} is required", field))),
    }
}

/// Parses a resource identifier, which must be a positive integer.
pub fn parse_id(value: Option<&str>, field: &str) -> Result<i32, AppError> {
    let raw = match value.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(AppError::BadRequest(format!("{} is required", field))),
    };
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("Invalid {}", field))),
    }
}

/// Registration e-mail rule: must contain "@" and ".com".
pub fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    if email.contains('@') && email.contains(".com") {
        Ok(())
    } else {
        Err(ValidationError::new("email_shape"))
    }
}

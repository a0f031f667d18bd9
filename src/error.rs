//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure of a request ends up as exactly one `AppError`, which maps to a single
//! HTTP status and a short JSON body of the form `{"error": "..."}`.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can simply
//! return `Result<_, AppError>`. `From` implementations for `sqlx::Error`,
//! `validator::ValidationErrors` and `bcrypt::BcryptError` allow the `?` operator
//! to be used against the store, the registration validators and the credential hasher.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Message returned to clients for any server-side failure. The detailed cause is
/// only written to the log.
const GENERIC_FAILURE: &str = "Internal server error";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing or invalid session/CSRF token, or an unknown principal (HTTP 401).
    Unauthorized(String),
    /// Missing or malformed request input (HTTP 400).
    BadRequest(String),
    /// A registration field failed format or uniqueness validation (HTTP 406).
    NotAcceptable(String),
    /// The resource does not exist or is not owned by the caller (HTTP 404).
    /// Both cases are reported identically so that other principals' resources
    /// cannot be probed.
    NotFound(String),
    /// An unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// An error originating from the resource store (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    /// The canonical "not yours or not there" error for a resource kind.
    pub fn not_found_for_caller(kind: &str) -> Self {
        AppError::NotFound(format!("{} not found for this user", kind))
    }

    /// The single error used for every failed login, whatever the cause.
    pub fn invalid_credentials() -> Self {
        AppError::Unauthorized("Invalid username or password".into())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotAcceptable(msg) => write!(f, "Not Acceptable: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Server-side failures are logged here, once, with their full detail; the client
/// only ever sees a generic message for them.
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "error": msg
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "error": msg
            })),
            AppError::NotAcceptable(msg) => HttpResponse::NotAcceptable().json(json!({
                "error": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "error": msg
            })),
            AppError::InternalServerError(msg) => {
                log::error!("internal failure: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": GENERIC_FAILURE
                }))
            }
            AppError::DatabaseError(msg) => {
                log::error!("store failure: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": GENERIC_FAILURE
                }))
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`, every other store error is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::DatabaseError(format!("Migration failed: {}", error))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::NotAcceptable`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::NotAcceptable(error.to_string())
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

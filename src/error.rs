//! Application-level error type for the HTTP boundary.
//!
//! Domain errors from the registration core convert into `AppError` so
//! handlers can use `?` end to end. Responses carry a stable `code` field
//! so clients can distinguish "not eligible" from "already registered"
//! from "tournament full" without parsing messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::registration::error::RegistrationError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    Unauthorized,
    Forbidden,
    Auth(String),
    Registration(RegistrationError),
    Database(sqlx::Error),
    Internal(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        AppError::Registration(err)
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "auth"),
            AppError::Registration(err) => registration_status_and_code(err),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Auth(msg) => msg.clone(),
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::Forbidden => "Not allowed".to_string(),
            AppError::Registration(err) => err.to_string(),
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                "Database error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                "Internal server error".to_string()
            }
        }
    }
}

fn registration_status_and_code(err: &RegistrationError) -> (StatusCode, &'static str) {
    match err {
        RegistrationError::AlreadyRegistered { .. } => (StatusCode::CONFLICT, "already_registered"),
        RegistrationError::NotEligible { .. } => (StatusCode::BAD_REQUEST, "not_eligible"),
        RegistrationError::RegistrationClosed => (StatusCode::BAD_REQUEST, "registration_closed"),
        RegistrationError::AlreadyTerminal { .. } => (StatusCode::CONFLICT, "already_terminal"),
        RegistrationError::RegistrationNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        RegistrationError::TournamentNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        RegistrationError::PaymentNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        RegistrationError::PaymentConflict { .. } => (StatusCode::CONFLICT, "payment_conflict"),
        RegistrationError::IllegalPaymentTransition { .. } => {
            (StatusCode::CONFLICT, "illegal_payment_transition")
        }
        RegistrationError::NotConfirmed { .. } => (StatusCode::CONFLICT, "not_confirmed"),
        RegistrationError::InvalidRankBand { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_rank_band")
        }
        RegistrationError::InconsistentState(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "inconsistent_state")
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.message();

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

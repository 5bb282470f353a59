use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::status::OrderStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("cannot change order status from {current} to {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    #[error("Order was modified concurrently, reload and retry")]
    Conflict,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation { field, message } => AppError::Validation { field, message },
            DomainError::Unauthenticated => AppError::Unauthorized,
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::NotFound(what) => AppError::NotFound(what),
            DomainError::InvalidTransition { from, to } => AppError::InvalidTransition {
                current: from,
                requested: to,
            },
            DomainError::ConcurrencyConflict { .. } => AppError::Conflict,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } | AppError::Conflict => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation { field, message } => json!({
                "error": message,
                "field": field,
            }),
            AppError::InvalidTransition { current, requested } => json!({
                "error": self.to_string(),
                "current_status": current.as_str(),
                "requested_status": requested.as_str(),
            }),
            AppError::Internal(msg) => {
                log::error!("request failed: {}", msg);
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Undecodable JSON bodies get the same 422 shape as domain validation.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Deserialize(e) => {
            log::warn!("rejected body on {}: {}", req.path(), e);
            AppError::Validation {
                field: "body".to_string(),
                message: e.to_string(),
            }
            .into()
        }
        other => other.into(),
    }
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    match err {
        QueryPayloadError::Deserialize(e) => {
            log::warn!("rejected query on {}: {}", req.path(), e);
            AppError::Validation {
                field: "query".to_string(),
                message: e.to_string(),
            }
            .into()
        }
        other => other.into(),
    }
}

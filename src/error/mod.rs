//! Error handling module

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors raised by the gateway client and the router session.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected gateway response: {0}")]
    Parse(String),

    #[error("{0} is not supported by this gateway")]
    NotSupported(&'static str),
}

/// API-facing errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Router(#[from] RouterError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Router(e @ RouterError::NotSupported(_)) => {
                (StatusCode::NOT_IMPLEMENTED, e.to_string())
            }
            AppError::Router(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

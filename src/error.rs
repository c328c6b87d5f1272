use std::any::Any;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::templates;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // An open sqlx::Transaction has already been rolled back by the time we
        // get here: it is dropped uncommitted while the error propagates.
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Page not found"),
            AppError::BadRequest(reason) => {
                warn!(%reason, "bad request");
                (StatusCode::BAD_REQUEST, "Bad request")
            }
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "Upload too large"),
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        };
        error_page(status, message)
    }
}

/// Renders the shared error template. Error pages have no session or profile
/// data, so they only rely on the static parts of the layout.
pub fn error_page(status: StatusCode, message: &str) -> Response {
    match templates::render_error(status, message) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "error template failed to render");
            (status, message.to_string()).into_response()
        }
    }
}

pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "handler panicked");
    error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
}

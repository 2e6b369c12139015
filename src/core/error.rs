use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use minijinja::context;
use thiserror::Error;

use crate::shared::views::{self, TemplateError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("View error: {0}")]
    View(#[from] TemplateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The store rejected an update because the row changed or vanished after it was read.
    #[error("Concurrency conflict: {0}")]
    Concurrency(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store the uploaded image".to_string(),
                )
            }
            AppError::View(ref e) => {
                tracing::error!("View error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Concurrency(ref msg) => {
                tracing::error!("Unresolved concurrency conflict: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The record was modified by another request".to_string(),
                )
            }
        };

        let page = views::render(
            "error.html",
            context! {
                status => status.as_u16(),
                reason => status.canonical_reason().unwrap_or("Error"),
                message => &message,
            },
        );

        match page {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                (status, message).into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

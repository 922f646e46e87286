//! Error types for hifz-web
//!
//! Handlers answer htmx requests, so errors render as HTML fragments the page
//! can swap into place rather than JSON bodies.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ui::layout::{escape, page};
use crate::session::{SessionError, ValidationError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Form input rejected (422)
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Content API failed for data the session cannot do without (502)
    #[error("Content unavailable: {0}")]
    ContentUnavailable(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Invalid(e) => ApiError::Validation(e),
            SessionError::ContentUnavailable(e) => ApiError::ContentUnavailable(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ContentUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Please check the form.",
            ApiError::ContentUnavailable(_) => "The verse source is unavailable right now.",
            ApiError::NotFound(_) => "Not found.",
            ApiError::Internal(_) => "Something went wrong.",
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::ContentUnavailable(_) => "Please try again in a moment.".to_string(),
            ApiError::NotFound(what) => what.clone(),
            ApiError::Internal(_) => String::new(),
        }
    }
}

impl ApiError {
    fn notice(&self) -> String {
        format!(
            r#"<div class="notice notice-error" role="alert"><strong>{}</strong> {}</div>"#,
            escape(self.title()),
            escape(&self.detail())
        )
    }

    /// Full page around the notice, for requests made without htmx
    pub fn into_page_response(self) -> Response {
        let body = format!(
            "{}\n<p><a class=\"button\" href=\"/\">Back to the form</a></p>",
            self.notice()
        );
        (self.status(), Html(page("Quran Memorize", &body))).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.notice();
        (self.status(), Html(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

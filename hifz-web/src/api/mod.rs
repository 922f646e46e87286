//! HTTP API handlers for hifz-web

pub mod health;
pub mod ui;

pub use health::health_routes;
pub use ui::{static_routes, ui_routes};

use crate::ApiError;

/// Fallback for unknown routes
pub async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

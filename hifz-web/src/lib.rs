//! hifz-web library - memorization web front end
//!
//! Exposes the router and application state for the server binary and for
//! integration tests.

use std::sync::Arc;

use axum::Router;
use hifz_common::config::ServerConfig;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cli;
pub mod content;
pub mod error;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use crate::content::ContentSource;

/// Application state shared across HTTP handlers
///
/// Read-only after startup; requests never share mutable state.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration
    pub config: Arc<ServerConfig>,
    /// Remote verse catalog
    pub content: Arc<dyn ContentSource>,
    /// `ads.txt` override loaded at startup
    pub ads_txt: Option<Arc<str>>,
}

impl AppState {
    pub fn new(config: ServerConfig, content: Arc<dyn ContentSource>) -> Self {
        Self {
            config: Arc::new(config),
            content,
            ads_txt: None,
        }
    }

    pub fn with_ads_txt(mut self, ads_txt: impl Into<Arc<str>>) -> Self {
        self.ads_txt = Some(ads_txt.into());
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // UI routes (HTML pages and fragments)
        .merge(api::ui_routes())
        // PWA artifacts and client scripts
        .merge(api::static_routes())
        .merge(api::health_routes())
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! UI Routes - HTML pages, fragments and static client assets
//!
//! # Structure
//! - **Layout** (`layout`): page shell and escaping helpers
//! - **Home** (`home`): session setup form
//! - **Memorize** (`memorize`): session fragment with embedded session data
//! - **Static Assets** (`static_assets`): playback driver, styles, PWA files

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod home;
pub mod layout;
pub mod memorize;
pub mod static_assets;

use home::home_page;
use memorize::memorize;
use static_assets::{
    serve_ads_txt, serve_hifz_css, serve_icon, serve_manifest, serve_playback_js,
    serve_service_worker,
};

/// Build page routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home_page))
        .route("/memorize", post(memorize))
}

/// Build static asset routes
pub fn static_routes() -> Router<AppState> {
    Router::new()
        .route("/static/playback.js", get(serve_playback_js))
        .route("/static/hifz.css", get(serve_hifz_css))
        .route("/manifest.webmanifest", get(serve_manifest))
        .route("/sw.js", get(serve_service_worker))
        .route("/icon.svg", get(serve_icon))
        .route("/ads.txt", get(serve_ads_txt))
}

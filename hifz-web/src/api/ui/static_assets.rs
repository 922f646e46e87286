//! Static asset handlers
//!
//! Embeds the client script, styles and PWA files at compile time

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;

const PLAYBACK_JS: &str = include_str!("../../../static/playback.js");
const HIFZ_CSS: &str = include_str!("../../../static/hifz.css");
const MANIFEST: &str = include_str!("../../../static/manifest.webmanifest");
const SERVICE_WORKER_JS: &str = include_str!("../../../static/sw.js");
const ICON_SVG: &str = include_str!("../../../static/icon.svg");
const ADS_TXT: &str = include_str!("../../../static/ads.txt");

fn asset(content_type: &'static str, cache_control: &'static str, body: &'static str) -> Response {
    (
        StatusCode::OK,
        [("content-type", content_type), ("cache-control", cache_control)],
        body,
    )
        .into_response()
}

/// GET /static/playback.js
///
/// Serves the playback driver
pub async fn serve_playback_js() -> Response {
    asset("application/javascript", "no-cache", PLAYBACK_JS)
}

/// GET /static/hifz.css
pub async fn serve_hifz_css() -> Response {
    asset("text/css", "no-cache", HIFZ_CSS)
}

/// GET /manifest.webmanifest
pub async fn serve_manifest() -> Response {
    asset("application/manifest+json", "public, max-age=86400", MANIFEST)
}

/// GET /sw.js
///
/// Must not be cached by the browser, or service worker updates stall
pub async fn serve_service_worker() -> Response {
    asset(
        "application/javascript",
        "no-cache, no-store, must-revalidate",
        SERVICE_WORKER_JS,
    )
}

/// GET /icon.svg
pub async fn serve_icon() -> Response {
    asset("image/svg+xml", "public, max-age=604800", ICON_SVG)
}

/// GET /ads.txt
///
/// Serves the configured override when one was loaded at startup
pub async fn serve_ads_txt(State(state): State<AppState>) -> Response {
    match state.ads_txt {
        Some(content) => (
            StatusCode::OK,
            [
                ("content-type", "text/plain; charset=utf-8"),
                ("cache-control", "public, max-age=86400"),
            ],
            content.to_string(),
        )
            .into_response(),
        None => asset("text/plain; charset=utf-8", "public, max-age=86400", ADS_TXT),
    }
}

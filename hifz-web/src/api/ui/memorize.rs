//! Memorize handler - builds a session and renders the player fragment
//!
//! The fragment carries only data: the session JSON in a
//! `<script type="application/json">` block. `/static/playback.js` finds it after
//! htmx swaps the fragment in and drives playback from it.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    Form,
};
use hifz_common::content::SessionData;
use tracing::{error, info};

use super::layout::{escape, json_for_script, page};
use crate::session::{build_session, MemorizeForm, SessionError};
use crate::{ApiError, ApiResult, AppState};

/// POST /memorize
///
/// htmx requests get the fragment; plain form posts get a full page around it,
/// errors included.
pub async fn memorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<MemorizeForm>,
) -> Response {
    let htmx = headers.contains_key("hx-request");

    match session_fragment(&state, &form).await {
        Ok(fragment) if htmx => Html(fragment).into_response(),
        Ok(fragment) => {
            let body = format!(
                "{}\n<p><a class=\"button\" href=\"/\">New session</a></p>",
                fragment
            );
            Html(page("Quran Memorize - Session", &body)).into_response()
        }
        Err(e) if htmx => e.into_response(),
        Err(e) => e.into_page_response(),
    }
}

async fn session_fragment(state: &AppState, form: &MemorizeForm) -> ApiResult<String> {
    let config = &state.config;

    let request = form
        .validate(&config.session, config.content.default_reciter)
        .map_err(|e| {
            info!(error = %e, "Rejected session request");
            ApiError::from(e)
        })?;

    info!(
        range = %request.range.label(),
        reciter = request.reciter,
        translation = ?request.translation,
        repeats = request.repeats,
        "Starting memorization session"
    );

    let data = build_session(
        state.content.as_ref(),
        &request,
        config.content.audio_lookup_concurrency,
    )
    .await
    .map_err(|e| {
        match &e {
            SessionError::ContentUnavailable(err) => {
                error!(range = %request.range.label(), error = %err, "Verse text unavailable")
            }
            SessionError::Invalid(err) => info!(error = %err, "Rejected session request"),
        }
        ApiError::from(e)
    })?;

    render_session(&data)
}

/// Player fragment for one session
pub fn render_session(data: &SessionData) -> ApiResult<String> {
    let json = json_for_script(data).map_err(|e| ApiError::Internal(e.to_string()))?;

    let label = data.range().map_err(|e| ApiError::Internal(e.to_string()))?.label();

    let missing_audio = data.verses.iter().filter(|v| v.audio_url.is_none()).count();
    let audio_notice = if missing_audio > 0 {
        format!(
            r#"<div class="notice notice-warning" role="status">Audio is unavailable for {} verse(s); use Next to continue past them.</div>"#,
            missing_audio
        )
    } else {
        String::new()
    };

    Ok(format!(
        r#"<section class="session" data-hifz-player>
    <h2>Memorizing {label}</h2>
    <p class="session-summary">{steps} steps, {total} repetitions, {repeats}x each</p>
    {audio_notice}
    <div class="player-progress" data-role="progress" hidden></div>
    <div class="player-stage" data-role="stage">
        <button type="button" class="button button-primary" data-action="start">Start session</button>
    </div>
    <div class="notice notice-warning" data-role="audio-notice" role="status" hidden></div>
    <script type="application/json" data-role="session-data">{json}</script>
</section>"#,
        label = escape(&label),
        steps = data.pattern.len(),
        total = data.total_repetitions,
        repeats = data.repeats,
        audio_notice = audio_notice,
        json = json,
    ))
}

//! Session setup: form validation and content assembly
//!
//! A session request is validated completely before any remote call. Content is
//! then fetched once: verse text (with translation) in one paged lookup, audio
//! one lookup per verse. Missing audio or translation degrades the session;
//! missing verse text fails it.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use hifz_common::config::SessionLimits;
use hifz_common::content::{SessionData, VerseContent};
use hifz_common::VerseRange;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::content::{ContentError, ContentSource};

/// Raw `POST /memorize` form; fields are parsed by [`MemorizeForm::validate`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemorizeForm {
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub reciter: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub repeats: Option<String>,
}

/// Form input rejected before pattern generation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a whole number, got \"{value}\"")]
    NotANumber { field: &'static str, value: String },

    #[error("{0}")]
    InvalidRange(String),

    #[error("repeats must be between 1 and {max}, got {requested}")]
    Repeats { requested: u32, max: u32 },

    #[error("a session covers at most {max} verses, {requested} requested")]
    TooManyVerses { requested: u32, max: u32 },

    #[error("chapter {chapter} has no verse {verse}")]
    PastChapterEnd { chapter: u32, verse: u32 },
}

/// Failure to set up a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("verse text unavailable: {0}")]
    ContentUnavailable(#[from] ContentError),
}

/// Validated session parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub range: VerseRange,
    pub reciter: u32,
    pub translation: Option<u32>,
    pub repeats: u32,
}

impl MemorizeForm {
    /// Parse and bound-check every field
    ///
    /// An absent reciter falls back to `default_reciter`; an absent, empty or
    /// `none` translation means no translation.
    pub fn validate(
        &self,
        limits: &SessionLimits,
        default_reciter: u32,
    ) -> Result<SessionRequest, ValidationError> {
        let chapter = required_number("chapter", &self.chapter)?;
        let start = required_number("start", &self.start)?;
        let end = required_number("end", &self.end)?;
        let repeats = required_number("repeats", &self.repeats)?;

        let reciter = optional_number("reciter", &self.reciter)?.unwrap_or(default_reciter);
        let translation = match self.translation.as_deref().map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("none") => None,
            _ => optional_number("translation", &self.translation)?,
        };

        let range = VerseRange::new(chapter, start, end)
            .map_err(|e| ValidationError::InvalidRange(range_message(e)))?;

        if repeats < 1 || repeats > limits.max_repeats {
            return Err(ValidationError::Repeats {
                requested: repeats,
                max: limits.max_repeats,
            });
        }
        if range.verse_count() > limits.max_verses {
            return Err(ValidationError::TooManyVerses {
                requested: range.verse_count(),
                max: limits.max_verses,
            });
        }

        Ok(SessionRequest {
            range,
            reciter,
            translation,
            repeats,
        })
    }
}

fn range_message(err: hifz_common::Error) -> String {
    match err {
        hifz_common::Error::InvalidRange(msg) => msg,
        other => other.to_string(),
    }
}

fn required_number(field: &'static str, value: &Option<String>) -> Result<u32, ValidationError> {
    optional_number(field, value)?.ok_or(ValidationError::Missing(field))
}

fn optional_number(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<u32>, ValidationError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ValidationError::NotANumber {
                field,
                value: text.to_string(),
            }),
    }
}

/// Fetch everything a session needs and assemble [`SessionData`]
///
/// Audio lookups run in verse order with at most `audio_concurrency` in flight.
pub async fn build_session(
    source: &dyn ContentSource,
    request: &SessionRequest,
    audio_concurrency: usize,
) -> Result<SessionData, SessionError> {
    let range = request.range;

    let texts = source
        .fetch_verses(range.chapter(), range.start(), range.end(), request.translation)
        .await?;

    match texts.keys().next_back() {
        None => {
            return Err(ValidationError::PastChapterEnd {
                chapter: range.chapter(),
                verse: range.start(),
            }
            .into())
        }
        Some(&last) if last < range.end() => {
            return Err(ValidationError::PastChapterEnd {
                chapter: range.chapter(),
                verse: range.end(),
            }
            .into())
        }
        Some(_) => {}
    }

    let audio = fetch_audio_urls(source, request, audio_concurrency.max(1)).await;

    let mut texts = texts;
    let verses: Vec<VerseContent> = range
        .verses()
        .map(|number| {
            let text = texts.remove(&number);
            if text.is_none() {
                warn!(chapter = range.chapter(), verse = number, "Verse text missing from content source");
            }
            if request.translation.is_some()
                && text.as_ref().map_or(false, |t| t.translation_text.is_none())
            {
                debug!(verse = number, "Translation missing for verse");
            }
            let (arabic_text, translation_text) = match text {
                Some(t) => (t.arabic_text, t.translation_text),
                None => (String::new(), None),
            };
            VerseContent {
                number,
                arabic_text,
                translation_text,
                audio_url: audio.get(&number).cloned().flatten(),
            }
        })
        .collect();

    Ok(SessionData::new(
        range,
        request.repeats,
        request.reciter,
        request.translation,
        verses,
    ))
}

async fn fetch_audio_urls(
    source: &dyn ContentSource,
    request: &SessionRequest,
    concurrency: usize,
) -> BTreeMap<u32, Option<String>> {
    let chapter = request.range.chapter();
    let reciter = request.reciter;

    stream::iter(request.range.verses())
        .map(|verse| async move {
            let url = match source.fetch_audio_url(reciter, chapter, verse).await {
                Ok(url) => {
                    if url.is_none() {
                        warn!(reciter, chapter, verse, "No recitation audio for verse");
                    }
                    url
                }
                Err(e) => {
                    warn!(reciter, chapter, verse, error = %e, "Audio lookup failed");
                    None
                }
            };
            (verse, url)
        })
        .buffered(concurrency)
        .collect()
        .await
}

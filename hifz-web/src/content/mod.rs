//! Remote content source
//!
//! The web layer talks to the verse catalog only through [`ContentSource`], so
//! handlers can be exercised against an in-process fake.

use std::collections::BTreeMap;

use async_trait::async_trait;
use hifz_common::content::{Chapter, Reciter, Translation, VerseText};
use thiserror::Error;

pub mod quran_com;

pub use quran_com::QuranComClient;

/// Content source errors
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Verse catalog, translations and recitation audio
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// All chapters in canonical order
    async fn fetch_chapters(&self) -> Result<Vec<Chapter>, ContentError>;

    async fn fetch_reciters(&self) -> Result<Vec<Reciter>, ContentError>;

    async fn fetch_translations(&self) -> Result<Vec<Translation>, ContentError>;

    /// Verse text for `start..=end`, keyed by verse number
    ///
    /// Verses past the end of the chapter are simply absent from the result.
    async fn fetch_verses(
        &self,
        chapter: u32,
        start: u32,
        end: u32,
        translation: Option<u32>,
    ) -> Result<BTreeMap<u32, VerseText>, ContentError>;

    /// Audio URL of one verse for one reciter, `None` if the reciter has no clip
    async fn fetch_audio_url(
        &self,
        reciter: u32,
        chapter: u32,
        verse: u32,
    ) -> Result<Option<String>, ContentError>;
}

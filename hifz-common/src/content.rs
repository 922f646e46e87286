//! Content data model
//!
//! Catalog entries and verse content as used by the web layer, independent of
//! the remote API's wire format.

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;
use crate::playback::PlaybackSession;
use crate::range::VerseRange;
use crate::Result;

/// Chapter (surah) catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u32,
    /// Transliterated name (e.g. "Al-Fatihah")
    pub display_name: String,
    /// Name in Arabic script
    pub native_name: String,
    pub verse_count: u32,
}

/// Reciter (qari) catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reciter {
    pub id: u32,
    pub name: String,
    /// Recitation style (e.g. "Murattal"), when the catalog has one
    pub style: Option<String>,
}

impl Reciter {
    pub fn label(&self) -> String {
        match &self.style {
            Some(style) if !style.is_empty() => format!("{} ({})", self.name, style),
            _ => self.name.clone(),
        }
    }
}

/// Translation catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: u32,
    pub name: String,
    pub author: Option<String>,
    pub language: String,
}

/// Verse text as returned by the content source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseText {
    pub arabic_text: String,
    pub translation_text: Option<String>,
}

/// Everything the player needs for one verse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseContent {
    /// Absolute verse number within the chapter
    pub number: u32,
    pub arabic_text: String,
    pub translation_text: Option<String>,
    pub audio_url: Option<String>,
}

/// Session payload embedded in the rendered page for the client-side driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub chapter: u32,
    pub start: u32,
    pub end: u32,
    pub repeats: u32,
    pub reciter: u32,
    pub translation: Option<u32>,
    pub pattern: Pattern,
    /// Ordered by verse number
    pub verses: Vec<VerseContent>,
    pub total_repetitions: u64,
}

impl SessionData {
    pub fn new(
        range: VerseRange,
        repeats: u32,
        reciter: u32,
        translation: Option<u32>,
        verses: Vec<VerseContent>,
    ) -> Self {
        let pattern = range.pattern(repeats);
        let total_repetitions = pattern.total_repetitions();
        Self {
            chapter: range.chapter(),
            start: range.start(),
            end: range.end(),
            repeats,
            reciter,
            translation,
            pattern,
            verses,
            total_repetitions,
        }
    }

    /// Verse range this session covers
    pub fn range(&self) -> Result<VerseRange> {
        VerseRange::new(self.chapter, self.start, self.end)
    }

    pub fn verse(&self, number: u32) -> Option<&VerseContent> {
        self.verses.iter().find(|v| v.number == number)
    }

    /// Verses with audio, in order
    pub fn playable_verses(&self) -> impl Iterator<Item = u32> + '_ {
        self.verses
            .iter()
            .filter(|v| v.audio_url.is_some())
            .map(|v| v.number)
    }

    /// Idle playback session over this data
    pub fn playback_session(&self) -> PlaybackSession {
        PlaybackSession::new(self.pattern.clone(), self.playable_verses())
    }
}

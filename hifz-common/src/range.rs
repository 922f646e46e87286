//! Verse range selection
//!
//! A [`VerseRange`] is the validated `(chapter, start, end)` triple a session is
//! built from. It can only be constructed through [`VerseRange::new`], so every
//! range handed to the pattern generator already satisfies `1 <= start <= end`.

use serde::{Deserialize, Serialize};

use crate::pattern::{generate, Pattern};
use crate::{Error, Result};

/// Number of chapters (surahs) in the text
pub const CHAPTER_COUNT: u32 = 114;

/// Inclusive range of verses within one chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRange {
    chapter: u32,
    start: u32,
    end: u32,
}

impl VerseRange {
    /// Validate and build a range
    pub fn new(chapter: u32, start: u32, end: u32) -> Result<Self> {
        if chapter < 1 || chapter > CHAPTER_COUNT {
            return Err(Error::InvalidRange(format!(
                "chapter must be between 1 and {}, got {}",
                CHAPTER_COUNT, chapter
            )));
        }
        if start < 1 {
            return Err(Error::InvalidRange(
                "start verse must be at least 1".to_string(),
            ));
        }
        if end < 1 {
            return Err(Error::InvalidRange(
                "end verse must be at least 1".to_string(),
            ));
        }
        if start > end {
            return Err(Error::InvalidRange(format!(
                "start verse ({}) is after end verse ({})",
                start, end
            )));
        }

        Ok(Self { chapter, start, end })
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of verses in the range (always >= 1)
    pub fn verse_count(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Absolute verse numbers covered by the range, in order
    pub fn verses(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    /// Build the session pattern with absolute verse numbers
    pub fn pattern(&self, repeats: u32) -> Pattern {
        generate(self.verse_count(), repeats).offset(self.start - 1)
    }

    /// `chapter:start-end` label used in headings and logs
    pub fn label(&self) -> String {
        if self.start == self.end {
            format!("{}:{}", self.chapter, self.start)
        } else {
            format!("{}:{}-{}", self.chapter, self.start, self.end)
        }
    }
}

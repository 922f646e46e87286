//! # hifz Common Library
//!
//! Shared code for the hifz memorization service:
//! - Verse range and content data model
//! - Pattern generation (progressive-overlap repetition schedule)
//! - Playback driver state machine
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod content;
pub mod error;
pub mod pattern;
pub mod playback;
pub mod range;

pub use error::{Error, Result};
pub use pattern::{generate, MemorizationStep, Pattern};
pub use playback::{Effect, PlaybackEvent, PlaybackSession, PlaybackState};
pub use range::VerseRange;

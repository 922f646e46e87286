//! Memorization pattern generator
//!
//! Expands a verse count into a progressive-overlap schedule: each new verse is
//! recited together with every verse before it, then drilled on its own.
//!
//! For three verses and two repeats:
//!
//! ```text
//! [1] x2, [1,2] x2, [2] x2, [1,2,3] x2, [3] x2
//! ```
//!
//! Verse numbers produced by [`generate`] are relative (1-based). Use
//! [`Pattern::offset`] or [`crate::VerseRange::pattern`] for absolute numbers.

use serde::{Deserialize, Serialize};

/// One entry of a pattern: a group of verses recited together, `repeat_count` times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorizationStep {
    /// Non-empty, strictly increasing
    pub verse_numbers: Vec<u32>,
    pub repeat_count: u32,
}

impl MemorizationStep {
    pub fn new(verse_numbers: Vec<u32>, repeat_count: u32) -> Self {
        Self {
            verse_numbers,
            repeat_count,
        }
    }
}

/// Ordered sequence of memorization steps for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern {
    steps: Vec<MemorizationStep>,
}

impl Pattern {
    pub fn steps(&self) -> &[MemorizationStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&MemorizationStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Shift every verse number by `by`
    ///
    /// A pattern generated for `n` verses is offset by `start - 1` to cover
    /// `start..=start + n - 1`.
    pub fn offset(&self, by: u32) -> Pattern {
        let steps = self
            .steps
            .iter()
            .map(|step| MemorizationStep {
                verse_numbers: step.verse_numbers.iter().map(|v| v + by).collect(),
                repeat_count: step.repeat_count,
            })
            .collect();
        Pattern { steps }
    }

    /// Sum of all repeat counts; the number of advances needed to finish the session
    pub fn total_repetitions(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.repeat_count)).sum()
    }

    /// Total number of verse recitations across the session
    pub fn total_recitations(&self) -> u64 {
        self.steps
            .iter()
            .map(|s| s.verse_numbers.len() as u64 * u64::from(s.repeat_count))
            .sum()
    }
}

impl From<Vec<MemorizationStep>> for Pattern {
    fn from(steps: Vec<MemorizationStep>) -> Self {
        Self { steps }
    }
}

/// Generate the memorization pattern for `n_verses` verses
///
/// Callers validate `n_verses >= 1` and `repeats >= 1` beforehand; `n_verses == 0`
/// yields an empty pattern.
pub fn generate(n_verses: u32, repeats: u32) -> Pattern {
    let capacity = (n_verses as usize * 2).saturating_sub(1);
    let mut steps = Vec::with_capacity(capacity);

    // Step 2i-3 reviews verses 1..=i, step 2i-2 drills verse i alone
    for i in 1..=n_verses {
        if i > 1 {
            steps.push(MemorizationStep::new((1..=i).collect(), repeats));
        }
        steps.push(MemorizationStep::new(vec![i], repeats));
    }

    Pattern { steps }
}

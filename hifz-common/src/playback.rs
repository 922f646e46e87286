//! Playback driver state machine
//!
//! Walks a [`Pattern`] one repetition at a time, chaining the audio clips of each
//! step. The browser runs the same transitions in `playback.js`; this module is
//! the reference model and is what the `hifz-plan` CLI drives.
//!
//! ```text
//! Idle --Start--> Playing(0, 0) --advance--> ... --advance--> Complete
//! ```
//!
//! The session is owned: [`PlaybackSession::handle`] consumes it and returns the
//! next session together with the effects the caller has to perform (render a
//! step, start a clip, ...). Nothing else mutates it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

/// Driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    /// Waiting for the user to start; autoplay needs a user gesture
    Idle,
    /// `clip_index` is the position in the step's verse list of the clip now
    /// playing, or the list length when no clip is playing
    Playing {
        step_index: usize,
        rep_index: u32,
        clip_index: usize,
    },
    /// Terminal
    Complete,
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// User pressed start
    Start,
    /// The current clip finished playing
    ClipEnded,
    /// The current clip could not start (e.g. autoplay blocked)
    ClipFailed,
    /// User pressed next; skips the remaining clips of this repetition
    Next,
}

/// Work the caller performs after a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    RenderStep {
        step_index: usize,
        rep_index: u32,
        verses: Vec<u32>,
    },
    PlayClip {
        verse: u32,
    },
    ReportAudioFailure {
        verse: u32,
    },
    RenderComplete,
}

/// One memorization run over a pattern
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pattern: Pattern,
    playable: BTreeSet<u32>,
    state: PlaybackState,
    completed_repetitions: u64,
}

impl PlaybackSession {
    /// Create an idle session
    ///
    /// `playable` lists the verses that have an audio clip; others are skipped
    /// when chaining audio.
    pub fn new(pattern: Pattern, playable: impl IntoIterator<Item = u32>) -> Self {
        Self {
            pattern,
            playable: playable.into_iter().collect(),
            state: PlaybackState::Idle,
            completed_repetitions: 0,
        }
    }

    /// Session where every verse has audio
    pub fn with_all_audio(pattern: Pattern) -> Self {
        let playable: Vec<u32> = pattern
            .steps()
            .iter()
            .flat_map(|s| s.verse_numbers.iter().copied())
            .collect();
        Self::new(pattern, playable)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn is_complete(&self) -> bool {
        self.state == PlaybackState::Complete
    }

    /// Repetitions finished so far (automatic or manual advances)
    pub fn completed_repetitions(&self) -> u64 {
        self.completed_repetitions
    }

    /// Verse whose clip is currently playing, if any
    pub fn current_clip(&self) -> Option<u32> {
        match self.state {
            PlaybackState::Playing {
                step_index,
                clip_index,
                ..
            } => self
                .pattern
                .step(step_index)
                .and_then(|s| s.verse_numbers.get(clip_index).copied()),
            _ => None,
        }
    }

    /// Apply one event
    pub fn handle(mut self, event: PlaybackEvent) -> (Self, Vec<Effect>) {
        let mut effects = Vec::new();

        match (self.state, event) {
            (PlaybackState::Idle, PlaybackEvent::Start) => {
                self.enter_step(0, 0, &mut effects);
            }
            (PlaybackState::Playing { step_index, rep_index, clip_index }, PlaybackEvent::ClipEnded) => {
                let Some(step) = self.pattern.step(step_index) else {
                    return (self, effects);
                };
                if clip_index >= step.verse_numbers.len() {
                    // Stale event, nothing is playing
                    return (self, effects);
                }
                match self.next_playable(step_index, clip_index + 1) {
                    Some(next) => {
                        self.state = PlaybackState::Playing {
                            step_index,
                            rep_index,
                            clip_index: next,
                        };
                        effects.push(Effect::PlayClip {
                            verse: step.verse_numbers[next],
                        });
                    }
                    None => self.advance(step_index, rep_index, &mut effects),
                }
            }
            (PlaybackState::Playing { .. }, PlaybackEvent::ClipFailed) => {
                if let Some(verse) = self.current_clip() {
                    effects.push(Effect::ReportAudioFailure { verse });
                }
            }
            (PlaybackState::Playing { step_index, rep_index, .. }, PlaybackEvent::Next) => {
                self.advance(step_index, rep_index, &mut effects);
            }
            // Idle waits for Start, Complete absorbs everything, Start is one-shot
            _ => {}
        }

        (self, effects)
    }

    fn advance(&mut self, step_index: usize, rep_index: u32, effects: &mut Vec<Effect>) {
        self.completed_repetitions += 1;

        let repeat_count = self
            .pattern
            .step(step_index)
            .map(|s| s.repeat_count)
            .unwrap_or(0);

        let (mut step_index, mut rep_index) = (step_index, rep_index + 1);
        if rep_index >= repeat_count {
            step_index += 1;
            rep_index = 0;
        }

        self.enter_step(step_index, rep_index, effects);
    }

    fn enter_step(&mut self, step_index: usize, rep_index: u32, effects: &mut Vec<Effect>) {
        let Some(step) = self.pattern.step(step_index) else {
            self.state = PlaybackState::Complete;
            effects.push(Effect::RenderComplete);
            return;
        };

        effects.push(Effect::RenderStep {
            step_index,
            rep_index,
            verses: step.verse_numbers.clone(),
        });

        let clip_index = match self.next_playable(step_index, 0) {
            Some(index) => {
                effects.push(Effect::PlayClip {
                    verse: step.verse_numbers[index],
                });
                index
            }
            // No audio at all; wait for a manual Next
            None => step.verse_numbers.len(),
        };

        self.state = PlaybackState::Playing {
            step_index,
            rep_index,
            clip_index,
        };
    }

    fn next_playable(&self, step_index: usize, from: usize) -> Option<usize> {
        let step = self.pattern.step(step_index)?;
        (from..step.verse_numbers.len()).find(|&i| self.playable.contains(&step.verse_numbers[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::generate;

    fn start(session: PlaybackSession) -> (PlaybackSession, Vec<Effect>) {
        session.handle(PlaybackEvent::Start)
    }

    /// Press Next until complete, returning the number of presses
    fn advances_to_complete(mut session: PlaybackSession) -> u64 {
        let mut count = 0;
        while !session.is_complete() {
            session = session.handle(PlaybackEvent::Next).0;
            count += 1;
            assert!(count < 10_000, "session never completed");
        }
        count
    }

    #[test]
    fn test_idle_until_start() {
        let session = PlaybackSession::with_all_audio(generate(2, 1));
        let (session, effects) = session.handle(PlaybackEvent::Next);
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(effects.is_empty());

        let (session, effects) = session.handle(PlaybackEvent::ClipEnded);
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_start_renders_first_step_and_plays() {
        let (session, effects) = start(PlaybackSession::with_all_audio(generate(3, 2)));
        assert_eq!(
            session.state(),
            PlaybackState::Playing {
                step_index: 0,
                rep_index: 0,
                clip_index: 0
            }
        );
        assert_eq!(
            effects,
            vec![
                Effect::RenderStep {
                    step_index: 0,
                    rep_index: 0,
                    verses: vec![1]
                },
                Effect::PlayClip { verse: 1 },
            ]
        );
    }

    #[test]
    fn test_second_start_is_ignored() {
        let (session, _) = start(PlaybackSession::with_all_audio(generate(3, 2)));
        let before = session.state();
        let (session, effects) = session.handle(PlaybackEvent::Start);
        assert_eq!(session.state(), before);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_advances_needed_equals_total_repetitions() {
        let (session, _) = start(PlaybackSession::with_all_audio(generate(3, 2)));
        assert_eq!(advances_to_complete(session), 10);

        let (session, _) = start(PlaybackSession::with_all_audio(generate(1, 5)));
        assert_eq!(advances_to_complete(session), 5);

        let pattern = generate(7, 3);
        let expected = pattern.total_repetitions();
        let (session, _) = start(PlaybackSession::with_all_audio(pattern));
        assert_eq!(advances_to_complete(session), expected);
    }

    #[test]
    fn test_complete_is_absorbing() {
        let (mut session, _) = start(PlaybackSession::with_all_audio(generate(1, 1)));
        let (next, effects) = session.handle(PlaybackEvent::Next);
        session = next;
        assert!(session.is_complete());
        assert_eq!(effects, vec![Effect::RenderComplete]);

        for event in [
            PlaybackEvent::Next,
            PlaybackEvent::ClipEnded,
            PlaybackEvent::ClipFailed,
            PlaybackEvent::Start,
        ] {
            let (next, effects) = session.handle(event);
            session = next;
            assert!(session.is_complete());
            assert!(effects.is_empty());
        }
        assert_eq!(session.completed_repetitions(), 1);
    }

    #[test]
    fn test_audio_chain_plays_in_order_then_advances() {
        // generate(2, 1): [1], [1,2], [2]
        let (session, _) = start(PlaybackSession::with_all_audio(generate(2, 1)));
        let (session, effects) = session.handle(PlaybackEvent::ClipEnded);
        assert_eq!(
            effects,
            vec![
                Effect::RenderStep {
                    step_index: 1,
                    rep_index: 0,
                    verses: vec![1, 2]
                },
                Effect::PlayClip { verse: 1 },
            ]
        );

        let (session, effects) = session.handle(PlaybackEvent::ClipEnded);
        assert_eq!(effects, vec![Effect::PlayClip { verse: 2 }]);
        assert_eq!(session.current_clip(), Some(2));

        let (session, effects) = session.handle(PlaybackEvent::ClipEnded);
        assert_eq!(effects[0], Effect::RenderStep {
            step_index: 2,
            rep_index: 0,
            verses: vec![2]
        });
        assert_eq!(session.completed_repetitions(), 2);
    }

    #[test]
    fn test_repeat_stays_on_step() {
        let (session, _) = start(PlaybackSession::with_all_audio(generate(2, 2)));
        let (session, effects) = session.handle(PlaybackEvent::ClipEnded);
        assert_eq!(
            session.state(),
            PlaybackState::Playing {
                step_index: 0,
                rep_index: 1,
                clip_index: 0
            }
        );
        assert_eq!(effects[1], Effect::PlayClip { verse: 1 });
    }

    #[test]
    fn test_next_bypasses_remaining_clips() {
        let pattern = generate(3, 1);
        let (session, _) = start(PlaybackSession::with_all_audio(pattern));
        // Move to [1,2] and skip before verse 2 plays
        let (session, _) = session.handle(PlaybackEvent::Next);
        assert_eq!(session.current_clip(), Some(1));
        let (session, effects) = session.handle(PlaybackEvent::Next);
        assert_eq!(
            effects,
            vec![
                Effect::RenderStep {
                    step_index: 2,
                    rep_index: 0,
                    verses: vec![2]
                },
                Effect::PlayClip { verse: 2 },
            ]
        );
        assert_eq!(session.completed_repetitions(), 2);
    }

    #[test]
    fn test_clip_failure_does_not_move_cursor() {
        let (session, _) = start(PlaybackSession::with_all_audio(generate(2, 1)));
        let before = session.state();
        let (session, effects) = session.handle(PlaybackEvent::ClipFailed);
        assert_eq!(session.state(), before);
        assert_eq!(effects, vec![Effect::ReportAudioFailure { verse: 1 }]);

        // Manual advance still works
        let (session, _) = session.handle(PlaybackEvent::Next);
        assert_eq!(session.completed_repetitions(), 1);
    }

    #[test]
    fn test_verses_without_audio_are_skipped() {
        // generate(3, 1) step 3 is [1,2,3]; verse 2 has no audio
        let pattern = generate(3, 1);
        let session = PlaybackSession::new(pattern, [1, 3]);
        let (session, _) = start(session);
        let (session, _) = session.handle(PlaybackEvent::Next); // [1,2]
        let (session, _) = session.handle(PlaybackEvent::Next); // [2]
        assert_eq!(session.current_clip(), None);

        let (session, effects) = session.handle(PlaybackEvent::Next); // [1,2,3]
        assert_eq!(effects[1], Effect::PlayClip { verse: 1 });
        let (_, effects) = session.handle(PlaybackEvent::ClipEnded);
        assert_eq!(effects, vec![Effect::PlayClip { verse: 3 }]);
    }

    #[test]
    fn test_step_without_audio_waits_for_next() {
        let session = PlaybackSession::new(generate(1, 2), std::iter::empty());
        let (session, effects) = start(session);
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::RenderStep { .. }));

        // No clip is playing, so stray clip events do nothing
        let (session, effects) = session.handle(PlaybackEvent::ClipEnded);
        assert!(effects.is_empty());
        let (session, effects) = session.handle(PlaybackEvent::ClipFailed);
        assert!(effects.is_empty());
        assert_eq!(session.completed_repetitions(), 0);

        let (session, _) = session.handle(PlaybackEvent::Next);
        assert_eq!(session.completed_repetitions(), 1);
    }

    #[test]
    fn test_unattended_run_plays_every_recitation() {
        let pattern = generate(4, 2);
        let expected = pattern.total_recitations();
        let (mut session, mut effects) = start(PlaybackSession::with_all_audio(pattern));

        let mut clips = 0;
        loop {
            clips += effects
                .iter()
                .filter(|e| matches!(e, Effect::PlayClip { .. }))
                .count() as u64;
            if session.is_complete() {
                break;
            }
            let (next, produced) = session.handle(PlaybackEvent::ClipEnded);
            session = next;
            effects = produced;
        }
        assert_eq!(clips, expected);
    }

    #[test]
    fn test_empty_pattern_completes_on_start() {
        let (session, effects) = start(PlaybackSession::with_all_audio(Pattern::default()));
        assert!(session.is_complete());
        assert_eq!(effects, vec![Effect::RenderComplete]);
    }
}

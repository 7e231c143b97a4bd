//! Answer Evaluator
//!
//! Scores the user's quality guesses against the hidden ground truth. The
//! result is binary in tone: every guess right is a success, anything else
//! is partial.

use crate::error::{Error, Result};
use crate::quality::Quality;
use crate::track_set::{TrackId, TrackSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Track id → guessed quality (or unanswered)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerMap {
    entries: HashMap<TrackId, Option<Quality>>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every guess and start one unanswered entry per track
    pub fn reset_for(&mut self, tracks: &TrackSet) {
        self.entries = tracks.iter().map(|t| (t.id().clone(), None)).collect();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Record a guess; the track must belong to the current session
    pub fn set(&mut self, track_id: &TrackId, guess: Option<Quality>) -> Result<()> {
        match self.entries.get_mut(track_id) {
            Some(slot) => {
                *slot = guess;
                Ok(())
            }
            None => Err(Error::UnknownTrack(track_id.to_string())),
        }
    }

    pub fn get(&self, track_id: &TrackId) -> Option<Quality> {
        self.entries.get(track_id).copied().flatten()
    }

    /// Tracks of `tracks` without a guess
    pub fn unanswered_count(&self, tracks: &TrackSet) -> usize {
        tracks.iter().filter(|t| self.get(t.id()).is_none()).count()
    }
}

/// Overall outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Partial,
}

/// Per-track result line, in presentation order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailLine {
    /// 1-based presentation position
    pub index: usize,
    pub track_id: String,
    pub actual: Quality,
    pub guessed: Quality,
}

impl DetailLine {
    pub fn is_correct(&self) -> bool {
        self.actual == self.guessed
    }
}

impl fmt::Display for DetailLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Track {}: {} (your guess: {}){}",
            self.index,
            self.actual.label(),
            self.guessed.label(),
            if self.is_correct() { " - correct" } else { "" }
        )
    }
}

/// Immutable scoring result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub correct: usize,
    pub total: usize,
    pub details: Vec<DetailLine>,
    pub tone: Tone,
}

impl Report {
    pub fn summary(&self) -> String {
        match self.tone {
            Tone::Success => format!("All {} correct!", self.total),
            Tone::Partial => format!("{} of {} correct", self.correct, self.total),
        }
    }
}

/// Score `answers` against `tracks`
///
/// # Errors
/// - `EmptyTrackSet` when there is no session
/// - `IncompleteAnswers` when any track has no guess
pub fn check_answers(tracks: Option<&TrackSet>, answers: &AnswerMap) -> Result<Report> {
    let tracks = match tracks {
        Some(set) if !set.is_empty() => set,
        _ => return Err(Error::EmptyTrackSet),
    };

    let missing = answers.unanswered_count(tracks);
    if missing > 0 {
        return Err(Error::IncompleteAnswers {
            missing,
            total: tracks.len(),
        });
    }

    let mut details = Vec::with_capacity(tracks.len());
    for (i, track) in tracks.iter().enumerate() {
        let guessed = answers
            .get(track.id())
            .ok_or_else(|| Error::UnknownTrack(track.id().to_string()))?;
        details.push(DetailLine {
            index: i + 1,
            track_id: track.id().to_string(),
            actual: track.quality(),
            guessed,
        });
    }

    let correct = details.iter().filter(|d| d.is_correct()).count();
    let total = tracks.len();
    let tone = if correct == total {
        Tone::Success
    } else {
        Tone::Partial
    };

    Ok(Report {
        correct,
        total,
        details,
        tone,
    })
}

//! Quiz tracks and their randomized presentation order

use crate::media::Locator;
use crate::quality::Quality;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;

/// Stable track identifier (`<sessionId>-<quality>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(session_id: &str, quality: Quality) -> Self {
        Self(format!("{}-{}", session_id, quality.tag()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One produced variant
///
/// Immutable after creation. The locator stays valid until the ledger
/// releases it on session reset or teardown.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizTrack {
    id: TrackId,
    quality: Quality,
    file_name: String,
    locator: Locator,
    mime_type: String,
}

impl QuizTrack {
    pub fn new(
        session_id: &str,
        quality: Quality,
        file_name: impl Into<String>,
        locator: Locator,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: TrackId::new(session_id, quality),
            quality,
            file_name: file_name.into(),
            locator,
            mime_type: mime_type.into(),
        }
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    /// Ground truth; never rendered before answers are checked
    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// Reorder `items` by drawing without replacement
///
/// Each step picks a uniformly random index among the remaining items.
/// Every permutation, including the identity, is a valid result.
pub fn shuffle<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    let mut drawn = Vec::with_capacity(items.len());
    while !items.is_empty() {
        let idx = rng.gen_range(0..items.len());
        drawn.push(items.swap_remove(idx));
    }
    drawn
}

/// The session's tracks in presentation order
#[derive(Debug, Clone)]
pub struct TrackSet {
    session_id: String,
    tracks: Vec<QuizTrack>,
}

impl TrackSet {
    /// Build a set, checking there is exactly one track per [`Quality`]
    ///
    /// Returns `None` on duplicates or omissions.
    pub fn new(session_id: impl Into<String>, tracks: Vec<QuizTrack>) -> Option<Self> {
        let qualities: HashSet<Quality> = tracks.iter().map(|t| t.quality).collect();
        if tracks.len() != Quality::ALL.len() || qualities.len() != Quality::ALL.len() {
            return None;
        }
        Some(Self {
            session_id: session_id.into(),
            tracks,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[QuizTrack] {
        &self.tracks
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuizTrack> {
        self.tracks.iter()
    }

    pub fn get(&self, id: &TrackId) -> Option<&QuizTrack> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    /// 0-based presentation position of a track
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id.clone()).collect()
    }

    pub fn locators(&self) -> Vec<Locator> {
        self.tracks.iter().map(|t| t.locator.clone()).collect()
    }
}

//! Test Helper Utilities
//!
//! Builds quiz sessions wired to in-process collaborators: the in-memory
//! transcoder, the blob store media host and the simulated playback backend.

#![allow(dead_code)]

use bitquiz_core::events::QuizEvent;
use bitquiz_core::media::BlobStore;
use bitquiz_core::playback::SimulatedPlayback;
use bitquiz_core::track_set::{QuizTrack, TrackSet};
use bitquiz_core::transcode::memory::InMemoryTranscoder;
use bitquiz_core::{InputAsset, Quality, QuizSession, SessionSettings};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default media duration reported by the simulated players (seconds)
pub const TRACK_SECS: f64 = 300.0;

pub struct Harness {
    pub engine: Arc<InMemoryTranscoder>,
    pub host: Arc<BlobStore>,
    pub backend: Arc<SimulatedPlayback>,
    pub session: QuizSession,
}

pub fn harness_with(engine: InMemoryTranscoder, duration: Option<f64>) -> Harness {
    let engine = Arc::new(engine);
    let host = Arc::new(BlobStore::new());
    let backend = Arc::new(SimulatedPlayback::new(host.clone(), duration));
    let session = QuizSession::new(
        engine.clone(),
        host.clone(),
        backend.clone(),
        SessionSettings::default(),
    );
    Harness {
        engine,
        host,
        backend,
        session,
    }
}

/// Session with a loaded engine and 300 s tracks
pub fn ready_harness() -> Harness {
    harness_with(InMemoryTranscoder::ready(), Some(TRACK_SECS))
}

pub fn wav_asset(name: &str) -> InputAsset {
    InputAsset::new(name, "audio/wav", b"RIFF....WAVEfmt fake pcm".to_vec())
}

/// Ready session that has already converted `song.wav`
pub async fn converted_harness() -> Harness {
    let mut h = ready_harness();
    h.session.select_asset(wav_asset("song.wav"));
    h.session.convert().await.unwrap();
    h
}

pub fn tracks(h: &Harness) -> TrackSet {
    h.session.tracks().cloned().expect("session has tracks")
}

pub fn track_of(set: &TrackSet, quality: Quality) -> QuizTrack {
    set.iter()
        .find(|t| t.quality() == quality)
        .cloned()
        .expect("one track per quality")
}

/// Everything currently buffered on `rx`
pub fn drain(rx: &mut broadcast::Receiver<QuizEvent>) -> Vec<QuizEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

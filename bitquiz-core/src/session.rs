//! Quiz session context
//!
//! [`QuizSession`] is the single owner of all mutable state: the selected
//! asset, the engine handle, the resource ledger, the current track set,
//! the answer map and the playback controller. Every operation takes
//! `&mut self`, so conversions cannot overlap; share it with the monitor
//! task through `Arc<tokio::sync::Mutex<_>>`.

use crate::asset::InputAsset;
use crate::error::{Error, Result};
use crate::evaluator::{self, AnswerMap, Report};
use crate::events::{QuizEvent, QuizEventBus};
use crate::ledger::ResourceLedger;
use crate::media::MediaHost;
use crate::playback::{PlaybackBackend, PlaybackController, PlaybackState, StopReason};
use crate::quality::Quality;
use crate::track_set::{TrackId, TrackSet};
use crate::transcode::{EngineStatus, TranscodeEngine, TranscodeOrchestrator};
use bitquiz_common::config::TomlConfig;
use bitquiz_common::time;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Runtime knobs taken from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Period of the playback monitor task
    pub monitor_interval: Duration,
    /// Event bus capacity
    pub event_capacity: usize,
}

impl SessionSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            monitor_interval: Duration::from_millis(config.playback.monitor_interval_ms),
            event_capacity: config.events.capacity,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

/// One user's quiz
pub struct QuizSession {
    orchestrator: TranscodeOrchestrator,
    ledger: ResourceLedger,
    controller: PlaybackController,
    events: QuizEventBus,
    settings: SessionSettings,
    asset: Option<InputAsset>,
    tracks: Option<TrackSet>,
    answers: AnswerMap,
}

impl QuizSession {
    pub fn new(
        engine: Arc<dyn TranscodeEngine>,
        host: Arc<dyn MediaHost>,
        backend: Arc<dyn PlaybackBackend>,
        settings: SessionSettings,
    ) -> Self {
        let events = QuizEventBus::new(settings.event_capacity);
        Self {
            orchestrator: TranscodeOrchestrator::new(engine, host.clone()),
            ledger: ResourceLedger::new(host),
            controller: PlaybackController::new(backend, events.clone()),
            events,
            settings,
            asset: None,
            tracks: None,
            answers: AnswerMap::new(),
        }
    }

    pub fn events(&self) -> &QuizEventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QuizEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// One-time transcoding engine initialization
    pub async fn initialize_engine(&mut self) -> Result<()> {
        self.orchestrator.initialize(&self.events).await
    }

    pub fn engine_status(&self) -> &EngineStatus {
        self.orchestrator.status()
    }

    /// Choose the file to quiz on
    ///
    /// Discards any tracks derived from the previously selected file.
    pub fn select_asset(&mut self, asset: InputAsset) {
        self.discard_tracks();
        info!(asset = %asset.name(), bytes = asset.byte_len(), "Asset selected");
        self.asset = Some(asset);
    }

    pub fn asset(&self) -> Option<&InputAsset> {
        self.asset.as_ref()
    }

    /// Convert the selected asset into a fresh track set
    ///
    /// The previous session's tracks are released before the new run
    /// starts. Nothing is discarded when the engine is not ready or no
    /// asset is selected.
    pub async fn convert(&mut self) -> Result<&TrackSet> {
        if !self.orchestrator.is_ready() {
            return Err(Error::NotReady);
        }
        if self.asset.is_none() {
            return Err(Error::NoInput);
        }

        self.discard_tracks();

        let set = self
            .orchestrator
            .convert(self.asset.as_ref(), &mut self.ledger, &self.events)
            .await?;

        if let Err(e) = self.controller.bind(&set) {
            self.ledger.release(&set.locators());
            return Err(e);
        }

        self.answers.reset_for(&set);
        let set = self.tracks.insert(set);
        Ok(&*set)
    }

    /// Current tracks in presentation order
    pub fn tracks(&self) -> Option<&TrackSet> {
        self.tracks.as_ref()
    }

    pub async fn play(&mut self, track_id: &TrackId) -> Result<()> {
        self.controller.play(track_id).await
    }

    pub fn stop(&mut self, track_id: &TrackId) -> Result<bool> {
        self.controller.stop(track_id)
    }

    pub fn seek_by(&mut self, offset_secs: f64) -> Option<f64> {
        self.controller.seek_by(offset_secs)
    }

    /// One playback monitoring step; see [`PlaybackController::tick`]
    pub fn tick_playback(&mut self) -> Option<StopReason> {
        self.controller.tick()
    }

    pub fn playback_state(&self) -> &PlaybackState {
        self.controller.state()
    }

    pub fn position(&self, track_id: &TrackId) -> Result<f64> {
        self.controller.position(track_id)
    }

    /// Record (or clear, with `None`) the guess for one track
    pub fn set_answer(&mut self, track_id: &TrackId, guess: Option<Quality>) -> Result<()> {
        self.answers.set(track_id, guess)
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    /// Score the current guesses
    pub fn check_answers(&self) -> Result<Report> {
        let report = evaluator::check_answers(self.tracks.as_ref(), &self.answers)?;

        info!(
            correct = report.correct,
            total = report.total,
            tone = ?report.tone,
            "Answers checked"
        );
        self.events.emit_lossy(QuizEvent::AnswersChecked {
            correct: report.correct,
            total: report.total,
            tone: report.tone,
            timestamp: time::now(),
        });
        Ok(report)
    }

    /// Number of media resources the session still holds
    pub fn live_resources(&self) -> usize {
        self.ledger.len()
    }

    /// Back to the initial state: no asset, no tracks, no answers
    pub fn reset(&mut self) {
        self.discard_tracks();
        self.asset = None;
    }

    /// Release everything the session holds; safe to call repeatedly
    pub fn teardown(&mut self) {
        self.discard_tracks();
        debug!("Quiz session torn down");
    }

    fn discard_tracks(&mut self) {
        self.controller.unbind_all();
        let session_id = self.tracks.take().map(|set| set.session_id().to_string());
        self.answers.clear();

        let released = self.ledger.release_all();
        if session_id.is_some() || released > 0 {
            info!(
                session_id = session_id.as_deref().unwrap_or("-"),
                released,
                "Previous session released"
            );
            self.events.emit_lossy(QuizEvent::SessionReleased {
                session_id,
                released,
                timestamp: time::now(),
            });
        }
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

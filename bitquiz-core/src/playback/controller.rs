//! Playback Controller
//!
//! State machine `Idle ⇄ Sounding(track)` over one bound player per track.
//!
//! End-of-track listeners only push the track id onto a channel; the
//! controller drains it at the start of every operation and in
//! [`PlaybackController::tick`], so every state change happens on the
//! owner's side.

use super::{ListenerId, PlaybackBackend, PlaybackState, PlayerInstance, StopReason};
use crate::error::{Error, Result};
use crate::events::{QuizEvent, QuizEventBus};
use crate::track_set::{TrackId, TrackSet};
use crate::transcode::AUDITION_CAP_SECS;
use bitquiz_common::time;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const CAP_SECS: f64 = AUDITION_CAP_SECS as f64;

struct Binding {
    track_id: TrackId,
    player: Box<dyn PlayerInstance>,
    listener: ListenerId,
}

/// Gates audition playback for one session's tracks
///
/// Never touches the resource ledger: players are bound to locators the
/// session already owns and unbound before those locators are released.
pub struct PlaybackController {
    backend: Arc<dyn PlaybackBackend>,
    events: QuizEventBus,
    bindings: Vec<Binding>,
    state: PlaybackState,
    end_tx: mpsc::UnboundedSender<TrackId>,
    end_rx: mpsc::UnboundedReceiver<TrackId>,
}

impl PlaybackController {
    pub fn new(backend: Arc<dyn PlaybackBackend>, events: QuizEventBus) -> Self {
        let (end_tx, end_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            events,
            bindings: Vec::new(),
            state: PlaybackState::Idle,
            end_tx,
            end_rx,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Track currently sounding, if any
    pub fn sounding(&self) -> Option<&TrackId> {
        match &self.state {
            PlaybackState::Sounding(id) => Some(id),
            PlaybackState::Idle => None,
        }
    }

    /// Number of bound players
    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }

    /// Bind one player per track and subscribe to its end notification
    ///
    /// Replaces any previous bindings. All-or-nothing: if any track fails to
    /// open, the players bound so far are unbound again.
    pub fn bind(&mut self, tracks: &TrackSet) -> Result<()> {
        self.unbind_all();

        for track in tracks.iter() {
            let player = match self.backend.open(track.locator()) {
                Ok(player) => player,
                Err(e) => {
                    warn!(track_id = %track.id(), error = %e, "Could not bind player");
                    self.unbind_all();
                    return Err(Error::PlaybackFailure(e.to_string()));
                }
            };

            let tx = self.end_tx.clone();
            let track_id = track.id().clone();
            let listener = player.add_end_listener(Arc::new(move || {
                // Receiver lives as long as the controller; a closed
                // channel means nobody is left to care
                let _ = tx.send(track_id.clone());
            }));

            self.bindings.push(Binding {
                track_id: track.id().clone(),
                player,
                listener,
            });
        }

        debug!(
            session_id = %tracks.session_id(),
            players = self.bindings.len(),
            "Players bound"
        );
        Ok(())
    }

    /// Stop anything sounding, unsubscribe every listener and drop the players
    pub fn unbind_all(&mut self) {
        if self.sounding().is_some() {
            self.halt(StopReason::SessionReleased);
        }

        for binding in self.bindings.drain(..) {
            if !binding.player.remove_end_listener(binding.listener) {
                debug!(track_id = %binding.track_id, "End listener was already gone");
            }
        }

        // Discard notifications from players that no longer exist
        while self.end_rx.try_recv().is_ok() {}
        self.state = PlaybackState::Idle;
    }

    /// Start `track_id` from position 0
    ///
    /// Any other sounding track is stopped first. Playing the track that is
    /// already sounding restarts it.
    pub async fn play(&mut self, track_id: &TrackId) -> Result<()> {
        let idx = self.index_of(track_id)?;
        self.apply_pending_ends();

        // Position the interrupted run had reached, when restarting
        let mut restarted_from = None;
        if self.sounding() == Some(track_id) {
            let player = &self.bindings[idx].player;
            player.pause();
            restarted_from = Some(clamp_to_cap(player.position()));
        } else if self.sounding().is_some() {
            self.halt(StopReason::Preempted);
        }

        let player = &self.bindings[idx].player;
        player.set_position(0.0);
        if let Err(e) = player.play().await {
            player.pause();
            player.set_position(0.0);
            self.state = PlaybackState::Idle;
            warn!(track_id = %track_id, error = %e, "Playback failed to start");
            if let Some(position) = restarted_from {
                self.emit_stopped(track_id.to_string(), StopReason::Preempted, position);
            }
            return Err(Error::PlaybackFailure(e.to_string()));
        }

        self.state = PlaybackState::Sounding(track_id.clone());
        info!(track_id = %track_id, "Playback started");
        self.events.emit_lossy(QuizEvent::PlaybackStarted {
            track_id: track_id.to_string(),
            timestamp: time::now(),
        });
        Ok(())
    }

    /// Stop `track_id` and rewind it
    ///
    /// No-op (returns `false`) unless that track is the one sounding.
    pub fn stop(&mut self, track_id: &TrackId) -> Result<bool> {
        self.index_of(track_id)?;
        self.apply_pending_ends();
        if self.sounding() != Some(track_id) {
            return Ok(false);
        }
        self.halt(StopReason::User);
        Ok(true)
    }

    /// Move the sounding track by `offset_secs`
    ///
    /// Returns the new (cap-clamped) position, or `None` when idle or while
    /// the duration is unknown. Landing on the cap stops the track.
    pub fn seek_by(&mut self, offset_secs: f64) -> Option<f64> {
        self.apply_pending_ends();
        let idx = self.sounding_index()?;
        let player = &self.bindings[idx].player;

        let duration = player.duration().filter(|d| d.is_finite() && *d >= 0.0)?;
        if !offset_secs.is_finite() {
            return None;
        }

        let target = (player.position() + offset_secs).clamp(0.0, duration);
        player.set_position(target);
        debug!(track_id = %self.bindings[idx].track_id, position = target, "Seek");

        if target >= CAP_SECS {
            self.halt(StopReason::CapReached);
            return Some(CAP_SECS);
        }
        Some(target)
    }

    /// Monitoring step
    ///
    /// Applies pending end-of-track notifications, then enforces the cap on
    /// the sounding track and reports its progress. Returns the stop this
    /// tick caused, if any.
    pub fn tick(&mut self) -> Option<StopReason> {
        if self.apply_pending_ends() {
            return Some(StopReason::Ended);
        }

        let idx = self.sounding_index()?;
        let binding = &self.bindings[idx];
        let position = binding.player.position();

        if position >= CAP_SECS {
            self.halt(StopReason::CapReached);
            return Some(StopReason::CapReached);
        }

        debug!(
            track_id = %binding.track_id,
            clock = %time::format_clock(position),
            "Playback progress"
        );
        self.events.emit_lossy(QuizEvent::PlaybackProgress {
            track_id: binding.track_id.to_string(),
            position_secs: position.max(0.0),
            cap_secs: AUDITION_CAP_SECS,
            timestamp: time::now(),
        });
        None
    }

    /// Current position of `track_id`, never beyond the cap
    pub fn position(&self, track_id: &TrackId) -> Result<f64> {
        let idx = self.index_of(track_id)?;
        Ok(clamp_to_cap(self.bindings[idx].player.position()))
    }

    fn index_of(&self, track_id: &TrackId) -> Result<usize> {
        self.bindings
            .iter()
            .position(|b| &b.track_id == track_id)
            .ok_or_else(|| Error::UnknownTrack(track_id.to_string()))
    }

    fn sounding_index(&self) -> Option<usize> {
        let id = self.sounding()?;
        self.bindings.iter().position(|b| &b.track_id == id)
    }

    /// Drain end-of-track notifications queued since the last call
    ///
    /// Every operation applies these before acting, so a replay never
    /// inherits the end of the previous run. Returns whether the sounding
    /// track had ended.
    fn apply_pending_ends(&mut self) -> bool {
        let mut ended_sounding = false;
        while let Ok(ended) = self.end_rx.try_recv() {
            if self.sounding() == Some(&ended) {
                self.halt(StopReason::Ended);
                ended_sounding = true;
            } else {
                debug!(track_id = %ended, "Ignoring end of a track that is not sounding");
            }
        }
        ended_sounding
    }

    /// Pause and rewind the sounding track, go Idle and report why
    fn halt(&mut self, reason: StopReason) {
        let Some(idx) = self.sounding_index() else {
            self.state = PlaybackState::Idle;
            return;
        };

        let binding = &self.bindings[idx];
        binding.player.pause();
        let position = clamp_to_cap(binding.player.position());
        binding.player.set_position(0.0);
        let track_id = binding.track_id.to_string();
        self.state = PlaybackState::Idle;
        self.emit_stopped(track_id, reason, position);
    }

    fn emit_stopped(&self, track_id: String, reason: StopReason, position: f64) {
        info!(
            track_id = %track_id,
            reason = ?reason,
            at = %time::format_clock(position),
            "Playback stopped"
        );
        self.events.emit_lossy(QuizEvent::PlaybackStopped {
            track_id,
            reason,
            position_secs: position,
            timestamp: time::now(),
        });
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.unbind_all();
    }
}

fn clamp_to_cap(position: f64) -> f64 {
    if position.is_finite() {
        position.clamp(0.0, CAP_SECS)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{BlobStore, MediaHost};
    use crate::playback::SimulatedPlayback;
    use crate::quality::Quality;
    use crate::track_set::QuizTrack;

    struct Fixture {
        host: Arc<BlobStore>,
        backend: Arc<SimulatedPlayback>,
        controller: PlaybackController,
        tracks: TrackSet,
    }

    fn fixture(duration: Option<f64>) -> Fixture {
        let host = Arc::new(BlobStore::new());
        let backend = Arc::new(SimulatedPlayback::new(host.clone(), duration));
        let tracks = Quality::ALL
            .iter()
            .map(|q| {
                let locator = host.create_resource(vec![1, 2, 3], "audio/mpeg").unwrap();
                QuizTrack::new("t_1", *q, format!("t_1_{}", q.tag()), locator, "audio/mpeg")
            })
            .collect();
        let tracks = TrackSet::new("t_1", tracks).unwrap();
        let mut controller = PlaybackController::new(backend.clone(), QuizEventBus::new(16));
        controller.bind(&tracks).unwrap();
        Fixture {
            host,
            backend,
            controller,
            tracks,
        }
    }

    fn id(tracks: &TrackSet, i: usize) -> TrackId {
        tracks.tracks()[i].id().clone()
    }

    #[tokio::test]
    async fn test_play_then_stop() {
        let mut f = fixture(Some(200.0));
        let a = id(&f.tracks, 0);

        f.controller.play(&a).await.unwrap();
        assert_eq!(f.controller.state(), &PlaybackState::Sounding(a.clone()));

        f.backend.advance(10.0);
        assert_eq!(f.controller.position(&a).unwrap(), 10.0);

        assert!(f.controller.stop(&a).unwrap());
        assert_eq!(f.controller.state(), &PlaybackState::Idle);
        assert_eq!(f.controller.position(&a).unwrap(), 0.0);
        assert!(!f.controller.stop(&a).unwrap());
    }

    #[tokio::test]
    async fn test_replaying_sounding_track_restarts() {
        let mut f = fixture(Some(200.0));
        let a = id(&f.tracks, 0);

        f.controller.play(&a).await.unwrap();
        f.backend.advance(30.0);
        f.controller.play(&a).await.unwrap();

        assert_eq!(f.controller.position(&a).unwrap(), 0.0);
        assert_eq!(f.controller.sounding(), Some(&a));
    }

    #[tokio::test]
    async fn test_failed_restart_reports_stop() {
        let mut f = fixture(Some(200.0));
        let mut rx = f.controller.events.subscribe();
        let a = id(&f.tracks, 0);

        f.controller.play(&a).await.unwrap();
        f.backend.advance(15.0);
        f.backend.fail_play(f.tracks.tracks()[0].locator());

        assert!(matches!(
            f.controller.play(&a).await,
            Err(Error::PlaybackFailure(_))
        ));
        assert_eq!(f.controller.state(), &PlaybackState::Idle);
        assert_eq!(f.backend.playing_count(), 0);

        let mut last_stop = None;
        while let Ok(event) = rx.try_recv() {
            if let QuizEvent::PlaybackStopped {
                track_id,
                reason,
                position_secs,
                ..
            } = event
            {
                last_stop = Some((track_id, reason, position_secs));
            }
        }
        assert_eq!(
            last_stop,
            Some((a.to_string(), StopReason::Preempted, 15.0))
        );
    }

    #[tokio::test]
    async fn test_unknown_track() {
        let mut f = fixture(Some(200.0));
        let bogus = TrackId::from("nope-mp3_128");
        assert!(matches!(
            f.controller.play(&bogus).await,
            Err(Error::UnknownTrack(_))
        ));
        assert!(matches!(f.controller.stop(&bogus), Err(Error::UnknownTrack(_))));
    }

    #[tokio::test]
    async fn test_seek_clamps_and_caps() {
        let mut f = fixture(Some(90.0));
        let a = id(&f.tracks, 1);
        assert_eq!(f.controller.seek_by(5.0), None);

        f.controller.play(&a).await.unwrap();
        assert_eq!(f.controller.seek_by(-5.0), Some(0.0));
        assert_eq!(f.controller.seek_by(500.0), Some(90.0));
        assert_eq!(f.controller.sounding(), Some(&a));

        let mut long = fixture(Some(300.0));
        let b = id(&long.tracks, 2);
        long.controller.play(&b).await.unwrap();
        assert_eq!(long.controller.seek_by(150.0), Some(CAP_SECS));
        assert_eq!(long.controller.state(), &PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_seek_ignored_while_duration_unknown() {
        let mut f = fixture(None);
        let a = id(&f.tracks, 0);
        f.controller.play(&a).await.unwrap();
        assert_eq!(f.controller.seek_by(10.0), None);
    }

    #[tokio::test]
    async fn test_bind_fails_closed_on_revoked_locator() {
        let f = fixture(Some(200.0));
        let mut controller = PlaybackController::new(f.backend.clone(), QuizEventBus::new(4));
        f.host.revoke(f.tracks.tracks()[2].locator()).unwrap();

        assert!(matches!(
            controller.bind(&f.tracks),
            Err(Error::PlaybackFailure(_))
        ));
        assert_eq!(controller.bound_count(), 0);
    }

    #[tokio::test]
    async fn test_unbind_removes_listeners() {
        let mut f = fixture(Some(200.0));
        assert_eq!(f.backend.listener_count(), 3);

        f.controller.play(&id(&f.tracks, 0)).await.unwrap();
        f.controller.unbind_all();

        assert_eq!(f.backend.listener_count(), 0);
        assert_eq!(f.backend.playing_count(), 0);
        assert_eq!(f.controller.state(), &PlaybackState::Idle);
    }
}

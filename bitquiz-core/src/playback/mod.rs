//! Audition playback
//!
//! The hosting environment's playback primitive is reached through
//! [`PlaybackBackend`] / [`PlayerInstance`]. [`PlaybackController`] owns one
//! player per quiz track and enforces the single-sounding-track rule and
//! the audition cap on top of it.

mod controller;
pub mod monitor;
pub mod simulated;

pub use controller::PlaybackController;
pub use monitor::spawn_playback_monitor;
pub use simulated::SimulatedPlayback;

use crate::media::Locator;
use crate::track_set::TrackId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Controller state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Sounding(TrackId),
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Sounding(id) => write!(f, "sounding({})", id),
        }
    }
}

/// Why a track stopped sounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit stop request
    User,
    /// Another track was started
    Preempted,
    /// Position reached the audition cap
    CapReached,
    /// Track ended on its own
    Ended,
    /// Session was replaced or torn down
    SessionReleased,
}

/// Playback primitive errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Locator could not be bound to a player
    #[error("cannot open {0}: {1}")]
    Open(Locator, String),

    /// Player refused to start
    #[error("playback rejected: {0}")]
    Rejected(String),
}

/// Handle returned by [`PlayerInstance::add_end_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback fired when a player reaches the end of its media
pub type EndListener = Arc<dyn Fn() + Send + Sync>;

/// One bound player
///
/// Positions and durations are in seconds.
#[async_trait]
pub trait PlayerInstance: Send + Sync {
    /// Start or resume; may need to prime first
    async fn play(&self) -> Result<(), PlayerError>;

    fn pause(&self);

    fn position(&self) -> f64;

    fn set_position(&self, secs: f64);

    /// `None` while the media duration is unknown
    fn duration(&self) -> Option<f64>;

    fn add_end_listener(&self, listener: EndListener) -> ListenerId;

    /// Returns false if `id` was not registered
    fn remove_end_listener(&self, id: ListenerId) -> bool;
}

/// Factory binding locators to players
pub trait PlaybackBackend: Send + Sync {
    fn open(&self, locator: &Locator) -> Result<Box<dyn PlayerInstance>, PlayerError>;
}

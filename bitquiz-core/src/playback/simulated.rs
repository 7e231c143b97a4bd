//! Simulated playback backend
//!
//! Players run on a virtual clock moved by [`SimulatedPlayback::advance`].
//! Opening requires the locator to resolve through the media host, so a
//! revoked locator cannot be played. End listeners fire when a sounding
//! player reaches its duration, outside of any internal lock.

use super::{EndListener, ListenerId, PlaybackBackend, PlayerError, PlayerInstance};
use crate::media::{Locator, MediaHost};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

#[derive(Default)]
struct Settings {
    durations: HashMap<Locator, Option<f64>>,
    failing: HashSet<Locator>,
}

struct PlayerCore {
    locator: Locator,
    state: Mutex<PlayerState>,
}

#[derive(Default)]
struct PlayerState {
    position: f64,
    playing: bool,
    listeners: Vec<(ListenerId, EndListener)>,
}

impl PlayerCore {
    fn lock(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct Shared {
    default_duration: Option<f64>,
    settings: Mutex<Settings>,
}

impl Shared {
    fn settings(&self) -> MutexGuard<'_, Settings> {
        self.settings.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn duration_of(&self, locator: &Locator) -> Option<f64> {
        self.settings()
            .durations
            .get(locator)
            .copied()
            .unwrap_or(self.default_duration)
    }
}

/// Virtual-clock [`PlaybackBackend`]
pub struct SimulatedPlayback {
    host: Arc<dyn MediaHost>,
    shared: Arc<Shared>,
    players: Mutex<Vec<Weak<PlayerCore>>>,
}

impl SimulatedPlayback {
    /// `default_duration` applies to every locator without an override;
    /// `None` models media whose duration is not known yet
    pub fn new(host: Arc<dyn MediaHost>, default_duration: Option<f64>) -> Self {
        Self {
            host,
            shared: Arc::new(Shared {
                default_duration,
                settings: Mutex::new(Settings::default()),
            }),
            players: Mutex::new(Vec::new()),
        }
    }

    /// Override the duration reported for `locator`
    pub fn set_duration(&self, locator: &Locator, duration: Option<f64>) {
        self.shared
            .settings()
            .durations
            .insert(locator.clone(), duration);
    }

    /// Make `play` fail for `locator`
    pub fn fail_play(&self, locator: &Locator) {
        self.shared.settings().failing.insert(locator.clone());
    }

    /// Move the virtual clock forward for every sounding player
    pub fn advance(&self, secs: f64) {
        let mut ended: Vec<EndListener> = Vec::new();

        for core in self.live_players() {
            let duration = self.shared.duration_of(&core.locator);
            let mut state = core.lock();
            if !state.playing {
                continue;
            }
            state.position += secs;
            if let Some(d) = duration {
                if state.position >= d {
                    state.position = d;
                    state.playing = false;
                    ended.extend(state.listeners.iter().map(|(_, l)| l.clone()));
                }
            }
        }

        for listener in ended {
            listener();
        }
    }

    /// Number of players currently sounding
    pub fn playing_count(&self) -> usize {
        self.live_players()
            .iter()
            .filter(|core| core.lock().playing)
            .count()
    }

    /// Whether any live player bound to `locator` is sounding
    pub fn is_playing(&self, locator: &Locator) -> bool {
        self.live_players()
            .iter()
            .any(|core| &core.locator == locator && core.lock().playing)
    }

    /// Total end listeners registered across live players
    pub fn listener_count(&self) -> usize {
        self.live_players()
            .iter()
            .map(|core| core.lock().listeners.len())
            .sum()
    }

    fn live_players(&self) -> Vec<Arc<PlayerCore>> {
        let mut players = self.players.lock().unwrap_or_else(|e| e.into_inner());
        players.retain(|weak| weak.strong_count() > 0);
        players.iter().filter_map(Weak::upgrade).collect()
    }
}

impl PlaybackBackend for SimulatedPlayback {
    fn open(&self, locator: &Locator) -> Result<Box<dyn PlayerInstance>, PlayerError> {
        if self.host.resolve(locator).is_none() {
            return Err(PlayerError::Open(
                locator.clone(),
                "resource is not available".to_string(),
            ));
        }

        let core = Arc::new(PlayerCore {
            locator: locator.clone(),
            state: Mutex::new(PlayerState::default()),
        });
        self.players
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::downgrade(&core));

        Ok(Box::new(SimulatedPlayer {
            core,
            shared: self.shared.clone(),
        }))
    }
}

struct SimulatedPlayer {
    core: Arc<PlayerCore>,
    shared: Arc<Shared>,
}

#[async_trait]
impl PlayerInstance for SimulatedPlayer {
    async fn play(&self) -> Result<(), PlayerError> {
        tokio::task::yield_now().await;
        if self.shared.settings().failing.contains(&self.core.locator) {
            return Err(PlayerError::Rejected(format!(
                "{} refused to start",
                self.core.locator
            )));
        }
        self.core.lock().playing = true;
        Ok(())
    }

    fn pause(&self) {
        self.core.lock().playing = false;
    }

    fn position(&self) -> f64 {
        self.core.lock().position
    }

    fn set_position(&self, secs: f64) {
        self.core.lock().position = secs;
    }

    fn duration(&self) -> Option<f64> {
        self.shared.duration_of(&self.core.locator)
    }

    fn add_end_listener(&self, listener: EndListener) -> ListenerId {
        let id = ListenerId::new();
        self.core.lock().listeners.push((id, listener));
        id
    }

    fn remove_end_listener(&self, id: ListenerId) -> bool {
        let mut state = self.core.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(existing, _)| *existing != id);
        state.listeners.len() != before
    }
}

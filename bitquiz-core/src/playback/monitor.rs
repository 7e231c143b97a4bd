//! Background playback monitoring

use crate::session::QuizSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Spawn the monitor task
///
/// Every `period` it runs one [`QuizSession::tick_playback`], which applies
/// natural track ends, enforces the audition cap and publishes progress.
/// Runs until `cancel` fires.
pub fn spawn_playback_monitor(
    session: Arc<Mutex<QuizSession>>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_ms = period.as_millis() as u64, "Playback monitor started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Some(reason) = session.lock().await.tick_playback() {
                        debug!(reason = ?reason, "Monitor stopped playback");
                    }
                }
            }
        }

        info!("Playback monitor stopped");
    })
}

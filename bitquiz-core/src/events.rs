//! Quiz events broadcast to the hosting surface
//!
//! Events never carry a track's true quality outside of the check-answers
//! result, so a subscriber rendering progress cannot spoil the quiz.

use crate::evaluator::Tone;
use crate::playback::StopReason;
use bitquiz_common::events::EventBus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event bus carrying [`QuizEvent`]s
pub type QuizEventBus = EventBus<QuizEvent>;

/// Quiz event types
///
/// Serializable with an internal `type` tag so a UI bridge can forward them
/// as JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuizEvent {
    /// Transcoding engine finished its one-time initialization
    EngineReady { timestamp: DateTime<Utc> },

    /// Transcoding engine initialization failed
    EngineFailed {
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Conversion run started for an uploaded file
    ConversionStarted {
        session_id: String,
        asset_name: String,
        timestamp: DateTime<Utc>,
    },

    /// One variant finished encoding
    ///
    /// Reports progress only; which variant finished is deliberately omitted.
    VariantEncoded {
        session_id: String,
        completed: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// All three variants are ready, in presentation order
    ConversionCompleted {
        session_id: String,
        track_ids: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Conversion run failed; nothing from it is exposed
    ConversionFailed {
        session_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Previous session's tracks were released
    SessionReleased {
        session_id: Option<String>,
        released: usize,
        timestamp: DateTime<Utc>,
    },

    /// A track started sounding
    PlaybackStarted {
        track_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A track stopped sounding
    PlaybackStopped {
        track_id: String,
        reason: StopReason,
        /// Position at which playback stopped, clamped to the audition cap
        position_secs: f64,
        timestamp: DateTime<Utc>,
    },

    /// Periodic position report while a track is sounding
    PlaybackProgress {
        track_id: String,
        position_secs: f64,
        cap_secs: u32,
        timestamp: DateTime<Utc>,
    },

    /// Answers were scored
    AnswersChecked {
        correct: usize,
        total: usize,
        tone: Tone,
        timestamp: DateTime<Utc>,
    },
}

impl QuizEvent {
    /// Event type name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            QuizEvent::EngineReady { .. } => "EngineReady",
            QuizEvent::EngineFailed { .. } => "EngineFailed",
            QuizEvent::ConversionStarted { .. } => "ConversionStarted",
            QuizEvent::VariantEncoded { .. } => "VariantEncoded",
            QuizEvent::ConversionCompleted { .. } => "ConversionCompleted",
            QuizEvent::ConversionFailed { .. } => "ConversionFailed",
            QuizEvent::SessionReleased { .. } => "SessionReleased",
            QuizEvent::PlaybackStarted { .. } => "PlaybackStarted",
            QuizEvent::PlaybackStopped { .. } => "PlaybackStopped",
            QuizEvent::PlaybackProgress { .. } => "PlaybackProgress",
            QuizEvent::AnswersChecked { .. } => "AnswersChecked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_tag_matches_event_type() {
        let event = QuizEvent::PlaybackStopped {
            track_id: "song_1-mp3_128".to_string(),
            reason: StopReason::CapReached,
            position_secs: 120.0,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
        assert_eq!(json["reason"], "cap_reached");
    }

    #[test]
    fn test_json_round_trip() {
        let event = QuizEvent::VariantEncoded {
            session_id: "song_1".to_string(),
            completed: 2,
            total: 3,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: QuizEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}

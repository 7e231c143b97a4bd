//! Error types for bitquiz-core
//!
//! Every failure reaches the caller as a typed variant. Only best-effort
//! cleanup (scratch file deletion, locator revocation during teardown) is
//! logged and swallowed.

use thiserror::Error;

/// Main error type for bitquiz-core
#[derive(Error, Debug)]
pub enum Error {
    /// Transcoding engine has not finished its one-time initialization
    #[error("Transcoding engine is not ready")]
    NotReady,

    /// Transcoding engine initialization failed
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),

    /// No input asset supplied
    #[error("No input file selected")]
    NoInput,

    /// An engine invocation or I/O step failed during conversion
    #[error("Transcode failed: {0}")]
    TranscodeFailure(String),

    /// Playback engine rejected a request
    #[error("Playback failed: {0}")]
    PlaybackFailure(String),

    /// Track id does not belong to the current session
    #[error("Unknown track: {0}")]
    UnknownTrack(String),

    /// Answers were checked before any session existed
    #[error("No quiz tracks available")]
    EmptyTrackSet,

    /// Some tracks have no guess yet
    #[error("{missing} of {total} tracks have no answer")]
    IncompleteAnswers { missing: usize, total: usize },

    /// Configuration errors surfaced from bitquiz-common
    #[error(transparent)]
    Common(#[from] bitquiz_common::Error),
}

impl Error {
    /// Short message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Error::NotReady => {
                "The audio converter is still loading. Please wait a moment.".to_string()
            }
            Error::EngineInit(_) => {
                "The audio converter could not be loaded. Reload and try again.".to_string()
            }
            Error::NoInput => "Choose an audio file first.".to_string(),
            Error::TranscodeFailure(_) => {
                "Conversion failed. Try again with a different audio file.".to_string()
            }
            Error::PlaybackFailure(_) => {
                "This track could not be played. Try again with a different audio file."
                    .to_string()
            }
            Error::UnknownTrack(_) => {
                "That track is no longer available. Convert the file again.".to_string()
            }
            Error::EmptyTrackSet => "Convert an audio file before checking answers.".to_string(),
            Error::IncompleteAnswers { missing, .. } => {
                format!("Pick a quality for every track ({} still unanswered).", missing)
            }
            Error::Common(e) => format!("Configuration problem: {}", e),
        }
    }
}

/// Convenience Result type using bitquiz-core Error
pub type Result<T> = std::result::Result<T, Error>;

//! # Bitrate Quiz Core (bitquiz-core)
//!
//! Transcode-and-quiz engine: derives three variants of one uploaded audio
//! file, hides which is which, gates audition playback and scores guesses.
//!
//! **Architecture:** every piece of mutable state lives in a single
//! [`QuizSession`] context. External collaborators (the transcoding engine,
//! the media host and the playback primitive) are reached only through the
//! traits in [`transcode`], [`media`] and [`playback`].
//!
//! Control flow: asset → [`transcode::TranscodeOrchestrator`] (registering
//! locators in the [`ledger::ResourceLedger`]) → shuffled
//! [`track_set::TrackSet`] → [`playback::PlaybackController`] →
//! [`evaluator::check_answers`].

pub mod asset;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod ledger;
pub mod media;
pub mod playback;
pub mod quality;
pub mod session;
pub mod track_set;
pub mod transcode;

pub use asset::InputAsset;
pub use error::{Error, Result};
pub use quality::Quality;
pub use session::{QuizSession, SessionSettings};

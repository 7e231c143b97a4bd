//! # Bitrate Quiz Common Library
//!
//! Shared code for the bitrate quiz crates including:
//! - Error type shared by configuration and logging
//! - TOML configuration loading
//! - Tracing subscriber initialization
//! - Generic broadcast event bus
//! - Time helpers (timestamps, session stamps, clock formatting)

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
pub use events::EventBus;

//! Transcoding: the external engine seam, the fixed plan and the orchestrator
//!
//! The engine is consumed as a black box: a one-time `load`, a virtual file
//! system and an FFmpeg-style `exec`. It is not safe for concurrent use, so
//! the orchestrator drives it strictly one call at a time.

pub mod ffmpeg;
pub mod memory;
mod orchestrator;
pub mod plan;

pub use orchestrator::TranscodeOrchestrator;
pub use plan::{TranscodePlan, AUDITION_CAP_SECS};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transcoding engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Operation requires a loaded engine
    #[error("engine not loaded")]
    NotLoaded,

    /// One-time initialization failed
    #[error("engine load failed: {0}")]
    LoadFailed(String),

    /// Virtual file system entry missing
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Name would escape the virtual file system
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// Command ran but reported failure
    #[error("exec failed: {0}")]
    ExecFailed(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// External transcoding engine
///
/// All file names are flat names inside the engine's virtual file system.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// One-time asynchronous initialization
    async fn load(&self) -> Result<(), EngineError>;

    /// Whether `load` has completed successfully
    fn is_ready(&self) -> bool;

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError>;

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Names of every entry starting with `prefix`
    async fn list_files(&self, prefix: &str) -> Result<Vec<String>, EngineError>;

    async fn delete_file(&self, name: &str) -> Result<(), EngineError>;

    /// Run one FFmpeg-style command (`-i <input> ... <output>`)
    async fn exec(&self, args: &[String]) -> Result<(), EngineError>;
}

/// Engine lifecycle as seen by the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum EngineStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready)
    }
}

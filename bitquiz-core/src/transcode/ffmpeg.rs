//! FFmpeg subprocess engine
//!
//! Backs the virtual file system with a private temporary directory and runs
//! the system `ffmpeg` binary inside it. `load` probes the binary once with
//! `-version`; every other call requires that probe to have succeeded.

use super::{EngineError, TranscodeEngine};
use async_trait::async_trait;
use bitquiz_common::config::TranscoderConfig;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

/// Engine driving a local FFmpeg executable
#[derive(Debug)]
pub struct FfmpegEngine {
    binary: PathBuf,
    scratch: TempDir,
    ready: AtomicBool,
}

impl FfmpegEngine {
    /// Create the engine and its scratch directory
    ///
    /// The scratch directory is removed when the engine is dropped.
    pub fn new(config: &TranscoderConfig) -> Result<Self, EngineError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("bitquiz-");
        let scratch = match &config.scratch_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        debug!(
            binary = %config.ffmpeg_path.display(),
            scratch = %scratch.path().display(),
            "FFmpeg engine created"
        );

        Ok(Self {
            binary: config.ffmpeg_path.clone(),
            scratch,
            ready: AtomicBool::new(false),
        })
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    fn require_ready(&self) -> Result<(), EngineError> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::NotLoaded)
        }
    }

    /// Map a flat virtual name onto the scratch directory
    fn entry_path(&self, name: &str) -> Result<PathBuf, EngineError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name.contains("..")
        {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        Ok(self.scratch.path().join(name))
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn load(&self) -> Result<(), EngineError> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                EngineError::LoadFailed(format!(
                    "failed to execute {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::LoadFailed(format!(
                "{} -version failed: {}",
                self.binary.display(),
                stderr.trim()
            )));
        }

        let banner = String::from_utf8_lossy(&output.stdout);
        info!(
            version = banner.lines().next().unwrap_or_default(),
            "FFmpeg available"
        );
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        self.require_ready()?;
        fs::write(self.entry_path(name)?, bytes).await?;
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.require_ready()?;
        let path = self.entry_path(name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EngineError::FileNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_files(&self, prefix: &str) -> Result<Vec<String>, EngineError> {
        self.require_ready()?;
        let mut names = Vec::new();
        let mut entries = fs::read_dir(self.scratch.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(prefix) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        self.require_ready()?;
        let path = self.entry_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EngineError::FileNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exec(&self, args: &[String]) -> Result<(), EngineError> {
        self.require_ready()?;

        let output = Command::new(&self.binary)
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(args)
            .current_dir(self.scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| EngineError::ExecFailed(format!("failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::ExecFailed(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

//! Ephemeral media resources
//!
//! A [`Locator`] is a revocable string handle to an in-memory byte buffer
//! with a MIME type. The [`MediaHost`] seam abstracts whatever the hosting
//! environment uses to hand such buffers to its playback primitive.

mod blob_store;

pub use blob_store::BlobStore;

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Resolvable handle to an ephemeral media resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator(String);

impl Locator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes behind a locator
#[derive(Debug)]
pub struct MediaResource {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Media host errors
#[derive(Debug, Error)]
pub enum MediaError {
    /// Locator was never issued or has already been revoked
    #[error("unknown or revoked locator: {0}")]
    UnknownLocator(Locator),

    /// Host refused to create the resource
    #[error("resource creation failed: {0}")]
    CreateFailed(String),
}

/// Hosting environment capability for ephemeral media resources
pub trait MediaHost: Send + Sync {
    /// Wrap bytes into a new resource and return its locator
    fn create_resource(&self, bytes: Vec<u8>, mime_type: &str) -> Result<Locator, MediaError>;

    /// Look up a live resource
    fn resolve(&self, locator: &Locator) -> Option<Arc<MediaResource>>;

    /// Free the resource behind `locator`
    fn revoke(&self, locator: &Locator) -> Result<(), MediaError>;
}

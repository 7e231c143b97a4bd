//! In-process media host handing out `blob:` style locators

use super::{Locator, MediaError, MediaHost, MediaResource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

const LOCATOR_PREFIX: &str = "blob:bitquiz/";

/// In-memory [`MediaHost`]
///
/// Each resource lives until its locator is revoked. Revoking drops the
/// store's reference; readers that already resolved the locator keep their
/// `Arc` until they finish.
#[derive(Debug, Default)]
pub struct BlobStore {
    resources: Mutex<HashMap<Locator, Arc<MediaResource>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resources not yet revoked
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Locator, Arc<MediaResource>>> {
        // A poisoned map is still structurally valid
        self.resources.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MediaHost for BlobStore {
    fn create_resource(&self, bytes: Vec<u8>, mime_type: &str) -> Result<Locator, MediaError> {
        if mime_type.trim().is_empty() {
            return Err(MediaError::CreateFailed("missing MIME type".to_string()));
        }

        let locator = Locator::new(format!("{}{}", LOCATOR_PREFIX, Uuid::new_v4()));
        debug!(locator = %locator, bytes = bytes.len(), mime_type, "Media resource created");

        self.lock().insert(
            locator.clone(),
            Arc::new(MediaResource {
                bytes,
                mime_type: mime_type.to_string(),
            }),
        );
        Ok(locator)
    }

    fn resolve(&self, locator: &Locator) -> Option<Arc<MediaResource>> {
        self.lock().get(locator).cloned()
    }

    fn revoke(&self, locator: &Locator) -> Result<(), MediaError> {
        match self.lock().remove(locator) {
            Some(_) => {
                debug!(locator = %locator, "Media resource revoked");
                Ok(())
            }
            None => Err(MediaError::UnknownLocator(locator.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_resolve_revoke() {
        let store = BlobStore::new();
        let locator = store.create_resource(vec![9, 8, 7], "audio/mpeg").unwrap();

        assert!(locator.as_str().starts_with(LOCATOR_PREFIX));
        let resource = store.resolve(&locator).unwrap();
        assert_eq!(resource.bytes, vec![9, 8, 7]);
        assert_eq!(resource.mime_type, "audio/mpeg");
        assert_eq!(store.live_count(), 1);

        store.revoke(&locator).unwrap();
        assert!(store.resolve(&locator).is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_second_revoke_reports_unknown() {
        let store = BlobStore::new();
        let locator = store.create_resource(vec![1], "audio/wav").unwrap();
        store.revoke(&locator).unwrap();

        assert!(matches!(store.revoke(&locator), Err(MediaError::UnknownLocator(_))));
    }

    #[test]
    fn test_locators_unique() {
        let store = BlobStore::new();
        let a = store.create_resource(vec![], "audio/mpeg").unwrap();
        let b = store.create_resource(vec![], "audio/mpeg").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_mime_rejected() {
        let store = BlobStore::new();
        assert!(matches!(
            store.create_resource(vec![1], " "),
            Err(MediaError::CreateFailed(_))
        ));
    }

    #[test]
    fn test_resolved_arc_outlives_revoke() {
        let store = BlobStore::new();
        let locator = store.create_resource(vec![5; 4], "audio/mpeg").unwrap();
        let held = store.resolve(&locator).unwrap();
        store.revoke(&locator).unwrap();
        assert_eq!(held.bytes.len(), 4);
    }
}

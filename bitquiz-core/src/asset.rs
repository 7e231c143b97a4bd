//! User-selected input file

use std::sync::Arc;

/// Extension used when the file name has none
pub const EXTENSION_SENTINEL: &str = "bin";

/// Base name used when the file name has nothing before the extension
const FALLBACK_BASE_NAME: &str = "audio";

/// The uploaded audio file
///
/// Immutable once constructed. Choosing another file means building a new
/// `InputAsset`, which invalidates every track derived from the old one.
#[derive(Debug, Clone)]
pub struct InputAsset {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl InputAsset {
    /// Wrap an uploaded file
    ///
    /// # Arguments
    /// * `name` - Display name as chosen by the user (e.g. `song.wav`)
    /// * `mime_type` - Declared MIME type, may be empty
    /// * `bytes` - Raw file contents
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Name without the final extension
    pub fn base_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => &self.name,
        }
    }

    /// Substring after the last `.`, or [`EXTENSION_SENTINEL`] when absent
    pub fn extension(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if idx + 1 < self.name.len() => &self.name[idx + 1..],
            _ => EXTENSION_SENTINEL,
        }
    }

    /// Base name reduced to characters safe for scratch file names
    ///
    /// Anything outside `[A-Za-z0-9_-]` becomes `_`.
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .base_name()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        if stem.is_empty() {
            FALLBACK_BASE_NAME.to_string()
        } else {
            stem
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> InputAsset {
        InputAsset::new(name, "audio/wav", vec![1u8, 2, 3])
    }

    #[test]
    fn test_base_name_and_extension() {
        let a = asset("song.wav");
        assert_eq!(a.base_name(), "song");
        assert_eq!(a.extension(), "wav");
        assert_eq!(a.byte_len(), 3);
    }

    #[test]
    fn test_last_dot_wins() {
        let a = asset("live.set.flac");
        assert_eq!(a.base_name(), "live.set");
        assert_eq!(a.extension(), "flac");
    }

    #[test]
    fn test_missing_extension_uses_sentinel() {
        let a = asset("recording");
        assert_eq!(a.base_name(), "recording");
        assert_eq!(a.extension(), EXTENSION_SENTINEL);

        let trailing = asset("take.");
        assert_eq!(trailing.base_name(), "take");
        assert_eq!(trailing.extension(), EXTENSION_SENTINEL);
    }

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(asset("my song (live).mp3").file_stem(), "my_song__live_");
        assert_eq!(asset("../etc/passwd.wav").file_stem(), "___etc_passwd");
        assert_eq!(asset(".wav").file_stem(), "audio");
        assert_eq!(asset("song.wav").file_stem(), "song");
    }
}

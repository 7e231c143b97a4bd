//! Quality tags for the three quiz variants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// True quality of a quiz track
///
/// Exactly one track per variant exists in every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quality {
    /// MP3 re-encode at 128 kbps
    #[serde(rename = "mp3_128")]
    Mp3_128,
    /// MP3 re-encode at 320 kbps
    #[serde(rename = "mp3_320")]
    Mp3_320,
    /// Stream copy of the uploaded file
    #[serde(rename = "original")]
    Original,
}

impl Quality {
    /// All variants, in plan order
    pub const ALL: [Quality; 3] = [Quality::Mp3_128, Quality::Mp3_320, Quality::Original];

    /// Machine tag used in track ids and file names
    pub fn tag(self) -> &'static str {
        match self {
            Quality::Mp3_128 => "mp3_128",
            Quality::Mp3_320 => "mp3_320",
            Quality::Original => "original",
        }
    }

    /// Human-readable label for reports
    pub fn label(self) -> &'static str {
        match self {
            Quality::Mp3_128 => "MP3 128 kbps",
            Quality::Mp3_320 => "MP3 320 kbps",
            Quality::Original => "Original",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mp3_128" => Ok(Quality::Mp3_128),
            "mp3_320" => Ok(Quality::Mp3_320),
            "original" => Ok(Quality::Original),
            other => Err(format!("Unknown quality: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_parse_round_trip() {
        for quality in Quality::ALL {
            assert_eq!(quality.tag().parse::<Quality>().unwrap(), quality);
        }
        assert!("flac".parse::<Quality>().is_err());
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&Quality::Mp3_320).unwrap();
        assert_eq!(json, "\"mp3_320\"");
        let parsed: Quality = serde_json::from_str("\"original\"").unwrap();
        assert_eq!(parsed, Quality::Original);
    }

    #[test]
    fn test_labels_distinct() {
        let labels: std::collections::HashSet<_> = Quality::ALL.iter().map(|q| q.label()).collect();
        assert_eq!(labels.len(), 3);
    }
}

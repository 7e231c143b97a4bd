//! The fixed three-variant transcode plan

use crate::asset::{InputAsset, EXTENSION_SENTINEL};
use crate::quality::Quality;

/// Audition cap applied at transcode time and enforced again at playback
pub const AUDITION_CAP_SECS: u32 = 120;

/// MIME type of the re-encoded variants, and fallback for the original
pub const MPEG_MIME: &str = "audio/mpeg";

/// One entry of the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodePlan {
    pub quality: Quality,
}

impl TranscodePlan {
    /// The three plans, in execution order
    pub fn all() -> [TranscodePlan; 3] {
        Quality::ALL.map(|quality| TranscodePlan { quality })
    }

    /// Scratch name of the session's input file
    pub fn input_name(session_id: &str, asset: &InputAsset) -> String {
        format!("{}_input.{}", session_id, asset.extension())
    }

    /// Scratch name of this plan's output
    pub fn output_name(&self, session_id: &str, asset: &InputAsset) -> String {
        let extension = match self.quality {
            Quality::Mp3_128 | Quality::Mp3_320 => "mp3",
            Quality::Original => asset.extension(),
        };
        format!("{}_{}.{}", session_id, self.quality.tag(), extension)
    }

    /// Codec flags for this plan
    pub fn codec_args(&self) -> Vec<String> {
        let args: &[&str] = match self.quality {
            Quality::Mp3_128 => &["-vn", "-codec:a", "libmp3lame", "-b:a", "128k"],
            Quality::Mp3_320 => &["-vn", "-codec:a", "libmp3lame", "-b:a", "320k"],
            Quality::Original => &["-c", "copy"],
        };
        args.iter().map(|s| s.to_string()).collect()
    }

    /// Explicit output muxer, needed only when the output name carries no
    /// usable extension
    ///
    /// A stream copy of an extensionless upload is written as `*.bin`, from
    /// which ffmpeg cannot infer a container. The declared MIME type picks
    /// one; anything unrecognized goes to Matroska, which accepts any audio
    /// codec.
    pub fn output_format(&self, asset: &InputAsset) -> Option<&'static str> {
        if self.quality != Quality::Original || asset.extension() != EXTENSION_SENTINEL {
            return None;
        }
        let format = match asset.mime_type().trim().to_ascii_lowercase().as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/flac" | "audio/x-flac" => "flac",
            "audio/ogg" => "ogg",
            "audio/aac" => "adts",
            "audio/mp4" | "audio/x-m4a" => "ipod",
            _ => "matroska",
        };
        Some(format)
    }

    /// Complete engine invocation: input, duration cap, codec flags, output last
    pub fn engine_args(&self, input_name: &str, output_name: &str, asset: &InputAsset) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            input_name.to_string(),
            "-t".to_string(),
            AUDITION_CAP_SECS.to_string(),
        ];
        args.extend(self.codec_args());
        if let Some(format) = self.output_format(asset) {
            args.push("-f".to_string());
            args.push(format.to_string());
        }
        args.push(output_name.to_string());
        args
    }

    /// MIME type of the produced resource
    pub fn output_mime(&self, asset: &InputAsset) -> String {
        match self.quality {
            Quality::Mp3_128 | Quality::Mp3_320 => MPEG_MIME.to_string(),
            Quality::Original => {
                let declared = asset.mime_type().trim();
                if declared.is_empty() {
                    MPEG_MIME.to_string()
                } else {
                    declared.to_string()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav() -> InputAsset {
        InputAsset::new("song.wav", "audio/wav", vec![0u8; 4])
    }

    #[test]
    fn test_plan_covers_each_quality_once() {
        let qualities: Vec<Quality> = TranscodePlan::all().iter().map(|p| p.quality).collect();
        assert_eq!(qualities, Quality::ALL.to_vec());
    }

    #[test]
    fn test_names_are_session_scoped() {
        let asset = wav();
        assert_eq!(TranscodePlan::input_name("song_1", &asset), "song_1_input.wav");

        let names: Vec<String> = TranscodePlan::all()
            .iter()
            .map(|p| p.output_name("song_1", &asset))
            .collect();
        assert_eq!(
            names,
            vec!["song_1_mp3_128.mp3", "song_1_mp3_320.mp3", "song_1_original.wav"]
        );
    }

    #[test]
    fn test_engine_args_cap_and_output_last() {
        let plan = TranscodePlan { quality: Quality::Mp3_320 };
        let args = plan.engine_args("in.wav", "out.mp3", &wav());

        assert_eq!(&args[..4], &["-i", "in.wav", "-t", "120"]);
        assert!(args.windows(2).any(|w| w == ["-b:a", "320k"]));
        assert_eq!(args.last().map(String::as_str), Some("out.mp3"));
    }

    #[test]
    fn test_original_is_stream_copy() {
        let plan = TranscodePlan { quality: Quality::Original };
        assert_eq!(plan.codec_args(), vec!["-c", "copy"]);
    }

    #[test]
    fn test_extensionless_copy_names_its_muxer() {
        let [low, _, original] = TranscodePlan::all();
        let asset = wav();
        assert_eq!(original.output_format(&asset), None);
        assert!(!original.engine_args("in.wav", "out.wav", &asset).contains(&"-f".to_string()));

        let wav_upload = InputAsset::new("recording", "audio/wav", vec![0u8]);
        assert_eq!(original.output_format(&wav_upload), Some("wav"));
        assert_eq!(low.output_format(&wav_upload), None);

        let unknown = InputAsset::new("recording", "", vec![0u8]);
        let args = original.engine_args("s_input.bin", "s_original.bin", &unknown);
        assert_eq!(&args[args.len() - 3..], &["-f", "matroska", "s_original.bin"]);
    }

    #[test]
    fn test_mime_rules() {
        let asset = wav();
        let [low, high, original] = TranscodePlan::all();
        assert_eq!(low.output_mime(&asset), "audio/mpeg");
        assert_eq!(high.output_mime(&asset), "audio/mpeg");
        assert_eq!(original.output_mime(&asset), "audio/wav");

        let undeclared = InputAsset::new("clip.ogg", "", vec![0u8]);
        assert_eq!(original.output_mime(&undeclared), "audio/mpeg");
    }
}

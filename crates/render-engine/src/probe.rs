//! ffprobe-backed media probe.

use reelgraph_common::{ReelError, ReelResult};
use reelgraph_processing_core::{MediaInfo, MediaProbe};
use serde::Deserialize;
use tokio::process::Command;

/// Runs `ffprobe` and reads stream and container metadata from its JSON
/// output.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: String,
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait::async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe(&self, src: &str) -> ReelResult<MediaInfo> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(src)
            .output()
            .await
            .map_err(|e| ReelError::resource(format!("Failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(ReelError::resource(format!(
                "{} failed for {src}: {}",
                self.binary,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let info = parse_probe_output(&output.stdout)?;
        tracing::debug!(
            src,
            width = ?info.width,
            height = ?info.height,
            duration = ?info.duration_secs,
            has_audio = info.has_audio,
            "Probed media"
        );
        Ok(info)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeOutput {
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_output(raw: &[u8]) -> ReelResult<MediaInfo> {
    let parsed: ProbeOutput = serde_json::from_slice(raw)
        .map_err(|e| ReelError::resource(format!("Unreadable ffprobe output: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    Ok(MediaInfo {
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        duration_secs: parsed
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0),
        frame_rate: video
            .and_then(|s| s.r_frame_rate.as_deref())
            .and_then(parse_frame_rate),
        has_video: video.is_some(),
        has_audio: parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio")),
    })
}

/// Parse an `r_frame_rate` ratio such as `30000/1001`.
pub fn parse_frame_rate(ratio: &str) -> Option<f64> {
    let (num, den) = ratio.split_once('/')?;
    let num = num.trim().parse::<i64>().ok()?;
    let den = den.trim().parse::<i64>().ok()?;
    if den == 0 || num <= 0 {
        return None;
    }
    Some(num as f64 / den as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30000/1001"},
            {"index": 1, "codec_type": "audio", "sample_rate": "48000"}
        ],
        "format": {"filename": "clip.mp4", "duration": "12.480000"}
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let info = parse_probe_output(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.dimensions(), Some((1920.0, 1080.0)));
        assert_eq!(info.duration_secs, Some(12.48));
        assert!((info.frame_rate.unwrap() - 29.97).abs() < 0.01);
        assert!(info.has_video);
        assert!(info.has_audio);
    }

    #[test]
    fn test_audio_only_file() {
        let raw = r#"{"streams":[{"codec_type":"audio"}],"format":{"duration":"3.5"}}"#;
        let info = parse_probe_output(raw.as_bytes()).unwrap();
        assert_eq!(info.width, None);
        assert!(!info.has_video);
        assert!(info.has_audio);
        assert_eq!(info.duration_secs, Some(3.5));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("30"), None);
    }

    #[test]
    fn test_garbage_is_resource_error() {
        let err = parse_probe_output(b"not json").unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_missing_binary_is_resource_error() {
        let probe = FfprobeProbe::new("reelgraph-no-such-ffprobe");
        let err = probe.probe("clip.mp4").await.unwrap_err();
        assert!(matches!(err, ReelError::Resource { .. }));
    }
}

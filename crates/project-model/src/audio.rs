//! Timed audio clips.

use serde::{Deserialize, Serialize};

use crate::project::ProjectError;

/// An audio clip placed on the timeline.
///
/// The source window `[audio_begin, audio_end]` is played at `speed`,
/// looped when shorter than the timeline window `[enter, exit]`, scaled by
/// `volume` and delayed to `enter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioItem {
    pub id: Option<String>,
    pub src: String,

    /// Timeline placement (seconds).
    pub enter: f64,
    pub exit: Option<f64>,

    pub volume: f64,
    pub speed: f64,

    /// Source trim window (seconds into the source file).
    pub audio_begin: f64,
    pub audio_end: Option<f64>,
    /// Probed length of the source file.
    pub audio_duration: Option<f64>,

    pub track: i32,
}

impl Default for AudioItem {
    fn default() -> Self {
        Self {
            id: None,
            src: String::new(),
            enter: 0.0,
            exit: None,
            volume: 1.0,
            speed: 1.0,
            audio_begin: 0.0,
            audio_end: None,
            audio_duration: None,
            track: 0,
        }
    }
}

impl AudioItem {
    /// Length of the trimmed source window.
    pub fn source_duration(&self) -> f64 {
        let end = self
            .audio_end
            .or(self.audio_duration)
            .unwrap_or(self.audio_begin);
        (end - self.audio_begin).max(0.0)
    }

    /// Length the clip occupies on the timeline.
    pub fn timeline_duration(&self) -> f64 {
        match self.exit {
            Some(exit) if exit > self.enter => exit - self.enter,
            _ => self.source_duration(),
        }
    }

    /// Source window length after the tempo change.
    pub fn speed_adjusted_duration(&self) -> f64 {
        if self.speed > 0.0 {
            self.source_duration() / self.speed
        } else {
            self.source_duration()
        }
    }

    /// Extra repetitions needed to fill the timeline window.
    ///
    /// `None` when the tempo-adjusted source already covers the window.
    pub fn loop_count(&self) -> Option<u32> {
        let adjusted = self.speed_adjusted_duration();
        let timeline = self.timeline_duration();
        if adjusted <= 0.0 || adjusted >= timeline {
            return None;
        }
        let repeats = (timeline / adjusted).ceil() - 1.0;
        (repeats >= 1.0).then_some(repeats as u32)
    }

    pub fn validate(&self) -> Result<(), ProjectError> {
        let label = self.id.as_deref().unwrap_or(self.src.as_str());
        if self.src.is_empty() {
            return Err(ProjectError::ValidationError {
                message: "audio item has no src".to_string(),
            });
        }
        if self.speed <= 0.0 || !self.speed.is_finite() {
            return Err(ProjectError::ValidationError {
                message: format!("{label}: audio speed must be positive"),
            });
        }
        if self.audio_begin < 0.0 {
            return Err(ProjectError::ValidationError {
                message: format!("{label}: audioBegin must be >= 0"),
            });
        }
        if let Some(end) = self.audio_end {
            if end <= self.audio_begin {
                return Err(ProjectError::ValidationError {
                    message: format!(
                        "{label}: audioEnd ({end}) must be greater than audioBegin ({})",
                        self.audio_begin
                    ),
                });
            }
        }
        if self.enter < 0.0 {
            return Err(ProjectError::ValidationError {
                message: format!("{label}: enter must be >= 0"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clip(begin: f64, end: f64, enter: f64, exit: Option<f64>, speed: f64) -> AudioItem {
        AudioItem {
            src: "music.mp3".into(),
            audio_begin: begin,
            audio_end: Some(end),
            enter,
            exit,
            speed,
            ..Default::default()
        }
    }

    #[test]
    fn test_timeline_duration_falls_back_to_source() {
        let a = clip(2.0, 6.0, 1.0, None, 1.0);
        assert_eq!(a.source_duration(), 4.0);
        assert_eq!(a.timeline_duration(), 4.0);

        let b = clip(2.0, 6.0, 1.0, Some(11.0), 1.0);
        assert_eq!(b.timeline_duration(), 10.0);
    }

    #[test]
    fn test_loop_count() {
        // 4s source filling 10s: 3 plays, 2 extra loops
        assert_eq!(clip(0.0, 4.0, 0.0, Some(10.0), 1.0).loop_count(), Some(2));
        // double speed halves the source: 2s into 10s
        assert_eq!(clip(0.0, 4.0, 0.0, Some(10.0), 2.0).loop_count(), Some(4));
        // long enough already
        assert_eq!(clip(0.0, 12.0, 0.0, Some(10.0), 1.0).loop_count(), None);
        assert_eq!(clip(0.0, 5.0, 0.0, Some(10.0), 1.0).loop_count(), Some(1));
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        assert!(clip(3.0, 3.0, 0.0, None, 1.0).validate().is_err());
        assert!(clip(0.0, 3.0, 0.0, None, 0.0).validate().is_err());
        assert!(clip(0.0, 3.0, 0.0, None, 1.5).validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_loop_count_matches_formula(
            source in 0.1f64..30.0,
            timeline in 0.1f64..120.0,
            speed in 0.25f64..4.0,
        ) {
            let item = clip(0.0, source, 0.0, Some(timeline), speed);
            let adjusted = source / speed;
            match item.loop_count() {
                None => prop_assert!(adjusted >= timeline || (timeline / adjusted).ceil() - 1.0 < 1.0),
                Some(n) => {
                    prop_assert!(adjusted < timeline);
                    prop_assert_eq!(n as f64, (timeline / adjusted).ceil() - 1.0);
                    // enough repetitions, but not one too many
                    prop_assert!(adjusted * (n as f64 + 1.0) >= timeline);
                    prop_assert!(adjusted * (n as f64) < timeline);
                }
            }
        }
    }
}

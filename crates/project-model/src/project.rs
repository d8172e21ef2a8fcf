//! Scene file and project-level settings.
//!
//! A scene file (`project.json`) is the top-level container that ties
//! together the canvas, timeline length, visual items, audio items and
//! subtitles.

use std::path::{Path, PathBuf};

use reelgraph_common::ReelError;
use serde::{Deserialize, Serialize};

use crate::audio::AudioItem;
use crate::color::is_opaque_hex;
use crate::item::{Item, ItemKind};
use crate::layout::{Canvas, ResolutionPreset};
use crate::subtitle::Subtitle;

/// Container formats the engine is asked to produce.
pub const SUPPORTED_FORMATS: [&str; 15] = [
    "mp4", "mkv", "avi", "mov", "webm", "flv", "wmv", "ogv", "m4v", "3gp", "asf", "f4v", "ts",
    "mts", "m2ts",
];

/// Top-level scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectFile {
    /// Output base name.
    pub name: String,

    /// Explicit canvas size, used when no preset (or `custom`) is given.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub resolution: Option<ResolutionPreset>,

    /// Timeline length in seconds.
    pub duration: f64,
    pub frame_rate: f64,

    /// `#rrggbb` canvas color.
    pub background_color: String,
    pub output_format: String,

    /// Image attached to the output as cover art.
    pub thumbnail: Option<String>,

    pub visuals: Vec<Item>,
    pub audios: Vec<AudioItem>,
    pub subtitle: Option<Subtitle>,
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            width: None,
            height: None,
            resolution: None,
            duration: 10.0,
            frame_rate: 30.0,
            background_color: "#ffffff".to_string(),
            output_format: "mp4".to_string(),
            thumbnail: None,
            visuals: vec![],
            audios: vec![],
            subtitle: None,
        }
    }
}

/// Validated project-level settings handed to every compilation stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSettings {
    pub name: String,
    pub canvas: Canvas,
    pub duration: f64,
    pub frame_rate: f64,
    pub background_color: String,
    /// Lowercased container extension.
    pub output_format: String,
    pub thumbnail: Option<String>,
}

impl ProjectFile {
    /// Canvas size: a non-custom preset wins over explicit width/height.
    pub fn canvas(&self) -> Canvas {
        if let Some(canvas) = self.resolution.and_then(ResolutionPreset::dimensions) {
            return canvas;
        }
        Canvas::new(
            self.width.unwrap_or(Canvas::DEFAULT.width),
            self.height.unwrap_or(Canvas::DEFAULT.height),
        )
    }

    /// Validate project-level fields and resolve them into settings.
    pub fn settings(&self) -> Result<ProjectSettings, ProjectError> {
        let canvas = self.canvas();
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ProjectError::configuration(format!(
                "canvas must have a positive size, got {}",
                canvas.size()
            )));
        }
        if !(self.duration > 0.0 && self.duration.is_finite()) {
            return Err(ProjectError::configuration(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }
        if !(self.frame_rate > 0.0 && self.frame_rate.is_finite()) {
            return Err(ProjectError::configuration(format!(
                "frameRate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !is_opaque_hex(&self.background_color) {
            return Err(ProjectError::configuration(format!(
                "backgroundColor must be #rrggbb, got {:?}",
                self.background_color
            )));
        }

        let output_format = self.output_format.to_lowercase();
        if !SUPPORTED_FORMATS.contains(&output_format.as_str()) {
            return Err(ProjectError::configuration(format!(
                "unsupported output format: {}. Supported formats: {}",
                self.output_format,
                SUPPORTED_FORMATS.join(", ")
            )));
        }

        Ok(ProjectSettings {
            name: self.name.clone(),
            canvas,
            duration: self.duration,
            frame_rate: self.frame_rate,
            background_color: self.background_color.clone(),
            output_format,
            thumbnail: self.thumbnail.clone(),
        })
    }

    /// Validate project settings and every item.
    pub fn validate(&self) -> Result<ProjectSettings, ProjectError> {
        let settings = self.settings()?;
        for item in &self.visuals {
            item.validate()?;
        }
        for audio in &self.audios {
            audio.validate()?;
        }
        Ok(settings)
    }

    /// Rewrite relative media references so they resolve against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |src: &mut String| {
            if !src.is_empty() && !is_url(src) && Path::new(src.as_str()).is_relative() {
                *src = base.join(src.as_str()).to_string_lossy().into_owned();
            }
        };

        for item in &mut self.visuals {
            match &mut item.kind {
                ItemKind::Video(v) => resolve(&mut v.src),
                ItemKind::Gif(g) => resolve(&mut g.src),
                ItemKind::Image(i) => {
                    resolve(&mut i.src);
                    if let Some(raster) = i.image_src.as_mut() {
                        resolve(raster);
                    }
                }
                ItemKind::Text(t) => {
                    if let Some(raster) = t.image_src.as_mut() {
                        resolve(raster);
                    }
                }
                ItemKind::Svg(s) => {
                    if let Some(raster) = s.image_src.as_mut() {
                        resolve(raster);
                    }
                }
            }
        }
        for audio in &mut self.audios {
            resolve(&mut audio.src);
        }
        if let Some(thumbnail) = self.thumbnail.as_mut() {
            resolve(thumbnail);
        }
    }
}

/// Whether a media reference is a remote URL.
pub fn is_url(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// A scene file loaded from disk.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    /// Path of the scene file.
    pub path: PathBuf,

    /// Scene contents, with relative media paths resolved.
    pub project: ProjectFile,
}

impl LoadedProject {
    /// Load a scene file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref().to_path_buf();

        let json = std::fs::read_to_string(&path).map_err(|e| ProjectError::IoError {
            path: path.clone(),
            source: e,
        })?;

        let mut project: ProjectFile =
            serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
                path: path.clone(),
                source: e,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        project.resolve_paths(base);

        Ok(Self { path, project })
    }

    /// Write the scene file back to disk.
    pub fn save(&self) -> Result<(), ProjectError> {
        let json =
            serde_json::to_string_pretty(&self.project).map_err(|e| ProjectError::ParseError {
                path: self.path.clone(),
                source: e,
            })?;
        std::fs::write(&self.path, json).map_err(|e| ProjectError::IoError {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Report local media references that do not exist on disk.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        let mut check = |src: &str, label: &str| {
            if !src.is_empty() && !is_url(src) && !Path::new(src).exists() {
                errors.push(format!("{label} source missing: {src}"));
            }
        };

        for item in &self.project.visuals {
            if let Some(src) = item.probe_source() {
                check(src, item.kind.name());
            }
        }
        for audio in &self.project.audios {
            check(&audio.src, "AUDIO");
        }
        if let Some(thumbnail) = &self.project.thumbnail {
            check(thumbnail, "Thumbnail");
        }

        errors
    }
}

/// Errors that can occur when loading or validating a scene file.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ConfigurationError { message: String },

    #[error("Invalid item: {message}")]
    ValidationError { message: String },
}

impl ProjectError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }
}

impl From<ProjectError> for ReelError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::IoError { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                ReelError::FileNotFound { path }
            }
            ProjectError::IoError { source, .. } => ReelError::Io(source),
            ProjectError::ParseError { path, source } => {
                ReelError::configuration(format!("{}: {source}", path.display()))
            }
            ProjectError::ConfigurationError { message } => ReelError::configuration(message),
            ProjectError::ValidationError { message } => ReelError::validation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ImageProps, VideoProps};

    #[test]
    fn test_defaults_from_empty_scene() {
        let project: ProjectFile = serde_json::from_str("{}").unwrap();
        assert_eq!(project.name, "unnamed");
        assert_eq!(project.duration, 10.0);
        assert_eq!(project.frame_rate, 30.0);
        assert_eq!(project.background_color, "#ffffff");

        let settings = project.settings().unwrap();
        assert_eq!(settings.canvas, Canvas::new(1280, 720));
        assert_eq!(settings.output_format, "mp4");
    }

    #[test]
    fn test_resolution_preset_overrides_explicit_size() {
        let project = ProjectFile {
            width: Some(100),
            height: Some(100),
            resolution: Some(ResolutionPreset::Tiktok),
            ..Default::default()
        };
        assert_eq!(project.canvas(), Canvas::new(1080, 1920));

        let custom = ProjectFile {
            width: Some(100),
            height: Some(50),
            resolution: Some(ResolutionPreset::Custom),
            ..Default::default()
        };
        assert_eq!(custom.canvas(), Canvas::new(100, 50));
    }

    #[test]
    fn test_output_format_is_normalized() {
        let project = ProjectFile {
            output_format: "MKV".into(),
            ..Default::default()
        };
        assert_eq!(project.settings().unwrap().output_format, "mkv");

        let bad = ProjectFile {
            output_format: "exe".into(),
            ..Default::default()
        };
        assert!(matches!(
            bad.settings(),
            Err(ProjectError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_project_fields() {
        for project in [
            ProjectFile {
                duration: 0.0,
                ..Default::default()
            },
            ProjectFile {
                background_color: "white".into(),
                ..Default::default()
            },
            ProjectFile {
                width: Some(0),
                ..Default::default()
            },
        ] {
            let err: ReelError = project.settings().unwrap_err().into();
            assert!(matches!(err, ReelError::Configuration { .. }));
        }
    }

    #[test]
    fn test_resolve_paths_keeps_urls_and_absolute_paths() {
        let mut project = ProjectFile {
            visuals: vec![
                Item::new(ItemKind::Video(VideoProps {
                    src: "clips/a.mp4".into(),
                    ..Default::default()
                })),
                Item::new(ItemKind::Image(ImageProps {
                    src: "https://example.com/b.png".into(),
                    image_src: None,
                })),
            ],
            audios: vec![AudioItem {
                src: "/abs/music.mp3".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        project.resolve_paths(Path::new("/scenes"));

        assert_eq!(
            project.visuals[0].probe_source(),
            Some("/scenes/clips/a.mp4")
        );
        assert_eq!(
            project.visuals[1].probe_source(),
            Some("https://example.com/b.png")
        );
        assert_eq!(project.audios[0].src, "/abs/music.mp3");
    }

    #[test]
    fn test_loaded_project_load_and_save() {
        let dir = std::env::temp_dir().join("reelgraph_test_project");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("project.json");
        std::fs::write(
            &path,
            r#"{"name":"demo","visuals":[{"type":"IMAGE","src":"logo.png"}]}"#,
        )
        .unwrap();

        let loaded = LoadedProject::load(&path).unwrap();
        assert_eq!(loaded.project.name, "demo");
        assert_eq!(
            loaded.validate_sources(),
            vec![format!("IMAGE source missing: {}", dir.join("logo.png").display())]
        );

        loaded.save().unwrap();
        let reloaded = LoadedProject::load(&path).unwrap();
        assert_eq!(reloaded.project.visuals.len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_maps_to_file_not_found() {
        let err: ReelError = LoadedProject::load("/nonexistent/reelgraph/project.json")
            .unwrap_err()
            .into();
        assert!(matches!(err, ReelError::FileNotFound { .. }));
    }
}

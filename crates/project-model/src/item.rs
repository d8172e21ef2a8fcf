//! Visual timeline items.
//!
//! An [`Item`] is a set of fields shared by every layer ([`ItemBase`]) plus
//! a variant payload ([`ItemKind`]) selected by the `type` tag:
//!
//! ```json
//! { "type": "VIDEO", "src": "clip.mp4", "x": 0, "y": 0, "enterBegin": 2 }
//! ```
//!
//! Optional fields that depend on the project or on probed media stay
//! `None` until normalization fills them in.

use serde::{Deserialize, Serialize};

use crate::layout::{Anchor, PositionPreset, ResizeMode};
use crate::project::ProjectError;

/// A visual layer placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(flatten)]
    pub base: ItemBase,

    #[serde(flatten)]
    pub kind: ItemKind,
}

/// Fields shared by every item variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemBase {
    /// Identifier referenced by transition chains.
    pub id: Option<String>,

    /// Anchor point on the canvas (pixels).
    pub x: f64,
    pub y: f64,

    /// Rendered size (pixels). Filled during normalization.
    pub width: Option<f64>,
    pub height: Option<f64>,

    /// Rotation in degrees.
    pub angle: f64,

    /// Layer opacity `[0.0, 1.0]`.
    pub opacity: f64,

    pub flip_h: bool,
    pub flip_v: bool,

    /// Track index; lower tracks are composited first.
    pub track: i32,

    /// Timeline window (seconds).
    pub enter_begin: f64,
    pub enter_end: f64,
    pub exit_begin: Option<f64>,
    pub exit_end: Option<f64>,

    /// Engine transition names used for entry/exit animations.
    pub enter_animation: Option<String>,
    pub exit_animation: Option<String>,

    pub position: Option<PositionPreset>,
    pub anchor: Option<Anchor>,
    pub resize: Option<ResizeMode>,

    pub crop_params: Option<CropRect>,
    pub chroma_key: Option<ChromaKey>,
    pub filter: Option<StyleFilter>,

    /// Slow linear zoom-in over the visible duration.
    pub zoom: bool,
}

impl Default for ItemBase {
    fn default() -> Self {
        Self {
            id: None,
            x: 0.0,
            y: 0.0,
            width: None,
            height: None,
            angle: 0.0,
            opacity: 1.0,
            flip_h: false,
            flip_v: false,
            track: 0,
            enter_begin: 0.0,
            enter_end: 0.0,
            exit_begin: None,
            exit_end: None,
            enter_animation: None,
            exit_animation: None,
            position: None,
            anchor: None,
            resize: None,
            crop_params: None,
            chroma_key: None,
            filter: None,
            zoom: false,
        }
    }
}

/// Variant payload, discriminated by the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum ItemKind {
    #[serde(alias = "video", alias = "Video")]
    Video(VideoProps),
    #[serde(alias = "image", alias = "Image")]
    Image(ImageProps),
    #[serde(alias = "gif", alias = "Gif")]
    Gif(GifProps),
    #[serde(alias = "text", alias = "Text")]
    Text(TextProps),
    #[serde(alias = "svg", alias = "Svg")]
    Svg(SvgProps),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoProps {
    pub src: String,

    /// Source trim window (seconds into the source file).
    pub video_begin: f64,
    pub video_end: Option<f64>,
    pub video_duration: Option<f64>,

    pub volume: f64,
    pub speed: f64,

    /// Transition effect played into the next chained item.
    pub transition: Option<String>,
    pub transition_duration: Option<f64>,
    /// Id of the next item in the transition chain (`"none"` ends it).
    pub transition_id: Option<String>,

    pub frame_rate: Option<f64>,
    pub has_audio: Option<bool>,
}

impl Default for VideoProps {
    fn default() -> Self {
        Self {
            src: String::new(),
            video_begin: 0.0,
            video_end: None,
            video_duration: None,
            volume: 1.0,
            speed: 1.0,
            transition: None,
            transition_duration: None,
            transition_id: None,
            frame_rate: None,
            has_audio: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProps {
    pub src: String,
    /// Rasterized bitmap produced by the rendering surface.
    pub image_src: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GifProps {
    pub src: String,
    pub speed: f64,
}

impl Default for GifProps {
    fn default() -> Self {
        Self {
            src: String::new(),
            speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProps {
    pub text: Option<String>,
    pub html: Option<String>,
    /// CSS properties forwarded to the rendering surface.
    pub style: Option<serde_json::Value>,
    pub image_src: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SvgProps {
    pub svg: String,
    pub image_src: Option<String>,
}

/// Source-space crop rectangle (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Color keying. Similarity and blend are expressed on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromaKey {
    pub color: String,
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub blend: Option<f64>,
}

/// CSS-like color adjustments applied to the color channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleFilter {
    /// -100..100
    pub brightness: Option<f64>,
    /// -100..100
    pub contrast: Option<f64>,
    /// -100..100
    pub saturate: Option<f64>,
    /// Degrees, e.g. `90` or `"90deg"`.
    #[serde(rename = "hue-rotate")]
    pub hue_rotate: Option<NumberOrText>,
    /// 0..100, percent of half the shorter side.
    pub blur: Option<NumberOrText>,
    pub invert: Option<Invert>,
    /// `#rrggbb` channel multiplier.
    pub color_tint: Option<String>,
}

/// A number that may also arrive as text with a unit suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    /// Numeric value, reading the leading decimal number of text values.
    pub fn value(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(s) => leading_number(s),
        }
    }
}

/// Invert either on/off or with a 0..1 strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Invert {
    Flag(bool),
    Strength(f64),
}

impl Invert {
    pub fn strength(self) -> f64 {
        match self {
            Invert::Flag(true) => 1.0,
            Invert::Flag(false) => 0.0,
            Invert::Strength(s) => s,
        }
    }
}

fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in text.char_indices() {
        let ok = c.is_ascii_digit()
            || (i == 0 && (c == '-' || c == '+'))
            || (c == '.' && !std::mem::replace(&mut seen_dot, true));
        if !ok {
            break;
        }
        end = i + c.len_utf8();
    }
    text[..end].parse().ok()
}

impl ItemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Video(_) => "VIDEO",
            ItemKind::Image(_) => "IMAGE",
            ItemKind::Gif(_) => "GIF",
            ItemKind::Text(_) => "TEXT",
            ItemKind::Svg(_) => "SVG",
        }
    }
}

impl Item {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            base: ItemBase::default(),
            kind,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.base.id.as_deref()
    }

    pub fn as_video(&self) -> Option<&VideoProps> {
        match &self.kind {
            ItemKind::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self.kind, ItemKind::Video(_))
    }

    /// Video or GIF: items whose source carries its own frame timing.
    pub fn is_motion_media(&self) -> bool {
        matches!(self.kind, ItemKind::Video(_) | ItemKind::Gif(_))
    }

    /// Zoom and resize only apply to bitmap/video media.
    pub fn is_scalable_media(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Video(_) | ItemKind::Image(_) | ItemKind::Gif(_)
        )
    }

    pub fn width(&self) -> f64 {
        self.base.width.unwrap_or_default()
    }

    pub fn height(&self) -> f64 {
        self.base.height.unwrap_or_default()
    }

    pub fn exit_begin(&self) -> f64 {
        self.base.exit_begin.unwrap_or_default()
    }

    pub fn exit_end(&self) -> f64 {
        self.base.exit_end.unwrap_or_default()
    }

    /// Playback speed for motion media, 1.0 otherwise.
    pub fn speed(&self) -> f64 {
        match &self.kind {
            ItemKind::Video(v) => v.speed,
            ItemKind::Gif(g) => g.speed,
            _ => 1.0,
        }
    }

    /// Media path the engine should read for this item.
    pub fn input_source(&self) -> Option<&str> {
        let src = match &self.kind {
            ItemKind::Video(v) => Some(v.src.as_str()),
            ItemKind::Gif(g) => Some(g.src.as_str()),
            ItemKind::Image(i) => i.image_src.as_deref().or(Some(i.src.as_str())),
            ItemKind::Text(t) => t.image_src.as_deref(),
            ItemKind::Svg(s) => s.image_src.as_deref(),
        };
        src.filter(|s| !s.is_empty())
    }

    /// Source reference that can be probed for intrinsic metadata.
    pub fn probe_source(&self) -> Option<&str> {
        let src = match &self.kind {
            ItemKind::Video(v) => v.src.as_str(),
            ItemKind::Gif(g) => g.src.as_str(),
            ItemKind::Image(i) => i.src.as_str(),
            ItemKind::Text(_) | ItemKind::Svg(_) => return None,
        };
        (!src.is_empty()).then_some(src)
    }

    /// `(effect, next_id)` when this video starts or continues a transition chain.
    pub fn transition_link(&self) -> Option<(&str, &str)> {
        let video = self.as_video()?;
        let effect = video.transition.as_deref().filter(|t| !t.is_empty())?;
        let next = video
            .transition_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != "none")?;
        Some((effect, next))
    }

    /// Next chain id regardless of whether a transition effect is declared.
    pub fn next_in_chain(&self) -> Option<&str> {
        self.as_video()?
            .transition_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != "none")
    }

    /// Check the timing window and numeric ranges.
    pub fn validate(&self) -> Result<(), ProjectError> {
        let label = self.id().unwrap_or(self.kind.name());
        let b = &self.base;
        let invalid = |message: String| Err(ProjectError::ValidationError { message });

        if b.enter_begin < 0.0 || b.enter_end < b.enter_begin {
            return invalid(format!(
                "{label}: enterBegin ({}) must be >= 0 and <= enterEnd ({})",
                b.enter_begin, b.enter_end
            ));
        }
        if let (Some(exit_begin), Some(exit_end)) = (b.exit_begin, b.exit_end) {
            if exit_begin > exit_end {
                return invalid(format!(
                    "{label}: exitBegin ({exit_begin}) must be <= exitEnd ({exit_end})"
                ));
            }
        }
        if let Some(exit_end) = b.exit_end {
            if exit_end < b.enter_begin {
                return invalid(format!(
                    "{label}: exitEnd ({exit_end}) ends before enterBegin ({})",
                    b.enter_begin
                ));
            }
        }
        if !(0.0..=1.0).contains(&b.opacity) {
            return invalid(format!("{label}: opacity {} outside [0, 1]", b.opacity));
        }
        if self.speed() <= 0.0 || !self.speed().is_finite() {
            return invalid(format!("{label}: speed must be positive"));
        }
        if let Some(crop) = &b.crop_params {
            if crop.width <= 0.0 || crop.height <= 0.0 {
                return invalid(format!("{label}: crop rectangle must have a positive size"));
            }
        }
        Ok(())
    }
}

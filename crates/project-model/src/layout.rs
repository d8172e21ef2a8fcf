//! Placement presets: anchors, position presets, resize modes, and canvas.

use serde::{Deserialize, Serialize};

/// Output canvas dimensions in pixels.
///
/// Passed explicitly to every stage that needs the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub const DEFAULT: Canvas = Canvas {
        width: 1280,
        height: 720,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width_f64(&self) -> f64 {
        self.width as f64
    }

    pub fn height_f64(&self) -> f64 {
        self.height as f64
    }

    /// `WxH` size string.
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which point of an overlay the item's `(x, y)` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterCenter,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::CenterCenter,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Horizontal and vertical fraction of the overlay size that lies
    /// left of / above the anchor point (0.0, 0.5 or 1.0).
    pub fn fractions(self) -> (f64, f64) {
        match self {
            Anchor::TopLeft => (0.0, 0.0),
            Anchor::TopCenter => (0.5, 0.0),
            Anchor::TopRight => (1.0, 0.0),
            Anchor::CenterLeft => (0.0, 0.5),
            Anchor::CenterCenter => (0.5, 0.5),
            Anchor::CenterRight => (1.0, 0.5),
            Anchor::BottomLeft => (0.0, 1.0),
            Anchor::BottomCenter => (0.5, 1.0),
            Anchor::BottomRight => (1.0, 1.0),
        }
    }

    /// Top-left offset of an overlay of size `width x height` whose anchor
    /// point sits at `(x, y)`.
    pub fn top_left(self, x: f64, y: f64, width: f64, height: f64) -> (f64, f64) {
        let (fx, fy) = self.fractions();
        (x - width * fx, y - height * fy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::CenterLeft => "center-left",
            Anchor::CenterCenter => "center-center",
            Anchor::CenterRight => "center-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }
}

/// Canvas placement preset. `Custom` keeps the explicit coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionPreset {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterCenter,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Custom,
}

impl PositionPreset {
    /// The anchor matching this preset, `None` for `Custom`.
    pub fn anchor(self) -> Option<Anchor> {
        match self {
            PositionPreset::TopLeft => Some(Anchor::TopLeft),
            PositionPreset::TopCenter => Some(Anchor::TopCenter),
            PositionPreset::TopRight => Some(Anchor::TopRight),
            PositionPreset::CenterLeft => Some(Anchor::CenterLeft),
            PositionPreset::CenterCenter => Some(Anchor::CenterCenter),
            PositionPreset::CenterRight => Some(Anchor::CenterRight),
            PositionPreset::BottomLeft => Some(Anchor::BottomLeft),
            PositionPreset::BottomCenter => Some(Anchor::BottomCenter),
            PositionPreset::BottomRight => Some(Anchor::BottomRight),
            PositionPreset::Custom => None,
        }
    }
}

/// How media dimensions are fitted to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Fit inside the canvas, keeping aspect ratio.
    Contain,
    /// Fill the canvas, keeping aspect ratio (overflow is cropped by the frame).
    Cover,
}

/// Named canvas sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPreset {
    Sd,
    Hd,
    FullHd,
    Squared,
    YoutubeShort,
    YoutubeVideo,
    Tiktok,
    InstagramReel,
    InstagramPost,
    InstagramStory,
    InstagramFeed,
    TwitterLandscape,
    TwitterPortrait,
    TwitterSquare,
    FacebookVideo,
    FacebookStory,
    FacebookPost,
    Snapshat,
    Custom,
}

impl ResolutionPreset {
    /// Preset dimensions; `None` for `Custom`.
    pub fn dimensions(self) -> Option<Canvas> {
        let (w, h) = match self {
            ResolutionPreset::Sd => (640, 480),
            ResolutionPreset::Hd => (1280, 720),
            ResolutionPreset::FullHd | ResolutionPreset::YoutubeVideo => (1920, 1080),
            ResolutionPreset::Squared
            | ResolutionPreset::InstagramPost
            | ResolutionPreset::InstagramFeed
            | ResolutionPreset::TwitterSquare
            | ResolutionPreset::FacebookPost => (1080, 1080),
            ResolutionPreset::YoutubeShort
            | ResolutionPreset::Tiktok
            | ResolutionPreset::InstagramReel
            | ResolutionPreset::InstagramStory
            | ResolutionPreset::FacebookVideo
            | ResolutionPreset::FacebookStory
            | ResolutionPreset::Snapshat => (1080, 1920),
            ResolutionPreset::TwitterLandscape => (1200, 675),
            ResolutionPreset::TwitterPortrait => (1080, 1350),
            ResolutionPreset::Custom => return None,
        };
        Some(Canvas::new(w, h))
    }
}

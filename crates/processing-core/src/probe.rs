//! Collaborator seams used while normalizing a scene.
//!
//! [`MediaProbe`] reports intrinsic metadata of a media file and
//! [`RenderSurface`] rasterizes text/SVG markup into bitmaps. Both are
//! implemented outside this crate (ffprobe, a headless browser, ...).

use reelgraph_common::{ReelError, ReelResult};
use reelgraph_project_model::{Canvas, Item, ItemKind};
use serde::{Deserialize, Serialize};

/// Intrinsic metadata of a media source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Size of the first video/image stream.
    pub width: Option<u32>,
    pub height: Option<u32>,

    /// Container duration in seconds.
    pub duration_secs: Option<f64>,

    /// Frames per second of the first video stream.
    pub frame_rate: Option<f64>,

    pub has_video: bool,
    pub has_audio: bool,
}

impl MediaInfo {
    /// Stream size when both dimensions are known and non-zero.
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w as f64, h as f64)),
            _ => None,
        }
    }
}

/// Reads intrinsic metadata from a media source.
#[async_trait::async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, src: &str) -> ReelResult<MediaInfo>;
}

/// A rasterized bitmap ready to be used as an engine input.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// Bitmap path.
    pub src: String,

    /// Rendered size, when the surface reports one.
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Rasterizes markup-based items (text, SVG) into bitmaps.
#[async_trait::async_trait]
pub trait RenderSurface: Send + Sync {
    async fn rasterize(&self, item: &Item, canvas: Canvas) -> ReelResult<RasterImage>;
}

/// Surface for scenes whose markup items already carry a rasterized
/// `imageSrc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrerenderedSurface;

#[async_trait::async_trait]
impl RenderSurface for PrerenderedSurface {
    async fn rasterize(&self, item: &Item, _canvas: Canvas) -> ReelResult<RasterImage> {
        let image_src = match &item.kind {
            ItemKind::Text(text) => text.image_src.as_deref(),
            ItemKind::Svg(svg) => svg.image_src.as_deref(),
            ItemKind::Image(image) => image.image_src.as_deref(),
            ItemKind::Video(_) | ItemKind::Gif(_) => None,
        };

        match image_src.filter(|s| !s.is_empty()) {
            Some(src) => Ok(RasterImage {
                src: src.to_string(),
                width: None,
                height: None,
            }),
            None => Err(ReelError::rendering(format!(
                "{} item {} has no prerendered imageSrc",
                item.kind.name(),
                item.id().unwrap_or("<unnamed>")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgraph_project_model::{SvgProps, TextProps};

    #[tokio::test]
    async fn test_prerendered_surface_uses_image_src() {
        let item = Item::new(ItemKind::Svg(SvgProps {
            svg: "<svg/>".into(),
            image_src: Some("/tmp/shape.png".into()),
        }));
        let raster = PrerenderedSurface
            .rasterize(&item, Canvas::DEFAULT)
            .await
            .unwrap();
        assert_eq!(raster.src, "/tmp/shape.png");
        assert_eq!(raster.width, None);
    }

    #[tokio::test]
    async fn test_prerendered_surface_fails_without_bitmap() {
        let item = Item::new(ItemKind::Text(TextProps {
            text: Some("hello".into()),
            ..Default::default()
        }));
        let err = PrerenderedSurface
            .rasterize(&item, Canvas::DEFAULT)
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Rendering { .. }));
    }

    #[test]
    fn test_media_info_dimensions() {
        let info = MediaInfo {
            width: Some(1920),
            height: Some(0),
            ..Default::default()
        };
        assert_eq!(info.dimensions(), None);
    }
}

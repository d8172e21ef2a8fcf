//! Defaulting and normalization of a loaded scene.
//!
//! Every optional field an item or audio clip leaves out is filled in
//! here, using probed media metadata where available. Probe failures are
//! logged and replaced by project defaults; rasterization failures abort.
//!
//! After normalization:
//! - every visual item has a size, a full timing window and rounded values
//! - items are ordered by `(track, enterBegin)`; the engine input index of
//!   the item at position `i` is `i + 1` (input 0 is the background canvas)
//! - audio clips are ordered by `(track, enter)`
//! - captions are ordered by start time

use reelgraph_common::ReelResult;
use reelgraph_project_model::{
    AudioItem, Item, ItemKind, ProjectFile, ProjectSettings, Subtitle,
};

use crate::geometry::{fit_to_canvas, preset_point, round2};
use crate::probe::{MediaInfo, MediaProbe, RenderSurface};

/// Default cross-transition length between chained items (seconds).
pub const DEFAULT_TRANSITION_DURATION: f64 = 1.0;

/// A scene whose items are fully populated and ordered.
#[derive(Debug, Clone)]
pub struct NormalizedProject {
    pub settings: ProjectSettings,
    pub items: Vec<Item>,
    pub audios: Vec<AudioItem>,
    pub subtitle: Option<Subtitle>,
}

impl NormalizedProject {
    /// Engine input index of the visual item at `position`.
    pub fn item_input(position: usize) -> usize {
        position + 1
    }

    /// Engine input index of the thumbnail, if any.
    pub fn thumbnail_input(&self) -> Option<usize> {
        self.settings
            .thumbnail
            .as_ref()
            .map(|_| self.items.len() + 1)
    }

    /// Engine input index of the first audio clip.
    pub fn first_audio_input(&self) -> usize {
        1 + self.items.len() + usize::from(self.settings.thumbnail.is_some())
    }
}

/// Fills in defaults using a media probe and a rendering surface.
pub struct Normalizer<'a, P: ?Sized, S: ?Sized> {
    probe: &'a P,
    surface: &'a S,
}

impl<'a, P, S> Normalizer<'a, P, S>
where
    P: MediaProbe + ?Sized,
    S: RenderSurface + ?Sized,
{
    pub fn new(probe: &'a P, surface: &'a S) -> Self {
        Self { probe, surface }
    }

    /// Validate and normalize a scene.
    pub async fn normalize(&self, project: ProjectFile) -> ReelResult<NormalizedProject> {
        let settings = project.validate()?;
        tracing::info!(
            name = %settings.name,
            canvas = %settings.canvas.size(),
            duration = settings.duration,
            visuals = project.visuals.len(),
            audios = project.audios.len(),
            "Normalizing scene"
        );

        let mut items = Vec::with_capacity(project.visuals.len());
        for item in project.visuals {
            items.push(self.normalize_item(item, &settings).await?);
        }

        let mut audios = Vec::with_capacity(project.audios.len());
        for audio in project.audios {
            audios.push(self.normalize_audio(audio, &settings).await);
        }

        items.sort_by(|a, b| {
            a.base
                .track
                .cmp(&b.base.track)
                .then(a.base.enter_begin.total_cmp(&b.base.enter_begin))
        });

        // audio inputs are registered in this order as well
        audios.sort_by(|a, b| a.track.cmp(&b.track).then(a.enter.total_cmp(&b.enter)));

        let subtitle = project.subtitle.map(|mut subtitle| {
            subtitle.sort_captions();
            subtitle
        });

        Ok(NormalizedProject {
            settings,
            items,
            audios,
            subtitle,
        })
    }

    /// Probe a source, degrading to `None` on failure.
    async fn probe_or_warn(&self, src: &str) -> Option<MediaInfo> {
        match self.probe.probe(src).await {
            Ok(info) => Some(info),
            Err(err) => {
                tracing::warn!(src, error = %err, "Could not probe media; using project defaults");
                None
            }
        }
    }

    async fn normalize_item(
        &self,
        mut item: Item,
        settings: &ProjectSettings,
    ) -> ReelResult<Item> {
        let canvas = settings.canvas;
        let (canvas_w, canvas_h) = (canvas.width_f64(), canvas.height_f64());
        let duration = settings.duration;

        item.base.exit_begin.get_or_insert(duration);
        item.base.exit_end.get_or_insert(duration);

        let info = match item.probe_source() {
            Some(src) => self.probe_or_warn(src).await,
            None => None,
        };
        let probed_size = info.as_ref().and_then(MediaInfo::dimensions);

        let raster = match &item.kind {
            ItemKind::Text(_) | ItemKind::Svg(_) => Some(self.surface.rasterize(&item, canvas).await?),
            _ => None,
        };
        // Surfaces that do not report a size: read it from the bitmap itself.
        let raster_size = match &raster {
            Some(r) => match (r.width, r.height) {
                (Some(w), Some(h)) => Some((w, h)),
                _ => self
                    .probe_or_warn(&r.src)
                    .await
                    .as_ref()
                    .and_then(MediaInfo::dimensions),
            },
            None => None,
        };

        let scalable = item.is_scalable_media();
        let base = &mut item.base;
        match &mut item.kind {
            ItemKind::Video(video) => {
                video.transition_duration.get_or_insert(DEFAULT_TRANSITION_DURATION);
                let video_duration = *video.video_duration.get_or_insert(
                    info.as_ref()
                        .and_then(|i| i.duration_secs)
                        .unwrap_or(duration),
                );
                video.video_end.get_or_insert(video_duration);
                if let Some(info) = &info {
                    if video.frame_rate.is_none() {
                        video.frame_rate = info.frame_rate.map(f64::ceil);
                    }
                    video.has_audio.get_or_insert(info.has_audio);
                }
                let (w, h) = probed_size.unwrap_or((canvas_w, canvas_h));
                base.width.get_or_insert(w);
                base.height.get_or_insert(h);
            }
            ItemKind::Image(_) | ItemKind::Gif(_) => {
                let (w, h) = probed_size.unwrap_or((canvas_w, canvas_h));
                base.width.get_or_insert(w);
                base.height.get_or_insert(h);
            }
            ItemKind::Text(text) => {
                let (w, h) = raster_size.unwrap_or((canvas_w, canvas_h));
                base.width.get_or_insert(w);
                base.height.get_or_insert(h);
                text.image_src = raster.map(|r| r.src);
            }
            ItemKind::Svg(svg) => {
                // rendered size wins over declared size
                if let Some((w, h)) = raster_size {
                    base.width = Some(w);
                    base.height = Some(h);
                }
                base.width.get_or_insert(canvas_w);
                base.height.get_or_insert(canvas_h);
                svg.image_src = raster.map(|r| r.src);
            }
        }

        if let Some(mode) = base.resize.filter(|_| scalable) {
            let current = base.width.zip(base.height);
            let (w, h) = fit_to_canvas(mode, probed_size.or(current), canvas);
            base.width = Some(w);
            base.height = Some(h);
        }

        if let Some(preset) = base.position {
            if let Some((x, y)) = preset_point(preset, canvas) {
                base.x = x;
                base.y = y;
                if base.anchor.is_none() {
                    base.anchor = preset.anchor();
                }
            }
        }

        round_item(&mut item);
        item.validate()?;

        tracing::debug!(
            kind = item.kind.name(),
            id = item.id().unwrap_or_default(),
            width = item.width(),
            height = item.height(),
            enter = item.base.enter_begin,
            exit = item.exit_end(),
            "Item normalized"
        );
        Ok(item)
    }

    async fn normalize_audio(&self, mut audio: AudioItem, settings: &ProjectSettings) -> AudioItem {
        let info = self.probe_or_warn(&audio.src).await;
        let probed = info
            .filter(|i| i.has_audio)
            .and_then(|i| i.duration_secs);

        let audio_duration = *audio
            .audio_duration
            .get_or_insert(probed.unwrap_or(settings.duration));
        audio.audio_end.get_or_insert(audio_duration);
        audio
    }
}

/// Pixel fields to integers (sizes rounded up), timing fields to 2 decimals.
fn round_item(item: &mut Item) {
    let base = &mut item.base;
    base.width = base.width.map(f64::ceil);
    base.height = base.height.map(f64::ceil);
    base.x = base.x.round();
    base.y = base.y.round();
    base.enter_begin = round2(base.enter_begin);
    base.enter_end = round2(base.enter_end);
    base.exit_begin = base.exit_begin.map(round2);
    base.exit_end = base.exit_end.map(round2);

    if let ItemKind::Video(video) = &mut item.kind {
        video.video_begin = round2(video.video_begin);
        video.video_end = video.video_end.map(round2);
    }
}

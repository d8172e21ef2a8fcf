//! Time-dependent stages: enter/exit animations and the zoom ramp.

use reelgraph_processing_core::geometry::round2;
use reelgraph_project_model::Item;

use super::{ChainBuilder, Placement};
use crate::filtergraph::{num, FilterNode};

/// Frame rate used when an item declares none.
pub const DEFAULT_ANIMATION_FPS: f64 = 30.0;

/// Zoom ratio reached at the end of the ramp.
pub const ZOOM_DEPTH: f64 = 1.5;

/// Output frame rate of the zoom ramp.
pub const ZOOM_FPS: f64 = 30.0;

fn has_enter_animation(item: &Item) -> bool {
    let base = &item.base;
    base.enter_animation.as_deref().is_some_and(|a| !a.is_empty()) && base.enter_end > base.enter_begin
}

fn has_exit_animation(item: &Item) -> bool {
    item.base
        .exit_animation
        .as_deref()
        .is_some_and(|a| !a.is_empty())
        && item.exit_end() > item.exit_begin()
        && item.transition_link().is_none()
}

/// Whether the item fades in or out against a transparent canvas.
///
/// Exit animations are suppressed on items that hand over to a chained
/// item, since the cross-transition covers the exit.
pub fn has_animation(item: &Item) -> bool {
    has_enter_animation(item) || has_exit_animation(item)
}

pub(super) fn apply_animation(chain: &mut ChainBuilder, item: &Item, placement: &Placement) {
    let enter = has_enter_animation(item);
    let exit = has_exit_animation(item);
    if !enter && !exit {
        return;
    }

    let fps = item
        .as_video()
        .and_then(|video| video.frame_rate)
        .filter(|fps| *fps > 0.0)
        .unwrap_or(DEFAULT_ANIMATION_FPS);
    let duration = if item.is_motion_media() {
        item.as_video().and_then(|video| video.video_duration)
    } else {
        Some(item.exit_end())
    }
    .filter(|d| *d > 0.0);

    // Still images become a stream of the item's visible length first.
    if !item.is_motion_media() {
        chain.then(
            FilterNode::new("loop")
                .opt("loop", -1)
                .opt("size", 1)
                .opt("start", 0),
            "looped",
        );
        chain.then(FilterNode::new("setpts").args("PTS-STARTPTS"), "pts_reset");
        let trim = match duration {
            Some(d) => FilterNode::new("trim").opt("duration", num(d)),
            None => FilterNode::new("trim"),
        };
        chain.then(trim, "trimmed");
        chain.then(FilterNode::new("fps").args(num(fps)), "initial_stream");
    }

    let base = &item.base;
    let local_enter_end = base.enter_end - base.enter_begin;
    let local_exit_begin = item.exit_begin() - base.enter_begin;
    let local_exit_end = item.exit_end() - base.enter_begin;

    if let (true, Some(effect)) = (enter, base.enter_animation.as_deref()) {
        let background = transparent_background(chain, "enter", placement, fps, duration);
        chain.then(FilterNode::new("fps").args(num(fps)), "enter_source");
        let faded = FilterNode::new("xfade")
            .opt("transition", effect)
            .opt("duration", num(round2(local_enter_end.max(0.0))))
            .opt("offset", 0)
            .input(background)
            .input(chain.current());
        chain.join(faded, "enterAnimated");
    }

    if let (true, Some(effect)) = (exit, base.exit_animation.as_deref()) {
        let background = transparent_background(chain, "exit", placement, fps, duration);
        chain.then(FilterNode::new("fps").args(num(fps)), "exit_source");
        let faded = FilterNode::new("xfade")
            .opt("transition", effect)
            .opt(
                "duration",
                num(round2((local_exit_end - local_exit_begin).max(0.0))),
            )
            .opt("offset", num(round2(local_exit_begin)))
            .input(chain.current())
            .input(background);
        chain.join(faded, "exitAnimated");
    }
}

/// Emit a transparent canvas the size of the item and return its label.
fn transparent_background(
    chain: &mut ChainBuilder,
    kind: &str,
    placement: &Placement,
    fps: f64,
    duration: Option<f64>,
) -> String {
    let canvas = chain.label(&format!("{kind}_base_animation"));
    let rgba = format!("{canvas}_rgba");
    let paced = format!("{canvas}_fps");

    let mut color = FilterNode::new("color")
        .opt("c", "0x00000000")
        .opt(
            "s",
            format!("{}x{}", num(placement.width), num(placement.height)),
        )
        .opt("r", num(fps));
    if let Some(d) = duration {
        color = color.opt("d", num(d));
    }
    chain.push(color.output(&canvas));
    chain.push(FilterNode::new("format").args("rgba").input(canvas).output(&rgba));
    chain.push(FilterNode::new("fps").args(num(fps)).input(rgba).output(&paced));
    paced
}

/// Per-frame zoom increment for a ramp from 1 to [`ZOOM_DEPTH`] over the
/// item's visible duration.
pub fn zoom_increment(item: &Item) -> f64 {
    let visible = (item.exit_end() - item.base.enter_begin).max(0.0);
    let frames = (visible * ZOOM_FPS).round().max(1.0);
    (ZOOM_DEPTH - 1.0) / frames
}

pub(super) fn apply_zoom(chain: &mut ChainBuilder, item: &Item, placement: &Placement) {
    if !item.base.zoom || !item.is_scalable_media() {
        return;
    }

    let (w, h) = (placement.width, placement.height);
    chain.then(FilterNode::new("setsar").args("1"), "sar1");
    // Upscale first so sub-pixel pan steps do not jitter.
    if w > 0.0 && h > 0.0 {
        chain.then(
            FilterNode::new("scale").args(format!(
                "{}:{}:flags=bicubic",
                num(w * 10.0),
                num(h * 10.0)
            )),
            "prezoom_scaled",
        );
    }
    chain.then(
        FilterNode::new("zoompan").args(format!(
            "z='min(max(zoom,pzoom)+{:.6},{})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={}x{}",
            zoom_increment(item),
            num(ZOOM_DEPTH),
            num(w),
            num(h)
        )),
        "zoom",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgraph_project_model::{Anchor, ImageProps, ItemKind, VideoProps};

    fn placement(width: f64, height: f64) -> Placement {
        Placement {
            x: 0.0,
            y: 0.0,
            width,
            height,
            anchor: Anchor::TopLeft,
        }
    }

    fn image() -> Item {
        let mut item = Item::new(ItemKind::Image(ImageProps {
            src: "logo.png".into(),
            image_src: None,
        }));
        item.base.width = Some(200.0);
        item.base.height = Some(100.0);
        item.base.enter_begin = 2.0;
        item.base.enter_end = 3.0;
        item.base.exit_begin = Some(7.0);
        item.base.exit_end = Some(8.0);
        item
    }

    fn render(item: &Item, stage: fn(&mut ChainBuilder, &Item, &Placement)) -> Vec<String> {
        let mut chain = ChainBuilder::new(4);
        stage(&mut chain, item, &placement(200.0, 100.0));
        chain.into_nodes().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_no_animation_without_effect_or_window() {
        let mut item = image();
        assert!(!has_animation(&item));
        item.base.enter_animation = Some("fade".into());
        item.base.enter_end = item.base.enter_begin;
        assert!(!has_animation(&item));
        assert!(render(&item, apply_animation).is_empty());
    }

    #[test]
    fn test_image_enter_and_exit() {
        let mut item = image();
        item.base.enter_animation = Some("fade".into());
        item.base.exit_animation = Some("slideleft".into());

        let nodes = render(&item, apply_animation);
        assert_eq!(
            nodes[..4],
            [
                "[4:v]loop=loop=-1:size=1:start=0[looped_4]",
                "[looped_4]setpts=PTS-STARTPTS[pts_reset_4]",
                "[pts_reset_4]trim=duration=8[trimmed_4]",
                "[trimmed_4]fps=30[initial_stream_4]",
            ]
        );
        assert_eq!(
            nodes[4],
            "color=c=0x00000000:s=200x100:r=30:d=8[enter_base_animation_4]"
        );
        assert_eq!(
            nodes[8],
            "[enter_base_animation_4_fps][enter_source_4]xfade=transition=fade:duration=1:offset=0[enterAnimated_4]"
        );
        assert_eq!(
            nodes.last().map(String::as_str),
            Some("[exit_source_4][exit_base_animation_4_fps]xfade=transition=slideleft:duration=1:offset=5[exitAnimated_4]")
        );
    }

    #[test]
    fn test_exit_suppressed_for_chained_video() {
        let mut item = Item::new(ItemKind::Video(VideoProps {
            src: "a.mp4".into(),
            video_duration: Some(6.0),
            frame_rate: Some(25.0),
            transition: Some("fade".into()),
            transition_id: Some("b".into()),
            ..Default::default()
        }));
        item.base.exit_begin = Some(5.0);
        item.base.exit_end = Some(6.0);
        item.base.exit_animation = Some("fade".into());
        assert!(!has_animation(&item));

        item.base.enter_animation = Some("fade".into());
        item.base.enter_end = 0.5;
        let nodes = render(&item, apply_animation);
        assert_eq!(nodes.len(), 5);
        assert_eq!(
            nodes[0],
            "color=c=0x00000000:s=200x100:r=25:d=6[enter_base_animation_4]"
        );
        assert_eq!(nodes[3], "[4:v]fps=25[enter_source_4]");
        assert!(nodes[4].contains("duration=0.5:offset=0"));
    }

    #[test]
    fn test_zoom_ramp() {
        let mut item = image();
        assert!(render(&item, apply_zoom).is_empty());

        item.base.zoom = true;
        // 6 visible seconds at 30 fps
        assert!((zoom_increment(&item) - 0.5 / 180.0).abs() < 1e-12);
        let nodes = render(&item, apply_zoom);
        assert_eq!(
            nodes,
            vec![
                "[4:v]setsar=1[sar1_4]",
                "[sar1_4]scale=2000:1000:flags=bicubic[prezoom_scaled_4]",
                "[prezoom_scaled_4]zoompan=z='min(max(zoom,pzoom)+0.002778,1.5)':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s=200x100[zoom_4]",
            ]
        );
    }

    #[test]
    fn test_zoom_with_empty_window_uses_one_frame() {
        let mut item = image();
        item.base.zoom = true;
        item.base.exit_end = Some(1.0);
        assert_eq!(zoom_increment(&item), 0.5);
    }
}

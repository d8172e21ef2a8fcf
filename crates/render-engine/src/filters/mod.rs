//! Per-item filter chains.
//!
//! Every visual item is turned into a linear chain of filters fed by its
//! engine input stream (`N:v`). Stages run in a fixed order and each one
//! is emitted only when the item asks for it:
//!
//! 1. playback speed (video, GIF)
//! 2. cover: optional crop, then scale to the item size (video, GIF)
//! 3. opacity
//! 4. chroma key
//! 5. color style on the color planes only
//! 6. flip
//! 7. rotation into an enlarged bounding box
//! 8. enter/exit animation against a transparent canvas
//! 9. zoom ramp
//! 10. start delay, for items outside a transition chain
//!
//! Intermediate labels are `<stage>_<input index>`, which keeps them
//! unique across the whole graph. The last node is relabelled with the
//! caller's output label; an item with no stage gets a `null` node.

mod motion;
mod style;

pub use motion::{has_animation, zoom_increment, DEFAULT_ANIMATION_FPS, ZOOM_DEPTH, ZOOM_FPS};
pub use style::{chroma_key_args, contrast_factor, has_style, range_map, saturation_factor};

use reelgraph_processing_core::geometry::RotatedBounds;
use reelgraph_project_model::{Anchor, Item};

use crate::compositor::overlay_offset;
use crate::filtergraph::{num, FilterNode};

/// Where an item's chain output is overlaid on the canvas.
///
/// Rotation grows the frame to its bounding box, so the anchor point is
/// shifted back by the growth to keep the item centred where it was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub anchor: Anchor,
}

impl Placement {
    pub fn of(item: &Item) -> Self {
        let base = &item.base;
        let (width, height) = (item.width(), item.height());
        let bounds = RotatedBounds::of(width, height, base.angle);
        let rotated = base.angle != 0.0;

        Self {
            x: base.x - bounds.offset_x,
            y: base.y - bounds.offset_y,
            width: if rotated { bounds.width } else { width },
            height: if rotated { bounds.height } else { height },
            anchor: base.anchor.unwrap_or_default(),
        }
    }

    /// `overlay` x/y expressions for this placement.
    pub fn overlay_position(&self) -> (String, String) {
        overlay_offset(self.anchor, self.x, self.y)
    }
}

/// The nodes of one item's chain and where its output goes.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemChain {
    pub nodes: Vec<FilterNode>,
    pub placement: Placement,
}

/// Linear chain under construction.
pub(crate) struct ChainBuilder {
    index: usize,
    nodes: Vec<FilterNode>,
    current: String,
}

impl ChainBuilder {
    pub(crate) fn new(input_index: usize) -> Self {
        Self::from_stream(input_index, format!("{input_index}:v"))
    }

    pub(crate) fn from_stream(input_index: usize, stream: String) -> Self {
        Self {
            index: input_index,
            nodes: Vec::new(),
            current: stream,
        }
    }

    pub(crate) fn label(&self, stem: &str) -> String {
        format!("{stem}_{}", self.index)
    }

    pub(crate) fn current(&self) -> &str {
        &self.current
    }

    pub(crate) fn set_current(&mut self, label: String) {
        self.current = label;
    }

    /// Append a node without touching the running stream.
    pub(crate) fn push(&mut self, node: FilterNode) {
        self.nodes.push(node);
    }

    /// Append a node whose inputs are already wired; its output becomes
    /// the running stream.
    pub(crate) fn join(&mut self, node: FilterNode, stem: &str) {
        let output = self.label(stem);
        self.nodes.push(node.output(&output));
        self.current = output;
    }

    /// Feed the running stream through `node`.
    pub(crate) fn then(&mut self, node: FilterNode, stem: &str) {
        let node = node.input(self.current.clone());
        self.join(node, stem);
    }

    pub(crate) fn into_nodes(self) -> Vec<FilterNode> {
        self.nodes
    }

    /// Relabel the last node's output, or pass the stream through when
    /// no node was emitted.
    pub(crate) fn finish(mut self, output: &str) -> Vec<FilterNode> {
        match self.nodes.last_mut() {
            Some(last) => last.outputs = vec![output.to_string()],
            None => self.nodes.push(
                FilterNode::new("null")
                    .input(self.current.clone())
                    .output(output),
            ),
        }
        self.nodes
    }
}

/// Build the chain for `item`, read from engine input `input_index` and
/// ending in `output`.
///
/// `grouped` items belong to a transition chain and are not delayed:
/// their timing comes from the cross-transition offsets.
pub fn build_item_chain(item: &Item, input_index: usize, output: &str, grouped: bool) -> ItemChain {
    let base = &item.base;
    let placement = Placement::of(item);
    let mut chain = ChainBuilder::new(input_index);

    if item.is_motion_media() {
        let speed = item.speed();
        if speed != 1.0 && speed > 0.0 {
            chain.then(
                FilterNode::new("setpts").args(format!("PTS*{}", num(1.0 / speed))),
                "speed",
            );
        }

        if let Some(crop) = &base.crop_params {
            chain.then(
                FilterNode::new("crop").args(format!(
                    "{}:{}:{}:{}",
                    num(crop.width),
                    num(crop.height),
                    num(crop.x),
                    num(crop.y)
                )),
                "cropped",
            );
        }
        chain.then(
            FilterNode::new("scale").args(format!(
                "{}:{}",
                num(item.width()),
                num(item.height())
            )),
            "scaled",
        );
        chain.then(FilterNode::new("format").args("rgba"), "covered");
    }

    if base.opacity != 1.0 {
        chain.then(FilterNode::new("format").args("rgba"), "with_alpha");
        chain.then(
            FilterNode::new("colorchannelmixer").args(format!("aa={}", num(base.opacity))),
            "opacity_applied",
        );
    }

    if let Some(key) = &base.chroma_key {
        style::apply_chroma_key(&mut chain, key);
    }

    if let Some(filter) = &base.filter {
        style::apply_style(&mut chain, filter, placement.width, placement.height);
    }

    match (base.flip_h, base.flip_v) {
        (true, true) => {
            chain.then(FilterNode::new("hflip"), "hflipped");
            chain.then(FilterNode::new("vflip"), "flipped");
        }
        (true, false) => chain.then(FilterNode::new("hflip"), "flipped"),
        (false, true) => chain.then(FilterNode::new("vflip"), "flipped"),
        (false, false) => {}
    }

    if base.angle != 0.0 {
        chain.then(
            FilterNode::new("rotate").args(format!(
                "{}*PI/180:c=none:ow={}:oh={}",
                num(base.angle),
                num(placement.width),
                num(placement.height)
            )),
            "rotated",
        );
    }

    motion::apply_animation(&mut chain, item, &placement);
    motion::apply_zoom(&mut chain, item, &placement);

    if base.enter_begin > 0.0 && !grouped {
        chain.then(
            FilterNode::new("setpts").args(format!(
                "PTS-STARTPTS+{}/TB",
                num(base.enter_begin)
            )),
            "delayed",
        );
    }

    tracing::trace!(
        input = input_index,
        kind = item.kind.name(),
        nodes = chain.nodes.len(),
        output,
        "Item chain built"
    );

    ItemChain {
        nodes: chain.finish(output),
        placement,
    }
}

//! Group compositor: layers item chains onto the project canvas.
//!
//! Each group ends in one overlay onto the running composite, gated to
//! the group's active interval. Singletons are overlaid directly at their
//! anchor-resolved position. Members of a transition chain are first
//! placed on full-canvas transparent layers, then joined left to right
//! with cross-transitions.

use reelgraph_processing_core::normalize::DEFAULT_TRANSITION_DURATION;
use reelgraph_processing_core::Group;
use reelgraph_project_model::{Anchor, Canvas};

use crate::filtergraph::{num, FilterNode};
use crate::filters::build_item_chain;

/// Transition used when no member of a chain names one.
pub const DEFAULT_TRANSITION: &str = "fade";

/// Label of the background canvas stream.
pub const BACKGROUND_STREAM: &str = "0:v";

/// `overlay` x/y expressions placing the overlay's `anchor` point at
/// `(x, y)`. Offsets that depend on the overlay size are left to the
/// engine (`overlay_w`, `overlay_h`).
pub fn overlay_offset(anchor: Anchor, x: f64, y: f64) -> (String, String) {
    let (fx, fy) = anchor.fractions();
    (axis_offset(x, fx, "overlay_w"), axis_offset(y, fy, "overlay_h"))
}

fn axis_offset(position: f64, fraction: f64, size: &str) -> String {
    if fraction == 0.0 {
        num(position)
    } else if fraction == 1.0 {
        format!("{} - {size}", num(position))
    } else {
        format!("{} - {size} / 2", num(position))
    }
}

/// Composited video nodes and the label of the final stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub nodes: Vec<FilterNode>,
    pub output: String,
}

fn group_output(index: usize) -> String {
    format!("outv-{index}")
}

/// Build item chains for every group and layer them onto the background.
pub fn compose_groups(groups: &[Group], canvas: Canvas) -> Composition {
    let mut nodes = Vec::new();

    if groups.is_empty() {
        let output = group_output(0);
        nodes.push(
            FilterNode::new("null")
                .input(BACKGROUND_STREAM)
                .output(&output),
        );
        return Composition { nodes, output };
    }

    for (g, group) in groups.iter().enumerate() {
        let chained = group.is_chain();

        let mut placements = Vec::with_capacity(group.len());
        for (i, member) in group.members.iter().enumerate() {
            let chain = build_item_chain(
                &member.item,
                member.input_index,
                &format!("filterd_{i}_{g}"),
                chained,
            );
            nodes.extend(chain.nodes);
            placements.push(chain.placement);
        }

        let (x, y, source) = if chained {
            nodes.extend(transition_nodes(group, g, &placements, canvas));
            (
                "0".to_string(),
                "0".to_string(),
                format!("xfaded_{}_{g}", group.len() - 2),
            )
        } else {
            let (x, y) = placements[0].overlay_position();
            (x, y, format!("filterd_0_{g}"))
        };

        let previous = if g == 0 {
            BACKGROUND_STREAM.to_string()
        } else {
            group_output(g - 1)
        };
        let (start, end) = group.active_interval();

        nodes.push(
            FilterNode::new("overlay")
                .opt("x", x)
                .opt("y", y)
                .opt("enable", format!("between(t,{},{})", num(start), num(end)))
                .input(previous)
                .input(source)
                .output(group_output(g)),
        );

        tracing::debug!(
            group = g,
            members = group.len(),
            start,
            end,
            "Group composited"
        );
    }

    Composition {
        nodes,
        output: group_output(groups.len() - 1),
    }
}

/// Full-canvas layers for each chain member and the cross-transitions
/// between consecutive members.
fn transition_nodes(
    group: &Group,
    g: usize,
    placements: &[crate::filters::Placement],
    canvas: Canvas,
) -> Vec<FilterNode> {
    let mut nodes = Vec::new();

    for (i, placement) in placements.iter().enumerate() {
        let layer = format!("base_canvas_{i}_{g}");
        let (x, y) = placement.overlay_position();
        nodes.push(
            FilterNode::new("color")
                .opt("c", "#00000000")
                .opt("s", canvas.size())
                .output(&layer),
        );
        nodes.push(
            FilterNode::new("overlay")
                .opt("x", x)
                .opt("y", y)
                .input(layer)
                .input(format!("filterd_{i}_{g}"))
                .output(format!("re_based_{i}_{g}")),
        );
    }

    let fallback = group
        .members
        .first()
        .and_then(|m| m.item.transition_link())
        .map(|(effect, _)| effect)
        .unwrap_or(DEFAULT_TRANSITION);

    for (i, pair) in group.members.windows(2).enumerate() {
        let (current, next) = (&pair[0], &pair[1]);
        let video = current.item.as_video();
        let transition = video
            .and_then(|v| v.transition.as_deref())
            .filter(|t| !t.is_empty())
            .unwrap_or(fallback);
        let duration = video
            .and_then(|v| v.transition_duration)
            .unwrap_or(DEFAULT_TRANSITION_DURATION);

        let first = if i == 0 {
            format!("re_based_0_{g}")
        } else {
            format!("xfaded_{}_{g}", i - 1)
        };

        nodes.push(
            FilterNode::new("xfade")
                .opt("transition", transition)
                .opt("duration", num(duration))
                .opt("offset", num(next.item.base.enter_begin))
                .input(first)
                .input(format!("re_based_{}_{g}", i + 1))
                .output(format!("xfaded_{i}_{g}")),
        );
    }

    nodes
}

//! Color keying and color-style adjustments.

use reelgraph_project_model::color::HexColor;
use reelgraph_project_model::{ChromaKey, StyleFilter};

use super::ChainBuilder;
use crate::filtergraph::{num, round_to, FilterNode};

/// Linearly map `value` from `[in_min, in_max]` to `[out_min, out_max]`,
/// rounded to four decimals. Values outside the input range extrapolate.
pub fn range_map(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    round_to(
        out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min),
        4,
    )
}

/// `colorkey` argument triple for a 0..100 similarity/blend key.
pub fn chroma_key_args(key: &ChromaKey) -> String {
    let similarity = range_map(key.similarity.unwrap_or(0.01), 0.0, 100.0, 0.0, 1.0).max(0.01);
    let blend = range_map(key.blend.unwrap_or(0.0), 0.0, 100.0, 0.0, 1.0).max(0.01);
    format!(
        "{}:{}:{}",
        key.color.replacen('#', "0x", 1),
        num(similarity),
        num(blend)
    )
}

pub(super) fn apply_chroma_key(chain: &mut ChainBuilder, key: &ChromaKey) {
    chain.then(
        FilterNode::new("colorkey").args(chroma_key_args(key)),
        "green_screen",
    );
}

/// `eq` contrast factor. Negative input shrinks contrast towards 0,
/// positive input grows it up to 1000.
pub fn contrast_factor(contrast: f64) -> Option<f64> {
    if contrast == 0.0 {
        None
    } else if contrast < 0.0 {
        Some(range_map(contrast, -100.0, 0.0, 0.0, 1.0))
    } else {
        Some(range_map(contrast, 0.0, 100.0, 1.0, 1000.0))
    }
}

/// `eq` saturation factor, `[0, 1]` below zero and `[1, 3]` above.
pub fn saturation_factor(saturate: f64) -> Option<f64> {
    if saturate == 0.0 {
        None
    } else if saturate < 0.0 {
        Some(range_map(saturate, -100.0, 0.0, 0.0, 1.0))
    } else {
        Some(range_map(saturate, 0.0, 100.0, 1.0, 3.0))
    }
}

fn hue_degrees(filter: &StyleFilter) -> Option<f64> {
    filter
        .hue_rotate
        .as_ref()
        .and_then(|hue| hue.value())
        .filter(|deg| *deg != 0.0)
}

fn blur_percent(filter: &StyleFilter) -> Option<f64> {
    filter
        .blur
        .as_ref()
        .and_then(|blur| blur.value())
        .filter(|pct| *pct != 0.0)
}

fn tint(filter: &StyleFilter) -> Option<HexColor> {
    let raw = filter.color_tint.as_deref().filter(|c| !c.is_empty())?;
    let parsed = HexColor::parse(raw);
    if parsed.is_none() {
        tracing::warn!(color_tint = raw, "Ignoring unparsable color tint");
    }
    parsed
}

/// Whether any adjustment is requested.
pub fn has_style(filter: &StyleFilter) -> bool {
    filter.brightness.is_some()
        || filter.contrast.is_some()
        || filter.saturate.is_some()
        || hue_degrees(filter).is_some()
        || blur_percent(filter).is_some()
        || filter.invert.is_some_and(|inv| inv.strength() != 0.0)
        || tint(filter).is_some()
}

/// Adjust the color planes only: the alpha plane is split off first and
/// merged back unchanged at the end.
pub(super) fn apply_style(chain: &mut ChainBuilder, filter: &StyleFilter, width: f64, height: f64) {
    if !has_style(filter) {
        return;
    }

    chain.then(FilterNode::new("format").args("rgba"), "fmt");
    let color = chain.label("col");
    let alpha = chain.label("a");
    let alpha_plane = chain.label("ap");
    chain.push(
        FilterNode::new("split")
            .args("2")
            .input(chain.current())
            .output(&color)
            .output(&alpha),
    );
    chain.push(
        FilterNode::new("alphaextract")
            .input(&alpha)
            .output(&alpha_plane),
    );
    chain.set_current(color);

    let mut eq = Vec::new();
    if let Some(brightness) = filter.brightness {
        eq.push(format!(
            "brightness={}",
            num(range_map(brightness, -100.0, 100.0, -1.0, 1.0))
        ));
    }
    if let Some(contrast) = filter.contrast.and_then(contrast_factor) {
        eq.push(format!("contrast={}", num(contrast)));
    }
    if let Some(saturation) = filter.saturate.and_then(saturation_factor) {
        eq.push(format!("saturation={}", num(saturation)));
    }
    if !eq.is_empty() {
        chain.then(FilterNode::new("eq").args(eq.join(":")), "eq");
    }

    if let Some(deg) = hue_degrees(filter) {
        chain.then(FilterNode::new("hue").args(format!("H={}", num(deg))), "hue");
    }

    if let Some(pct) = blur_percent(filter) {
        let radius = range_map(pct, 0.0, 100.0, 0.0, width.min(height) / 2.0);
        chain.then(FilterNode::new("boxblur").args(num(radius)), "blur");
    }

    if let Some(invert) = filter.invert.filter(|inv| inv.strength() != 0.0) {
        let strength = range_map(invert.strength(), 0.0, 1.0, 0.0, 1.0);
        let node = if strength >= 1.0 {
            FilterNode::new("negate")
        } else if strength > 0.0 {
            let s = num(strength);
            let channel = format!("'(1-{s})*val+{s}*(255-val)'");
            FilterNode::new("lutrgb").args(format!("r={channel}:g={channel}:b={channel}"))
        } else {
            FilterNode::new("copy")
        };
        chain.then(node, "invert");
    }

    if let Some(color) = tint(filter) {
        let (r, g, b) = color.unit_rgb();
        chain.then(
            FilterNode::new("colorchannelmixer").args(format!(
                "rr={}:gg={}:bb={}",
                num(r),
                num(g),
                num(b)
            )),
            "tint",
        );
    }

    let merged = FilterNode::new("alphamerge")
        .input(chain.current())
        .input(alpha_plane);
    chain.join(merged, "styled");
}

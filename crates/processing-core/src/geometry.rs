//! Canvas geometry: resize presets, position presets and rotated bounds.

use reelgraph_project_model::{Canvas, PositionPreset, ResizeMode};

/// Fit media of `original` size to the canvas.
///
/// Falls back to the canvas size when the original size is unknown.
pub fn fit_to_canvas(mode: ResizeMode, original: Option<(f64, f64)>, canvas: Canvas) -> (f64, f64) {
    let (target_w, target_h) = (canvas.width_f64(), canvas.height_f64());
    let Some((orig_w, orig_h)) = original.filter(|(w, h)| *w > 0.0 && *h > 0.0) else {
        return (target_w, target_h);
    };

    let original_ratio = orig_w / orig_h;
    let target_ratio = target_w / target_h;
    let wider = original_ratio > target_ratio;

    match (mode, wider) {
        // contain: wider fits width, taller fits height
        (ResizeMode::Contain, true) | (ResizeMode::Cover, false) => {
            (target_w, (target_w / original_ratio).round())
        }
        (ResizeMode::Contain, false) | (ResizeMode::Cover, true) => {
            ((target_h * original_ratio).round(), target_h)
        }
    }
}

/// Canvas point a position preset places the item's anchor on.
///
/// `None` for [`PositionPreset::Custom`], which keeps explicit coordinates.
pub fn preset_point(preset: PositionPreset, canvas: Canvas) -> Option<(f64, f64)> {
    let anchor = preset.anchor()?;
    let (fx, fy) = anchor.fractions();
    Some((canvas.width_f64() * fx, canvas.height_f64() * fy))
}

/// Bounding box of a `width x height` rectangle rotated by an angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedBounds {
    pub width: f64,
    pub height: f64,
    /// Growth on each side, used to keep the rotation centered.
    pub offset_x: f64,
    pub offset_y: f64,
}

impl RotatedBounds {
    pub fn of(width: f64, height: f64, angle_deg: f64) -> Self {
        let theta = angle_deg.to_radians();
        let (sin, cos) = theta.sin_cos();

        let bound_x = (width * cos).abs() + (height * sin).abs();
        let bound_y = (height * cos).abs() + (width * sin).abs();

        Self {
            width: bound_x.ceil(),
            height: bound_y.ceil(),
            offset_x: ((bound_x - width) / 2.0).ceil(),
            offset_y: ((bound_y - height) / 2.0).ceil(),
        }
    }
}

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

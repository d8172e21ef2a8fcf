//! Subtitle script synthesis (Advanced SubStation Alpha).
//!
//! The script declares a `Default` style and, for word-highlighting
//! modes, a `Highlight` style. Dialogue lines switch between them with
//! inline `{\r<Style>}` overrides.

use std::path::Path;

use reelgraph_common::{ReelError, ReelResult};
use reelgraph_project_model::color::HexColor;
use reelgraph_project_model::{Anchor, Caption, Canvas, HighlightMode, Subtitle, SubtitleStyles, Word};

use crate::filtergraph::{num, FilterNode};

/// Label of the video stream after subtitles are burned in.
pub const SUBTITLED_VIDEO: &str = "outv-subtitled";

pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";
pub const DEFAULT_FONT_SIZE: u32 = 50;
pub const DEFAULT_FONT_FAMILY: &str = "Poppins";

/// Margin as a fraction of the canvas size when none is set.
const DEFAULT_MARGIN_RATIO: f64 = 0.05;

const TRANSPARENT: &str = "&H00000000";

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Format seconds as `h:mm:ss.cc`, rounded to the nearest centisecond.
///
/// Negative and non-finite input formats as zero.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };
    let total_cs = (seconds * 100.0).round() as u64;
    let cs = total_cs % 100;
    let total_secs = total_cs / 100;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{h}:{m:02}:{s:02}.{cs:02}")
}

/// Convert `#rrggbb[aa]` to the script's `&HAABBGGRR` notation.
pub fn convert_color(hex: &str) -> ReelResult<String> {
    let color = HexColor::parse(hex)
        .ok_or_else(|| ReelError::validation(format!("invalid subtitle color {hex:?}")))?;
    Ok(format!(
        "&H{:02x}{:02x}{:02x}{:02x}",
        color.a.unwrap_or(0),
        color.b,
        color.g,
        color.r
    ))
}

/// Numpad-style alignment for a subtitle position.
pub fn alignment(position: Option<Anchor>) -> u8 {
    match position {
        Some(Anchor::TopLeft) => 7,
        Some(Anchor::TopCenter) => 8,
        Some(Anchor::TopRight) => 9,
        Some(Anchor::CenterLeft) => 4,
        Some(Anchor::CenterCenter) => 5,
        Some(Anchor::CenterRight) => 6,
        Some(Anchor::BottomLeft) => 1,
        Some(Anchor::BottomCenter) | None => 2,
        Some(Anchor::BottomRight) => 3,
    }
}

/// Style settings with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyles {
    pub margin_v: i64,
    pub margin_h: i64,
    pub color: String,
    pub font_size: u32,
    pub font_family: String,
}

impl ResolvedStyles {
    pub fn resolve(styles: &SubtitleStyles, canvas: Canvas) -> Self {
        let margin = |set: Option<f64>, extent: f64| {
            set.filter(|m| *m != 0.0)
                .unwrap_or(extent * DEFAULT_MARGIN_RATIO)
                .round() as i64
        };
        Self {
            margin_v: margin(styles.margin_v, canvas.height_f64()),
            margin_h: margin(styles.margin_h, canvas.width_f64()),
            color: styles
                .color
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
            font_size: styles
                .font_size
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_FONT_SIZE),
            font_family: styles
                .font_family
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        }
    }
}

/// One `Style:` record (without the `Style: ` prefix).
fn style_record(
    styles: &SubtitleStyles,
    resolved: &ResolvedStyles,
    highlight: bool,
) -> ReelResult<String> {
    let name = if highlight { "Highlight" } else { "Default" };
    let primary = match styles.active_word.as_ref().filter(|_| highlight) {
        Some(active) => convert_color(&active.color)?,
        None => convert_color(&resolved.color)?,
    };

    let background = styles.background.as_deref().filter(|b| !b.is_empty());
    let outline = styles.outline.as_ref().filter(|_| background.is_none());

    let outline_color = match outline {
        Some(o) => convert_color(&o.color)?,
        None => TRANSPARENT.to_string(),
    };
    let back_color = match background {
        Some(b) => convert_color(b)?,
        None => TRANSPARENT.to_string(),
    };
    let outline_width = outline.map_or_else(|| "0".to_string(), |o| num(o.width));
    let boxed = background.is_some();

    let fields = [
        name.to_string(),
        resolved.font_family.clone(),
        resolved.font_size.to_string(),
        primary,
        TRANSPARENT.to_string(),
        outline_color,
        back_color,
        u8::from(styles.is_bold).to_string(),
        u8::from(styles.is_italic).to_string(),
        "0".into(),
        "0".into(),
        "100".into(),
        "100".into(),
        "0".into(),
        "0".into(),
        (if boxed { "3" } else { "1" }).into(),
        outline_width,
        (if boxed { "1" } else { "0" }).into(),
        alignment(styles.position).to_string(),
        "0".into(),
        "0".into(),
        "0".into(),
        "1".into(),
    ];
    Ok(fields.join(","))
}

fn header(subtitle: &Subtitle, resolved: &ResolvedStyles, canvas: Canvas) -> ReelResult<String> {
    let styles = &subtitle.styles;
    let default_style = style_record(styles, resolved, false)?;
    let highlight_style = if styles.mode.uses_highlight() {
        format!("Style: {}", style_record(styles, resolved, true)?)
    } else {
        String::new()
    };

    Ok(format!(
        "\n[Script Info]\nTitle: Generated Subtitles\nScriptType: v4.00+\nCollisions: Normal\nPlayDepth: 0\nPlayResX: {}\nPlayResY: {}\n\n[V4+ Styles]\n{STYLE_FORMAT}\nStyle: {default_style}\n{highlight_style}\n\n[Events]\n{EVENT_FORMAT}\n",
        canvas.width, canvas.height
    ))
}

fn dialogue(resolved: &ResolvedStyles, start: f64, end: f64, text: &str) -> String {
    format!(
        "Dialogue: 0,{},{},Default,,{},{},{},,{text}",
        format_time(start),
        format_time(end),
        resolved.margin_h,
        resolved.margin_h,
        resolved.margin_v
    )
}

fn normal_events(subtitle: &Subtitle, resolved: &ResolvedStyles) -> String {
    subtitle
        .captions
        .iter()
        .map(|caption| {
            let text = subtitle.transform(&caption.display_text());
            dialogue(resolved, caption.start, caption.end, &text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn one_word_events(subtitle: &Subtitle, resolved: &ResolvedStyles) -> String {
    let mut words: Vec<&Word> = subtitle.captions.iter().flat_map(|c| &c.words).collect();
    words.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut out = String::new();
    for word in words {
        let text = format!("{{\\rHighlight}}{}{{\\rDefault}}", subtitle.transform(&word.text));
        out.push_str(&dialogue(resolved, word.start, word.end, &text));
        out.push('\n');
    }
    out
}

/// One line per word boundary. Spoken words are plain, the current word
/// is highlighted; upcoming words are hidden unless `show_upcoming`.
fn word_step_events(subtitle: &Subtitle, resolved: &ResolvedStyles, show_upcoming: bool) -> String {
    let mut out = String::new();

    let captions = subtitle.captions.iter().filter(|c| !c.words.is_empty());
    for (index, caption) in captions.enumerate() {
        let texts: Vec<String> = caption
            .words
            .iter()
            .map(|w| subtitle.transform(&w.text))
            .collect();
        out.push_str(&format!("; Group {}: \"{}\"\n", index + 1, texts.join(" ")));

        for (current, word) in caption.words.iter().enumerate() {
            let end = next_word_start(caption, current);
            let line = texts
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    if i == current {
                        format!("{{\\rHighlight}}{text}{{\\rDefault}}")
                    } else if i < current || show_upcoming {
                        text.clone()
                    } else {
                        format!("{{\\alpha&HFF&}}{text}{{\\alpha&H00&}}")
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&dialogue(resolved, word.start, end, &line));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// A word stays on screen until the next word starts; the last word
/// until its own end.
fn next_word_start(caption: &Caption, index: usize) -> f64 {
    match caption.words.get(index + 1) {
        Some(next) => next.start,
        None => caption.words.last().map_or(caption.end, |w| w.end),
    }
}

/// Build the full subtitle script for a canvas.
pub fn build_script(subtitle: &Subtitle, canvas: Canvas) -> ReelResult<String> {
    let resolved = ResolvedStyles::resolve(&subtitle.styles, canvas);
    let header = header(subtitle, &resolved, canvas)?;

    let skipped = subtitle
        .captions
        .iter()
        .filter(|c| c.words.is_empty())
        .count();
    if skipped > 0 && subtitle.styles.mode != HighlightMode::Normal {
        tracing::warn!(skipped, mode = ?subtitle.styles.mode, "Captions without words are not shown in word modes");
    }

    let events = match subtitle.styles.mode {
        HighlightMode::Normal => normal_events(subtitle, &resolved),
        HighlightMode::OneWord => one_word_events(subtitle, &resolved),
        HighlightMode::Progressive => word_step_events(subtitle, &resolved, false),
        HighlightMode::Karaoke => word_step_events(subtitle, &resolved, true),
    };

    tracing::debug!(
        captions = subtitle.captions.len(),
        mode = ?subtitle.styles.mode,
        "Subtitle script built"
    );
    Ok(format!("{header}{events}"))
}

/// Escape a path for use inside a filter argument.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\\\:")
}

/// Burn the script at `script` into the stream `input`.
pub fn subtitles_node(script: &Path, fonts_dir: &Path, input: &str) -> FilterNode {
    FilterNode::new("subtitles")
        .args(format!(
            "{}:fontsdir={}",
            escape_filter_path(script),
            escape_filter_path(fonts_dir)
        ))
        .input(input)
        .output(SUBTITLED_VIDEO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reelgraph_project_model::{ActiveWord, Outline};

    fn word(start: f64, end: f64, text: &str) -> Word {
        Word {
            start,
            end,
            text: text.into(),
        }
    }

    fn subtitle(mode: HighlightMode) -> Subtitle {
        Subtitle {
            captions: vec![Caption {
                start: 0.0,
                end: 1.5,
                text: None,
                words: vec![
                    word(0.0, 0.5, "one"),
                    word(0.5, 1.0, "two"),
                    word(1.0, 1.5, "three"),
                ],
            }],
            styles: SubtitleStyles {
                mode,
                ..Default::default()
            },
        }
    }

    fn events(script: &str) -> Vec<&str> {
        script
            .lines()
            .filter(|l| l.starts_with("Dialogue:"))
            .collect()
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00:00.00");
        assert_eq!(format_time(3661.005), "1:01:01.00");
        assert_eq!(format_time(59.999), "0:01:00.00");
        assert_eq!(format_time(-3.0), "0:00:00.00");
        assert_eq!(format_time(f64::NAN), "0:00:00.00");
        assert_eq!(format_time(f64::INFINITY), "0:00:00.00");
        assert_eq!(format_time(12.345), "0:00:12.35");
    }

    #[test]
    fn test_convert_color() {
        assert_eq!(convert_color("#ff8000").unwrap(), "&H000080ff");
        assert_eq!(convert_color("#11223344").unwrap(), "&H44332211");
        assert!(convert_color("white").is_err());
    }

    #[test]
    fn test_alignment_map() {
        assert_eq!(alignment(None), 2);
        assert_eq!(alignment(Some(Anchor::TopLeft)), 7);
        assert_eq!(alignment(Some(Anchor::CenterCenter)), 5);
        assert_eq!(alignment(Some(Anchor::BottomRight)), 3);
    }

    #[test]
    fn test_default_margins_and_style() {
        let script = build_script(&subtitle(HighlightMode::Normal), Canvas::DEFAULT).unwrap();
        assert!(script.starts_with("\n[Script Info]\nTitle: Generated Subtitles\n"));
        assert!(script.contains("PlayResX: 1280\nPlayResY: 720\n"));
        assert!(script.contains(
            "Style: Default,Poppins,50,&H00ffffff,&H00000000,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,0,0,2,0,0,0,1\n\n\n[Events]\n"
        ));
        assert!(!script.contains("Style: Highlight"));
        assert_eq!(
            events(&script),
            vec!["Dialogue: 0,0:00:00.00,0:00:01.50,Default,,64,64,36,,one two three"]
        );
        assert!(!script.ends_with('\n'));
    }

    #[test]
    fn test_background_box_overrides_outline() {
        let mut sub = subtitle(HighlightMode::Normal);
        sub.styles.outline = Some(Outline {
            width: 2.0,
            color: "#000000".into(),
        });
        let script = build_script(&sub, Canvas::DEFAULT).unwrap();
        assert!(script.contains(",&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,0,2,"));

        sub.styles.background = Some("#00000080".into());
        let script = build_script(&sub, Canvas::DEFAULT).unwrap();
        assert!(script.contains(",&H00000000,&H80000000,0,0,0,0,100,100,0,0,3,0,1,2,"));
    }

    #[test]
    fn test_highlight_style_uses_active_word_color() {
        let mut sub = subtitle(HighlightMode::Karaoke);
        sub.styles.active_word = Some(ActiveWord {
            color: "#ff0000".into(),
        });
        let script = build_script(&sub, Canvas::DEFAULT).unwrap();
        assert!(script.contains("Style: Highlight,Poppins,50,&H000000ff,"));
        assert!(script.contains("Style: Default,Poppins,50,&H00ffffff,"));
    }

    #[test]
    fn test_one_word_mode() {
        let script = build_script(&subtitle(HighlightMode::OneWord), Canvas::DEFAULT).unwrap();
        assert!(script.contains("Style: Highlight,"));
        let lines = events(&script);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "Dialogue: 0,0:00:00.50,0:00:01.00,Default,,64,64,36,,{\\rHighlight}two{\\rDefault}"
        );
    }

    #[test]
    fn test_progressive_hides_upcoming_words() {
        let script = build_script(&subtitle(HighlightMode::Progressive), Canvas::DEFAULT).unwrap();
        assert!(script.contains("; Group 1: \"one two three\"\n"));
        let lines = events(&script);
        assert_eq!(
            lines[0],
            "Dialogue: 0,0:00:00.00,0:00:00.50,Default,,64,64,36,,{\\rHighlight}one{\\rDefault} {\\alpha&HFF&}two{\\alpha&H00&} {\\alpha&HFF&}three{\\alpha&H00&}"
        );
        assert_eq!(
            lines[2],
            "Dialogue: 0,0:00:01.00,0:00:01.50,Default,,64,64,36,,one two {\\rHighlight}three{\\rDefault}"
        );
    }

    #[test]
    fn test_karaoke_keeps_all_words_visible() {
        let script = build_script(&subtitle(HighlightMode::Karaoke), Canvas::DEFAULT).unwrap();
        let lines = events(&script);
        assert_eq!(
            lines[0],
            "Dialogue: 0,0:00:00.00,0:00:00.50,Default,,64,64,36,,{\\rHighlight}one{\\rDefault} two three"
        );
        assert!(!script.contains("alpha&HFF&"));
    }

    #[test]
    fn test_text_transform_applies_in_word_modes() {
        let mut sub = subtitle(HighlightMode::OneWord);
        sub.styles.text_transform = Some(reelgraph_project_model::TextTransform::Uppercase);
        let script = build_script(&sub, Canvas::DEFAULT).unwrap();
        assert!(script.contains("{\\rHighlight}TWO{\\rDefault}"));
    }

    #[test]
    fn test_captions_without_words_are_skipped_in_word_modes() {
        let mut sub = subtitle(HighlightMode::Progressive);
        sub.captions.insert(
            0,
            Caption {
                start: 0.0,
                end: 1.0,
                text: Some("silent".into()),
                words: vec![],
            },
        );
        let script = build_script(&sub, Canvas::DEFAULT).unwrap();
        assert!(script.contains("; Group 1: \"one two three\""));
        assert_eq!(events(&script).len(), 3);
    }

    #[test]
    fn test_subtitles_node_escapes_path() {
        let node = subtitles_node(
            Path::new("C:\\work\\subtitles.ass"),
            Path::new("C:\\work"),
            "outv-2",
        );
        assert_eq!(
            node.to_string(),
            "[outv-2]subtitles=C\\\\:/work/subtitles.ass:fontsdir=C\\\\:/work[outv-subtitled]"
        );
    }

    proptest! {
        #[test]
        fn prop_format_time_round_trips_centiseconds(cs in 0u64..100_000_000) {
            let formatted = format_time(cs as f64 / 100.0);
            let (h, rest) = formatted.split_once(':').unwrap();
            let (m, rest) = rest.split_once(':').unwrap();
            let (s, c) = rest.split_once('.').unwrap();
            prop_assert_eq!(m.len(), 2);
            prop_assert_eq!(s.len(), 2);
            prop_assert_eq!(c.len(), 2);
            let parsed = h.parse::<u64>().unwrap() * 360_000
                + m.parse::<u64>().unwrap() * 6_000
                + s.parse::<u64>().unwrap() * 100
                + c.parse::<u64>().unwrap();
            prop_assert_eq!(parsed, cs);
        }
    }
}

//! Captions with word timings and subtitle styling.

use serde::{Deserialize, Serialize};

use crate::layout::Anchor;

/// Subtitle track: style configuration plus ordered captions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subtitle {
    pub captions: Vec<Caption>,
    pub styles: SubtitleStyles,
}

/// A caption line spanning `[start, end]` seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Caption {
    pub start: f64,
    pub end: f64,
    /// Display text; derived from the words when absent.
    pub text: Option<String>,
    pub words: Vec<Word>,
}

/// A single timed word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubtitleStyles {
    /// `#rrggbb[aa]` text color.
    pub color: Option<String>,
    /// Opaque box fill behind the text.
    pub background: Option<String>,
    pub is_bold: bool,
    pub is_italic: bool,
    pub font_size: Option<u32>,
    pub font_family: Option<String>,
    pub text_transform: Option<TextTransform>,
    pub outline: Option<Outline>,
    pub position: Option<Anchor>,
    pub margin_v: Option<f64>,
    pub margin_h: Option<f64>,
    pub mode: HighlightMode,
    pub active_word: Option<ActiveWord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub width: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveWord {
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    Uppercase,
    Lowercase,
    Capitalize,
}

impl TextTransform {
    pub fn apply(self, text: &str) -> String {
        match self {
            TextTransform::Uppercase => text.to_uppercase(),
            TextTransform::Lowercase => text.to_lowercase(),
            TextTransform::Capitalize => text
                .split(' ')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// How words are revealed and highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightMode {
    /// One line per caption.
    #[default]
    Normal,
    /// One line per word.
    OneWord,
    /// Words appear as they are spoken.
    Progressive,
    /// All words visible, the current one highlighted.
    Karaoke,
}

impl HighlightMode {
    /// Whether the script needs a second `Highlight` style.
    pub fn uses_highlight(self) -> bool {
        !matches!(self, HighlightMode::Normal)
    }
}

impl Caption {
    /// Caption text, falling back to its words in time order.
    pub fn display_text(&self) -> String {
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            return text.to_string();
        }
        let mut words: Vec<&Word> = self.words.iter().collect();
        words.sort_by(|a, b| a.start.total_cmp(&b.start));
        words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Subtitle {
    /// Sort captions by start time.
    pub fn sort_captions(&mut self) {
        self.captions.sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    /// Apply the configured text transform to a string.
    pub fn transform(&self, text: &str) -> String {
        match self.styles.text_transform {
            Some(t) => t.apply(text),
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(start: f64, end: f64, text: &str) -> Word {
        Word {
            start,
            end,
            text: text.into(),
        }
    }

    #[test]
    fn test_display_text_from_words() {
        let caption = Caption {
            start: 0.0,
            end: 2.0,
            text: None,
            words: vec![word(1.0, 2.0, "world"), word(0.0, 1.0, "hello")],
        };
        assert_eq!(caption.display_text(), "hello world");
    }

    #[test]
    fn test_text_transforms() {
        assert_eq!(TextTransform::Uppercase.apply("abc def"), "ABC DEF");
        assert_eq!(TextTransform::Lowercase.apply("ABC"), "abc");
        assert_eq!(
            TextTransform::Capitalize.apply("hello  big world"),
            "Hello  Big World"
        );
    }

    #[test]
    fn test_style_deserialization() {
        let json = r##"{
            "captions": [{"start": 1, "end": 2, "words": []}],
            "styles": {
                "mode": "one-word",
                "isBold": true,
                "position": "top-center",
                "activeWord": {"color": "#ff0000"}
            }
        }"##;
        let subtitle: Subtitle = serde_json::from_str(json).unwrap();
        assert_eq!(subtitle.styles.mode, HighlightMode::OneWord);
        assert!(subtitle.styles.is_bold);
        assert_eq!(subtitle.styles.position, Some(Anchor::TopCenter));
        assert!(subtitle.styles.mode.uses_highlight());
        assert!(!HighlightMode::Normal.uses_highlight());
    }

    #[test]
    fn test_sort_captions() {
        let mut subtitle = Subtitle {
            captions: vec![
                Caption {
                    start: 5.0,
                    ..Default::default()
                },
                Caption {
                    start: 1.0,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        subtitle.sort_captions();
        assert_eq!(subtitle.captions[0].start, 1.0);
    }
}

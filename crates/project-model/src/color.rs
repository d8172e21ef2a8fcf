//! Hex color parsing.

/// An 8-bit RGB color with optional alpha, parsed from `#rrggbb[aa]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: Option<u8>,
}

impl HexColor {
    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.strip_prefix('#')?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if hex.len() == 8 { byte(6) } else { None },
        })
    }

    /// Channel intensities scaled to `[0.0, 1.0]`.
    pub fn unit_rgb(&self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }
}

/// Whether `input` is a six-digit `#rrggbb` color.
pub fn is_opaque_hex(input: &str) -> bool {
    input.len() == 7 && HexColor::parse(input).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb_and_rgba() {
        assert_eq!(
            HexColor::parse("#ff8000"),
            Some(HexColor {
                r: 255,
                g: 128,
                b: 0,
                a: None
            })
        );
        assert_eq!(HexColor::parse("#00000080").and_then(|c| c.a), Some(0x80));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(HexColor::parse("ff8000").is_none());
        assert!(HexColor::parse("#fff").is_none());
        assert!(HexColor::parse("#gg0000").is_none());
        assert!(!is_opaque_hex("#00000000"));
        assert!(is_opaque_hex("#1A1a1a"));
    }
}

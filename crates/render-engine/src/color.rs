//! CSS-style color strings used by frame and webcam styles.
//!
//! Accepted forms: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` and
//! `rgba(r, g, b, a)` with `a` in `[0, 1]`.

use reframe_common::error::ReframeError;
use tiny_skia::Color;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorError {
    #[error("Malformed color '{0}'")]
    Malformed(String),

    #[error("Color component out of range in '{0}'")]
    OutOfRange(String),
}

impl From<ColorError> for ReframeError {
    fn from(err: ColorError) -> Self {
        ReframeError::render(err.to_string())
    }
}

/// Parse a color string.
pub fn parse_color(input: &str) -> Result<Color, ColorError> {
    let s = input.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| ColorError::Malformed(input.to_string()));
    }

    let lower = s.to_ascii_lowercase();
    let (body, expect_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
        (rest, true)
    } else if let Some(rest) = lower.strip_prefix("rgb(") {
        (rest, false)
    } else {
        return Err(ColorError::Malformed(input.to_string()));
    };
    let body = body
        .strip_suffix(')')
        .ok_or_else(|| ColorError::Malformed(input.to_string()))?;

    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != if expect_alpha { 4 } else { 3 } {
        return Err(ColorError::Malformed(input.to_string()));
    }

    let mut channels = [0u8; 3];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        let value: f64 = part
            .parse()
            .map_err(|_| ColorError::Malformed(input.to_string()))?;
        if !(0.0..=255.0).contains(&value) {
            return Err(ColorError::OutOfRange(input.to_string()));
        }
        *slot = value.round() as u8;
    }

    let alpha = match parts.get(3) {
        Some(part) => {
            let value: f32 = part
                .parse()
                .map_err(|_| ColorError::Malformed(input.to_string()))?;
            if !(0.0..=1.0).contains(&value) {
                return Err(ColorError::OutOfRange(input.to_string()));
            }
            value
        }
        None => 1.0,
    };

    let [r, g, b] = channels;
    Color::from_rgba(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        alpha,
    )
    .ok_or_else(|| ColorError::OutOfRange(input.to_string()))
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Color::from_rgba8(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
            255,
        )),
        6 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba8(c: Color) -> [u8; 4] {
        let u = c.to_color_u8();
        [u.red(), u.green(), u.blue(), u.alpha()]
    }

    #[test]
    fn test_hex_forms() {
        assert_eq!(rgba8(parse_color("#fff").unwrap()), [255, 255, 255, 255]);
        assert_eq!(rgba8(parse_color("#4f46e5").unwrap()), [0x4f, 0x46, 0xe5, 255]);
        assert_eq!(rgba8(parse_color("#00000080").unwrap()), [0, 0, 0, 0x80]);
        assert_eq!(rgba8(parse_color(" #ABC ").unwrap()), [0xaa, 0xbb, 0xcc, 255]);
    }

    #[test]
    fn test_functional_forms() {
        assert_eq!(rgba8(parse_color("rgb(10, 20, 30)").unwrap()), [10, 20, 30, 255]);
        assert_eq!(
            rgba8(parse_color("rgba(0, 0, 0, 0.5)").unwrap()),
            [0, 0, 0, 128]
        );
        assert_eq!(rgba8(parse_color("RGBA(255,255,255,0)").unwrap()), [255, 255, 255, 0]);
    }

    #[test]
    fn test_malformed_colors_are_rejected() {
        for bad in ["", "red", "#12", "#12345", "#ggg", "rgb(1,2)", "rgba(1,2,3)", "rgb(1,2,3"] {
            assert!(
                matches!(parse_color(bad), Err(ColorError::Malformed(_))),
                "{bad:?} should be malformed"
            );
        }
        assert!(matches!(
            parse_color("rgb(300, 0, 0)"),
            Err(ColorError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_color("rgba(0, 0, 0, 1.5)"),
            Err(ColorError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_color_error_becomes_render_error() {
        let err: ReframeError = parse_color("nope").unwrap_err().into();
        assert!(matches!(err, ReframeError::Render { .. }));
        assert!(err.to_string().contains("nope"));
    }
}

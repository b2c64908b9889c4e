//! Length, font-size and opacity parsing.
//!
//! Every parser here is total: malformed input maps to a fixed sentinel instead of an
//! error, so one bad attribute never stops the rest of a document from resolving.

use crate::viewport::{Axis, Viewport};
use tracing::trace;

/// Font size used when none is given or the given one cannot be read.
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Factor applied to `px` font sizes.
pub const PX_FONT_SCALE: f32 = 1.25;

/// Sentinel returned by [`parse_opacity`] for unreadable input.
pub const INVALID_OPACITY: f32 = -1.0;

const UNICODE_MINUS: char = '\u{2212}';

/// Whether `s` is a zero literal: optional sign (`-`, `+` or U+2212), one or more `0`,
/// then optionally a `.` followed by more `0`s.
pub fn is_zero_literal(s: &str) -> bool {
    let s = s.trim();
    let s = s
        .strip_prefix(['-', '+', UNICODE_MINUS])
        .unwrap_or(s);

    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    !int.is_empty() && int.chars().all(|c| c == '0') && frac.map_or(true, |f| f.chars().all(|c| c == '0'))
}

/// Parse a plain number, accepting the unicode minus sign.
pub fn parse_number(s: &str) -> Option<f32> {
    let s = s.trim();
    if is_zero_literal(s) {
        return Some(0.0);
    }
    let value: f32 = s.replace(UNICODE_MINUS, "-").parse().ok()?;
    value.is_finite().then(|| unsigned_zero(value))
}

/// Map `-0.0` to `0.0`.
fn unsigned_zero(value: f32) -> f32 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Parse a length, or `None` when the text is not one.
///
/// Absolute units convert to user units at 96 per inch; `em`/`ex` use the default font
/// size; `%` resolves against the viewport dimension picked by `axis`.
pub fn try_parse_length(s: &str, axis: Axis, viewport: &Viewport) -> Option<f32> {
    let s = s.trim();
    if is_zero_literal(s) {
        return Some(0.0);
    }

    let normalized = s.replace(UNICODE_MINUS, "-");
    let (number, unit) = split_number(&normalized)?;
    let value: f32 = number.parse().ok()?;

    let factor = match unit {
        "" | "px" => 1.0,
        "pt" => 4.0 / 3.0,
        "pc" => 16.0,
        "in" => 96.0,
        "cm" => 96.0 / 2.54,
        "mm" => 96.0 / 25.4,
        "em" => DEFAULT_FONT_SIZE,
        "ex" => DEFAULT_FONT_SIZE / 2.0,
        "%" => viewport.extent(axis) / 100.0,
        "vw" => viewport.width / 100.0,
        "vh" => viewport.height / 100.0,
        "vmin" => viewport.width.min(viewport.height) / 100.0,
        "vmax" => viewport.width.max(viewport.height) / 100.0,
        _ => return None,
    };

    let result = value * factor;
    result.is_finite().then(|| unsigned_zero(result))
}

/// Parse a length; anything unreadable is `0.0`.
pub fn parse_length(s: &str, axis: Axis, viewport: &Viewport) -> f32 {
    try_parse_length(s, axis, viewport).unwrap_or_else(|| {
        trace!(value = s, "Unparsable length, using 0");
        0.0
    })
}

/// Parse a dash list. `none` yields no list; each entry is a diagonal length.
pub fn parse_length_list(s: &str, viewport: &Viewport) -> Option<Vec<f32>> {
    let s = s.trim();
    if s == "none" {
        return None;
    }
    Some(
        s.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map(|p| parse_length(p, Axis::Diagonal, viewport))
            .collect(),
    )
}

/// Parse a font size of the form `<digits>[.<digits>][unit]`.
///
/// `px` sizes are scaled by [`PX_FONT_SCALE`]; any other unit keeps the bare number.
/// Input that does not have this form yields [`DEFAULT_FONT_SIZE`].
pub fn parse_font_size(s: &str) -> f32 {
    let s = s.trim();
    let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if digits_end == 0 {
        return DEFAULT_FONT_SIZE;
    }

    let mut number_end = digits_end;
    if s[number_end..].starts_with('.') {
        number_end += 1;
        number_end += s[number_end..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len() - number_end);
    }

    let unit = &s[number_end..];
    if !unit.chars().all(|c| c.is_ascii_lowercase()) {
        return DEFAULT_FONT_SIZE;
    }

    match s[..number_end].parse::<f32>() {
        Ok(size) if unit == "px" => size * PX_FONT_SCALE,
        Ok(size) => size,
        Err(_) => DEFAULT_FONT_SIZE,
    }
}

/// Parse an opacity. A trailing `%` divides by 100; unreadable input yields
/// [`INVALID_OPACITY`].
pub fn parse_opacity(s: &str) -> f32 {
    let s = s.trim();
    let (number, percent) = match s.strip_suffix('%') {
        Some(number) => (number, true),
        None => (s, false),
    };
    match parse_number(number) {
        Some(value) if percent => value / 100.0,
        Some(value) => value,
        None => INVALID_OPACITY,
    }
}

/// Split `s` into its leading number and the unit suffix.
fn split_number(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        i += 1;
    }

    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'-' | b'+') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }

    Some((&s[..i], s[i..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(200.0, 100.0)
    }

    #[test]
    fn test_zero_literals() {
        for zero in ["0", "-0", "+0", "\u{2212}0", "000", "-0.000", "0.", "00.0"] {
            assert!(is_zero_literal(zero), "{zero}");
            let value = parse_length(zero, Axis::Horizontal, &vp());
            assert_eq!(value.to_bits(), 0.0f32.to_bits(), "{zero}");
        }
        for not_zero in ["", "-", ".0", "0.01", "10", "0px", "1.0"] {
            assert!(!is_zero_literal(not_zero), "{not_zero}");
        }
    }

    #[test]
    fn test_negative_zero_spellings_are_unsigned() {
        for zero in ["-.0", "-0px", "\u{2212}0mm", "-0%", "-1e-60"] {
            let value = parse_length(zero, Axis::Horizontal, &vp());
            assert_eq!(value.to_bits(), 0.0f32.to_bits(), "{zero}");
        }
        for zero in ["-.0", "-0e3"] {
            assert_eq!(parse_number(zero).map(f32::to_bits), Some(0.0f32.to_bits()), "{zero}");
        }
    }

    #[test]
    fn test_units() {
        let vp = vp();
        assert_eq!(parse_length("10", Axis::Horizontal, &vp), 10.0);
        assert_eq!(parse_length("10px", Axis::Horizontal, &vp), 10.0);
        assert_eq!(parse_length("1in", Axis::Horizontal, &vp), 96.0);
        assert_eq!(parse_length("3pt", Axis::Horizontal, &vp), 4.0);
        assert_eq!(parse_length("2em", Axis::Horizontal, &vp), 24.0);
        assert!((parse_length("2.54cm", Axis::Horizontal, &vp) - 96.0).abs() < 1e-3);
        assert_eq!(parse_length("1e2", Axis::Horizontal, &vp), 100.0);
        assert_eq!(parse_length("\u{2212}5", Axis::Horizontal, &vp), -5.0);
    }

    #[test]
    fn test_percent_follows_axis() {
        let vp = vp();
        assert_eq!(parse_length("50%", Axis::Horizontal, &vp), 100.0);
        assert_eq!(parse_length("50%", Axis::Vertical, &vp), 50.0);
        let diagonal = parse_length("100%", Axis::Diagonal, &vp);
        assert!((diagonal - vp.diagonal()).abs() < 1e-3);
        assert_eq!(parse_length("10vw", Axis::Vertical, &vp), 20.0);
        assert_eq!(parse_length("10vmin", Axis::Horizontal, &vp), 10.0);
    }

    #[test]
    fn test_unparsable_length_is_zero() {
        let vp = vp();
        assert_eq!(parse_length("abc", Axis::Horizontal, &vp), 0.0);
        assert_eq!(parse_length("10furlongs", Axis::Horizontal, &vp), 0.0);
        assert!(try_parse_length("", Axis::Horizontal, &vp).is_none());
    }

    #[test]
    fn test_length_list() {
        let vp = Viewport::new(100.0, 100.0);
        assert_eq!(parse_length_list("5, 10 2", &vp), Some(vec![5.0, 10.0, 2.0]));
        assert_eq!(parse_length_list("none", &vp), None);
        let list = parse_length_list("10%", &vp).unwrap();
        assert!((list[0] - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_font_size() {
        assert_eq!(parse_font_size("10"), 10.0);
        assert_eq!(parse_font_size("10px"), 12.5);
        assert_eq!(parse_font_size("14pt"), 14.0);
        assert_eq!(parse_font_size("1.5"), 1.5);
        assert_eq!(parse_font_size("large"), DEFAULT_FONT_SIZE);
        assert_eq!(parse_font_size("-3"), DEFAULT_FONT_SIZE);
        assert_eq!(parse_font_size("12%"), DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_opacity() {
        assert_eq!(parse_opacity("50%"), 0.5);
        assert_eq!(parse_opacity("0.25"), 0.25);
        assert_eq!(parse_opacity("not-a-number"), -1.0);
        assert_eq!(parse_opacity("%"), -1.0);
    }
}

//! Length units - parsing attribute lengths into ems and formatting ems

use regex_lite::Regex;
use std::sync::OnceLock;

/// Conversion context for lengths
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitContext {
    /// Pixels per em
    pub em_px: f64,
    /// Height of an x in ems
    pub x_height: f64,
    /// Scale of the node the length belongs to
    pub scale: f64,
}

impl Default for UnitContext {
    fn default() -> Self {
        Self {
            em_px: 16.0,
            x_height: 0.442,
            scale: 1.0,
        }
    }
}

fn length_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^\s*([-+]?(?:\.\d+|\d+(?:\.\d*)?))?(pt|em|ex|mu|px|pc|in|mm|cm|%)?\s*$")
                .ok()
        })
        .as_ref()
}

/// Named MathML spaces, in ems
fn named_space(name: &str) -> Option<f64> {
    let eighteenths = match name {
        "veryverythinmathspace" => 1.0,
        "verythinmathspace" => 2.0,
        "thinmathspace" => 3.0,
        "mediummathspace" => 4.0,
        "thickmathspace" => 5.0,
        "verythickmathspace" => 6.0,
        "veryverythickmathspace" => 7.0,
        "negativeveryverythinmathspace" => -1.0,
        "negativeverythinmathspace" => -2.0,
        "negativethinmathspace" => -3.0,
        "negativemediummathspace" => -4.0,
        "negativethickmathspace" => -5.0,
        "negativeverythickmathspace" => -6.0,
        "negativeveryverythickmathspace" => -7.0,
        _ => return None,
    };
    Some(eighteenths / 18.0)
}

/// Whether a string is a well-formed length
pub fn is_length(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && (named_space(value).is_some()
            || length_pattern().is_some_and(|pattern| pattern.is_match(value)))
}

/// Convert a length to ems.
///
/// An empty value yields `size`; percentages and unitless numbers are taken
/// relative to `size`. Returns `None` for a malformed length.
pub fn length_to_em(value: &str, size: f64, ctx: &UnitContext) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return Some(size);
    }
    if let Some(em) = named_space(value) {
        return Some(em);
    }
    let caps = length_pattern()?.captures(value)?;
    let number = match caps.get(1) {
        Some(m) => m.as_str().parse::<f64>().ok()?,
        None => 1.0,
    };
    let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let absolute_px = match unit {
        "px" => Some(1.0),
        "in" => Some(96.0),
        "cm" => Some(96.0 / 2.54),
        "mm" => Some(96.0 / 25.4),
        "pt" => Some(96.0 / 72.0),
        "pc" => Some(16.0),
        _ => None,
    };
    let em = match (unit, absolute_px) {
        (_, Some(px)) => number * px / ctx.em_px / ctx.scale,
        ("em", _) => number,
        ("ex", _) => number * ctx.x_height,
        ("mu", _) => number / 18.0,
        ("%", _) => number / 100.0 * size,
        _ => number * size,
    };
    Some(em)
}

/// Format an em value the way display styles carry it
pub fn em(m: f64) -> String {
    if m.abs() < 0.0006 {
        return "0".to_string();
    }
    let fixed = format!("{:.3}", m);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{}em", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_em_format() {
        assert_eq!(em(0.0), "0");
        assert_eq!(em(0.0004), "0");
        assert_eq!(em(-0.0005), "0");
        assert_eq!(em(1.0), "1em");
        assert_eq!(em(-0.25), "-0.25em");
        assert_eq!(em(0.2), "0.2em");
        assert_eq!(em(0.12345), "0.123em");
        assert_eq!(em(10.0), "10em");
    }

    #[test]
    fn test_relative_units() {
        let ctx = UnitContext::default();
        assert!(close(length_to_em("2em", 0.0, &ctx).unwrap(), 2.0));
        assert!(close(length_to_em("1ex", 0.0, &ctx).unwrap(), 0.442));
        assert!(close(length_to_em("18mu", 0.0, &ctx).unwrap(), 1.0));
        assert!(close(length_to_em("50%", 0.8, &ctx).unwrap(), 0.4));
        assert!(close(length_to_em("2", 0.3, &ctx).unwrap(), 0.6));
        assert!(close(length_to_em("em", 0.0, &ctx).unwrap(), 1.0));
    }

    #[test]
    fn test_absolute_units() {
        let ctx = UnitContext::default();
        assert!(close(length_to_em("8px", 0.0, &ctx).unwrap(), 0.5));
        assert!(close(length_to_em("12pt", 0.0, &ctx).unwrap(), 1.0));

        let scaled = UnitContext {
            scale: 0.5,
            ..ctx
        };
        assert!(close(length_to_em("8px", 0.0, &scaled).unwrap(), 1.0));
    }

    #[test]
    fn test_empty_and_named() {
        let ctx = UnitContext::default();
        assert_eq!(length_to_em("", 0.15, &ctx), Some(0.15));
        assert!(close(
            length_to_em("thickmathspace", 0.0, &ctx).unwrap(),
            5.0 / 18.0
        ));
        assert!(close(
            length_to_em("negativethinmathspace", 0.0, &ctx).unwrap(),
            -3.0 / 18.0
        ));
    }

    #[test]
    fn test_invalid_lengths() {
        let ctx = UnitContext::default();
        assert_eq!(length_to_em("tall", 0.0, &ctx), None);
        assert_eq!(length_to_em("3 furlongs", 0.0, &ctx), None);
        assert!(!is_length("abc"));
        assert!(!is_length(""));
        assert!(is_length("-.5em"));
        assert!(is_length("mediummathspace"));
    }
}

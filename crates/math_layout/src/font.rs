//! Font parameters - the spacing constants and glyph metrics a layout pass reads
//!
//! A [`FontParameterSet`] is shared read-only across a pass. Lookups never
//! substitute a value for something the set does not contain: a missing
//! constant or glyph is reported as an error so that wrong spacing never
//! reaches the output silently.

use crate::error::{MathError, MathResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Named Constants
// =============================================================================

/// Named font constants (all in ems)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontParam {
    /// Height of a lowercase x
    XHeight,
    /// Height of the math axis above the baseline
    AxisHeight,
    /// Default rule thickness
    RuleThickness,
    /// Minimum subscript shift (subscript alone)
    Sub1,
    /// Minimum subscript shift (with superscript)
    Sub2,
    /// Subscript baseline drop below a compound base
    SubDrop,
    /// Minimum superscript shift in display style
    Sup1,
    /// Minimum superscript shift in text style
    Sup2,
    /// Minimum superscript shift in cramped style
    Sup3,
    /// Superscript baseline drop below the top of a compound base
    SupDrop,
    /// Minimum gap between a limit and the operator above
    BigOpSpacing1,
    /// Minimum gap between a limit and the operator below
    BigOpSpacing2,
    /// Minimum baseline rise of an upper limit
    BigOpSpacing3,
    /// Minimum baseline drop of a lower limit
    BigOpSpacing4,
    /// Padding above and below limits
    BigOpSpacing5,
    /// Space after a script
    Scriptspace,
}

impl FontParam {
    pub const ALL: [FontParam; 16] = [
        FontParam::XHeight,
        FontParam::AxisHeight,
        FontParam::RuleThickness,
        FontParam::Sub1,
        FontParam::Sub2,
        FontParam::SubDrop,
        FontParam::Sup1,
        FontParam::Sup2,
        FontParam::Sup3,
        FontParam::SupDrop,
        FontParam::BigOpSpacing1,
        FontParam::BigOpSpacing2,
        FontParam::BigOpSpacing3,
        FontParam::BigOpSpacing4,
        FontParam::BigOpSpacing5,
        FontParam::Scriptspace,
    ];

    /// Catalog name of the constant
    pub fn name(&self) -> &'static str {
        match self {
            FontParam::XHeight => "x_height",
            FontParam::AxisHeight => "axis_height",
            FontParam::RuleThickness => "rule_thickness",
            FontParam::Sub1 => "sub1",
            FontParam::Sub2 => "sub2",
            FontParam::SubDrop => "sub_drop",
            FontParam::Sup1 => "sup1",
            FontParam::Sup2 => "sup2",
            FontParam::Sup3 => "sup3",
            FontParam::SupDrop => "sup_drop",
            FontParam::BigOpSpacing1 => "big_op_spacing1",
            FontParam::BigOpSpacing2 => "big_op_spacing2",
            FontParam::BigOpSpacing3 => "big_op_spacing3",
            FontParam::BigOpSpacing4 => "big_op_spacing4",
            FontParam::BigOpSpacing5 => "big_op_spacing5",
            FontParam::Scriptspace => "scriptspace",
        }
    }
}

impl std::fmt::Display for FontParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Variants
// =============================================================================

/// Font variant selected by the `mathvariant` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontVariant {
    Normal,
    Italic,
    Bold,
    BoldItalic,
    DoubleStruck,
    Script,
    BoldScript,
    Fraktur,
    BoldFraktur,
    SansSerif,
    BoldSansSerif,
    SansSerifItalic,
    SansSerifBoldItalic,
    Monospace,
}

impl FontVariant {
    /// Parse a `mathvariant` attribute value
    pub fn from_name(name: &str) -> Option<Self> {
        let variant = match name {
            "normal" => FontVariant::Normal,
            "italic" => FontVariant::Italic,
            "bold" => FontVariant::Bold,
            "bold-italic" => FontVariant::BoldItalic,
            "double-struck" => FontVariant::DoubleStruck,
            "script" => FontVariant::Script,
            "bold-script" => FontVariant::BoldScript,
            "fraktur" => FontVariant::Fraktur,
            "bold-fraktur" => FontVariant::BoldFraktur,
            "sans-serif" => FontVariant::SansSerif,
            "bold-sans-serif" => FontVariant::BoldSansSerif,
            "sans-serif-italic" => FontVariant::SansSerifItalic,
            "sans-serif-bold-italic" => FontVariant::SansSerifBoldItalic,
            "monospace" => FontVariant::Monospace,
            _ => return None,
        };
        Some(variant)
    }

    /// The `mathvariant` name of this variant
    pub fn name(&self) -> &'static str {
        match self {
            FontVariant::Normal => "normal",
            FontVariant::Italic => "italic",
            FontVariant::Bold => "bold",
            FontVariant::BoldItalic => "bold-italic",
            FontVariant::DoubleStruck => "double-struck",
            FontVariant::Script => "script",
            FontVariant::BoldScript => "bold-script",
            FontVariant::Fraktur => "fraktur",
            FontVariant::BoldFraktur => "bold-fraktur",
            FontVariant::SansSerif => "sans-serif",
            FontVariant::BoldSansSerif => "bold-sans-serif",
            FontVariant::SansSerifItalic => "sans-serif-italic",
            FontVariant::SansSerifBoldItalic => "sans-serif-bold-italic",
            FontVariant::Monospace => "monospace",
        }
    }

    /// Next variant to consult when this one has no metrics for a glyph
    pub fn fallback(&self) -> Option<Self> {
        match self {
            FontVariant::Normal => None,
            FontVariant::BoldItalic | FontVariant::SansSerifItalic => Some(FontVariant::Italic),
            FontVariant::BoldScript => Some(FontVariant::Script),
            FontVariant::BoldFraktur => Some(FontVariant::Fraktur),
            FontVariant::SansSerifBoldItalic => Some(FontVariant::SansSerifItalic),
            FontVariant::BoldSansSerif => Some(FontVariant::SansSerif),
            _ => Some(FontVariant::Normal),
        }
    }
}

impl std::fmt::Display for FontVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Glyph Metrics
// =============================================================================

/// Metrics of a single glyph in ems
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharMetrics {
    pub height: f64,
    pub depth: f64,
    pub width: f64,
}

impl CharMetrics {
    pub const fn new(height: f64, depth: f64, width: f64) -> Self {
        Self {
            height,
            depth,
            width,
        }
    }
}

// =============================================================================
// Parameter Set
// =============================================================================

/// Font constants plus a per-variant glyph metric table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontParameterSet {
    #[serde(default)]
    pub params: BTreeMap<FontParam, f64>,
    #[serde(default)]
    pub chars: BTreeMap<FontVariant, BTreeMap<char, CharMetrics>>,
}

impl FontParameterSet {
    /// An empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Computer Modern (TeX) constants with metrics for common glyphs
    pub fn tex() -> Self {
        let mut set = Self::new();
        for &(param, value) in TEX_PARAMS {
            set.params.insert(param, value);
        }
        for (variant, table) in [
            (FontVariant::Normal, TEX_NORMAL),
            (FontVariant::Italic, TEX_ITALIC),
        ] {
            for &(ch, h, d, w) in table {
                set.insert_char(variant, ch, CharMetrics::new(h, d, w));
            }
        }
        set
    }

    /// Load a parameter set from JSON
    pub fn from_json(json: &str) -> MathResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set a constant, returning the updated set
    pub fn with_param(mut self, param: FontParam, value: f64) -> Self {
        self.params.insert(param, value);
        self
    }

    /// Remove a constant, returning the updated set
    pub fn without_param(mut self, param: FontParam) -> Self {
        self.params.remove(&param);
        self
    }

    /// Look up a constant
    pub fn param(&self, param: FontParam) -> MathResult<f64> {
        self.params
            .get(&param)
            .copied()
            .ok_or(MathError::MissingFontParameter(param))
    }

    /// Add or replace the metrics of a glyph
    pub fn insert_char(&mut self, variant: FontVariant, ch: char, metrics: CharMetrics) {
        self.chars.entry(variant).or_default().insert(ch, metrics);
    }

    /// Look up glyph metrics, following the variant fallback chain
    pub fn char_metrics(&self, variant: FontVariant, ch: char) -> MathResult<CharMetrics> {
        let mut current = Some(variant);
        while let Some(v) = current {
            if let Some(metrics) = self.chars.get(&v).and_then(|table| table.get(&ch)) {
                return Ok(*metrics);
            }
            current = v.fallback();
        }
        Err(MathError::MissingGlyphMetric { variant, ch })
    }
}

const TEX_PARAMS: &[(FontParam, f64)] = &[
    (FontParam::XHeight, 0.442),
    (FontParam::AxisHeight, 0.25),
    (FontParam::RuleThickness, 0.06),
    (FontParam::Sub1, 0.15),
    (FontParam::Sub2, 0.247),
    (FontParam::SubDrop, 0.05),
    (FontParam::Sup1, 0.413),
    (FontParam::Sup2, 0.363),
    (FontParam::Sup3, 0.289),
    (FontParam::SupDrop, 0.386),
    (FontParam::BigOpSpacing1, 0.111),
    (FontParam::BigOpSpacing2, 0.167),
    (FontParam::BigOpSpacing3, 0.2),
    (FontParam::BigOpSpacing4, 0.6),
    (FontParam::BigOpSpacing5, 0.1),
    (FontParam::Scriptspace, 0.05),
];

// (char, height, depth, width)
const TEX_NORMAL: &[(char, f64, f64, f64)] = &[
    (' ', 0.0, 0.0, 0.25),
    ('0', 0.666, 0.022, 0.5),
    ('1', 0.666, 0.0, 0.5),
    ('2', 0.666, 0.0, 0.5),
    ('3', 0.665, 0.022, 0.5),
    ('4', 0.677, 0.0, 0.5),
    ('5', 0.666, 0.022, 0.5),
    ('6', 0.666, 0.022, 0.5),
    ('7', 0.676, 0.022, 0.5),
    ('8', 0.666, 0.022, 0.5),
    ('9', 0.666, 0.022, 0.5),
    ('a', 0.448, 0.011, 0.5),
    ('b', 0.694, 0.011, 0.556),
    ('c', 0.448, 0.011, 0.444),
    ('d', 0.694, 0.011, 0.556),
    ('e', 0.448, 0.011, 0.444),
    ('f', 0.705, 0.0, 0.306),
    ('g', 0.453, 0.206, 0.5),
    ('h', 0.694, 0.0, 0.556),
    ('i', 0.669, 0.0, 0.278),
    ('j', 0.669, 0.205, 0.306),
    ('k', 0.694, 0.0, 0.528),
    ('l', 0.694, 0.0, 0.278),
    ('m', 0.442, 0.0, 0.833),
    ('n', 0.442, 0.0, 0.556),
    ('o', 0.448, 0.01, 0.5),
    ('p', 0.442, 0.194, 0.556),
    ('q', 0.442, 0.194, 0.528),
    ('r', 0.442, 0.0, 0.392),
    ('s', 0.448, 0.011, 0.394),
    ('t', 0.615, 0.01, 0.389),
    ('u', 0.442, 0.011, 0.556),
    ('v', 0.431, 0.011, 0.528),
    ('w', 0.431, 0.011, 0.722),
    ('x', 0.431, 0.0, 0.528),
    ('y', 0.431, 0.204, 0.528),
    ('z', 0.431, 0.0, 0.444),
    ('A', 0.716, 0.0, 0.75),
    ('B', 0.683, 0.0, 0.708),
    ('C', 0.705, 0.021, 0.722),
    ('D', 0.683, 0.0, 0.764),
    ('E', 0.68, 0.0, 0.681),
    ('F', 0.68, 0.0, 0.653),
    ('G', 0.705, 0.022, 0.785),
    ('H', 0.683, 0.0, 0.75),
    ('I', 0.683, 0.0, 0.361),
    ('J', 0.683, 0.022, 0.514),
    ('K', 0.683, 0.0, 0.778),
    ('L', 0.683, 0.0, 0.625),
    ('M', 0.683, 0.0, 0.917),
    ('N', 0.683, 0.0, 0.75),
    ('O', 0.705, 0.022, 0.778),
    ('P', 0.683, 0.0, 0.681),
    ('Q', 0.705, 0.193, 0.778),
    ('R', 0.683, 0.022, 0.736),
    ('S', 0.705, 0.022, 0.556),
    ('T', 0.677, 0.0, 0.722),
    ('U', 0.683, 0.022, 0.75),
    ('V', 0.683, 0.022, 0.75),
    ('W', 0.683, 0.022, 1.028),
    ('X', 0.683, 0.0, 0.75),
    ('Y', 0.683, 0.0, 0.75),
    ('Z', 0.683, 0.0, 0.611),
    ('+', 0.583, 0.082, 0.778),
    ('-', 0.583, 0.082, 0.778),
    ('\u{2212}', 0.583, 0.082, 0.778),
    ('=', 0.367, -0.133, 0.778),
    ('<', 0.54, 0.04, 0.778),
    ('>', 0.54, 0.04, 0.778),
    ('(', 0.75, 0.25, 0.389),
    (')', 0.75, 0.25, 0.389),
    ('[', 0.75, 0.25, 0.278),
    (']', 0.75, 0.25, 0.278),
    ('{', 0.75, 0.25, 0.5),
    ('}', 0.75, 0.25, 0.5),
    ('|', 0.75, 0.249, 0.278),
    ('/', 0.75, 0.25, 0.5),
    (',', 0.121, 0.194, 0.278),
    ('.', 0.12, 0.0, 0.278),
    (';', 0.43, 0.194, 0.278),
    (':', 0.43, 0.0, 0.278),
    ('!', 0.716, 0.0, 0.278),
    ('\'', 0.694, 0.0, 0.278),
    ('\u{2032}', 0.56, 0.0, 0.275),
    ('^', 0.694, 0.0, 0.5),
    ('~', 0.668, 0.0, 0.5),
    ('_', -0.025, 0.062, 0.5),
    ('\u{00AF}', 0.59, -0.544, 0.5),
    ('\u{00D7}', 0.491, -0.009, 0.778),
    ('\u{00F7}', 0.537, 0.036, 0.778),
    ('\u{00B1}', 0.666, 0.0, 0.778),
    ('\u{22C5}', 0.31, -0.199, 0.278),
    ('\u{2264}', 0.636, 0.138, 0.778),
    ('\u{2265}', 0.636, 0.138, 0.778),
    ('\u{2260}', 0.716, 0.215, 0.778),
    ('\u{2192}', 0.511, 0.011, 1.0),
    ('\u{221E}', 0.442, 0.011, 1.0),
    ('\u{2202}', 0.715, 0.022, 0.531),
    ('\u{2207}', 0.683, 0.033, 0.833),
    ('\u{2208}', 0.54, 0.04, 0.667),
    ('\u{2211}', 0.75, 0.25, 1.056),
    ('\u{220F}', 0.75, 0.25, 0.944),
    ('\u{2210}', 0.75, 0.25, 0.944),
    ('\u{222B}', 0.805, 0.306, 0.472),
    ('\u{222E}', 0.805, 0.306, 0.472),
    ('\u{22C3}', 0.75, 0.25, 0.833),
    ('\u{22C2}', 0.75, 0.25, 0.833),
    ('\u{0393}', 0.68, 0.0, 0.625),
    ('\u{0394}', 0.716, 0.0, 0.833),
    ('\u{0398}', 0.705, 0.022, 0.778),
    ('\u{039B}', 0.716, 0.0, 0.694),
    ('\u{039E}', 0.677, 0.0, 0.667),
    ('\u{03A0}', 0.68, 0.0, 0.75),
    ('\u{03A3}', 0.683, 0.0, 0.722),
    ('\u{03A6}', 0.683, 0.0, 0.722),
    ('\u{03A8}', 0.683, 0.0, 0.778),
    ('\u{03A9}', 0.705, 0.0, 0.722),
];

const TEX_ITALIC: &[(char, f64, f64, f64)] = &[
    ('a', 0.441, 0.01, 0.529),
    ('b', 0.694, 0.011, 0.429),
    ('c', 0.442, 0.011, 0.433),
    ('d', 0.694, 0.01, 0.52),
    ('e', 0.442, 0.011, 0.466),
    ('f', 0.705, 0.205, 0.49),
    ('g', 0.442, 0.205, 0.477),
    ('h', 0.694, 0.011, 0.576),
    ('i', 0.661, 0.011, 0.345),
    ('j', 0.661, 0.204, 0.412),
    ('k', 0.694, 0.011, 0.521),
    ('l', 0.694, 0.011, 0.298),
    ('m', 0.442, 0.011, 0.878),
    ('n', 0.442, 0.011, 0.6),
    ('o', 0.441, 0.011, 0.485),
    ('p', 0.442, 0.194, 0.503),
    ('q', 0.442, 0.194, 0.446),
    ('r', 0.442, 0.011, 0.451),
    ('s', 0.442, 0.01, 0.469),
    ('t', 0.626, 0.011, 0.361),
    ('u', 0.442, 0.011, 0.572),
    ('v', 0.443, 0.011, 0.485),
    ('w', 0.443, 0.011, 0.716),
    ('x', 0.442, 0.011, 0.572),
    ('y', 0.442, 0.205, 0.49),
    ('z', 0.442, 0.011, 0.465),
    ('A', 0.716, 0.0, 0.75),
    ('B', 0.683, 0.0, 0.759),
    ('C', 0.705, 0.022, 0.715),
    ('D', 0.683, 0.0, 0.828),
    ('E', 0.68, 0.0, 0.738),
    ('F', 0.68, 0.0, 0.643),
    ('G', 0.705, 0.022, 0.786),
    ('H', 0.683, 0.0, 0.831),
    ('I', 0.683, 0.0, 0.44),
    ('J', 0.683, 0.022, 0.555),
    ('K', 0.683, 0.0, 0.849),
    ('L', 0.683, 0.0, 0.681),
    ('M', 0.683, 0.0, 0.97),
    ('N', 0.683, 0.0, 0.803),
    ('O', 0.704, 0.022, 0.763),
    ('P', 0.683, 0.0, 0.642),
    ('Q', 0.704, 0.194, 0.791),
    ('R', 0.683, 0.021, 0.759),
    ('S', 0.705, 0.022, 0.613),
    ('T', 0.677, 0.0, 0.584),
    ('U', 0.683, 0.022, 0.683),
    ('V', 0.683, 0.022, 0.583),
    ('W', 0.683, 0.022, 0.944),
    ('X', 0.683, 0.0, 0.828),
    ('Y', 0.683, 0.0, 0.581),
    ('Z', 0.683, 0.0, 0.683),
    ('\u{03B1}', 0.442, 0.011, 0.64),
    ('\u{03B2}', 0.705, 0.194, 0.566),
    ('\u{03B3}', 0.441, 0.216, 0.518),
    ('\u{03B4}', 0.717, 0.01, 0.444),
    ('\u{03B5}', 0.452, 0.022, 0.466),
    ('\u{03B6}', 0.704, 0.204, 0.438),
    ('\u{03B7}', 0.442, 0.216, 0.497),
    ('\u{03B8}', 0.705, 0.01, 0.469),
    ('\u{03B9}', 0.442, 0.01, 0.354),
    ('\u{03BA}', 0.442, 0.011, 0.576),
    ('\u{03BB}', 0.694, 0.012, 0.583),
    ('\u{03BC}', 0.442, 0.216, 0.603),
    ('\u{03BD}', 0.442, 0.0, 0.494),
    ('\u{03BE}', 0.704, 0.205, 0.438),
    ('\u{03C0}', 0.431, 0.011, 0.57),
    ('\u{03C1}', 0.442, 0.216, 0.517),
    ('\u{03C3}', 0.431, 0.011, 0.571),
    ('\u{03C4}', 0.431, 0.013, 0.437),
    ('\u{03C5}', 0.443, 0.01, 0.54),
    ('\u{03C6}', 0.442, 0.218, 0.654),
    ('\u{03C7}', 0.442, 0.204, 0.626),
    ('\u{03C8}', 0.694, 0.205, 0.651),
    ('\u{03C9}', 0.443, 0.011, 0.622),
];

// =============================================================================
// Tests
// =============================================================================

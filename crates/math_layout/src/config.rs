//! Layout options
//!
//! Options that apply to a whole layout pass. Font constants and glyph
//! metrics live separately in [`FontParameterSet`](crate::font::FontParameterSet).

use crate::error::{MathError, MathResult};
use crate::units::UnitContext;
use serde::{Deserialize, Serialize};

/// Options for one layout pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutOptions {
    /// Lay the root out in display style
    pub display: bool,
    /// Pixels per em, for absolute length units
    pub em_px: f64,
    /// Size factor applied per script level
    pub script_size_multiplier: f64,
    /// Smallest script size in pixels
    pub script_min_size_px: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            display: false,
            em_px: 16.0,
            script_size_multiplier: 0.71,
            script_min_size_px: 8.0,
        }
    }
}

impl LayoutOptions {
    /// Default options in display style
    pub fn display() -> Self {
        Self {
            display: true,
            ..Self::default()
        }
    }

    /// Load options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> MathResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every size option is finite and in range
    pub fn validate(&self) -> MathResult<()> {
        let checks = [
            ("em_px", self.em_px, self.em_px > 0.0),
            (
                "script_size_multiplier",
                self.script_size_multiplier,
                self.script_size_multiplier > 0.0,
            ),
            (
                "script_min_size_px",
                self.script_min_size_px,
                self.script_min_size_px >= 0.0,
            ),
        ];
        for (name, value, in_range) in checks {
            if !(in_range && value.is_finite()) {
                return Err(MathError::InvalidOption { name, value });
            }
        }
        Ok(())
    }

    /// Size of a node at the given script level, relative to the root.
    ///
    /// Always finite and positive for validated options.
    pub fn scale_for_level(&self, level: i32) -> f64 {
        if level == 0 {
            return 1.0;
        }
        let min = self.script_min_size_px / self.em_px;
        let scale = self.script_size_multiplier.powi(level).max(min);
        if scale.is_finite() {
            scale
        } else {
            f64::MAX
        }
    }

    /// Length conversion context for a node at `scale`
    pub fn unit_context(&self, x_height: f64, scale: f64) -> UnitContext {
        UnitContext {
            em_px: self.em_px,
            x_height,
            scale,
        }
    }
}

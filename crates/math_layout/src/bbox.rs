//! Bounding boxes - the value type every layout construct composes
//!
//! Boxes measure width, height above the baseline, and depth below it, in the
//! node's own ems. `rscale` is the node's size relative to its parent; it is
//! applied when a parent appends or combines the box, never to the box's own
//! fields.

use serde::{Deserialize, Serialize};

/// Starting extent of an empty box, so the first combine always wins
const BIGDIMEN: f64 = 10_000_000.0;

/// A bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Width
    pub w: f64,
    /// Height above the baseline
    pub h: f64,
    /// Depth below the baseline
    pub d: f64,
    /// Scale relative to the parent
    pub rscale: f64,
}

impl Default for BBox {
    fn default() -> Self {
        Self::zero()
    }
}

impl BBox {
    /// A box of the given extents at scale 1
    pub fn new(w: f64, h: f64, d: f64) -> Self {
        Self { w, h, d, rscale: 1.0 }
    }

    /// A box with no extent
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// A box that any combined box will overwrite
    pub fn empty() -> Self {
        Self::new(0.0, -BIGDIMEN, -BIGDIMEN)
    }

    /// Return the same box at a different relative scale
    pub fn with_rscale(self, rscale: f64) -> Self {
        Self { rscale, ..self }
    }

    /// Width as it appears in the parent
    pub fn scaled_width(&self) -> f64 {
        self.w * self.rscale
    }

    /// Height as it appears in the parent
    pub fn scaled_height(&self) -> f64 {
        self.h * self.rscale
    }

    /// Depth as it appears in the parent
    pub fn scaled_depth(&self) -> f64 {
        self.d * self.rscale
    }

    /// Horizontal concatenation: widths add, height and depth take the max
    pub fn append(&self, other: &BBox) -> BBox {
        BBox {
            w: self.w + other.scaled_width(),
            h: self.h.max(other.scaled_height()),
            d: self.d.max(other.scaled_depth()),
            rscale: self.rscale,
        }
    }

    /// Place `other` at `(x, y)` relative to this box's origin.
    ///
    /// Positive `y` raises `other` above the baseline.
    pub fn combine(&self, other: &BBox, x: f64, y: f64) -> BBox {
        BBox {
            w: self.w.max(x + other.scaled_width()),
            h: self.h.max(y + other.scaled_height()),
            d: self.d.max(other.scaled_depth() - y),
            rscale: self.rscale,
        }
    }

    /// Clamp negative height and depth to zero; width is left alone
    pub fn clean(&self) -> BBox {
        BBox {
            h: self.h.max(0.0),
            d: self.d.max(0.0),
            ..*self
        }
    }

    /// Add to the width
    pub fn pad_width(&self, extra: f64) -> BBox {
        BBox {
            w: self.w + extra,
            ..*self
        }
    }

    /// Add to the height
    pub fn pad_height(&self, extra: f64) -> BBox {
        BBox {
            h: self.h + extra,
            ..*self
        }
    }

    /// Add to the depth
    pub fn pad_depth(&self, extra: f64) -> BBox {
        BBox {
            d: self.d + extra,
            ..*self
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_append() {
        let a = BBox::new(1.0, 0.7, 0.2);
        let b = BBox::new(0.5, 0.9, 0.1);
        let c = a.append(&b);
        assert_eq!(c.w, 1.5);
        assert_eq!(c.h, 0.9);
        assert_eq!(c.d, 0.2);
    }

    #[test]
    fn test_append_scaled() {
        let a = BBox::new(1.0, 0.5, 0.0);
        let b = BBox::new(1.0, 1.0, 0.5).with_rscale(0.5);
        let c = a.append(&b);
        assert_eq!(c.w, 1.5);
        assert_eq!(c.h, 0.5);
        assert_eq!(c.d, 0.25);
    }

    #[test]
    fn test_combine_raised() {
        let base = BBox::new(1.0, 0.7, 0.0);
        let script = BBox::new(0.5, 0.4, 0.1);
        let c = base.combine(&script, 1.0, 0.5);
        assert_eq!(c.w, 1.5);
        assert!((c.h - 0.9).abs() < 1e-12);
        assert_eq!(c.d, 0.0);
    }

    #[test]
    fn test_combine_lowered() {
        let base = BBox::new(1.0, 0.7, 0.0);
        let script = BBox::new(0.5, 0.4, 0.1);
        let c = base.combine(&script, 0.2, -0.3);
        assert_eq!(c.w, 1.0);
        assert_eq!(c.h, 0.7);
        assert!((c.d - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_then_clean() {
        let c = BBox::empty().clean();
        assert_eq!(c, BBox::zero());

        let c = BBox::empty().combine(&BBox::new(2.0, 0.5, 0.1), 0.0, 0.0);
        assert_eq!(c, BBox::new(2.0, 0.5, 0.1));
    }

    #[test]
    fn test_clean_keeps_width() {
        let c = BBox::new(-0.5, -0.2, -0.1).clean();
        assert_eq!(c.w, -0.5);
        assert_eq!(c.h, 0.0);
        assert_eq!(c.d, 0.0);
    }

    fn extent() -> impl Strategy<Value = f64> {
        -5.0f64..5.0
    }

    proptest! {
        #[test]
        fn prop_append_is_width_additive(
            aw in 0.0f64..10.0, ah in extent(), ad in extent(),
            bw in 0.0f64..10.0, bh in extent(), bd in extent(),
        ) {
            let a = BBox::new(aw, ah, ad);
            let b = BBox::new(bw, bh, bd);
            let c = a.append(&b);
            prop_assert_eq!(c.w, aw + bw);
            prop_assert_eq!(c.h, ah.max(bh));
            prop_assert_eq!(c.d, ad.max(bd));
        }

        #[test]
        fn prop_clean_is_non_negative(w in extent(), h in extent(), d in extent()) {
            let c = BBox::new(w, h, d).clean();
            prop_assert!(c.h >= 0.0);
            prop_assert!(c.d >= 0.0);
            prop_assert_eq!(c.w, w);
        }

        #[test]
        fn prop_combine_never_shrinks(
            h in extent(), d in extent(),
            oh in extent(), od in extent(), x in extent(), y in extent(),
        ) {
            let a = BBox::new(1.0, h, d);
            let c = a.combine(&BBox::new(1.0, oh, od), x, y);
            prop_assert!(c.w >= a.w);
            prop_assert!(c.h >= a.h);
            prop_assert!(c.d >= a.d);
        }
    }
}

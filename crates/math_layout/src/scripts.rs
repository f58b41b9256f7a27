//! Script positioning - offsets for sub/superscripts and under/overscripts
//!
//! Follows the TeXBook Appendix G rules. Every construct is one of six
//! [`ScriptConstruct`] cases; the shared measurements ([`sub_offset`],
//! [`sup_offset`], [`over_separation`], [`under_separation`],
//! [`centering_offsets`]) are free functions used by all of them.
//!
//! Under/over constructs whose base has movable limits outside display style
//! are laid out exactly like the matching sub/sup construct.

use crate::attributes::ResolvedAttributes;
use crate::bbox::BBox;
use crate::error::{MathError, MathResult};
use crate::font::{FontParam, FontParameterSet};
use crate::model::{MathTree, NodeId, NodeKind};
use crate::units::{self, UnitContext};
use serde::{Deserialize, Serialize};

// =============================================================================
// Constructs
// =============================================================================

/// The six script constructs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptConstruct {
    Sub,
    Sup,
    SubSup,
    Under,
    Over,
    UnderOver,
}

impl ScriptConstruct {
    /// The construct for a node kind
    pub fn from_kind(kind: NodeKind) -> MathResult<Self> {
        match kind {
            NodeKind::Sub => Ok(ScriptConstruct::Sub),
            NodeKind::Sup => Ok(ScriptConstruct::Sup),
            NodeKind::SubSup => Ok(ScriptConstruct::SubSup),
            NodeKind::Under => Ok(ScriptConstruct::Under),
            NodeKind::Over => Ok(ScriptConstruct::Over),
            NodeKind::UnderOver => Ok(ScriptConstruct::UnderOver),
            other => Err(MathError::UnsupportedConstruct(other)),
        }
    }

    /// The sub/sup construct an under/over construct turns into when its
    /// limits move
    pub fn as_scripts(self) -> Self {
        match self {
            ScriptConstruct::Under => ScriptConstruct::Sub,
            ScriptConstruct::Over => ScriptConstruct::Sup,
            ScriptConstruct::UnderOver => ScriptConstruct::SubSup,
            other => other,
        }
    }

    /// Whether this is an under/over construct
    pub fn is_limits(self) -> bool {
        matches!(
            self,
            ScriptConstruct::Under | ScriptConstruct::Over | ScriptConstruct::UnderOver
        )
    }

    /// Number of scripts attached to the base
    pub fn script_count(self) -> usize {
        match self {
            ScriptConstruct::SubSup | ScriptConstruct::UnderOver => 2,
            _ => 1,
        }
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Everything the engine reads besides the boxes
#[derive(Debug, Clone)]
pub struct ScriptParams<'a> {
    pub font: &'a FontParameterSet,
    pub units: UnitContext,
    pub display_style: bool,
    pub prime_style: bool,
    /// `subscriptshift` attribute; empty selects the font default
    pub subscript_shift: &'a str,
    /// `superscriptshift` attribute; empty selects the font default
    pub superscript_shift: &'a str,
}

impl<'a> ScriptParams<'a> {
    /// Parameters with no explicit shifts
    pub fn new(font: &'a FontParameterSet, display_style: bool, prime_style: bool) -> Self {
        Self {
            font,
            units: UnitContext::default(),
            display_style,
            prime_style,
            subscript_shift: "",
            superscript_shift: "",
        }
    }

    fn param(&self, param: FontParam) -> MathResult<f64> {
        self.font.param(param)
    }

    /// Convert a shift attribute, falling back to `default`
    fn shift(&self, value: &str, default: f64) -> f64 {
        units::length_to_em(value, default, &self.units).unwrap_or(default)
    }
}

// =============================================================================
// Shared Measurements
// =============================================================================

/// Whether a base counts as a single character.
///
/// `core_box` is the box of the base after unwrapping a single-child row or
/// style group (see [`MathTree::unwrap_single`]).
pub fn is_char_base(
    tree: &MathTree,
    resolved: &ResolvedAttributes,
    base: NodeId,
    core_box: &BBox,
) -> bool {
    let core = tree.unwrap_single(base);
    let node = tree.node(core);
    matches!(
        node.kind,
        NodeKind::Operator | NodeKind::Identifier | NodeKind::Number
    ) && core_box.rscale == 1.0
        && node.text.chars().count() == 1
        && !resolved.get(core).get_bool("largeop")
}

/// Whether an under/over construct sets its limits as scripts
pub fn has_movable_limits(tree: &MathTree, resolved: &ResolvedAttributes, id: NodeId) -> bool {
    let attrs = resolved.get(id);
    if attrs.get_bool("displaystyle") {
        return false;
    }
    let node = tree.node(id);
    node.flag("movablelimits")
        || attrs.get_bool("movablelimits")
        || node
            .children
            .first()
            .and_then(|&base| tree.core_operator(base))
            .is_some_and(|mo| resolved.get(mo).get_bool("movablelimits"))
}

/// Minimum superscript shift for the current style
pub fn superscript_shift_default(params: &ScriptParams) -> MathResult<f64> {
    let tier = if params.display_style {
        FontParam::Sup1
    } else if params.prime_style {
        FontParam::Sup3
    } else {
        FontParam::Sup2
    };
    params.param(tier)
}

/// Subscript drop `V` (TeXBook Appendix G 18a, 18b)
pub fn sub_offset(
    params: &ScriptParams,
    base: &BBox,
    script: &BBox,
    char_base: bool,
) -> MathResult<f64> {
    let sub_drop = params.param(FontParam::SubDrop)?;
    let x_height = params.param(FontParam::XHeight)?;
    let explicit = params.shift(params.subscript_shift, params.param(FontParam::Sub1)?);
    let drop = if char_base {
        0.0
    } else {
        base.d + sub_drop * script.rscale
    };
    Ok(drop
        .max(explicit)
        .max(script.h * script.rscale - (4.0 / 5.0) * x_height))
}

/// Superscript rise `U` (TeXBook Appendix G 18a, 18c, 18d)
pub fn sup_offset(
    params: &ScriptParams,
    base: &BBox,
    script: &BBox,
    char_base: bool,
) -> MathResult<f64> {
    let sup_drop = params.param(FontParam::SupDrop)?;
    let x_height = params.param(FontParam::XHeight)?;
    let explicit = params.shift(params.superscript_shift, superscript_shift_default(params)?);
    let drop = if char_base {
        0.0
    } else {
        base.h - sup_drop * script.rscale
    };
    Ok(drop
        .max(explicit)
        .max(script.d * script.rscale + (1.0 / 4.0) * x_height))
}

/// Superscript rise `u`, subscript drop `v`, and the gap `q` between them
/// when both are present (TeXBook Appendix G 18e)
pub fn sub_sup_offsets(
    params: &ScriptParams,
    base: &BBox,
    sub: &BBox,
    sup: &BBox,
    char_base: bool,
) -> MathResult<(f64, f64, f64)> {
    let t = 3.0 * params.param(FontParam::RuleThickness)?;
    let x_height = params.param(FontParam::XHeight)?;
    let sub_drop = params.param(FontParam::SubDrop)?;
    let explicit_sub = params.shift(params.subscript_shift, params.param(FontParam::Sub2)?);
    let drop = if char_base {
        0.0
    } else {
        base.d + sub_drop * sub.rscale
    };

    let mut u = sup_offset(params, base, sup, char_base)?;
    let mut v = drop.max(explicit_sub);
    let gap = |u: f64, v: f64| (u - sup.d * sup.rscale) - (sub.h * sub.rscale - v);

    let q = gap(u, v);
    if q < t {
        v += t - q;
        let p = (4.0 / 5.0) * x_height - (u - sup.d * sup.rscale);
        if p > 0.0 {
            u += p;
            v -= p;
        }
    }
    u = u.max(params.shift(params.superscript_shift, u));
    v = v.max(params.shift(params.subscript_shift, v));
    Ok((u, v, gap(u, v)))
}

/// Separation `k` above the base and rise `u` of an overscript
/// (TeXBook Appendix G 13, 13a)
pub fn over_separation(
    params: &ScriptParams,
    base: &BBox,
    over: &BBox,
) -> MathResult<(f64, f64)> {
    let d = over.d * over.rscale;
    let k = params
        .param(FontParam::BigOpSpacing1)?
        .max(params.param(FontParam::BigOpSpacing3)? - d.max(0.0));
    Ok((k, base.h + k + d))
}

/// Separation `k` below the base and (negative) offset `v` of an underscript
/// (TeXBook Appendix G 13, 13a)
pub fn under_separation(
    params: &ScriptParams,
    base: &BBox,
    under: &BBox,
) -> MathResult<(f64, f64)> {
    let h = under.h * under.rscale;
    let k = params
        .param(FontParam::BigOpSpacing2)?
        .max(params.param(FontParam::BigOpSpacing4)? - h);
    Ok((k, -(base.d + k + h)))
}

/// Horizontal offsets that center each box in a vertical stack
pub fn centering_offsets(boxes: &[BBox]) -> Vec<f64> {
    let widths: Vec<f64> = boxes.iter().map(BBox::scaled_width).collect();
    let w = widths.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    widths.iter().map(|width| (w - width) / 2.0).collect()
}

// =============================================================================
// Placement
// =============================================================================

/// Computed offsets of a script construct
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScriptPlacement {
    /// Subscript lowered by `v`
    Sub { v: f64 },
    /// Superscript raised by `u`
    Sup { u: f64 },
    /// Both scripts with gap `q` between them
    SubSup { u: f64, v: f64, q: f64 },
    /// Underscript at separation `k`, offset `v`; `dx` for base and under
    Under { k: f64, v: f64, dx: [f64; 2] },
    /// Overscript at separation `k`, offset `u`; `dx` for base and over
    Over { k: f64, u: f64, dx: [f64; 2] },
    /// Both limits; `dx` for base, under, and over
    UnderOver {
        k_under: f64,
        v: f64,
        k_over: f64,
        u: f64,
        dx: [f64; 3],
    },
}

/// Result of positioning one construct
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptLayout {
    /// The construct as written
    pub construct: ScriptConstruct,
    pub placement: ScriptPlacement,
    /// The box of the whole construct, relative scale 1
    pub bbox: BBox,
}

impl ScriptLayout {
    /// Whether an under/over construct was set as sub/sup
    pub fn limits_moved(&self) -> bool {
        self.construct.is_limits()
            && matches!(
                self.placement,
                ScriptPlacement::Sub { .. }
                    | ScriptPlacement::Sup { .. }
                    | ScriptPlacement::SubSup { .. }
            )
    }
}

/// Position the scripts of a construct around its base.
///
/// `scripts` follows child order: `[sub]`, `[sup]`, `[sub, sup]`, `[under]`,
/// `[over]`, or `[under, over]`.
pub fn layout_script(
    construct: ScriptConstruct,
    params: &ScriptParams,
    base: &BBox,
    scripts: &[BBox],
    char_base: bool,
    movable_limits: bool,
) -> MathResult<ScriptLayout> {
    if scripts.len() != construct.script_count() {
        return Err(MathError::InvalidStructure {
            kind: construct_kind(construct),
            expected: construct.script_count() + 1,
            found: scripts.len() + 1,
        });
    }
    let effective = if construct.is_limits() && movable_limits {
        construct.as_scripts()
    } else {
        construct
    };
    let scriptspace = || params.param(FontParam::Scriptspace);
    let spacing5 = || params.param(FontParam::BigOpSpacing5);

    let (placement, bbox) = match effective {
        ScriptConstruct::Sub => {
            let v = sub_offset(params, base, &scripts[0], char_base)?;
            let bbox = BBox::zero().append(base);
            let bbox = bbox
                .combine(&scripts[0], bbox.w, -v)
                .pad_width(scriptspace()?);
            (ScriptPlacement::Sub { v }, bbox)
        }
        ScriptConstruct::Sup => {
            let u = sup_offset(params, base, &scripts[0], char_base)?;
            let bbox = BBox::zero().append(base);
            let bbox = bbox
                .combine(&scripts[0], bbox.w, u)
                .pad_width(scriptspace()?);
            (ScriptPlacement::Sup { u }, bbox)
        }
        ScriptConstruct::SubSup => {
            let (sub, sup) = (&scripts[0], &scripts[1]);
            let (u, v, q) = sub_sup_offsets(params, base, sub, sup, char_base)?;
            let bbox = BBox::zero().append(base);
            let w = bbox.w;
            let bbox = bbox
                .combine(sub, w, -v)
                .combine(sup, w, u)
                .pad_width(scriptspace()?);
            (ScriptPlacement::SubSup { u, v, q }, bbox)
        }
        ScriptConstruct::Under => {
            let under = &scripts[0];
            let (k, v) = under_separation(params, base, under)?;
            let dx = centering_offsets(&[*base, *under]);
            let bbox = BBox::empty()
                .combine(base, dx[0], 0.0)
                .combine(under, dx[1], v)
                .pad_depth(spacing5()?);
            let dx = [dx[0], dx[1]];
            (ScriptPlacement::Under { k, v, dx }, bbox)
        }
        ScriptConstruct::Over => {
            let over = &scripts[0];
            let (k, u) = over_separation(params, base, over)?;
            let dx = centering_offsets(&[*base, *over]);
            let bbox = BBox::empty()
                .combine(base, dx[0], 0.0)
                .combine(over, dx[1], u)
                .pad_height(spacing5()?);
            let dx = [dx[0], dx[1]];
            (ScriptPlacement::Over { k, u, dx }, bbox)
        }
        ScriptConstruct::UnderOver => {
            let (under, over) = (&scripts[0], &scripts[1]);
            let (k_under, v) = under_separation(params, base, under)?;
            let (k_over, u) = over_separation(params, base, over)?;
            let dx = centering_offsets(&[*base, *under, *over]);
            let bbox = BBox::empty()
                .combine(base, dx[0], 0.0)
                .combine(under, dx[1], v)
                .combine(over, dx[2], u)
                .pad_height(spacing5()?)
                .pad_depth(spacing5()?);
            let dx = [dx[0], dx[1], dx[2]];
            (
                ScriptPlacement::UnderOver {
                    k_under,
                    v,
                    k_over,
                    u,
                    dx,
                },
                bbox,
            )
        }
    };

    tracing::trace!(
        target: "math_layout::layout",
        ?construct,
        ?placement,
        char_base,
        movable_limits,
        "script placed"
    );
    Ok(ScriptLayout {
        construct,
        placement,
        bbox: bbox.clean(),
    })
}

fn construct_kind(construct: ScriptConstruct) -> NodeKind {
    match construct {
        ScriptConstruct::Sub => NodeKind::Sub,
        ScriptConstruct::Sup => NodeKind::Sup,
        ScriptConstruct::SubSup => NodeKind::SubSup,
        ScriptConstruct::Under => NodeKind::Under,
        ScriptConstruct::Over => NodeKind::Over,
        ScriptConstruct::UnderOver => NodeKind::UnderOver,
    }
}

// =============================================================================
// Tests
// =============================================================================

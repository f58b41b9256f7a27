//! Box pass - bounding boxes for every node, computed bottom-up
//!
//! [`LayoutEngine`] computes a node's box on first request and caches it, so
//! every node owns exactly one box per pass. Script constructs delegate to
//! [`crate::scripts`] and keep their placement for emission.

use crate::attributes::ResolvedAttributes;
use crate::bbox::BBox;
use crate::config::LayoutOptions;
use crate::error::{MathError, MathResult};
use crate::font::{FontParam, FontParameterSet, FontVariant};
use crate::model::{MathTree, NodeId, NodeKind};
use crate::scripts::{self, ScriptConstruct, ScriptLayout, ScriptParams};
use crate::tex_class::{self, class_of, ClassTable};
use crate::units::{self, UnitContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Horizontal padding on each inner side of a table cell
pub const CELL_PADDING_X: f64 = 0.5;
/// Vertical padding on each inner side of a table cell
pub const CELL_PADDING_Y: f64 = 0.25;
/// Height above the baseline of the strut in every table cell
pub const STRUT_HEIGHT: f64 = 0.75;
/// Depth below the baseline of the strut in every table cell
pub const STRUT_DEPTH: f64 = 0.25;

// =============================================================================
// Box Table
// =============================================================================

/// Column and row extents of a laid out table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    /// Width of the table: columns plus the padding between them
    pub width: f64,
    pub column_widths: Vec<f64>,
    /// Height and depth of each row
    pub rows: Vec<(f64, f64)>,
}

/// Side table of boxes and placements, indexed by node
#[derive(Debug, Clone, PartialEq)]
pub struct BoxTable {
    boxes: Vec<Option<BBox>>,
    scales: Vec<f64>,
    spacing: Vec<f64>,
    scripts: BTreeMap<NodeId, ScriptLayout>,
    tables: BTreeMap<NodeId, TableLayout>,
}

impl BoxTable {
    fn new(scales: Vec<f64>) -> Self {
        let len = scales.len();
        Self {
            boxes: vec![None; len],
            scales,
            spacing: vec![0.0; len],
            scripts: BTreeMap::new(),
            tables: BTreeMap::new(),
        }
    }

    /// The box of a node
    pub fn get(&self, id: NodeId) -> Option<&BBox> {
        self.boxes.get(id.index()).and_then(Option::as_ref)
    }

    /// The box of a node, failing for ids outside the pass
    pub fn try_get(&self, id: NodeId) -> MathResult<BBox> {
        self.get(id).copied().ok_or(MathError::NodeNotFound(id))
    }

    /// Size of a node relative to the root
    pub fn scale(&self, id: NodeId) -> f64 {
        self.scales.get(id.index()).copied().unwrap_or(1.0)
    }

    /// Inter-atom space before a node, in its parent's ems
    pub fn space_before(&self, id: NodeId) -> f64 {
        self.spacing.get(id.index()).copied().unwrap_or(0.0)
    }

    /// Placement of a script construct
    pub fn script(&self, id: NodeId) -> Option<&ScriptLayout> {
        self.scripts.get(&id)
    }

    /// Extents of a table
    pub fn table(&self, id: NodeId) -> Option<&TableLayout> {
        self.tables.get(&id)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

// =============================================================================
// Layout Engine
// =============================================================================

/// Engine for computing the boxes of one tree
pub struct LayoutEngine<'a> {
    tree: &'a MathTree,
    resolved: &'a ResolvedAttributes,
    classes: &'a ClassTable,
    font: &'a FontParameterSet,
    options: &'a LayoutOptions,
    table: BoxTable,
}

impl<'a> LayoutEngine<'a> {
    /// Create an engine over a resolved and classified tree
    pub fn new(
        tree: &'a MathTree,
        resolved: &'a ResolvedAttributes,
        classes: &'a ClassTable,
        font: &'a FontParameterSet,
        options: &'a LayoutOptions,
    ) -> MathResult<Self> {
        options.validate()?;
        let mut scales = Vec::with_capacity(tree.len());
        for id in tree.ids() {
            resolved.try_get(id)?;
            class_of(classes, id)?;
            scales.push(options.scale_for_level(resolved.context(id).script_level));
        }
        Ok(Self {
            tree,
            resolved,
            classes,
            font,
            options,
            table: BoxTable::new(scales),
        })
    }

    /// Lay out the whole tree
    pub fn layout(mut self) -> MathResult<BoxTable> {
        if !self.tree.is_empty() {
            let root = self.bbox(self.tree.root())?;
            tracing::debug!(
                target: "math_layout::layout",
                nodes = self.tree.len(),
                w = root.w,
                h = root.h,
                d = root.d,
                "boxes computed"
            );
        }
        Ok(self.table)
    }

    /// The box of a node, computing it on first request
    pub fn bbox(&mut self, id: NodeId) -> MathResult<BBox> {
        if let Some(bbox) = self.table.get(id) {
            return Ok(*bbox);
        }
        let bbox = self.compute_bbox(id)?.with_rscale(self.rscale(id));
        self.table.boxes[id.index()] = Some(bbox);
        Ok(bbox)
    }

    fn rscale(&self, id: NodeId) -> f64 {
        let parent_scale = self
            .tree
            .node(id)
            .parent
            .map(|parent| self.table.scale(parent))
            .unwrap_or(1.0);
        self.table.scale(id) / parent_scale
    }

    fn units(&self, id: NodeId) -> MathResult<UnitContext> {
        let x_height = self.font.param(FontParam::XHeight)?;
        Ok(self.options.unit_context(x_height, self.table.scale(id)))
    }

    fn compute_bbox(&mut self, id: NodeId) -> MathResult<BBox> {
        let tree = self.tree;
        let node = tree.node(id);
        if let Some(expected) = node.kind.arity() {
            if node.children.len() != expected {
                return Err(MathError::InvalidStructure {
                    kind: node.kind,
                    expected,
                    found: node.children.len(),
                });
            }
        }
        match node.kind {
            NodeKind::Identifier | NodeKind::Number | NodeKind::Operator | NodeKind::Text => {
                self.layout_token(id)
            }
            NodeKind::Space => self.layout_space(id),
            kind if kind.is_row_like() => self.layout_row(id),
            NodeKind::TableRow => self.layout_table_row(id),
            NodeKind::Table => self.layout_table(id),
            kind => self.layout_script(id, ScriptConstruct::from_kind(kind)?),
        }
    }

    /// Glyphs side by side in the node's resolved variant
    fn layout_token(&mut self, id: NodeId) -> MathResult<BBox> {
        let variant = FontVariant::from_name(&self.resolved.get(id).get_text("mathvariant"))
            .unwrap_or(FontVariant::Normal);
        let mut bbox = BBox::zero();
        for ch in self.tree.text(id).chars() {
            let metrics = self.font.char_metrics(variant, ch)?;
            bbox = bbox.append(&BBox::new(metrics.width, metrics.height, metrics.depth));
        }
        Ok(bbox)
    }

    fn layout_space(&mut self, id: NodeId) -> MathResult<BBox> {
        let attrs = self.resolved.get(id);
        let ctx = self.units(id)?;
        let length =
            |name: &str| units::length_to_em(&attrs.get_text(name), 0.0, &ctx).unwrap_or(0.0);
        Ok(BBox::new(length("width"), length("height"), length("depth")))
    }

    /// Children appended left to right with inter-atom spacing
    fn layout_row(&mut self, id: NodeId) -> MathResult<BBox> {
        let tree = self.tree;
        let script_style = self.resolved.context(id).script_level > 0;
        let mut bbox = BBox::zero();
        let mut prev = None;
        for &child in tree.children(id) {
            let child_box = self.bbox(child)?;
            if let Some(class) = self.classes.class(child) {
                if let Some(left) = prev {
                    let space = tex_class::inter_atom_space(left, class, script_style);
                    self.table.spacing[child.index()] = space;
                    bbox = bbox.pad_width(space);
                }
                prev = Some(class);
            }
            bbox = bbox.append(&child_box);
        }
        Ok(bbox.clean())
    }

    /// Cells side by side, never shorter than the cell strut
    fn layout_table_row(&mut self, id: NodeId) -> MathResult<BBox> {
        let tree = self.tree;
        let mut bbox = BBox::zero();
        for (column, &cell) in tree.children(id).iter().enumerate() {
            if column > 0 {
                bbox = bbox.pad_width(2.0 * CELL_PADDING_X);
            }
            bbox = bbox.append(&self.bbox(cell)?);
        }
        Ok(BBox {
            h: bbox.h.max(STRUT_HEIGHT),
            d: bbox.d.max(STRUT_DEPTH),
            ..bbox
        })
    }

    /// Rows stacked and centered on the math axis, cells aligned in columns
    fn layout_table(&mut self, id: NodeId) -> MathResult<BBox> {
        let tree = self.tree;
        let rows = tree.children(id);
        let mut column_widths: Vec<f64> = Vec::new();
        let mut extents = Vec::with_capacity(rows.len());
        for &row in rows {
            let row_box = self.bbox(row)?;
            extents.push((row_box.scaled_height(), row_box.scaled_depth()));
            for (column, &cell) in tree.children(row).iter().enumerate() {
                let w = self.bbox(cell)?.scaled_width();
                match column_widths.get_mut(column) {
                    Some(width) => *width = width.max(w),
                    None => column_widths.push(w),
                }
            }
        }

        let gaps = column_widths.len().saturating_sub(1) as f64;
        let w = column_widths.iter().sum::<f64>() + gaps * 2.0 * CELL_PADDING_X;

        let row_gaps = rows.len().saturating_sub(1) as f64;
        let total = extents.iter().map(|(h, d)| h + d).sum::<f64>()
            + row_gaps * 2.0 * CELL_PADDING_Y;
        let axis = self.font.param(FontParam::AxisHeight)?;
        self.table.tables.insert(
            id,
            TableLayout {
                width: w,
                column_widths,
                rows: extents,
            },
        );
        Ok(BBox::new(w, total / 2.0 + axis, total / 2.0 - axis).clean())
    }

    fn layout_script(&mut self, id: NodeId, construct: ScriptConstruct) -> MathResult<BBox> {
        let tree = self.tree;
        let resolved = self.resolved;
        let children = tree.children(id);
        let base_id = children[0];
        let base = self.bbox(base_id)?;
        let scripts = children[1..]
            .iter()
            .map(|&child| self.bbox(child))
            .collect::<MathResult<Vec<_>>>()?;

        let core_box = self.bbox(tree.unwrap_single(base_id))?;
        let char_base = scripts::is_char_base(tree, resolved, base_id, &core_box);
        let movable = construct.is_limits() && scripts::has_movable_limits(tree, resolved, id);

        let attrs = resolved.get(id);
        let context = resolved.context(id);
        let subscript_shift = attrs.get_text("subscriptshift");
        let superscript_shift = attrs.get_text("superscriptshift");
        let params = ScriptParams {
            font: self.font,
            units: self.units(id)?,
            display_style: context.display_style,
            prime_style: context.prime_style,
            subscript_shift: &subscript_shift,
            superscript_shift: &superscript_shift,
        };
        let layout =
            scripts::layout_script(construct, &params, &base, &scripts, char_base, movable)?;
        self.table.scripts.insert(id, layout);
        Ok(layout.bbox)
    }
}

/// Compute the boxes of a resolved and classified tree
pub fn layout_tree(
    tree: &MathTree,
    resolved: &ResolvedAttributes,
    classes: &ClassTable,
    font: &FontParameterSet,
    options: &LayoutOptions,
) -> MathResult<BoxTable> {
    LayoutEngine::new(tree, resolved, classes, font, options)?.layout()
}

// =============================================================================
// Tests
// =============================================================================

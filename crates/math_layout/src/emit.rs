//! Box emission - convert laid out nodes into the display tree
//!
//! Display nodes carry a box-kind tag (`mjx-*`), attributes, and style
//! properties with offsets already converted to em strings. Consumers treat
//! unknown tags as opaque containers and unknown styles as pass-through.

use crate::attributes::ResolvedAttributes;
use crate::error::{MathError, MathResult};
use crate::layout::{BoxTable, CELL_PADDING_X, CELL_PADDING_Y, STRUT_DEPTH, STRUT_HEIGHT};
use crate::model::{MathTree, NodeId, NodeKind};
use crate::scripts::ScriptPlacement;
use crate::units::em;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag of the strut that closes every table cell
pub const STRUT_TAG: &str = "mjx-tstrut";

// =============================================================================
// Display Tree
// =============================================================================

/// A styled display box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayNode {
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DisplayContent>,
}

/// Content of a display box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayContent {
    Node(DisplayNode),
    Text(String),
}

impl DisplayNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: DisplayNode) -> Self {
        self.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(DisplayContent::Text(text.into()));
        self
    }

    /// Append a child box
    pub fn push(&mut self, child: DisplayNode) {
        self.children.push(DisplayContent::Node(child));
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles.get(name).map(String::as_str)
    }

    /// Child boxes, skipping text
    pub fn child_nodes(&self) -> impl Iterator<Item = &DisplayNode> {
        self.children.iter().filter_map(|child| match child {
            DisplayContent::Node(node) => Some(node),
            DisplayContent::Text(_) => None,
        })
    }

    /// The last child, if it is a box
    pub fn last_node(&self) -> Option<&DisplayNode> {
        match self.children.last() {
            Some(DisplayContent::Node(node)) => Some(node),
            _ => None,
        }
    }

    /// First box with the given tag, depth-first, including this one
    pub fn find(&self, kind: &str) -> Option<&DisplayNode> {
        if self.kind == kind {
            return Some(self);
        }
        self.child_nodes().find_map(|child| child.find(kind))
    }

    /// Serialize as nested tag markup
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.kind);
        for (name, value) in &self.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
        }
        if !self.styles.is_empty() {
            let style = self
                .styles
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            out.push_str(&format!(" style=\"{}\"", escape(&style)));
        }
        out.push('>');
        for child in &self.children {
            match child {
                DisplayContent::Node(node) => node.write_markup(out),
                DisplayContent::Text(text) => out.push_str(&escape(text)),
            }
        }
        out.push_str("</");
        out.push_str(&self.kind);
        out.push('>');
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Format a relative size as a CSS percentage
pub fn percent(m: f64) -> String {
    let fixed = format!("{:.1}", 100.0 * m);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{}%", trimmed)
}

fn strut() -> DisplayNode {
    DisplayNode::new(STRUT_TAG)
        .with_style("display", "inline-block")
        .with_style("height", em(STRUT_HEIGHT + STRUT_DEPTH))
        .with_style("vertical-align", em(-STRUT_DEPTH))
}

// =============================================================================
// Emitter
// =============================================================================

/// Emit the display tree of a laid out tree
pub fn emit(
    tree: &MathTree,
    resolved: &ResolvedAttributes,
    boxes: &BoxTable,
) -> MathResult<DisplayNode> {
    if tree.is_empty() {
        return Ok(DisplayNode::new("mjx-math"));
    }
    let emitter = Emitter {
        tree,
        resolved,
        boxes,
    };
    let display = emitter.emit_node(tree.root())?;
    tracing::debug!(target: "math_layout::emit", nodes = tree.len(), "display tree emitted");
    Ok(display)
}

struct Emitter<'a> {
    tree: &'a MathTree,
    resolved: &'a ResolvedAttributes,
    boxes: &'a BoxTable,
}

impl Emitter<'_> {
    fn emit_node(&self, id: NodeId) -> MathResult<DisplayNode> {
        let node = self.tree.node(id);
        let bbox = self.boxes.try_get(id)?;
        let tag = format!("mjx-{}", node.kind.tag());

        let mut display = match node.kind {
            kind if kind.is_token() => {
                let mut token = DisplayNode::new(tag).with_text(node.text.as_str());
                let variant = self.resolved.get(id).get_text("mathvariant");
                if !variant.is_empty() && variant != "normal" {
                    token = token.with_attr("variant", variant);
                }
                token
            }
            NodeKind::Space => {
                let mut space = DisplayNode::new(tag).with_style("width", em(bbox.w));
                if bbox.h + bbox.d != 0.0 {
                    space = space.with_style("height", em(bbox.h + bbox.d));
                }
                if bbox.d != 0.0 {
                    space = space.with_style("vertical-align", em(-bbox.d));
                }
                space
            }
            NodeKind::Math => {
                let mut math = self.emit_children(DisplayNode::new(tag), id)?;
                if self.resolved.context(id).display_style {
                    math = math.with_attr("display", "true");
                }
                math
            }
            NodeKind::Row | NodeKind::Style | NodeKind::TableRow => {
                self.emit_children(DisplayNode::new(tag), id)?
            }
            NodeKind::TableCell => self.emit_children(DisplayNode::new(tag), id)?.with_child(strut()),
            NodeKind::Table => self.emit_table(id)?,
            _ => self.emit_script(id, DisplayNode::new(tag))?,
        };

        if (bbox.rscale - 1.0).abs() > 1e-9 {
            display = display.with_style("font-size", percent(bbox.rscale));
        }
        let space = self.boxes.space_before(id);
        if space != 0.0 {
            display = display.with_style("margin-left", em(space / bbox.rscale));
        }
        Ok(display)
    }

    fn emit_children(&self, mut display: DisplayNode, id: NodeId) -> MathResult<DisplayNode> {
        for &child in self.tree.children(id) {
            display.push(self.emit_node(child)?);
        }
        Ok(display)
    }

    fn emit_script(&self, id: NodeId, mut display: DisplayNode) -> MathResult<DisplayNode> {
        let layout = self.boxes.script(id).ok_or(MathError::NodeNotFound(id))?;
        let parts = self
            .tree
            .children(id)
            .iter()
            .map(|&child| self.emit_node(child))
            .collect::<MathResult<Vec<_>>>()?;
        let mut parts = parts.into_iter();
        let (Some(base), Some(first)) = (parts.next(), parts.next()) else {
            return Err(MathError::InvalidStructure {
                kind: self.tree.kind(id),
                expected: layout.construct.script_count() + 1,
                found: self.tree.children(id).len(),
            });
        };
        let second = parts.next();
        let shifted = |offset: f64| DisplayNode::new("mjx-script").with_style("vertical-align", em(offset));

        match (layout.placement, second) {
            (ScriptPlacement::Sub { v }, _) => {
                display.push(base);
                display.push(shifted(-v).with_child(first));
            }
            (ScriptPlacement::Sup { u }, _) => {
                display.push(base);
                display.push(shifted(u).with_child(first));
            }
            (ScriptPlacement::SubSup { v, q, .. }, Some(sup)) => {
                display.push(base);
                display.push(
                    shifted(-v)
                        .with_child(sup)
                        .with_child(DisplayNode::new("mjx-spacer").with_style("margin-top", em(q)))
                        .with_child(first),
                );
            }
            (ScriptPlacement::Under { k, dx, .. }, _) => {
                display.push(padded(DisplayNode::new("mjx-base"), dx[0]).with_child(base));
                display.push(
                    padded(DisplayNode::new("mjx-under"), dx[1])
                        .with_style("padding-top", em(k))
                        .with_child(first),
                );
            }
            (ScriptPlacement::Over { k, dx, .. }, _) => {
                display.push(
                    padded(DisplayNode::new("mjx-over"), dx[1])
                        .with_style("padding-bottom", em(k))
                        .with_child(first),
                );
                display.push(padded(DisplayNode::new("mjx-base"), dx[0]).with_child(base));
            }
            (
                ScriptPlacement::UnderOver {
                    k_under, k_over, dx, ..
                },
                Some(over),
            ) => {
                display.push(
                    padded(DisplayNode::new("mjx-over"), dx[2])
                        .with_style("padding-bottom", em(k_over))
                        .with_child(over),
                );
                display.push(padded(DisplayNode::new("mjx-base"), dx[0]).with_child(base));
                display.push(
                    padded(DisplayNode::new("mjx-under"), dx[1])
                        .with_style("padding-top", em(k_under))
                        .with_child(first),
                );
            }
            (_, None) => {
                return Err(MathError::InvalidStructure {
                    kind: self.tree.kind(id),
                    expected: 3,
                    found: 2,
                });
            }
        }

        if layout.limits_moved() {
            display = display.with_attr("limits", "false");
        }
        Ok(display)
    }

    fn emit_table(&self, id: NodeId) -> MathResult<DisplayNode> {
        let bbox = self.boxes.try_get(id)?;
        let layout = self.boxes.table(id).ok_or(MathError::NodeNotFound(id))?;
        let rows = self.tree.children(id);
        let mut itable = DisplayNode::new("mjx-itable");
        for (r, &row) in rows.iter().enumerate() {
            let mut line = self.emit_children_bare(row)?;
            let cells = self.tree.children(row).len();
            for (c, cell) in line.children.iter_mut().enumerate() {
                let DisplayContent::Node(cell) = cell else {
                    continue;
                };
                if let Some(&width) = layout.column_widths.get(c) {
                    cell.styles.insert("width".to_string(), em(width));
                }
                let sides = [
                    ("padding-top", r > 0, CELL_PADDING_Y),
                    ("padding-bottom", r + 1 < rows.len(), CELL_PADDING_Y),
                    ("padding-left", c > 0, CELL_PADDING_X),
                    ("padding-right", c + 1 < cells, CELL_PADDING_X),
                ];
                for (side, inner, padding) in sides {
                    if inner {
                        cell.styles.insert(side.to_string(), em(padding));
                    }
                }
            }
            itable.push(line);
        }
        Ok(DisplayNode::new("mjx-mtable")
            .with_style("vertical-align", em(-bbox.d))
            .with_child(itable))
    }

    /// Emit a node, treating a non-row child of a table like a row
    fn emit_children_bare(&self, row: NodeId) -> MathResult<DisplayNode> {
        let display = self.emit_node(row)?;
        if self.tree.kind(row) == NodeKind::TableRow {
            Ok(display)
        } else {
            Ok(DisplayNode::new("mjx-mtr").with_child(display))
        }
    }
}

/// Apply a centering offset; zero offsets leave no style
fn padded(display: DisplayNode, dx: f64) -> DisplayNode {
    if dx != 0.0 {
        display.with_style("padding-left", em(dx))
    } else {
        display
    }
}

// =============================================================================
// Tests
// =============================================================================

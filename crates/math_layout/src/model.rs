//! Markup tree - the node tree consumed by the layout core
//!
//! Trees arrive as nested [`MarkupNode`] values (built in code or loaded from
//! JSON) and are flattened into a [`MathTree`] arena. Every derived value a
//! layout pass computes (resolved attributes, spacing classes, boxes) lives in
//! side tables keyed by [`NodeId`], so the tree itself stays read-only.

use crate::attributes::AttributeValue;
use crate::error::MathResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Node Kinds
// =============================================================================

/// The kind of a markup node, serialized with its MathML element name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root of a formula
    #[serde(rename = "math")]
    Math,
    /// Identifier token
    #[serde(rename = "mi")]
    Identifier,
    /// Number token
    #[serde(rename = "mn")]
    Number,
    /// Operator token
    #[serde(rename = "mo")]
    Operator,
    /// Upright text token
    #[serde(rename = "mtext")]
    Text,
    /// Blank space of a given width
    #[serde(rename = "mspace")]
    Space,
    /// Horizontal group
    #[serde(rename = "mrow")]
    Row,
    /// Style group that sets inherited attributes for its descendants
    #[serde(rename = "mstyle")]
    Style,
    /// Base with subscript
    #[serde(rename = "msub")]
    Sub,
    /// Base with superscript
    #[serde(rename = "msup")]
    Sup,
    /// Base with subscript and superscript
    #[serde(rename = "msubsup")]
    SubSup,
    /// Base with underscript
    #[serde(rename = "munder")]
    Under,
    /// Base with overscript
    #[serde(rename = "mover")]
    Over,
    /// Base with underscript and overscript
    #[serde(rename = "munderover")]
    UnderOver,
    /// Table of rows
    #[serde(rename = "mtable")]
    Table,
    /// Table row
    #[serde(rename = "mtr")]
    TableRow,
    /// Table cell
    #[serde(rename = "mtd")]
    TableCell,
}

impl NodeKind {
    /// The MathML element name for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Math => "math",
            NodeKind::Identifier => "mi",
            NodeKind::Number => "mn",
            NodeKind::Operator => "mo",
            NodeKind::Text => "mtext",
            NodeKind::Space => "mspace",
            NodeKind::Row => "mrow",
            NodeKind::Style => "mstyle",
            NodeKind::Sub => "msub",
            NodeKind::Sup => "msup",
            NodeKind::SubSup => "msubsup",
            NodeKind::Under => "munder",
            NodeKind::Over => "mover",
            NodeKind::UnderOver => "munderover",
            NodeKind::Table => "mtable",
            NodeKind::TableRow => "mtr",
            NodeKind::TableCell => "mtd",
        }
    }

    /// Token kinds carry text instead of children
    pub fn is_token(&self) -> bool {
        matches!(
            self,
            NodeKind::Identifier | NodeKind::Number | NodeKind::Operator | NodeKind::Text
        )
    }

    /// Whether this kind is one of the six script constructs
    pub fn is_script(&self) -> bool {
        matches!(
            self,
            NodeKind::Sub
                | NodeKind::Sup
                | NodeKind::SubSup
                | NodeKind::Under
                | NodeKind::Over
                | NodeKind::UnderOver
        )
    }

    /// Fixed child count for kinds that require one
    pub fn arity(&self) -> Option<usize> {
        match self {
            NodeKind::Sub | NodeKind::Sup | NodeKind::Under | NodeKind::Over => Some(2),
            NodeKind::SubSup | NodeKind::UnderOver => Some(3),
            NodeKind::Identifier
            | NodeKind::Number
            | NodeKind::Operator
            | NodeKind::Text
            | NodeKind::Space => Some(0),
            _ => None,
        }
    }

    /// Row-like kinds lay their children out horizontally
    pub fn is_row_like(&self) -> bool {
        matches!(
            self,
            NodeKind::Math | NodeKind::Row | NodeKind::Style | NodeKind::TableCell
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// Nested Markup (input form)
// =============================================================================

/// A node of the nested input tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupNode {
    pub kind: NodeKind,
    /// Text content of token nodes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Explicitly given attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Internal flags set by the producer of the tree (e.g. `movablelimits`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    /// Create a node with no text, attributes, or children
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: String::new(),
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    fn token(kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::new(kind)
        }
    }

    fn container(kind: NodeKind, children: Vec<MarkupNode>) -> Self {
        Self {
            children,
            ..Self::new(kind)
        }
    }

    /// Create a formula root
    pub fn math(children: Vec<MarkupNode>) -> Self {
        Self::container(NodeKind::Math, children)
    }

    /// Create an identifier
    pub fn mi(text: impl Into<String>) -> Self {
        Self::token(NodeKind::Identifier, text)
    }

    /// Create a number
    pub fn mn(text: impl Into<String>) -> Self {
        Self::token(NodeKind::Number, text)
    }

    /// Create an operator
    pub fn mo(text: impl Into<String>) -> Self {
        Self::token(NodeKind::Operator, text)
    }

    /// Create a text run
    pub fn mtext(text: impl Into<String>) -> Self {
        Self::token(NodeKind::Text, text)
    }

    /// Create a space of the given width (a length string such as `"1em"`)
    pub fn mspace(width: impl Into<String>) -> Self {
        Self::new(NodeKind::Space).with_attr("width", AttributeValue::Text(width.into()))
    }

    /// Create a row
    pub fn mrow(children: Vec<MarkupNode>) -> Self {
        Self::container(NodeKind::Row, children)
    }

    /// Create a style group
    pub fn mstyle(children: Vec<MarkupNode>) -> Self {
        Self::container(NodeKind::Style, children)
    }

    /// Create a subscript
    pub fn msub(base: MarkupNode, sub: MarkupNode) -> Self {
        Self::container(NodeKind::Sub, vec![base, sub])
    }

    /// Create a superscript
    pub fn msup(base: MarkupNode, sup: MarkupNode) -> Self {
        Self::container(NodeKind::Sup, vec![base, sup])
    }

    /// Create a combined subscript and superscript
    pub fn msubsup(base: MarkupNode, sub: MarkupNode, sup: MarkupNode) -> Self {
        Self::container(NodeKind::SubSup, vec![base, sub, sup])
    }

    /// Create an underscript
    pub fn munder(base: MarkupNode, under: MarkupNode) -> Self {
        Self::container(NodeKind::Under, vec![base, under])
    }

    /// Create an overscript
    pub fn mover(base: MarkupNode, over: MarkupNode) -> Self {
        Self::container(NodeKind::Over, vec![base, over])
    }

    /// Create a combined underscript and overscript
    pub fn munderover(base: MarkupNode, under: MarkupNode, over: MarkupNode) -> Self {
        Self::container(NodeKind::UnderOver, vec![base, under, over])
    }

    /// Create a table
    pub fn mtable(rows: Vec<MarkupNode>) -> Self {
        Self::container(NodeKind::Table, rows)
    }

    /// Create a table row
    pub fn mtr(cells: Vec<MarkupNode>) -> Self {
        Self::container(NodeKind::TableRow, cells)
    }

    /// Create a table cell
    pub fn mtd(children: Vec<MarkupNode>) -> Self {
        Self::container(NodeKind::TableCell, children)
    }

    /// Set an explicit attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set an internal property
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

// =============================================================================
// Arena Tree
// =============================================================================

/// Identity of a node within one [`MathTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node stored in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct MathNode {
    pub kind: NodeKind,
    pub text: String,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub properties: BTreeMap<String, AttributeValue>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl MathNode {
    /// Look up an internal property as a flag
    pub fn flag(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .is_some_and(AttributeValue::is_truthy)
    }
}

/// An immutable markup tree flattened into an arena in pre-order
#[derive(Debug, Clone, PartialEq)]
pub struct MathTree {
    nodes: Vec<MathNode>,
}

impl MathTree {
    /// Flatten a nested markup tree
    pub fn from_markup(root: MarkupNode) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.push(root, None);
        tree
    }

    /// Load a nested markup tree from JSON
    pub fn from_json(json: &str) -> MathResult<Self> {
        let root: MarkupNode = serde_json::from_str(json)?;
        Ok(Self::from_markup(root))
    }

    fn push(&mut self, markup: MarkupNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(MathNode {
            kind: markup.kind,
            text: markup.text,
            attributes: markup.attributes,
            properties: markup.properties,
            children: Vec::with_capacity(markup.children.len()),
            parent,
        });
        for child in markup.children {
            let child_id = self.push(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    /// The root node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has its root, so this is only true for no tree at all
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Access a node. Ids are only minted by this tree, so indexing is total.
    pub fn node(&self, id: NodeId) -> &MathNode {
        &self.nodes[id.0]
    }

    /// Access a node by an id that may come from elsewhere
    pub fn get(&self, id: NodeId) -> Option<&MathNode> {
        self.nodes.get(id.0)
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    /// Children of a node in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Text of a token node (empty for containers)
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// All node ids in pre-order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Unwrap a style group or row that has exactly one child
    pub fn unwrap_single(&self, id: NodeId) -> NodeId {
        let node = self.node(id);
        if matches!(node.kind, NodeKind::Style | NodeKind::Row) && node.children.len() == 1 {
            node.children[0]
        } else {
            id
        }
    }

    /// The embellished operator at the core of a node, if any.
    ///
    /// Descends through the base of script constructs and through rows or
    /// style groups with a single child.
    pub fn core_operator(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        match node.kind {
            NodeKind::Operator => Some(id),
            kind if kind.is_script() => node.children.first().and_then(|&b| self.core_operator(b)),
            NodeKind::Row | NodeKind::Style if node.children.len() == 1 => {
                self.core_operator(node.children[0])
            }
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_preorder() {
        let tree = MathTree::from_markup(MarkupNode::math(vec![MarkupNode::msub(
            MarkupNode::mi("x"),
            MarkupNode::mn("2"),
        )]));
        assert_eq!(tree.len(), 4);
        let root = tree.root();
        assert_eq!(tree.kind(root), NodeKind::Math);

        let msub = tree.children(root)[0];
        assert_eq!(tree.kind(msub), NodeKind::Sub);
        assert_eq!(tree.node(msub).parent, Some(root));

        let kids = tree.children(msub);
        assert_eq!(tree.text(kids[0]), "x");
        assert_eq!(tree.text(kids[1]), "2");
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(NodeKind::UnderOver.to_string(), "munderover");
        assert_eq!(NodeKind::TableCell.tag(), "mtd");
        assert!(NodeKind::Operator.is_token());
        assert!(!NodeKind::Row.is_token());
        assert_eq!(NodeKind::SubSup.arity(), Some(3));
        assert_eq!(NodeKind::Row.arity(), None);
        assert!(NodeKind::TableCell.is_row_like());
        assert!(!NodeKind::TableRow.is_row_like());
    }

    #[test]
    fn test_unwrap_single() {
        let tree = MathTree::from_markup(MarkupNode::mrow(vec![MarkupNode::mi("y")]));
        let inner = tree.unwrap_single(tree.root());
        assert_eq!(tree.kind(inner), NodeKind::Identifier);

        let tree = MathTree::from_markup(MarkupNode::mrow(vec![
            MarkupNode::mi("a"),
            MarkupNode::mi("b"),
        ]));
        assert_eq!(tree.unwrap_single(tree.root()), tree.root());
    }

    #[test]
    fn test_core_operator() {
        let tree = MathTree::from_markup(MarkupNode::munderover(
            MarkupNode::mrow(vec![MarkupNode::mo("\u{2211}")]),
            MarkupNode::mi("i"),
            MarkupNode::mi("n"),
        ));
        let core = tree.core_operator(tree.root()).unwrap();
        assert_eq!(tree.text(core), "\u{2211}");

        let tree = MathTree::from_markup(MarkupNode::msub(MarkupNode::mi("x"), MarkupNode::mn("1")));
        assert!(tree.core_operator(tree.root()).is_none());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "kind": "msup",
            "children": [
                {"kind": "mi", "text": "x"},
                {"kind": "mn", "text": "2", "attributes": {"mathsize": "big"}}
            ]
        }"#;
        let tree = MathTree::from_json(json).unwrap();
        assert_eq!(tree.kind(tree.root()), NodeKind::Sup);
        let two = tree.children(tree.root())[1];
        assert_eq!(
            tree.node(two).attributes.get("mathsize"),
            Some(&AttributeValue::Text("big".to_string()))
        );
    }

    #[test]
    fn test_markup_serialization() {
        let node = MarkupNode::msub(MarkupNode::mi("a"), MarkupNode::mn("0"))
            .with_property("movablelimits", true);
        let json = serde_json::to_string(&node).unwrap();
        let back: MarkupNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }
}

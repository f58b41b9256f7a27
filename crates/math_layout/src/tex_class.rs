//! Spacing classes - a left-to-right pass tagging each node with its TeX class
//!
//! Classes drive inter-element spacing and some layout decisions. Within a
//! row every child sees the class of its nearest classed predecessor; spaces
//! have no class and are skipped when threading.

use crate::attributes::{AttributeValue, ResolvedAttributes};
use crate::error::{MathError, MathResult};
use crate::model::{MathTree, NodeId, NodeKind};
use crate::operators;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Internal property set on identifiers reclassified as operators
pub const AUTO_OP: &str = "autoOP";

/// TeX spacing class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexClass {
    Ord,
    Op,
    Bin,
    Rel,
    Open,
    Close,
    Punct,
    Inner,
    Vcenter,
}

impl TexClass {
    /// A binary operator after one of these classes acts as ordinary
    fn forces_bin_to_ord(prev: Option<TexClass>) -> bool {
        matches!(
            prev,
            None | Some(TexClass::Bin)
                | Some(TexClass::Op)
                | Some(TexClass::Rel)
                | Some(TexClass::Open)
                | Some(TexClass::Punct)
        )
    }

    /// A binary operator before one of these classes acts as ordinary
    fn ends_bin(self) -> bool {
        matches!(self, TexClass::Rel | TexClass::Close | TexClass::Punct)
    }

    fn spacing_index(self) -> usize {
        match self {
            TexClass::Ord | TexClass::Vcenter => 0,
            TexClass::Op => 1,
            TexClass::Bin => 2,
            TexClass::Rel => 3,
            TexClass::Open => 4,
            TexClass::Close => 5,
            TexClass::Punct => 6,
            TexClass::Inner => 7,
        }
    }
}

/// Inter-atom spacing in mu (TeXBook chapter 18). Negative entries apply only
/// outside script styles.
const SPACING: [[i8; 8]; 8] = [
    // Ord Op  Bin Rel Open Close Punct Inner
    [0, 3, -4, -5, 0, 0, 0, -3],     // Ord
    [3, 3, 0, -5, 0, 0, 0, -3],      // Op
    [-4, -4, 0, 0, -4, 0, 0, -4],    // Bin
    [-5, -5, 0, 0, -5, 0, 0, -5],    // Rel
    [0, 0, 0, 0, 0, 0, 0, 0],        // Open
    [0, 3, -4, -5, 0, 0, 0, -3],     // Close
    [-3, -3, 0, -3, -3, -3, -3, -3], // Punct
    [-3, 3, -4, -5, -3, 0, -3, -3],  // Inner
];

/// Space in ems between adjacent atoms of the given classes
pub fn inter_atom_space(left: TexClass, right: TexClass, script_style: bool) -> f64 {
    let mu = SPACING[left.spacing_index()][right.spacing_index()];
    if mu < 0 && script_style {
        return 0.0;
    }
    f64::from(mu.abs()) / 18.0
}

fn operator_name() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").ok())
        .as_ref()
}

/// Side table of spacing classes and computed properties
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTable {
    classes: Vec<Option<TexClass>>,
    properties: Vec<BTreeMap<String, AttributeValue>>,
}

impl ClassTable {
    fn new(len: usize) -> Self {
        Self {
            classes: vec![None; len],
            properties: vec![BTreeMap::new(); len],
        }
    }

    /// The class of a node; `None` for nodes without a visual class
    pub fn class(&self, id: NodeId) -> Option<TexClass> {
        self.classes.get(id.index()).copied().flatten()
    }

    /// A computed property of a node
    pub fn property(&self, id: NodeId, name: &str) -> Option<&AttributeValue> {
        self.properties.get(id.index()).and_then(|p| p.get(name))
    }

    /// Whether an identifier was reclassified as an operator by its name
    pub fn is_auto_op(&self, id: NodeId) -> bool {
        self.property(id, AUTO_OP)
            .is_some_and(AttributeValue::is_truthy)
    }

    fn set_class(&mut self, id: NodeId, class: Option<TexClass>) {
        self.classes[id.index()] = class;
    }

    fn set_property(&mut self, id: NodeId, name: &str, value: AttributeValue) {
        self.properties[id.index()].insert(name.to_string(), value);
    }
}

/// Classify every node of the tree
pub fn assign_tex_classes(tree: &MathTree, resolved: &ResolvedAttributes) -> ClassTable {
    let mut table = ClassTable::new(tree.len());
    if !tree.is_empty() {
        assign_tex_class(tree, tree.root(), None, resolved, &mut table);
    }
    tracing::debug!(target: "math_layout::class", nodes = tree.len(), "classes assigned");
    table
}

/// Classify one node given the class of its previous sibling.
///
/// Returns the node's own class so the caller can thread it to the next
/// sibling.
pub fn assign_tex_class(
    tree: &MathTree,
    id: NodeId,
    prev: Option<TexClass>,
    resolved: &ResolvedAttributes,
    table: &mut ClassTable,
) -> Option<TexClass> {
    let node = tree.node(id);
    let class = match node.kind {
        NodeKind::Identifier => {
            let name = node.text.as_str();
            let is_name = operator_name().is_some_and(|pattern| pattern.is_match(name));
            if name.chars().count() > 1 && is_name {
                table.set_property(id, AUTO_OP, AttributeValue::Bool(true));
                Some(TexClass::Op)
            } else {
                Some(TexClass::Ord)
            }
        }
        NodeKind::Number | NodeKind::Text => Some(TexClass::Ord),
        NodeKind::Space => None,
        NodeKind::Operator => {
            let attrs = resolved.get(id);
            let class = if attrs.get_bool("largeop") {
                TexClass::Op
            } else {
                operators::lookup(&node.text)
                    .map(|entry| entry.class)
                    .unwrap_or(TexClass::Rel)
            };
            if class == TexClass::Bin && TexClass::forces_bin_to_ord(prev) {
                Some(TexClass::Ord)
            } else {
                Some(class)
            }
        }
        kind if kind.is_row_like() => {
            let classes = assign_row(tree, tree.children(id), resolved, table);
            match classes.as_slice() {
                [single] => Some(*single),
                _ => Some(TexClass::Ord),
            }
        }
        kind if kind.is_script() => {
            let children = tree.children(id);
            let base = children
                .first()
                .and_then(|&b| assign_tex_class(tree, b, prev, resolved, table));
            for &script in children.iter().skip(1) {
                assign_tex_class(tree, script, None, resolved, table);
            }
            base.or(Some(TexClass::Ord))
        }
        _ => {
            for &child in tree.children(id) {
                assign_tex_class(tree, child, None, resolved, table);
            }
            Some(TexClass::Ord)
        }
    };
    table.set_class(id, class);
    tracing::trace!(target: "math_layout::class", node = %id, kind = %node.kind, ?class, "class");
    class
}

/// Thread classes through a row, returning the classes of classed children
fn assign_row(
    tree: &MathTree,
    children: &[NodeId],
    resolved: &ResolvedAttributes,
    table: &mut ClassTable,
) -> Vec<TexClass> {
    let mut prev: Option<(NodeId, TexClass)> = None;
    let mut classes = Vec::new();
    for &child in children {
        let Some(class) = assign_tex_class(tree, child, prev.map(|(_, c)| c), resolved, table)
        else {
            continue;
        };
        if let Some((prev_id, TexClass::Bin)) = prev {
            if class.ends_bin() {
                demote(tree, table, prev_id, &mut classes);
            }
        }
        prev = Some((child, class));
        classes.push(class);
    }
    // A trailing binary operator has nothing to combine with.
    if let Some((last, TexClass::Bin)) = prev {
        demote(tree, table, last, &mut classes);
    }
    classes
}

/// Turn a binary atom into an ordinary one, along with its embellished core
fn demote(tree: &MathTree, table: &mut ClassTable, id: NodeId, classes: &mut [TexClass]) {
    table.set_class(id, Some(TexClass::Ord));
    if let Some(core) = tree.core_operator(id).filter(|&core| core != id) {
        table.set_class(core, Some(TexClass::Ord));
    }
    if let Some(last) = classes.last_mut() {
        *last = TexClass::Ord;
    }
}

/// Look up the class of a node that may not belong to this table
pub fn class_of(table: &ClassTable, id: NodeId) -> MathResult<Option<TexClass>> {
    if id.index() < table.classes.len() {
        Ok(table.class(id))
    } else {
        Err(MathError::NodeNotFound(id))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{resolve_attributes, InheritedContext};
    use crate::model::MarkupNode;

    fn classify(markup: MarkupNode) -> (MathTree, ClassTable) {
        let tree = MathTree::from_markup(markup);
        let resolved = resolve_attributes(&tree, &InheritedContext::default());
        let classes = assign_tex_classes(&tree, &resolved);
        (tree, classes)
    }

    #[test]
    fn test_multi_letter_identifier_becomes_operator() {
        let (tree, classes) = classify(MarkupNode::mrow(vec![
            MarkupNode::mi("sin"),
            MarkupNode::mi("x"),
        ]));
        let kids = tree.children(tree.root());
        assert_eq!(classes.class(kids[0]), Some(TexClass::Op));
        assert!(classes.is_auto_op(kids[0]));
        assert_eq!(classes.class(kids[1]), Some(TexClass::Ord));
        assert!(!classes.is_auto_op(kids[1]));
    }

    #[test]
    fn test_non_name_identifier_stays_ordinary() {
        let (tree, classes) = classify(MarkupNode::mrow(vec![
            MarkupNode::mi("x1"),
            MarkupNode::mi("2x"),
            MarkupNode::mi("a b"),
        ]));
        let kids = tree.children(tree.root());
        assert_eq!(classes.class(kids[0]), Some(TexClass::Op));
        assert_eq!(classes.class(kids[1]), Some(TexClass::Ord));
        assert_eq!(classes.class(kids[2]), Some(TexClass::Ord));
        assert!(!classes.is_auto_op(kids[1]));
    }

    #[test]
    fn test_leading_binary_becomes_ordinary() {
        let (tree, classes) = classify(MarkupNode::mrow(vec![
            MarkupNode::mo("-"),
            MarkupNode::mi("x"),
            MarkupNode::mo("+"),
            MarkupNode::mi("y"),
        ]));
        let kids = tree.children(tree.root());
        assert_eq!(classes.class(kids[0]), Some(TexClass::Ord));
        assert_eq!(classes.class(kids[2]), Some(TexClass::Bin));
    }

    #[test]
    fn test_binary_before_relation_becomes_ordinary() {
        let (tree, classes) = classify(MarkupNode::mrow(vec![
            MarkupNode::mi("x"),
            MarkupNode::mo("+"),
            MarkupNode::mo("="),
            MarkupNode::mi("y"),
            MarkupNode::mo("+"),
        ]));
        let kids = tree.children(tree.root());
        assert_eq!(classes.class(kids[1]), Some(TexClass::Ord));
        assert_eq!(classes.class(kids[2]), Some(TexClass::Rel));
        // trailing
        assert_eq!(classes.class(kids[4]), Some(TexClass::Ord));
    }

    #[test]
    fn test_demoted_script_demotes_its_operator() {
        let (tree, classes) = classify(MarkupNode::mrow(vec![
            MarkupNode::mi("x"),
            MarkupNode::msub(MarkupNode::mo("+"), MarkupNode::mn("1")),
            MarkupNode::mo("="),
            MarkupNode::mi("y"),
            MarkupNode::msup(MarkupNode::mo("-"), MarkupNode::mn("2")),
        ]));
        let kids = tree.children(tree.root());
        for script in [kids[1], kids[4]] {
            let base = tree.children(script)[0];
            assert_eq!(classes.class(script), Some(TexClass::Ord));
            assert_eq!(classes.class(base), Some(TexClass::Ord));
        }
    }

    #[test]
    fn test_spaces_are_skipped() {
        let (tree, classes) = classify(MarkupNode::mrow(vec![
            MarkupNode::mi("x"),
            MarkupNode::mspace("1em"),
            MarkupNode::mo("+"),
            MarkupNode::mi("y"),
        ]));
        let kids = tree.children(tree.root());
        assert_eq!(classes.class(kids[1]), None);
        // The space does not hide the ordinary x from the plus sign.
        assert_eq!(classes.class(kids[2]), Some(TexClass::Bin));
    }

    #[test]
    fn test_script_takes_base_class() {
        let (tree, classes) = classify(MarkupNode::munderover(
            MarkupNode::mo("\u{2211}"),
            MarkupNode::mi("i"),
            MarkupNode::mi("n"),
        ));
        assert_eq!(classes.class(tree.root()), Some(TexClass::Op));

        let (tree, classes) = classify(MarkupNode::msup(MarkupNode::mi("x"), MarkupNode::mn("2")));
        assert_eq!(classes.class(tree.root()), Some(TexClass::Ord));
    }

    #[test]
    fn test_single_child_row_passes_class_through() {
        let (tree, classes) = classify(MarkupNode::mrow(vec![MarkupNode::mo("=")]));
        assert_eq!(classes.class(tree.root()), Some(TexClass::Rel));
    }

    #[test]
    fn test_inter_atom_space() {
        assert_eq!(inter_atom_space(TexClass::Ord, TexClass::Ord, false), 0.0);
        assert_eq!(inter_atom_space(TexClass::Op, TexClass::Ord, true), 3.0 / 18.0);
        assert_eq!(inter_atom_space(TexClass::Ord, TexClass::Rel, false), 5.0 / 18.0);
        assert_eq!(inter_atom_space(TexClass::Ord, TexClass::Rel, true), 0.0);
        assert_eq!(inter_atom_space(TexClass::Bin, TexClass::Ord, false), 4.0 / 18.0);
    }

    #[test]
    fn test_class_of_unknown_node() {
        let (_, classes) = classify(MarkupNode::mi("x"));
        let other = MathTree::from_markup(MarkupNode::mrow(vec![MarkupNode::mi("a")]));
        let far = other.children(other.root())[0];
        assert!(class_of(&classes, far).is_err());
    }
}

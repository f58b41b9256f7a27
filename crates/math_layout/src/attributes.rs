//! Attribute resolution - explicit values over inherited context over defaults
//!
//! Resolution walks the tree top-down once and produces a
//! [`ResolvedAttributes`] side table. Each resolved value records where it
//! came from ([`Provenance`]). Invalid explicit values are replaced by the
//! per-kind default and logged; they never abort the pass.

use crate::error::{MathError, MathResult};
use crate::font::FontVariant;
use crate::model::{MathTree, NodeId, NodeKind};
use crate::operators;
use crate::units;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Attribute Values
// =============================================================================

/// A raw attribute value as it appears in the markup tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Interpret the value as a boolean, accepting `"true"`/`"false"` strings
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Text(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            AttributeValue::Number(_) => None,
        }
    }

    /// Whether the value counts as set for a flag
    pub fn is_truthy(&self) -> bool {
        match self {
            AttributeValue::Number(n) => *n != 0.0,
            other => other.as_bool().unwrap_or(false),
        }
    }

    /// Interpret the value as a number, accepting numeric strings
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(s) => s.trim().parse().ok(),
            AttributeValue::Bool(_) => None,
        }
    }

    /// The value as attribute text
    pub fn to_text(&self) -> String {
        match self {
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Number(n) => n.to_string(),
            AttributeValue::Text(s) => s.clone(),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        AttributeValue::Number(n as f64)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

/// Where a resolved attribute value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Given on the node itself
    Explicit,
    /// Taken from the surrounding context or an enclosing style group
    Inherited,
    /// The per-kind default
    Default,
}

/// A resolved value with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAttribute {
    pub value: AttributeValue,
    pub provenance: Provenance,
}

/// The resolved attributes of one node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    entries: BTreeMap<String, ResolvedAttribute>,
}

impl Attributes {
    /// The resolved value of an attribute
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    /// Where an attribute's value came from
    pub fn provenance(&self, name: &str) -> Option<Provenance> {
        self.entries.get(name).map(|entry| entry.provenance)
    }

    /// A boolean attribute, false when absent
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).is_some_and(AttributeValue::is_truthy)
    }

    /// A textual attribute, empty when absent
    pub fn get_text(&self, name: &str) -> String {
        self.get(name).map(AttributeValue::to_text).unwrap_or_default()
    }

    /// Iterate over all resolved attributes
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedAttribute)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn set(&mut self, name: &str, value: AttributeValue, provenance: Provenance) {
        self.entries.insert(
            name.to_string(),
            ResolvedAttribute { value, provenance },
        );
    }

    /// Set an inherited value unless the attribute was given explicitly
    fn set_inherited(&mut self, name: &str, value: AttributeValue) {
        if self.provenance(name) != Some(Provenance::Explicit) {
            self.set(name, value, Provenance::Inherited);
        }
    }
}

// =============================================================================
// Domains and Defaults
// =============================================================================

/// The set of values an attribute accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeDomain {
    Boolean,
    Integer,
    Length,
    Variant,
    Text,
}

/// The declared domain of an attribute
pub fn attribute_domain(name: &str) -> AttributeDomain {
    match name {
        "displaystyle" | "texprimestyle" | "movablelimits" | "largeop" | "stretchy"
        | "symmetric" | "fence" | "separator" | "accent" | "accentunder" => {
            AttributeDomain::Boolean
        }
        "scriptlevel" | "rowspan" | "columnspan" => AttributeDomain::Integer,
        "subscriptshift" | "superscriptshift" | "width" | "height" | "depth" | "lspace"
        | "rspace" | "minsize" => AttributeDomain::Length,
        "mathvariant" => AttributeDomain::Variant,
        _ => AttributeDomain::Text,
    }
}

fn in_domain(domain: AttributeDomain, value: &AttributeValue) -> bool {
    match domain {
        AttributeDomain::Boolean => value.as_bool().is_some(),
        AttributeDomain::Integer => value.as_number().is_some_and(|n| n.fract() == 0.0),
        // Empty means "use the font default"
        AttributeDomain::Length => match value {
            AttributeValue::Text(s) => s.trim().is_empty() || units::is_length(s),
            AttributeValue::Number(_) => true,
            AttributeValue::Bool(_) => false,
        },
        AttributeDomain::Variant => match value {
            AttributeValue::Text(s) => FontVariant::from_name(s.trim()).is_some(),
            _ => false,
        },
        AttributeDomain::Text => true,
    }
}

#[derive(Debug, Clone, Copy)]
enum StaticValue {
    Bool(bool),
    Int(i32),
    Text(&'static str),
}

impl From<StaticValue> for AttributeValue {
    fn from(value: StaticValue) -> Self {
        match value {
            StaticValue::Bool(b) => AttributeValue::Bool(b),
            StaticValue::Int(n) => AttributeValue::Number(n as f64),
            StaticValue::Text(s) => AttributeValue::Text(s.to_string()),
        }
    }
}

const TOKEN_DEFAULTS: &[(&str, StaticValue)] = &[("mathvariant", StaticValue::Text("normal"))];

const OPERATOR_DEFAULTS: &[(&str, StaticValue)] = &[
    ("mathvariant", StaticValue::Text("normal")),
    ("form", StaticValue::Text("infix")),
    ("fence", StaticValue::Bool(false)),
    ("separator", StaticValue::Bool(false)),
    ("lspace", StaticValue::Text("thickmathspace")),
    ("rspace", StaticValue::Text("thickmathspace")),
    ("stretchy", StaticValue::Bool(false)),
    ("symmetric", StaticValue::Bool(false)),
    ("minsize", StaticValue::Text("1em")),
    ("largeop", StaticValue::Bool(false)),
    ("movablelimits", StaticValue::Bool(false)),
    ("accent", StaticValue::Bool(false)),
];

const SPACE_DEFAULTS: &[(&str, StaticValue)] = &[
    ("width", StaticValue::Text("0em")),
    ("height", StaticValue::Text("0ex")),
    ("depth", StaticValue::Text("0ex")),
];

const SUB_DEFAULTS: &[(&str, StaticValue)] = &[("subscriptshift", StaticValue::Text(""))];
const SUP_DEFAULTS: &[(&str, StaticValue)] = &[("superscriptshift", StaticValue::Text(""))];
const SUBSUP_DEFAULTS: &[(&str, StaticValue)] = &[
    ("subscriptshift", StaticValue::Text("")),
    ("superscriptshift", StaticValue::Text("")),
];
const UNDER_DEFAULTS: &[(&str, StaticValue)] = &[
    ("accentunder", StaticValue::Bool(false)),
    ("subscriptshift", StaticValue::Text("")),
];
const OVER_DEFAULTS: &[(&str, StaticValue)] = &[
    ("accent", StaticValue::Bool(false)),
    ("superscriptshift", StaticValue::Text("")),
];
const UNDEROVER_DEFAULTS: &[(&str, StaticValue)] = &[
    ("accent", StaticValue::Bool(false)),
    ("accentunder", StaticValue::Bool(false)),
    ("subscriptshift", StaticValue::Text("")),
    ("superscriptshift", StaticValue::Text("")),
];
const CELL_DEFAULTS: &[(&str, StaticValue)] = &[
    ("rowspan", StaticValue::Int(1)),
    ("columnspan", StaticValue::Int(1)),
];

fn kind_defaults(kind: NodeKind) -> &'static [(&'static str, StaticValue)] {
    match kind {
        NodeKind::Identifier | NodeKind::Number | NodeKind::Text => TOKEN_DEFAULTS,
        NodeKind::Operator => OPERATOR_DEFAULTS,
        NodeKind::Space => SPACE_DEFAULTS,
        NodeKind::Sub => SUB_DEFAULTS,
        NodeKind::Sup => SUP_DEFAULTS,
        NodeKind::SubSup => SUBSUP_DEFAULTS,
        NodeKind::Under => UNDER_DEFAULTS,
        NodeKind::Over => OVER_DEFAULTS,
        NodeKind::UnderOver => UNDEROVER_DEFAULTS,
        NodeKind::TableCell => CELL_DEFAULTS,
        _ => &[],
    }
}

/// The per-kind default of an attribute, if the kind declares one
pub fn default_value(kind: NodeKind, name: &str) -> Option<AttributeValue> {
    kind_defaults(kind)
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, v)| v.into())
}

// =============================================================================
// Inherited Context
// =============================================================================

/// Context passed from a node to its children during resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InheritedContext {
    pub display_style: bool,
    pub script_level: i32,
    /// Cramped style: superscripts use the lowest shift tier
    pub prime_style: bool,
    /// Attributes set by enclosing style groups
    pub inherited: BTreeMap<String, AttributeValue>,
}

impl InheritedContext {
    /// Root context for a display or inline formula
    pub fn new(display_style: bool) -> Self {
        Self {
            display_style,
            ..Default::default()
        }
    }

    fn for_script(&self, prime: bool, increment: bool) -> Self {
        Self {
            display_style: false,
            script_level: self.script_level.saturating_add(i32::from(increment)),
            prime_style: self.prime_style || prime,
            inherited: self.inherited.clone(),
        }
    }
}

/// Context attributes every node carries
const CONTEXT_ATTRIBUTES: [&str; 3] = ["displaystyle", "scriptlevel", "texprimestyle"];

// =============================================================================
// Resolution Pass
// =============================================================================

/// Side table of resolved attributes, indexed by node
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttributes {
    attributes: Vec<Attributes>,
    contexts: Vec<InheritedContext>,
}

impl ResolvedAttributes {
    /// Resolved attributes of a node
    pub fn get(&self, id: NodeId) -> &Attributes {
        &self.attributes[id.index()]
    }

    /// Resolved attributes of a node that may not belong to this table
    pub fn try_get(&self, id: NodeId) -> MathResult<&Attributes> {
        self.attributes
            .get(id.index())
            .ok_or(MathError::NodeNotFound(id))
    }

    /// The context a node was resolved in, after its own explicit overrides
    pub fn context(&self, id: NodeId) -> &InheritedContext {
        &self.contexts[id.index()]
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Resolve the attributes of every node in the tree
pub fn resolve_attributes(tree: &MathTree, context: &InheritedContext) -> ResolvedAttributes {
    let mut table = ResolvedAttributes {
        attributes: vec![Attributes::default(); tree.len()],
        contexts: vec![InheritedContext::default(); tree.len()],
    };
    if !tree.is_empty() {
        resolve_node(tree, tree.root(), context, &mut table);
    }
    tracing::debug!(
        target: "math_layout::attributes",
        nodes = tree.len(),
        display = context.display_style,
        "attributes resolved"
    );
    table
}

fn resolve_node(
    tree: &MathTree,
    id: NodeId,
    context: &InheritedContext,
    table: &mut ResolvedAttributes,
) {
    let node = tree.node(id);
    let kind = node.kind;
    let mut attrs = Attributes::default();

    // Defaults first, then inherited values, then explicit values.
    for &(name, value) in kind_defaults(kind) {
        attrs.set(name, value.into(), Provenance::Default);
    }
    if kind == NodeKind::Operator {
        if let Some(entry) = operators::lookup(&node.text) {
            attrs.set("largeop", entry.largeop.into(), Provenance::Default);
            attrs.set("movablelimits", entry.movablelimits.into(), Provenance::Default);
        }
    }
    for (name, value) in &context.inherited {
        if default_value(kind, name).is_some() {
            attrs.set(name, value.clone(), Provenance::Inherited);
        }
    }
    for (name, value) in &node.attributes {
        if in_domain(attribute_domain(name), value) {
            attrs.set(name, value.clone(), Provenance::Explicit);
            continue;
        }
        let err = MathError::AttributeDomain {
            kind,
            attribute: name.clone(),
            value: value.to_text(),
        };
        tracing::debug!(target: "math_layout::attributes", node = %id, "{err}; using default");
    }

    // Context attributes: the node's own explicit values take effect for it
    // and its descendants.
    let mut own = context.clone();
    if let Some(display) = explicit(&attrs, "displaystyle").and_then(AttributeValue::as_bool) {
        own.display_style = display;
    } else if kind == NodeKind::Math {
        if let Some(display) = explicit(&attrs, "display") {
            own.display_style = display.to_text().trim() == "block";
        }
    }
    if let Some(level) = explicit(&attrs, "scriptlevel") {
        own.script_level = apply_script_level(own.script_level, level);
    }
    if let Some(prime) = explicit(&attrs, "texprimestyle").and_then(AttributeValue::as_bool) {
        own.prime_style = prime;
    }
    for name in CONTEXT_ATTRIBUTES {
        let value = match name {
            "displaystyle" => AttributeValue::Bool(own.display_style),
            "scriptlevel" => AttributeValue::Number(own.script_level as f64),
            _ => AttributeValue::Bool(own.prime_style),
        };
        if attrs.provenance(name) == Some(Provenance::Explicit) {
            attrs.set(name, value, Provenance::Explicit);
        } else {
            attrs.set_inherited(name, value);
        }
    }

    // A single alphabetic identifier is italic unless told otherwise.
    if kind == NodeKind::Identifier && is_single_alphabetic(&node.text) {
        attrs.set_inherited("mathvariant", AttributeValue::Text("italic".to_string()));
    }

    // Style groups hand their remaining explicit attributes down.
    if matches!(kind, NodeKind::Style | NodeKind::Math) {
        for (name, entry) in attrs.iter() {
            if entry.provenance == Provenance::Explicit && !CONTEXT_ATTRIBUTES.contains(&name) {
                own.inherited.insert(name.to_string(), entry.value.clone());
            }
        }
    }

    table.attributes[id.index()] = attrs;
    table.contexts[id.index()] = own.clone();

    let children = tree.children(id);
    for (index, &child) in children.iter().enumerate() {
        let child_context = child_context(kind, index, &own, table.get(id));
        resolve_node(tree, child, &child_context, table);
    }
}

fn explicit<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a AttributeValue> {
    match attrs.provenance(name) {
        Some(Provenance::Explicit) => attrs.get(name),
        _ => None,
    }
}

/// Signed text values (`"+1"`, `"-1"`) are relative, everything else absolute
fn apply_script_level(current: i32, value: &AttributeValue) -> i32 {
    let Some(n) = value.as_number() else {
        return current;
    };
    match value {
        AttributeValue::Text(s) if s.trim_start().starts_with(['+', '-']) => {
            current.saturating_add(n as i32)
        }
        _ => n as i32,
    }
}

fn is_single_alphabetic(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

/// The context for the child at `index` of a node of `kind`
fn child_context(
    kind: NodeKind,
    index: usize,
    own: &InheritedContext,
    attrs: &Attributes,
) -> InheritedContext {
    match (kind, index) {
        (_, 0) if kind.is_script() => own.clone(),
        // Subscripts are cramped, superscripts keep the parent's style.
        (NodeKind::Sub, 1) | (NodeKind::SubSup, 1) => own.for_script(true, true),
        (NodeKind::Sup, 1) | (NodeKind::SubSup, 2) => own.for_script(false, true),
        (NodeKind::Under, 1) | (NodeKind::UnderOver, 1) => {
            let accent = attrs.get_bool("accentunder");
            own.for_script(true, !accent)
        }
        (NodeKind::Over, 1) | (NodeKind::UnderOver, 2) => {
            let accent = attrs.get_bool("accent");
            own.for_script(accent, !accent)
        }
        (NodeKind::Table, _) => InheritedContext {
            display_style: attrs.get_bool("displaystyle")
                && attrs.provenance("displaystyle") == Some(Provenance::Explicit),
            ..own.clone()
        },
        _ => own.clone(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarkupNode;

    fn resolve(markup: MarkupNode, display: bool) -> (MathTree, ResolvedAttributes) {
        let tree = MathTree::from_markup(markup);
        let resolved = resolve_attributes(&tree, &InheritedContext::new(display));
        (tree, resolved)
    }

    #[test]
    fn test_single_letter_identifier_is_italic() {
        let (tree, resolved) = resolve(
            MarkupNode::mrow(vec![MarkupNode::mi("x"), MarkupNode::mi("sin")]),
            false,
        );
        let kids = tree.children(tree.root());
        let x = resolved.get(kids[0]);
        assert_eq!(x.get_text("mathvariant"), "italic");
        assert_eq!(x.provenance("mathvariant"), Some(Provenance::Inherited));

        let sin = resolved.get(kids[1]);
        assert_eq!(sin.get_text("mathvariant"), "normal");
        assert_eq!(sin.provenance("mathvariant"), Some(Provenance::Default));
    }

    #[test]
    fn test_explicit_variant_wins() {
        let (tree, resolved) = resolve(MarkupNode::mi("x").with_attr("mathvariant", "bold"), false);
        let attrs = resolved.get(tree.root());
        assert_eq!(attrs.get_text("mathvariant"), "bold");
        assert_eq!(attrs.provenance("mathvariant"), Some(Provenance::Explicit));
    }

    #[test]
    fn test_digit_is_not_italicized() {
        let (tree, resolved) = resolve(MarkupNode::mi("2"), false);
        assert_eq!(resolved.get(tree.root()).get_text("mathvariant"), "normal");
    }

    #[test]
    fn test_script_context() {
        let (tree, resolved) = resolve(
            MarkupNode::msubsup(MarkupNode::mi("x"), MarkupNode::mi("i"), MarkupNode::mn("2")),
            true,
        );
        let kids = tree.children(tree.root());
        let base = resolved.context(kids[0]);
        assert!(base.display_style);
        assert_eq!(base.script_level, 0);

        let sub = resolved.context(kids[1]);
        assert!(!sub.display_style);
        assert_eq!(sub.script_level, 1);
        assert!(sub.prime_style);

        let sup = resolved.context(kids[2]);
        assert_eq!(sup.script_level, 1);
        assert!(!sup.prime_style);
        assert_eq!(
            resolved.get(kids[2]).provenance("scriptlevel"),
            Some(Provenance::Inherited)
        );
    }

    #[test]
    fn test_style_group_inherits_to_descendants() {
        let (tree, resolved) = resolve(
            MarkupNode::mstyle(vec![
                MarkupNode::mo("\u{2211}"),
                MarkupNode::mrow(vec![MarkupNode::mn("1")]),
            ])
            .with_attr("movablelimits", true)
            .with_attr("mathvariant", "bold"),
            false,
        );
        let kids = tree.children(tree.root());
        let op = resolved.get(kids[0]);
        assert!(op.get_bool("movablelimits"));
        assert_eq!(op.provenance("movablelimits"), Some(Provenance::Inherited));
        assert_eq!(op.get_text("mathvariant"), "bold");

        // Rows declare no mathvariant, but their tokens do.
        let one = tree.children(kids[1])[0];
        assert_eq!(resolved.get(kids[1]).get("mathvariant"), None);
        assert_eq!(resolved.get(one).get_text("mathvariant"), "bold");
    }

    #[test]
    fn test_style_group_display_and_level() {
        let (tree, resolved) = resolve(
            MarkupNode::mstyle(vec![MarkupNode::mi("x")])
                .with_attr("displaystyle", true)
                .with_attr("scriptlevel", "+2"),
            false,
        );
        let x = tree.children(tree.root())[0];
        assert!(resolved.context(x).display_style);
        assert_eq!(resolved.context(x).script_level, 2);
        assert_eq!(
            resolved.get(tree.root()).provenance("displaystyle"),
            Some(Provenance::Explicit)
        );
    }

    #[test]
    fn test_math_display_attribute() {
        let (tree, resolved) = resolve(
            MarkupNode::math(vec![MarkupNode::mi("x")]).with_attr("display", "block"),
            false,
        );
        let x = tree.children(tree.root())[0];
        assert!(resolved.context(x).display_style);

        let (tree, resolved) = resolve(
            MarkupNode::math(vec![MarkupNode::mi("x")])
                .with_attr("display", "block")
                .with_attr("displaystyle", false),
            false,
        );
        assert!(!resolved.context(tree.root()).display_style);
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let (tree, resolved) = resolve(
            MarkupNode::msub(MarkupNode::mi("x"), MarkupNode::mn("1"))
                .with_attr("subscriptshift", "very low"),
            false,
        );
        let attrs = resolved.get(tree.root());
        assert_eq!(attrs.get_text("subscriptshift"), "");
        assert_eq!(attrs.provenance("subscriptshift"), Some(Provenance::Default));

        let (tree, resolved) = resolve(MarkupNode::mo("+").with_attr("largeop", "maybe"), false);
        assert!(!resolved.get(tree.root()).get_bool("largeop"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let tree = MathTree::from_markup(MarkupNode::mstyle(vec![MarkupNode::munderover(
            MarkupNode::mo("\u{2211}"),
            MarkupNode::mi("i"),
            MarkupNode::mi("n"),
        )])
        .with_attr("mathvariant", "bold"));
        let context = InheritedContext::new(false);
        let first = resolve_attributes(&tree, &context);
        let second = resolve_attributes(&tree, &context);
        assert_eq!(first, second);
    }

    #[test]
    fn test_operator_dictionary_defaults() {
        let (tree, resolved) = resolve(MarkupNode::mo("\u{2211}"), false);
        let attrs = resolved.get(tree.root());
        assert!(attrs.get_bool("largeop"));
        assert!(attrs.get_bool("movablelimits"));
        assert_eq!(attrs.provenance("largeop"), Some(Provenance::Default));

        let (tree, resolved) = resolve(
            MarkupNode::mo("\u{2211}").with_attr("movablelimits", "false"),
            false,
        );
        assert!(!resolved.get(tree.root()).get_bool("movablelimits"));
    }

    #[test]
    fn test_accent_over_keeps_level() {
        let (tree, resolved) = resolve(
            MarkupNode::mover(MarkupNode::mi("x"), MarkupNode::mo("^")).with_attr("accent", true),
            false,
        );
        let over = tree.children(tree.root())[1];
        assert_eq!(resolved.context(over).script_level, 0);
        assert!(resolved.context(over).prime_style);
    }

    #[test]
    fn test_extreme_script_level_saturates() {
        let (tree, resolved) = resolve(
            MarkupNode::mstyle(vec![MarkupNode::msub(MarkupNode::mi("x"), MarkupNode::mn("1"))])
                .with_attr("scriptlevel", "2147483647"),
            false,
        );
        let msub = tree.children(tree.root())[0];
        let sub = tree.children(msub)[1];
        assert_eq!(resolved.context(msub).script_level, i32::MAX);
        assert_eq!(resolved.context(sub).script_level, i32::MAX);

        let (tree, resolved) = resolve(
            MarkupNode::mstyle(vec![MarkupNode::mstyle(vec![MarkupNode::mi("y")])
                .with_attr("scriptlevel", "+2147483647")])
            .with_attr("scriptlevel", "+5"),
            false,
        );
        let inner = tree.children(tree.root())[0];
        assert_eq!(resolved.context(inner).script_level, i32::MAX);

        let (tree, resolved) = resolve(
            MarkupNode::mstyle(vec![MarkupNode::mi("z")])
                .with_attr("scriptlevel", "-99999999999"),
            false,
        );
        assert_eq!(resolved.context(tree.root()).script_level, i32::MIN);
    }

    #[test]
    fn test_try_get_unknown_node() {
        let (_, resolved) = resolve(MarkupNode::mi("x"), false);
        let other = MathTree::from_markup(MarkupNode::mrow(vec![
            MarkupNode::mi("a"),
            MarkupNode::mi("b"),
        ]));
        let far = other.children(other.root())[1];
        assert!(matches!(
            resolved.try_get(far),
            Err(MathError::NodeNotFound(_))
        ));
    }
}

//! Math Layout - typesetting core for math notation
//!
//! This crate turns a tree of typed markup nodes into a tree of styled,
//! dimensioned display boxes:
//! - Attribute resolution (explicit, inherited, and default values)
//! - TeX spacing-class assignment
//! - Bounding boxes and script positioning following TeXBook Appendix G
//! - Emission of the display tree handed to a painter
//!
//! Every pass writes a side table keyed by [`NodeId`]; the markup tree itself
//! is never mutated.

pub mod attributes;
pub mod bbox;
pub mod config;
pub mod emit;
pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod operators;
pub mod scripts;
pub mod tex_class;
pub mod units;

pub use attributes::{
    resolve_attributes, AttributeValue, Attributes, InheritedContext, Provenance,
    ResolvedAttributes,
};
pub use bbox::BBox;
pub use config::LayoutOptions;
pub use emit::{emit, DisplayContent, DisplayNode};
pub use error::*;
pub use font::{CharMetrics, FontParam, FontParameterSet, FontVariant};
pub use layout::{layout_tree, BoxTable, LayoutEngine, TableLayout};
pub use model::{MarkupNode, MathNode, MathTree, NodeId, NodeKind};
pub use scripts::{ScriptConstruct, ScriptLayout, ScriptParams, ScriptPlacement};
pub use tex_class::{assign_tex_classes, ClassTable, TexClass};

/// Everything one layout pass produces
#[derive(Debug, Clone)]
pub struct Typeset {
    pub root: NodeId,
    pub resolved: ResolvedAttributes,
    pub classes: ClassTable,
    pub boxes: BoxTable,
    pub display: DisplayNode,
}

impl Typeset {
    /// Box of the root node
    pub fn root_box(&self) -> BBox {
        self.boxes
            .get(self.root)
            .copied()
            .unwrap_or_default()
    }
}

/// Run a full layout pass: resolve, classify, compute boxes, emit
pub fn typeset(
    tree: &MathTree,
    font: &FontParameterSet,
    options: &LayoutOptions,
) -> MathResult<Typeset> {
    let resolved = resolve_attributes(tree, &InheritedContext::new(options.display));
    let classes = assign_tex_classes(tree, &resolved);
    let boxes = layout_tree(tree, &resolved, &classes, font, options)?;
    let display = emit(tree, &resolved, &boxes)?;
    Ok(Typeset {
        root: tree.root(),
        resolved,
        classes,
        boxes,
        display,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================================================
    // Integration Tests
    // =============================================================================

    fn sum_formula() -> MarkupNode {
        MarkupNode::math(vec![
            MarkupNode::munderover(
                MarkupNode::mo("\u{2211}"),
                MarkupNode::mrow(vec![
                    MarkupNode::mi("i"),
                    MarkupNode::mo("="),
                    MarkupNode::mn("1"),
                ]),
                MarkupNode::mi("n"),
            ),
            MarkupNode::msubsup(MarkupNode::mi("x"), MarkupNode::mi("i"), MarkupNode::mn("2")),
        ])
    }

    #[test]
    fn test_pipeline() {
        let tree = MathTree::from_markup(sum_formula());
        let result = typeset(&tree, &FontParameterSet::tex(), &LayoutOptions::display()).unwrap();

        assert_eq!(result.display.kind, "mjx-math");
        assert!(result.display.find("mjx-under").is_some());
        let root = result.root_box();
        assert!(root.w > 1.056);
        assert!(root.h > 0.75 && root.d > 0.25);
        assert_eq!(result.classes.class(tree.root()), Some(TexClass::Ord));
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let tree = MathTree::from_markup(sum_formula());
        let font = FontParameterSet::tex();
        for options in [LayoutOptions::default(), LayoutOptions::display()] {
            let first = typeset(&tree, &font, &options).unwrap();
            let second = typeset(&tree, &font, &options).unwrap();
            assert_eq!(first.display, second.display);
            assert_eq!(first.display.to_markup(), second.display.to_markup());
            assert_eq!(first.boxes, second.boxes);
        }
    }

    #[test]
    fn test_inline_sum_moves_limits() {
        let tree = MathTree::from_markup(sum_formula());
        let result = typeset(&tree, &FontParameterSet::tex(), &LayoutOptions::default()).unwrap();
        let sum = result.display.find("mjx-munderover").unwrap();
        assert_eq!(sum.attribute("limits"), Some("false"));
        assert!(result.display.find("mjx-under").is_none());
    }

    #[test]
    fn test_missing_parameter_fails_whole_pass() {
        let tree = MathTree::from_markup(sum_formula());
        let font = FontParameterSet::tex().without_param(FontParam::BigOpSpacing5);
        let err = typeset(&tree, &font, &LayoutOptions::display()).unwrap_err();
        assert_eq!(err.to_string(), "missing font parameter: big_op_spacing5");
    }

    #[test]
    fn test_pipeline_from_json() {
        let json = r#"{
            "kind": "math",
            "attributes": {"display": "block"},
            "children": [
                {"kind": "mtable", "children": [
                    {"kind": "mtr", "children": [
                        {"kind": "mtd", "children": [{"kind": "mn", "text": "1"}]},
                        {"kind": "mtd"}
                    ]}
                ]}
            ]
        }"#;
        let tree = MathTree::from_json(json).unwrap();
        let result = typeset(&tree, &FontParameterSet::tex(), &LayoutOptions::default()).unwrap();
        assert_eq!(result.display.attribute("display"), Some("true"));

        let row = result.display.find("mjx-mtr").unwrap();
        for cell in row.child_nodes() {
            assert_eq!(cell.last_node().map(|n| n.kind.as_str()), Some(emit::STRUT_TAG));
        }
    }

    #[test]
    fn test_explicit_shift_reaches_layout() {
        let tree = MathTree::from_markup(
            MarkupNode::msup(MarkupNode::mi("x"), MarkupNode::mn("2"))
                .with_attr("superscriptshift", "1em"),
        );
        let result = typeset(&tree, &FontParameterSet::tex(), &LayoutOptions::default()).unwrap();
        let script = result.display.find("mjx-script").unwrap();
        assert_eq!(script.style("vertical-align"), Some("1em"));
    }
}

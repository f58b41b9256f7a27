//! Property tests over generated formulas
//!
//! Random markup trees are laid out with the TeX parameter set; every pass
//! must be reproducible and every box must keep non-negative extents.

use math_layout::{
    typeset, FontParameterSet, LayoutOptions, MarkupNode, MathTree, ScriptConstruct,
};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = MarkupNode> {
    prop_oneof![
        prop::sample::select(vec!["x", "y", "n", "sin", "\u{03B1}"]).prop_map(MarkupNode::mi),
        prop::sample::select(vec!["0", "1", "42"]).prop_map(MarkupNode::mn),
        prop::sample::select(vec!["+", "=", "(", ")", ",", "\u{2211}", "\u{222B}"])
            .prop_map(MarkupNode::mo),
        Just(MarkupNode::mspace("thinmathspace")),
    ]
}

fn formula() -> impl Strategy<Value = MarkupNode> {
    leaf().prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(MarkupNode::mrow),
            (inner.clone(), inner.clone()).prop_map(|(b, s)| MarkupNode::msub(b, s)),
            (inner.clone(), inner.clone()).prop_map(|(b, s)| MarkupNode::msup(b, s)),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(b, s, t)| MarkupNode::msubsup(b, s, t)),
            (inner.clone(), inner.clone()).prop_map(|(b, s)| MarkupNode::munder(b, s)),
            (inner.clone(), inner.clone()).prop_map(|(b, s)| MarkupNode::mover(b, s)),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(b, s, t)| MarkupNode::munderover(b, s, t)),
            prop::collection::vec(inner.clone(), 1..3).prop_map(|cells| {
                MarkupNode::mtable(vec![MarkupNode::mtr(
                    cells.into_iter().map(|c| MarkupNode::mtd(vec![c])).collect(),
                )])
            }),
        ]
    })
}

proptest! {
    #[test]
    fn prop_layout_is_deterministic(markup in formula(), display in any::<bool>()) {
        let tree = MathTree::from_markup(MarkupNode::math(vec![markup]));
        let font = FontParameterSet::tex();
        let options = LayoutOptions { display, ..LayoutOptions::default() };
        let first = typeset(&tree, &font, &options).unwrap();
        let second = typeset(&tree, &font, &options).unwrap();
        prop_assert_eq!(&first.display, &second.display);
        prop_assert_eq!(first.display.to_markup(), second.display.to_markup());
    }

    #[test]
    fn prop_boxes_are_non_negative(markup in formula(), display in any::<bool>()) {
        let tree = MathTree::from_markup(markup);
        let options = LayoutOptions { display, ..LayoutOptions::default() };
        let result = typeset(&tree, &FontParameterSet::tex(), &options).unwrap();
        for id in tree.ids() {
            let bbox = result.boxes.try_get(id).unwrap();
            prop_assert!(bbox.h >= 0.0, "negative height at {}", id);
            prop_assert!(bbox.d >= 0.0, "negative depth at {}", id);
            prop_assert!(bbox.rscale > 0.0);
        }
    }

    #[test]
    fn prop_inline_limits_never_stack(markup in formula()) {
        let tree = MathTree::from_markup(markup);
        let result = typeset(&tree, &FontParameterSet::tex(), &LayoutOptions::default()).unwrap();
        for id in tree.ids() {
            let Some(layout) = result.boxes.script(id) else { continue };
            let movable = math_layout::scripts::has_movable_limits(&tree, &result.resolved, id);
            if layout.construct.is_limits() {
                prop_assert_eq!(layout.limits_moved(), movable);
            } else {
                prop_assert!(!layout.limits_moved());
            }
            prop_assert_eq!(
                layout.construct,
                ScriptConstruct::from_kind(tree.kind(id)).unwrap()
            );
        }
    }
}

use std::collections::HashSet;

use proptest::prelude::*;

use xpath1::simple_node::{doc, elem, SimpleNodeBuilder};
use xpath1::{Compiler, SimpleNode};

/// Builds a three-level tree from the given shape: `shape[i]` children
/// under the i-th subtree root.
fn build_tree(shape: &[usize]) -> SimpleNode {
    let mut root = elem("root");
    for (i, &children) in shape.iter().enumerate() {
        let mut subtree: SimpleNodeBuilder = elem(&format!("s{i}"));
        for j in 0..children {
            subtree = subtree.child(elem(&format!("s{i}c{j}")));
        }
        root = root.child(subtree);
    }
    doc().child(root).build()
}

fn all_elements(document: &SimpleNode) -> Vec<SimpleNode> {
    Compiler::new()
        .compile("//*")
        .expect("compile")
        .eval_node_set(Some(document), None)
        .expect("eval")
}

fn axis_set(context: &SimpleNode, expr: &str) -> HashSet<SimpleNode> {
    Compiler::new()
        .compile(expr)
        .expect(expr)
        .eval_node_set(Some(context), None)
        .expect(expr)
        .into_iter()
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// For any two distinct elements exactly one holds: a precedes b, b
    /// precedes a, or one is an ancestor-or-self of the other.
    #[test]
    fn following_axis_partitions_the_document(
        shape in proptest::collection::vec(0usize..4, 1..4)
    ) {
        let document = build_tree(&shape);
        let elements = all_elements(&document);
        for a in &elements {
            let following_a = axis_set(a, "following::*");
            let ancestry_a: HashSet<SimpleNode> = axis_set(a, "ancestor-or-self::*")
                .union(&axis_set(a, "descendant-or-self::*"))
                .cloned()
                .collect();
            for b in &elements {
                if a == b {
                    continue;
                }
                let following_b = axis_set(b, "following::*");
                let relations = [
                    following_a.contains(b),
                    following_b.contains(a),
                    ancestry_a.contains(b),
                ];
                prop_assert_eq!(
                    relations.iter().filter(|&&r| r).count(),
                    1,
                    "exactly one relation must hold"
                );
            }
        }
    }

    /// Node-sets from paths and unions are duplicate-free, and re-sorting
    /// through another union never changes the order.
    #[test]
    fn path_results_are_stable_and_unique(
        shape in proptest::collection::vec(0usize..4, 1..4)
    ) {
        let document = build_tree(&shape);
        let elements = all_elements(&document);
        let unique: HashSet<SimpleNode> = elements.iter().cloned().collect();
        prop_assert_eq!(unique.len(), elements.len(), "duplicates in //*");

        let doubled = Compiler::new()
            .compile("//* | //*")
            .expect("compile")
            .eval_node_set(Some(&document), None)
            .expect("eval");
        prop_assert_eq!(&doubled, &elements);

        let unioned = Compiler::new()
            .compile("//*[position() mod 2 = 1] | //*[position() mod 2 = 0]")
            .expect("compile")
            .eval_node_set(Some(&document), None)
            .expect("eval");
        prop_assert_eq!(&unioned, &elements);
    }

    /// `*[position()=k]` selects exactly the k-th child.
    #[test]
    fn positional_predicate_identity(n in 1usize..8, k in 1usize..10) {
        let document = build_tree(&[n]);
        let subtree_children = Compiler::new()
            .compile("/root/s0/*")
            .expect("compile")
            .eval_node_set(Some(&document), None)
            .expect("eval");
        let selected = Compiler::new()
            .compile(&format!("/root/s0/*[{k}]"))
            .expect("compile")
            .eval_node_set(Some(&document), None)
            .expect("eval");
        if k <= n {
            prop_assert_eq!(selected.len(), 1);
            prop_assert_eq!(&selected[0], &subtree_children[k - 1]);
        } else {
            prop_assert!(selected.is_empty());
        }
    }
}

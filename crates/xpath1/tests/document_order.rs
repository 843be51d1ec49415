use rstest::rstest;

use xpath1::simple_node::{attr, doc, elem, text};
use xpath1::{Compiler, NodeKind, SimpleNode, XmlNode};

/// <root> <a id=".." alpha=".."> <a1>t</a1> <a2/> </a> <b> <b1/> </b> </root>
fn sample() -> SimpleNode {
    doc()
        .child(
            elem("root")
                .child(
                    elem("a")
                        .attr(attr("id", "1"))
                        .attr(attr("alpha", "2"))
                        .declare_ns("p", "urn:p")
                        .child(elem("a1").child(text("t")))
                        .child(elem("a2")),
                )
                .child(elem("b").child(elem("b1"))),
        )
        .build()
}

fn eval_names(document: &SimpleNode, expr: &str) -> Vec<String> {
    Compiler::<SimpleNode>::new()
        .compile(expr)
        .expect(expr)
        .eval_node_set(Some(document), None)
        .expect(expr)
        .iter()
        .filter_map(|n| n.name().map(|q| q.local))
        .collect()
}

#[rstest]
fn union_sorts_across_subtrees() {
    let document = sample();
    assert_eq!(
        eval_names(&document, "//b1 | //a1 | /root"),
        vec!["root", "a1", "b1"]
    );
    // the text node inside <a1> sorts between <a> and <a2> but carries no
    // name, so only the elements remain visible here
    assert_eq!(
        eval_names(&document, "//a2 | //a1/text() | //a"),
        vec!["a", "a2"]
    );
}

#[rstest]
fn attributes_sort_after_element_before_children() {
    let document = sample();
    assert_eq!(
        eval_names(&document, "//a/@id | //a1 | //a"),
        vec!["a", "id", "a1"]
    );
}

#[rstest]
fn attributes_of_one_element_order_by_name() {
    let document = sample();
    assert_eq!(eval_names(&document, "//a/@id | //a/@alpha"), vec!["alpha", "id"]);
}

#[rstest]
fn namespaces_precede_attributes() {
    let document = sample();
    let ns = Compiler::<SimpleNode>::new()
        .compile("//a/namespace::* | //a/@*")
        .unwrap()
        .eval_node_set(Some(&document), None)
        .unwrap();
    let kinds: Vec<NodeKind> = ns.iter().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Namespace,
            NodeKind::Namespace,
            NodeKind::Attribute,
            NodeKind::Attribute
        ]
    );
    let locals: Vec<String> = ns.iter().filter_map(|n| n.name().map(|q| q.local)).collect();
    assert_eq!(locals, vec!["p", "xml", "alpha", "id"]);
}

#[rstest]
fn union_deduplicates_by_identity() {
    let document = sample();
    assert_eq!(eval_names(&document, "//a1 | //a1"), vec!["a1"]);
    assert_eq!(
        eval_names(&document, "/root/a/* | //a1 | //a2"),
        vec!["a1", "a2"]
    );
}

#[rstest]
fn multi_step_paths_emerge_ordered_and_unique() {
    let document = sample();
    // both steps visit overlapping nodes; the result is still ordered and
    // duplicate-free
    assert_eq!(
        eval_names(&document, "//*/ancestor-or-self::*"),
        vec!["root", "a", "a1", "a2", "b", "b1"]
    );
    assert_eq!(
        eval_names(&document, "/root//*"),
        vec!["a", "a1", "a2", "b", "b1"]
    );
}

#[rstest]
fn ancestors_precede_descendants() {
    let document = sample();
    assert_eq!(
        eval_names(&document, "//a1/ancestor-or-self::*"),
        vec!["root", "a", "a1"]
    );
}

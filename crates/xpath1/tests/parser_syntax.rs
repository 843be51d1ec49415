use rstest::rstest;

use xpath1::simple_node::{attr, doc, elem, text};
use xpath1::{Compiler, SimpleNode};

/// Operator keywords double as element names; only position decides.
#[rstest]
fn operator_names_versus_name_tests() {
    let document = doc()
        .child(
            elem("r")
                .child(elem("div").child(text("4")))
                .child(elem("mod").child(text("3"))),
        )
        .build();
    let r = Compiler::<SimpleNode>::new()
        .compile("/r")
        .unwrap()
        .eval_node_set(Some(&document), None)
        .unwrap()
        .remove(0);
    let eval = |expr: &str| {
        Compiler::<SimpleNode>::new()
            .compile(expr)
            .expect(expr)
            .eval_number(Some(&r), None)
            .expect(expr)
    };
    assert_eq!(eval("number(div)"), 4.0);
    assert_eq!(eval("number(mod)"), 3.0);
    assert_eq!(eval("div div div"), 1.0);
    assert_eq!(eval("mod mod mod"), 0.0);
    assert_eq!(eval("div mod mod"), 1.0);
    assert_eq!(eval("div * mod"), 12.0);
}

#[rstest]
fn star_is_operator_after_operand_otherwise_wildcard() {
    let document = doc()
        .child(elem("r").child(elem("x").child(text("5"))))
        .build();
    let r = Compiler::<SimpleNode>::new()
        .compile("/r")
        .unwrap()
        .eval_node_set(Some(&document), None)
        .unwrap()
        .remove(0);
    let eval = |expr: &str| {
        Compiler::<SimpleNode>::new()
            .compile(expr)
            .expect(expr)
            .eval_number(Some(&r), None)
            .expect(expr)
    };
    assert_eq!(eval("count(*)"), 1.0);
    assert_eq!(eval("count(*) * 2"), 2.0);
    assert_eq!(eval("number(*) * number(*)"), 25.0);
}

#[rstest]
fn name_characters_bind_tighter_than_subtraction() {
    let document = doc()
        .child(
            elem("r")
                .child(elem("a-b").child(text("10")))
                .child(elem("a").child(text("1")))
                .child(elem("b").child(text("2"))),
        )
        .build();
    let r = Compiler::<SimpleNode>::new()
        .compile("/r")
        .unwrap()
        .eval_node_set(Some(&document), None)
        .unwrap()
        .remove(0);
    let eval = |expr: &str| {
        Compiler::<SimpleNode>::new()
            .compile(expr)
            .expect(expr)
            .eval_number(Some(&r), None)
            .expect(expr)
    };
    // "a-b" is one name; subtraction needs whitespace
    assert_eq!(eval("number(a-b)"), 10.0);
    assert_eq!(eval("a - b"), -1.0);
}

#[rstest]
#[case("5", 5.0)]
#[case("12.5", 12.5)]
#[case(".5", 0.5)]
#[case("12.", 12.0)]
#[case("-3", -3.0)]
fn number_literals(#[case] expr: &str, #[case] expected: f64) {
    let got = Compiler::<SimpleNode>::new()
        .compile(expr)
        .expect(expr)
        .eval_number(None, None)
        .expect(expr);
    assert_eq!(got, expected, "{expr}");
}

#[rstest]
fn string_literals_accept_both_quotes() {
    let eval = |expr: &str| {
        Compiler::<SimpleNode>::new()
            .compile(expr)
            .expect(expr)
            .eval_string(None, None)
            .expect(expr)
    };
    assert_eq!(eval("'double \" inside'"), "double \" inside");
    assert_eq!(eval("\"single ' inside\""), "single ' inside");
    assert_eq!(eval("''"), "");
}

#[rstest]
fn abbreviations_desugar() {
    let document = doc()
        .child(
            elem("r")
                .attr(attr("id", "r1"))
                .child(elem("x").child(elem("y").child(text("deep")))),
        )
        .build();
    let compiler = Compiler::<SimpleNode>::new();
    let eval_count = |expr: &str| {
        compiler
            .compile(expr)
            .expect(expr)
            .eval_number(Some(&document), None)
            .expect(expr)
    };
    assert_eq!(eval_count("count(//y)"), 1.0);
    assert_eq!(
        eval_count("count(/descendant-or-self::node()/child::y)"),
        1.0
    );
    assert_eq!(eval_count("count(//x//y)"), 1.0);
    assert_eq!(eval_count("count(/r/@id)"), 1.0);
    assert_eq!(eval_count("count(/r/attribute::id)"), 1.0);
    assert_eq!(eval_count("count(/r/x/y/../..//y)"), 1.0);
    assert_eq!(eval_count("count(/r/x/./y)"), 1.0);
}

#[rstest]
fn whitespace_is_insignificant() {
    let document = doc().child(elem("a").child(elem("b"))).build();
    let compiler = Compiler::<SimpleNode>::new();
    for expr in ["/a/b", " /a/b ", "/ a / b", "/a\n\t/b"] {
        let ns = compiler
            .compile(expr)
            .expect(expr)
            .eval_node_set(Some(&document), None)
            .expect(expr);
        assert_eq!(ns.len(), 1, "{expr:?}");
    }
}

#[rstest]
fn axis_keywords_need_the_double_colon() {
    // "self" without "::" is an ordinary element name
    let document = doc().child(elem("self").child(elem("p"))).build();
    let ns = Compiler::<SimpleNode>::new()
        .compile("/self/p")
        .unwrap()
        .eval_node_set(Some(&document), None)
        .unwrap();
    assert_eq!(ns.len(), 1);
}

#[rstest]
fn function_name_versus_kind_test() {
    // node()/text()/comment()/processing-instruction() are kind tests, not
    // function calls; other names followed by parens are functions
    let document = doc().child(elem("a").child(text("x"))).build();
    let compiler = Compiler::<SimpleNode>::new();
    assert_eq!(
        compiler
            .compile("count(/a/node())")
            .unwrap()
            .eval_number(Some(&document), None)
            .unwrap(),
        1.0
    );
    assert!(compiler.compile("node('x')").is_err()); // kind test takes no literal
    assert!(compiler.compile("text(1)").is_err());
}

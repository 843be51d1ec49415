use rstest::rstest;

use xpath1::{Compiler, SimpleNode};

fn eval_string(expr: &str) -> String {
    Compiler::<SimpleNode>::new()
        .compile(expr)
        .expect(expr)
        .eval_string(None, None)
        .expect(expr)
}

fn eval_bool(expr: &str) -> bool {
    Compiler::<SimpleNode>::new()
        .compile(expr)
        .expect(expr)
        .eval_boolean(None, None)
        .expect(expr)
}

fn eval_number(expr: &str) -> f64 {
    Compiler::<SimpleNode>::new()
        .compile(expr)
        .expect(expr)
        .eval_number(None, None)
        .expect(expr)
}

#[rstest]
#[case("concat('one', ':', 'two')", "one:two")]
#[case("concat('a', 'b', 'c', 'd', 'e')", "abcde")]
#[case("concat('x', 1 + 1)", "x2")]
fn concat_is_variadic(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(eval_string(expr), expected, "{expr}");
}

#[rstest]
#[case("starts-with('haystack', 'hay')", true)]
#[case("starts-with('haystack', 'stack')", false)]
#[case("starts-with('anything', '')", true)]
#[case("ends-with('haystack', 'stack')", true)]
#[case("ends-with('haystack', 'hay')", false)]
#[case("contains('haystack', 'yst')", true)]
#[case("contains('haystack', 'needle')", false)]
#[case("contains('haystack', '')", true)]
fn substring_predicates(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expr), expected, "{expr}");
}

#[rstest]
#[case("substring-before('1999/04/01', '/')", "1999")]
#[case("substring-after('1999/04/01', '/')", "04/01")]
#[case("substring-before('abc', 'x')", "")]
#[case("substring-after('abc', 'x')", "")]
#[case("substring-after('abc', '')", "abc")]
fn substring_before_after(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(eval_string(expr), expected, "{expr}");
}

// the W3C examples for substring's edge cases
#[rstest]
#[case("substring('12345', 2, 3)", "234")]
#[case("substring('12345', 2)", "2345")]
#[case("substring('12345', 1.5, 2.6)", "234")]
#[case("substring('12345', 0, 3)", "12")]
#[case("substring('12345', 0 div 0, 3)", "")]
#[case("substring('12345', 1, 0 div 0)", "")]
#[case("substring('12345', -42, 1 div 0)", "12345")]
#[case("substring('12345', -1 div 0, 1 div 0)", "")]
#[case("substring('12345', 6)", "")]
#[case("substring('', 1)", "")]
fn substring_edge_cases(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(eval_string(expr), expected, "{expr}");
}

#[rstest]
#[case("normalize-space('  a  b ')", "a b")]
#[case("normalize-space('\t one \r\n two \t')", "one two")]
#[case("normalize-space('solo')", "solo")]
#[case("normalize-space('')", "")]
#[case("normalize-space('   ')", "")]
fn normalize_space_collapses_whitespace(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(eval_string(expr), expected, "{expr}");
}

#[rstest]
#[case("translate('bar', 'abc', 'ABC')", "BAr")]
#[case("translate('--aaa--', 'abc-', 'ABC')", "AAA")]
#[case("translate('abcabc', 'aba', 'xy')", "xycxyc")] // first mapping of 'a' wins
#[case("translate('keep', '', 'xyz')", "keep")]
fn translate_remaps_code_points(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(eval_string(expr), expected, "{expr}");
}

#[rstest]
fn string_length_counts_code_points() {
    assert_eq!(eval_number("string-length('hello')"), 5.0);
    assert_eq!(eval_number("string-length('')"), 0.0);
    assert_eq!(eval_number("string-length('héllo')"), 5.0);
    assert_eq!(eval_number("string-length('日本語')"), 3.0);
}

#[rstest]
fn unicode_safe_operations() {
    assert_eq!(eval_string("substring('日本語', 2, 1)"), "本");
    assert_eq!(eval_string("translate('日本語', '本', '中')"), "日中語");
    assert!(eval_bool("starts-with('日本語', '日')"));
}

#[rstest]
fn string_functions_use_context_when_argless() {
    use xpath1::simple_node::{doc, elem, text};
    let document = doc()
        .child(elem("r").child(text("  padded   value ")))
        .build();
    let compiler = Compiler::<SimpleNode>::new();
    let root = compiler
        .compile("/r")
        .unwrap()
        .eval_node_set(Some(&document), None)
        .unwrap()
        .remove(0);
    assert_eq!(
        compiler
            .compile("normalize-space()")
            .unwrap()
            .eval_string(Some(&root), None)
            .unwrap(),
        "padded value"
    );
    assert_eq!(
        compiler
            .compile("string-length()")
            .unwrap()
            .eval_number(Some(&root), None)
            .unwrap(),
        17.0
    );
}

#[rstest]
fn string_conversion_of_values() {
    assert_eq!(eval_string("string(12)"), "12");
    assert_eq!(eval_string("string(12.5)"), "12.5");
    assert_eq!(eval_string("string(true())"), "true");
    assert_eq!(eval_string("string(1 div 0)"), "Infinity");
    assert_eq!(eval_string("string(-1 div 0)"), "-Infinity");
    assert_eq!(eval_string("string(0 div 0)"), "NaN");
}

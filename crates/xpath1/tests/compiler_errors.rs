use std::sync::Arc;

use rstest::rstest;

use xpath1::{
    Arg, Compiler, DataType, Error, Function, FunctionMap, Signature, SimpleNode, Value,
};

fn compile_err(expr: &str) -> Error {
    Compiler::<SimpleNode>::new().compile(expr).unwrap_err()
}

#[rstest]
#[case("")]
#[case("developer/")]
#[case("1 +")]
#[case("a b")]
#[case("//")]
#[case("$")]
#[case("foo(")]
#[case("a[")]
#[case("'unterminated")]
#[case("a::b")]
fn parse_errors(#[case] expr: &str) {
    match compile_err(expr) {
        Error::Parse(_) => {}
        other => panic!("{expr}: expected parse error, got {other:?}"),
    }
}

#[rstest]
#[case("foo:bar")]
#[case("$foo:v")]
#[case("foo:fn()")]
#[case("child::foo:*")]
fn unresolved_prefixes(#[case] expr: &str) {
    assert_eq!(compile_err(expr), Error::UnresolvedPrefix("foo".to_string()));
}

#[rstest]
fn unresolved_function() {
    assert_eq!(
        compile_err("nosuch()"),
        Error::UnresolvedFunction("nosuch".to_string())
    );
    // user functions live under their Clark name
    assert_eq!(
        Compiler::<SimpleNode>::new()
            .with_namespace("u", "urn:u")
            .compile("u:missing()")
            .unwrap_err(),
        Error::UnresolvedFunction("{urn:u}missing".to_string())
    );
}

#[rstest]
#[case("concat('a')", "concat")]
#[case("true(1)", "true")]
#[case("not()", "not")]
#[case("boolean()", "boolean")]
#[case("substring('a')", "substring")]
#[case("substring('a', 1, 2, 3)", "substring")]
#[case("translate('a', 'b')", "translate")]
fn wrong_argument_counts(#[case] expr: &str, #[case] name: &str) {
    assert_eq!(compile_err(expr), Error::ArgCount(name.to_string()));
}

#[rstest]
fn invalid_user_signature() {
    let mut fns = FunctionMap::new();
    fns.insert(
        "broken".to_string(),
        Function::new(
            DataType::String,
            Signature::from([
                Arg::optional(DataType::String),
                Arg::mandatory(DataType::String),
            ]),
            |_args: &[Value<SimpleNode>]| Ok(Value::String(String::new())),
        ),
    );
    let err = Compiler::new()
        .with_functions(Arc::new(fns))
        .compile("broken('a', 'b')")
        .unwrap_err();
    assert_eq!(err, Error::Signature("broken".to_string()));
}

#[rstest]
#[case("count('x')", DataType::String)]
#[case("count(1)", DataType::Number)]
#[case("sum(true())", DataType::Boolean)]
fn node_set_arguments_reject_values(#[case] expr: &str, #[case] from: DataType) {
    assert_eq!(
        compile_err(expr),
        Error::Conversion {
            from,
            to: DataType::NodeSet
        }
    );
}

#[rstest]
fn union_requires_node_sets() {
    assert_eq!(
        compile_err("'a' | //x"),
        Error::Conversion {
            from: DataType::String,
            to: DataType::NodeSet
        }
    );
    assert_eq!(
        compile_err("//x | 1"),
        Error::Conversion {
            from: DataType::Number,
            to: DataType::NodeSet
        }
    );
}

#[rstest]
fn filters_require_node_sets() {
    assert_eq!(
        compile_err("(1 + 2)[1]"),
        Error::Conversion {
            from: DataType::Number,
            to: DataType::NodeSet
        }
    );
    assert_eq!(
        compile_err("('a')/b"),
        Error::Conversion {
            from: DataType::String,
            to: DataType::NodeSet
        }
    );
}

#[rstest]
fn errors_render_their_subject() {
    assert_eq!(
        compile_err("nosuch()").to_string(),
        "unresolved function: nosuch"
    );
    assert_eq!(
        compile_err("foo:bar").to_string(),
        "unresolved prefix: foo"
    );
    assert_eq!(
        compile_err("count(1)").to_string(),
        "cannot convert number to node-set"
    );
}

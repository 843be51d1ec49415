use std::sync::Arc;

use xpath1::simple_node::{doc, elem, text};
use xpath1::{
    clark_name, Arg, Compiler, DataType, Error, Function, FunctionMap, Signature, SimpleNode,
    Value, VariableMap,
};

fn main() -> Result<(), Error> {
    let document = doc()
        .child(
            elem("developer")
                .child(elem("name").child(text("Santhosh Kumar Tekuri")))
                .child(elem("email").child(text("santhosh.tekuri@gmail.com"))),
        )
        .build();

    let compiler = Compiler::<SimpleNode>::new();
    let expr = compiler.compile("/developer/name")?;
    println!("xpath {} returns value of type {}", expr, expr.return_type());
    println!("Result: {}", expr.eval_string(Some(&document), None)?);

    // Variables, by Clark name.
    let uri = "www.jroller.com/santhosh/";
    let compiler = Compiler::<SimpleNode>::new().with_namespace("ns", uri);
    let expr = compiler.compile("$v1 + $v2 * $ns:v3 - $ns:v4")?;
    let mut vars = VariableMap::new();
    vars.insert("v1".to_string(), Value::Number(2.0));
    vars.insert("v2".to_string(), Value::Number(3.0));
    vars.insert(clark_name(uri, "v3"), Value::Number(4.0));
    vars.insert(clark_name(uri, "v4"), Value::Number(1.0));
    println!("Result: {}", expr.eval_number(None, Some(&vars))?);

    // A user function with a variadic signature.
    let mut functions = FunctionMap::new();
    functions.insert(
        clark_name(uri, "join"),
        Function::new(
            DataType::String,
            Signature::from([
                Arg::mandatory(DataType::String),
                Arg::variadic(DataType::String),
            ]),
            |args: &[Value<SimpleNode>]| {
                let sep = args[0].string_value();
                let parts: Vec<String> = args[1..].iter().map(Value::string_value).collect();
                Ok(Value::String(parts.join(&sep)))
            },
        ),
    );
    let compiler = Compiler::new()
        .with_namespace("x", uri)
        .with_functions(Arc::new(functions));
    let expr = compiler.compile("x:join(':', 'one', 'two', 'three')")?;
    println!("Result: {}", expr.eval_string(None, None)?);

    Ok(())
}

//! An XPath 1.0 expression engine.
//!
//! Expressions compile once into an immutable, thread-safe [`XPath`] object
//! and evaluate against any DOM implementing [`XmlNode`], producing a
//! node-set, string, number or boolean [`Value`].
//!
//! ```
//! use xpath1::simple_node::{doc, elem, text};
//! use xpath1::{Compiler, DataType, SimpleNode};
//!
//! let document = doc()
//!     .child(
//!         elem("developer")
//!             .child(elem("name").child(text("Santhosh Kumar Tekuri")))
//!             .child(elem("email").child(text("santhosh.tekuri@gmail.com"))),
//!     )
//!     .build();
//!
//! let compiler = Compiler::<SimpleNode>::new();
//! let expr = compiler.compile("/developer/name").unwrap();
//! assert_eq!(expr.return_type(), DataType::NodeSet);
//! assert_eq!(
//!     expr.eval_string(Some(&document), None).unwrap(),
//!     "Santhosh Kumar Tekuri"
//! );
//! ```

pub mod compiler;
mod engine;
pub mod model;
pub mod parser;
pub mod runtime;
pub mod simple_node;
pub mod value;

pub use compiler::Compiler;
pub use engine::functions::{Arg, Cardinality, Function, FunctionImpl, Signature};
pub use model::{NodeKind, QName, XmlNode, XML_NAMESPACE_URI};
pub use runtime::{Error, FunctionMap, Functions, VariableMap, Variables, XPath};
pub use simple_node::SimpleNode;
pub use value::{clark_name, node_string_value, DataType, Value};

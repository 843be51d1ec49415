//! Errors, evaluation context, binding hooks and the compiled expression
//! surface.

use std::collections::HashMap;
use std::fmt;

use crate::engine::Expr;
use crate::model::XmlNode;
use crate::value::{DataType, Value};

/// Everything that can go wrong compiling or evaluating an expression.
///
/// Compile-time: `Parse`, `UnresolvedPrefix`, `UnresolvedFunction`,
/// `Signature`, `ArgCount` and `Conversion` (a statically typed slot fed an
/// expression that cannot be converted). Evaluation-time:
/// `UnresolvedVariable`, `VarMustBeNodeSet`, `MissingContextNode`, and
/// `Conversion` again from [`XPath::eval_node_set`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Parse(String),
    #[error("unresolved prefix: {0}")]
    UnresolvedPrefix(String),
    #[error("unresolved function: {0}")]
    UnresolvedFunction(String),
    #[error("function {0} has invalid argument signature")]
    Signature(String),
    #[error("wrong number of args to function {0}")]
    ArgCount(String),
    #[error("cannot convert {from} to {to}")]
    Conversion { from: DataType, to: DataType },
    #[error("unresolved variable: {0}")]
    UnresolvedVariable(String),
    #[error("variable {0} must evaluate to node-set")]
    VarMustBeNodeSet(String),
    #[error("expression requires a context node")]
    MissingContextNode,
}

/// Variable bindings consulted during evaluation, keyed by Clark name.
/// A binding must not change for the duration of a single evaluation.
pub trait Variables<N: XmlNode>: Send + Sync {
    /// Returns the value bound to the variable, or `None` if unbound
    /// (which surfaces as [`Error::UnresolvedVariable`]).
    fn get(&self, name: &str) -> Option<Value<N>>;
}

/// Map-backed [`Variables`] implementation.
pub type VariableMap<N> = HashMap<String, Value<N>>;

impl<N: XmlNode> Variables<N> for VariableMap<N> {
    fn get(&self, name: &str) -> Option<Value<N>> {
        HashMap::get(self, name).cloned()
    }
}

/// User function bindings consulted during compilation, keyed by Clark
/// name. Core functions cannot be overridden: they are looked up first.
pub trait Functions<N: XmlNode>: Send + Sync {
    fn resolve(&self, name: &str) -> Option<&crate::engine::functions::Function<N>>;
}

/// Map-backed [`Functions`] implementation.
pub type FunctionMap<N> = HashMap<String, crate::engine::functions::Function<N>>;

impl<N: XmlNode> Functions<N> for FunctionMap<N> {
    fn resolve(&self, name: &str) -> Option<&crate::engine::functions::Function<N>> {
        HashMap::get(self, name)
    }
}

/// Evaluation context threaded through the tree: the current node, the
/// 1-based position and cardinality of the node-set being filtered, and the
/// variable bindings.
pub(crate) struct Context<'a, N: XmlNode> {
    pub(crate) node: Option<N>,
    pub(crate) position: usize,
    pub(crate) size: usize,
    pub(crate) vars: Option<&'a dyn Variables<N>>,
}

impl<N: XmlNode> Context<'_, N> {
    /// Context for evaluating static expressions and folding literals.
    pub(crate) fn null() -> Self {
        Context {
            node: None,
            position: 0,
            size: 0,
            vars: None,
        }
    }
}

/// A compiled XPath 1.0 expression.
///
/// Immutable after compilation and safe to evaluate concurrently from many
/// threads; each evaluation allocates its own transient state.
pub struct XPath<N: XmlNode> {
    source: String,
    expr: Expr<N>,
}

impl<N: XmlNode> XPath<N> {
    pub(crate) fn new(source: String, expr: Expr<N>) -> Self {
        XPath { source, expr }
    }

    /// The source text this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Static type of every value this expression can evaluate to.
    /// [`DataType::Unknown`] means any of the four.
    pub fn return_type(&self) -> DataType {
        self.expr.return_type()
    }

    /// True iff simplification reduced the whole expression to a literal;
    /// a static expression evaluates to the same value in every context and
    /// accepts `None` for both the node and the variables.
    pub fn is_static(&self) -> bool {
        self.expr.is_literal()
    }

    /// Evaluates against `node` with the given variable bindings.
    pub fn eval(
        &self,
        node: Option<&N>,
        vars: Option<&dyn Variables<N>>,
    ) -> Result<Value<N>, Error> {
        let ctx = Context {
            node: node.cloned(),
            position: 0,
            size: 1,
            vars,
        };
        self.expr.evaluate(&ctx)
    }

    /// Evaluates and converts the result to a string.
    pub fn eval_string(
        &self,
        node: Option<&N>,
        vars: Option<&dyn Variables<N>>,
    ) -> Result<String, Error> {
        Ok(self.eval(node, vars)?.string_value())
    }

    /// Evaluates and converts the result to a number.
    pub fn eval_number(
        &self,
        node: Option<&N>,
        vars: Option<&dyn Variables<N>>,
    ) -> Result<f64, Error> {
        Ok(self.eval(node, vars)?.number_value())
    }

    /// Evaluates and converts the result to a boolean.
    pub fn eval_boolean(
        &self,
        node: Option<&N>,
        vars: Option<&dyn Variables<N>>,
    ) -> Result<bool, Error> {
        Ok(self.eval(node, vars)?.boolean_value())
    }

    /// Evaluates to a node-set; any other result type is a
    /// [`Error::Conversion`], node-sets never convert from values.
    pub fn eval_node_set(
        &self,
        node: Option<&N>,
        vars: Option<&dyn Variables<N>>,
    ) -> Result<Vec<N>, Error> {
        match self.return_type() {
            DataType::NodeSet | DataType::Unknown => match self.eval(node, vars)? {
                Value::Nodes(ns) => Ok(ns),
                other => Err(Error::Conversion {
                    from: other.data_type(),
                    to: DataType::NodeSet,
                }),
            },
            from => Err(Error::Conversion {
                from,
                to: DataType::NodeSet,
            }),
        }
    }
}

impl<N: XmlNode> fmt::Display for XPath<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl<N: XmlNode> fmt::Debug for XPath<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XPath")
            .field("source", &self.source)
            .field("returns", &self.return_type())
            .finish()
    }
}

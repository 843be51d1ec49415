//! Syntax tree produced by the parser and consumed by the compiler.
//!
//! Abbreviations (`//`, `.`, `..`, `@`) are already desugared here: the
//! compiler only ever sees explicit axes and node tests.

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Literal(String),
    VarRef {
        prefix: Option<String>,
        local: String,
    },
    FunctionCall {
        prefix: Option<String>,
        local: String,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Negate(Box<Expr>),
    Path(LocationPath),
    /// A primary expression filtered by predicates, optionally continued by
    /// a relative location path (`$nodes[1]/child::a`).
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        path: Option<LocationPath>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Div,
    Mod,
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Union,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    pub(crate) fn kind_test(axis: Axis, node_test: NodeTest) -> Self {
        Step {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    Parent,
    Ancestor,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
    Namespace,
    SelfAxis,
    DescendantOrSelf,
    AncestorOrSelf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// `node()`
    Node,
    /// `text()`
    Text,
    /// `comment()`
    Comment,
    /// `processing-instruction()` with an optional target
    Pi(Option<String>),
    /// A name test: `*`, `prefix:*`, `local` or `prefix:local`.
    /// A wildcard is represented by `local == "*"`.
    Name {
        prefix: Option<String>,
        local: String,
    },
}

//! The evaluator tree.
//!
//! The compiler lowers the syntax tree into this closed sum type. Every
//! variant carries a static return type; implicit conversions are explicit
//! wrapper nodes, which keeps evaluation free of type dispatch and lets
//! simplification fold whole chains over literals.

use std::collections::HashSet;

use crate::model::{root_of, NodeKind, XmlNode};
use crate::runtime::{Context, Error};
use crate::value::{node_string_value, node_number_value, DataType, Value};

pub(crate) mod axes;
pub(crate) mod functions;
pub(crate) mod order;

use axes::{axis_iter, Axis};
use functions::numeric::round_xpath;
use functions::{nodes as node_fns, strings, FunctionImpl};
use order::sort_document_order;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Div,
    Mod,
}

impl ArithOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Subtract => a - b,
            ArithOp::Multiply => a * b,
            ArithOp::Div => a / b,
            ArithOp::Mod => a % b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl RelOp {
    fn apply(self, a: f64, b: f64) -> bool {
        match self {
            RelOp::Lt => a < b,
            RelOp::Lte => a <= b,
            RelOp::Gt => a > b,
            RelOp::Gte => a >= b,
        }
    }
}

pub(crate) enum Expr<N: XmlNode> {
    Number(f64),
    String(String),
    Boolean(bool),
    /// The context node as a singleton node-set.
    Context,
    AsString(Box<Expr<N>>),
    AsNumber(Box<Expr<N>>),
    AsBoolean(Box<Expr<N>>),
    Negate(Box<Expr<N>>),
    Arithmetic {
        op: ArithOp,
        lhs: Box<Expr<N>>,
        rhs: Box<Expr<N>>,
    },
    /// `and`/`or`: evaluates `lhs` and short-circuits when it equals
    /// `skip` (false for `and`, true for `or`).
    Logical {
        skip: bool,
        lhs: Box<Expr<N>>,
        rhs: Box<Expr<N>>,
    },
    Equality {
        negated: bool,
        lhs: Box<Expr<N>>,
        rhs: Box<Expr<N>>,
    },
    Relational {
        op: RelOp,
        lhs: Box<Expr<N>>,
        rhs: Box<Expr<N>>,
    },
    Union {
        lhs: Box<Expr<N>>,
        rhs: Box<Expr<N>>,
    },
    Path(LocationPath<N>),
    Filter {
        primary: Box<Expr<N>>,
        predicates: Vec<Expr<N>>,
    },
    FilterPath {
        filter: Box<Expr<N>>,
        path: LocationPath<N>,
    },
    Variable {
        name: String,
        returns: DataType,
    },
    Call {
        returns: DataType,
        target: CallTarget<N>,
        args: Vec<Expr<N>>,
    },
}

pub(crate) enum CallTarget<N: XmlNode> {
    Position,
    Last,
    Count,
    Sum,
    Floor,
    Ceiling,
    Round,
    Name,
    LocalName,
    NamespaceUri,
    NormalizeSpace,
    StringLength,
    StartsWith,
    EndsWith,
    Contains,
    Concat,
    Translate,
    Substring,
    SubstringBefore,
    SubstringAfter,
    Not,
    Lang,
    User(FunctionImpl<N>),
}

pub(crate) struct LocationPath<N: XmlNode> {
    pub(crate) absolute: bool,
    pub(crate) steps: Vec<Step<N>>,
}

pub(crate) struct Step<N: XmlNode> {
    pub(crate) axis: Axis,
    pub(crate) test: NodeTest,
    pub(crate) predicates: Vec<Expr<N>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeTest {
    AnyNode,
    Kind(NodeKind),
    Pi(Option<String>),
    /// `prefix:*` on an axis whose principal node kind is `kind`.
    NamespaceWildcard { kind: NodeKind, uri: String },
    Name {
        kind: NodeKind,
        uri: Option<String>,
        local: String,
    },
    /// A name test on the namespace axis matches the bound prefix.
    NamespacePrefix {
        uri: Option<String>,
        prefix: String,
    },
}

impl NodeTest {
    pub(crate) fn matches<N: XmlNode>(&self, n: &N) -> bool {
        match self {
            NodeTest::AnyNode => true,
            NodeTest::Kind(k) => n.kind() == *k,
            NodeTest::Pi(target) => {
                n.kind() == NodeKind::ProcessingInstruction
                    && match target {
                        Some(t) => n.name().map(|q| q.local == *t).unwrap_or(false),
                        None => true,
                    }
            }
            NodeTest::NamespaceWildcard { kind, uri } => {
                n.kind() == *kind
                    && n.name()
                        .map(|q| q.uri.as_deref() == Some(uri.as_str()))
                        .unwrap_or(false)
            }
            NodeTest::Name { kind, uri, local } => {
                n.kind() == *kind
                    && n.name()
                        .map(|q| q.uri == *uri && q.local == *local)
                        .unwrap_or(false)
            }
            NodeTest::NamespacePrefix { uri, prefix } => {
                n.kind() == NodeKind::Namespace
                    && uri.is_none()
                    && n.name().map(|q| q.local == *prefix).unwrap_or(false)
            }
        }
    }
}

impl<N: XmlNode> Expr<N> {
    pub(crate) fn return_type(&self) -> DataType {
        match self {
            Expr::Number(_) | Expr::AsNumber(_) | Expr::Negate(_) | Expr::Arithmetic { .. } => {
                DataType::Number
            }
            Expr::String(_) | Expr::AsString(_) => DataType::String,
            Expr::Boolean(_)
            | Expr::AsBoolean(_)
            | Expr::Logical { .. }
            | Expr::Equality { .. }
            | Expr::Relational { .. } => DataType::Boolean,
            Expr::Context
            | Expr::Union { .. }
            | Expr::Path(_)
            | Expr::Filter { .. }
            | Expr::FilterPath { .. } => DataType::NodeSet,
            Expr::Variable { returns, .. } => *returns,
            Expr::Call { returns, .. } => *returns,
        }
    }

    pub(crate) fn is_literal(&self) -> bool {
        matches!(self, Expr::Number(_) | Expr::String(_) | Expr::Boolean(_))
    }

    pub(crate) fn evaluate(&self, ctx: &Context<N>) -> Result<Value<N>, Error> {
        match self {
            Expr::Number(x) => Ok(Value::Number(*x)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Context => {
                let n = ctx.node.clone().ok_or(Error::MissingContextNode)?;
                Ok(Value::Nodes(vec![n]))
            }
            Expr::AsString(e) => Ok(Value::String(e.evaluate(ctx)?.string_value())),
            Expr::AsNumber(e) => Ok(Value::Number(e.evaluate(ctx)?.number_value())),
            Expr::AsBoolean(e) => Ok(Value::Boolean(e.evaluate(ctx)?.boolean_value())),
            Expr::Negate(e) => Ok(Value::Number(-e.evaluate(ctx)?.number_value())),
            Expr::Arithmetic { op, lhs, rhs } => {
                let a = lhs.evaluate(ctx)?.number_value();
                let b = rhs.evaluate(ctx)?.number_value();
                Ok(Value::Number(op.apply(a, b)))
            }
            Expr::Logical { skip, lhs, rhs } => {
                if lhs.evaluate(ctx)?.boolean_value() == *skip {
                    return Ok(Value::Boolean(*skip));
                }
                Ok(Value::Boolean(rhs.evaluate(ctx)?.boolean_value()))
            }
            Expr::Equality { negated, lhs, rhs } => {
                let l = lhs.evaluate(ctx)?;
                let r = rhs.evaluate(ctx)?;
                Ok(Value::Boolean(eval_equality(*negated, l, r)))
            }
            Expr::Relational { op, lhs, rhs } => {
                let l = lhs.evaluate(ctx)?;
                let r = rhs.evaluate(ctx)?;
                Ok(Value::Boolean(eval_relational(*op, l, r)))
            }
            Expr::Union { lhs, rhs } => {
                let l = into_nodes(lhs.evaluate(ctx)?)?;
                let r = into_nodes(rhs.evaluate(ctx)?)?;
                Ok(Value::Nodes(merge_union(l, r)))
            }
            Expr::Path(path) => path.evaluate(ctx),
            Expr::Filter {
                primary,
                predicates,
            } => {
                let ns = into_nodes(primary.evaluate(ctx)?)?;
                Ok(Value::Nodes(eval_predicates(predicates, ns, ctx)?))
            }
            Expr::FilterPath { filter, path } => {
                let ns = into_nodes(filter.evaluate(ctx)?)?;
                path.evaluate_with(ns, ctx)
            }
            Expr::Variable { name, returns } => {
                let vars = ctx
                    .vars
                    .ok_or_else(|| Error::UnresolvedVariable(name.clone()))?;
                let v = vars
                    .get(name)
                    .ok_or_else(|| Error::UnresolvedVariable(name.clone()))?;
                if *returns == DataType::NodeSet && v.data_type() != DataType::NodeSet {
                    return Err(Error::VarMustBeNodeSet(name.clone()));
                }
                Ok(v)
            }
            Expr::Call { target, args, .. } => {
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(a.evaluate(ctx)?);
                }
                eval_call(target, &values, ctx)
            }
        }
    }

    /// Folds every sub-expression whose children are all literals and whose
    /// evaluation does not consult the context. Logical operators
    /// additionally collapse around a literal operand.
    pub(crate) fn simplify(self) -> Expr<N> {
        match self {
            Expr::Number(_)
            | Expr::String(_)
            | Expr::Boolean(_)
            | Expr::Context
            | Expr::Variable { .. } => self,
            Expr::AsString(e) => simplify_unary(Expr::AsString, *e),
            Expr::AsNumber(e) => simplify_unary(Expr::AsNumber, *e),
            Expr::AsBoolean(e) => simplify_unary(Expr::AsBoolean, *e),
            Expr::Negate(e) => simplify_unary(Expr::Negate, *e),
            Expr::Arithmetic { op, lhs, rhs } => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                let foldable = lhs.is_literal() && rhs.is_literal();
                let e = Expr::Arithmetic {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                if foldable {
                    fold(e)
                } else {
                    e
                }
            }
            Expr::Logical { skip, lhs, rhs } => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                if let Expr::Boolean(b) = lhs {
                    return if b == skip { Expr::Boolean(skip) } else { rhs };
                }
                if let Expr::Boolean(b) = rhs {
                    return if b == skip { Expr::Boolean(skip) } else { lhs };
                }
                Expr::Logical {
                    skip,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
            Expr::Equality { negated, lhs, rhs } => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                let foldable = lhs.is_literal() && rhs.is_literal();
                let e = Expr::Equality {
                    negated,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                if foldable {
                    fold(e)
                } else {
                    e
                }
            }
            Expr::Relational { op, lhs, rhs } => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                // A literal that converts to NaN decides the comparison
                // regardless of the other side.
                if literal_nan(&lhs) || literal_nan(&rhs) {
                    return Expr::Boolean(false);
                }
                let foldable = lhs.is_literal() && rhs.is_literal();
                let e = Expr::Relational {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                if foldable {
                    fold(e)
                } else {
                    e
                }
            }
            Expr::Union { lhs, rhs } => Expr::Union {
                lhs: Box::new(lhs.simplify()),
                rhs: Box::new(rhs.simplify()),
            },
            Expr::Path(path) => Expr::Path(simplify_path(path)),
            Expr::Filter {
                primary,
                predicates,
            } => Expr::Filter {
                primary: Box::new(primary.simplify()),
                predicates: predicates.into_iter().map(Expr::simplify).collect(),
            },
            Expr::FilterPath { filter, path } => Expr::FilterPath {
                filter: Box::new(filter.simplify()),
                path: simplify_path(path),
            },
            Expr::Call {
                returns,
                target,
                args,
            } => {
                let args: Vec<_> = args.into_iter().map(Expr::simplify).collect();
                let context_dependent = matches!(
                    target,
                    CallTarget::Position | CallTarget::Last | CallTarget::Lang
                );
                let foldable =
                    !context_dependent && args.iter().all(Expr::is_literal);
                let e = Expr::Call {
                    returns,
                    target,
                    args,
                };
                if foldable {
                    fold(e)
                } else {
                    e
                }
            }
        }
    }
}

fn literal_nan<N: XmlNode>(e: &Expr<N>) -> bool {
    match e {
        Expr::Number(x) => x.is_nan(),
        Expr::String(s) => crate::value::parse_number(s).is_nan(),
        _ => false,
    }
}

fn simplify_unary<N: XmlNode>(
    wrap: fn(Box<Expr<N>>) -> Expr<N>,
    inner: Expr<N>,
) -> Expr<N> {
    let inner = inner.simplify();
    let foldable = inner.is_literal();
    let e = wrap(Box::new(inner));
    if foldable {
        fold(e)
    } else {
        e
    }
}

fn simplify_path<N: XmlNode>(mut path: LocationPath<N>) -> LocationPath<N> {
    for step in &mut path.steps {
        let predicates = std::mem::take(&mut step.predicates);
        step.predicates = predicates.into_iter().map(Expr::simplify).collect();
    }
    path
}

/// Evaluates a pure expression over literals in a null context and replaces
/// it with the resulting literal. Left untouched if evaluation fails or
/// yields a node-set (neither can happen for the callers' inputs).
fn fold<N: XmlNode>(e: Expr<N>) -> Expr<N> {
    match e.evaluate(&Context::null()) {
        Ok(Value::Number(x)) => Expr::Number(x),
        Ok(Value::String(s)) => Expr::String(s),
        Ok(Value::Boolean(b)) => Expr::Boolean(b),
        _ => e,
    }
}

impl<N: XmlNode> LocationPath<N> {
    pub(crate) fn evaluate(&self, ctx: &Context<N>) -> Result<Value<N>, Error> {
        let context_node = ctx.node.clone().ok_or(Error::MissingContextNode)?;
        let start = if self.absolute {
            root_of(&context_node)
        } else {
            context_node
        };
        self.evaluate_with(vec![start], ctx)
    }

    pub(crate) fn evaluate_with(
        &self,
        mut ns: Vec<N>,
        ctx: &Context<N>,
    ) -> Result<Value<N>, Error> {
        let order_required = ns.len() > 1 || self.steps.len() > 1;
        for step in &self.steps {
            ns = eval_step(step, &ns, ctx)?;
        }
        if order_required {
            sort_document_order(&mut ns);
        }
        Ok(Value::Nodes(ns))
    }
}

fn eval_step<N: XmlNode>(
    step: &Step<N>,
    input: &[N],
    ctx: &Context<N>,
) -> Result<Vec<N>, Error> {
    let mut out = Vec::new();
    let mut seen: HashSet<N> = HashSet::new();
    for context_node in input {
        let mut matched = Vec::new();
        for n in axis_iter(step.axis, context_node) {
            if step.test.matches(&n) && seen.insert(n.clone()) {
                matched.push(n);
            }
        }
        let matched = eval_predicates(&step.predicates, matched, ctx)?;
        out.extend(matched);
    }
    if step.axis.is_reverse() {
        out.reverse();
    }
    Ok(out)
}

/// Applies predicates left to right. Within one predicate pass the input
/// order is preserved; positions are 1-based along the axis direction. A
/// numeric predicate value selects by position.
fn eval_predicates<N: XmlNode>(
    predicates: &[Expr<N>],
    mut ns: Vec<N>,
    ctx: &Context<N>,
) -> Result<Vec<N>, Error> {
    for predicate in predicates {
        let size = ns.len();
        let mut kept = Vec::new();
        for (idx, n) in ns.into_iter().enumerate() {
            let sub = Context {
                node: Some(n.clone()),
                position: idx + 1,
                size,
                vars: ctx.vars,
            };
            let value = predicate.evaluate(&sub)?;
            let keep = match value {
                Value::Number(x) => (idx + 1) as f64 == round_xpath(x),
                other => other.boolean_value(),
            };
            if keep {
                kept.push(n);
            }
        }
        ns = kept;
    }
    Ok(ns)
}

fn into_nodes<N: XmlNode>(v: Value<N>) -> Result<Vec<N>, Error> {
    match v {
        Value::Nodes(ns) => Ok(ns),
        other => Err(Error::Conversion {
            from: other.data_type(),
            to: DataType::NodeSet,
        }),
    }
}

fn merge_union<N: XmlNode>(lhs: Vec<N>, rhs: Vec<N>) -> Vec<N> {
    if lhs.is_empty() {
        return rhs;
    }
    if rhs.is_empty() {
        return lhs;
    }
    let mut seen: HashSet<N> = lhs.iter().cloned().collect();
    let mut out = lhs;
    for n in rhs {
        if seen.insert(n.clone()) {
            out.push(n);
        }
    }
    sort_document_order(&mut out);
    out
}

fn apply_eq<T: PartialEq>(negated: bool, a: T, b: T) -> bool {
    (a == b) != negated
}

fn eval_equality<N: XmlNode>(negated: bool, lhs: Value<N>, rhs: Value<N>) -> bool {
    match (&lhs, &rhs) {
        (Value::Nodes(a), Value::Nodes(b)) => {
            for n1 in a {
                let s1 = node_string_value(n1);
                for n2 in b {
                    if apply_eq(negated, s1.as_str(), node_string_value(n2).as_str()) {
                        return true;
                    }
                }
            }
            false
        }
        (Value::Nodes(ns), other) | (other, Value::Nodes(ns)) => match other {
            Value::Boolean(b) => apply_eq(negated, *b, !ns.is_empty()),
            Value::Number(x) => ns
                .iter()
                .any(|n| apply_eq(negated, *x, node_number_value(n))),
            _ => {
                let s = other.string_value();
                ns.iter()
                    .any(|n| apply_eq(negated, s.as_str(), node_string_value(n).as_str()))
            }
        },
        _ => {
            if lhs.data_type() == DataType::Boolean || rhs.data_type() == DataType::Boolean {
                apply_eq(negated, lhs.boolean_value(), rhs.boolean_value())
            } else if lhs.data_type() == DataType::Number
                || rhs.data_type() == DataType::Number
            {
                apply_eq(negated, lhs.number_value(), rhs.number_value())
            } else {
                apply_eq(negated, lhs.string_value(), rhs.string_value())
            }
        }
    }
}

/// Relational comparison converts through numbers; a NaN on the value side
/// of a node-set comparison makes the whole comparison false.
fn eval_relational<N: XmlNode>(op: RelOp, lhs: Value<N>, rhs: Value<N>) -> bool {
    match (&lhs, &rhs) {
        (Value::Nodes(a), Value::Nodes(b)) => {
            for n1 in a {
                let v1 = node_number_value(n1);
                if v1.is_nan() {
                    continue;
                }
                for n2 in b {
                    if op.apply(v1, node_number_value(n2)) {
                        return true;
                    }
                }
            }
            false
        }
        (Value::Nodes(ns), other) => {
            let r = other.number_value();
            !r.is_nan() && ns.iter().any(|n| op.apply(node_number_value(n), r))
        }
        (other, Value::Nodes(ns)) => {
            let l = other.number_value();
            !l.is_nan() && ns.iter().any(|n| op.apply(l, node_number_value(n)))
        }
        _ => op.apply(lhs.number_value(), rhs.number_value()),
    }
}

fn eval_call<N: XmlNode>(
    target: &CallTarget<N>,
    args: &[Value<N>],
    ctx: &Context<N>,
) -> Result<Value<N>, Error> {
    match target {
        CallTarget::Position => Ok(Value::Number(ctx.position as f64)),
        CallTarget::Last => Ok(Value::Number(ctx.size as f64)),
        CallTarget::Count => Ok(Value::Number(arg_nodes(args, 0)?.len() as f64)),
        CallTarget::Sum => {
            let total = arg_nodes(args, 0)?
                .iter()
                .map(node_number_value)
                .sum::<f64>();
            Ok(Value::Number(total))
        }
        CallTarget::Floor => Ok(Value::Number(arg_number(args, 0).floor())),
        CallTarget::Ceiling => Ok(Value::Number(arg_number(args, 0).ceil())),
        CallTarget::Round => Ok(Value::Number(round_xpath(arg_number(args, 0)))),
        CallTarget::Name => Ok(Value::String(node_fns::qualified_name(
            &arg_nodes(args, 0)?,
        ))),
        CallTarget::LocalName => {
            Ok(Value::String(node_fns::local_name(&arg_nodes(args, 0)?)))
        }
        CallTarget::NamespaceUri => {
            Ok(Value::String(node_fns::namespace_uri(&arg_nodes(args, 0)?)))
        }
        CallTarget::NormalizeSpace => {
            Ok(Value::String(strings::normalize_space(&arg_string(args, 0))))
        }
        CallTarget::StringLength => {
            Ok(Value::Number(arg_string(args, 0).chars().count() as f64))
        }
        CallTarget::StartsWith => Ok(Value::Boolean(
            arg_string(args, 0).starts_with(&arg_string(args, 1)),
        )),
        CallTarget::EndsWith => Ok(Value::Boolean(
            arg_string(args, 0).ends_with(&arg_string(args, 1)),
        )),
        CallTarget::Contains => Ok(Value::Boolean(
            arg_string(args, 0).contains(&arg_string(args, 1)),
        )),
        CallTarget::Concat => {
            let mut out = String::new();
            for v in args {
                out.push_str(&v.string_value());
            }
            Ok(Value::String(out))
        }
        CallTarget::Translate => Ok(Value::String(strings::translate(
            &arg_string(args, 0),
            &arg_string(args, 1),
            &arg_string(args, 2),
        ))),
        CallTarget::Substring => {
            let length = args.get(2).map(|v| v.number_value());
            Ok(Value::String(strings::substring(
                &arg_string(args, 0),
                arg_number(args, 1),
                length,
            )))
        }
        CallTarget::SubstringBefore => Ok(Value::String(strings::substring_before(
            &arg_string(args, 0),
            &arg_string(args, 1),
        ))),
        CallTarget::SubstringAfter => Ok(Value::String(strings::substring_after(
            &arg_string(args, 0),
            &arg_string(args, 1),
        ))),
        CallTarget::Not => Ok(Value::Boolean(!arg_boolean(args, 0))),
        CallTarget::Lang => {
            let node = ctx.node.clone().ok_or(Error::MissingContextNode)?;
            Ok(Value::Boolean(node_fns::lang_matches(
                &node,
                &arg_string(args, 0),
            )))
        }
        CallTarget::User(implementation) => implementation(args),
    }
}

fn arg_string<N: XmlNode>(args: &[Value<N>], i: usize) -> String {
    args.get(i).map(Value::string_value).unwrap_or_default()
}

fn arg_number<N: XmlNode>(args: &[Value<N>], i: usize) -> f64 {
    args.get(i).map(Value::number_value).unwrap_or(f64::NAN)
}

fn arg_boolean<N: XmlNode>(args: &[Value<N>], i: usize) -> bool {
    args.get(i).map(Value::boolean_value).unwrap_or(false)
}

fn arg_nodes<N: XmlNode>(args: &[Value<N>], i: usize) -> Result<Vec<N>, Error> {
    match args.get(i) {
        Some(Value::Nodes(ns)) => Ok(ns.clone()),
        Some(other) => Err(Error::Conversion {
            from: other.data_type(),
            to: DataType::NodeSet,
        }),
        None => Ok(Vec::new()),
    }
}

//! Compiles a parsed syntax tree into the evaluator tree: resolves
//! prefixes, binds variables and functions, inserts conversion wrappers and
//! runs static simplification.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::axes::Axis;
use crate::engine::functions::{core_library, CoreFn, Function, FunctionKind};
use crate::engine::{ArithOp, CallTarget, Expr, LocationPath, NodeTest, RelOp, Step};
use crate::model::{NodeKind, XmlNode};
use crate::parser::{self, ast};
use crate::runtime::{Error, Functions, XPath};
use crate::value::{clark_name, DataType};

/// XPath 1.0 expression compiler: a configuration holder binding namespace
/// prefixes and user functions. Compiled expressions outlive the compiler.
pub struct Compiler<N: XmlNode> {
    namespaces: HashMap<String, String>,
    functions: Option<Arc<dyn Functions<N>>>,
    core: HashMap<&'static str, Function<N>>,
}

impl<N: XmlNode> Default for Compiler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: XmlNode> Compiler<N> {
    pub fn new() -> Self {
        Compiler {
            namespaces: HashMap::new(),
            functions: None,
            core: core_library(),
        }
    }

    /// Binds `prefix` to `uri` for name tests, variables and function
    /// names. The empty prefix always resolves to the empty URI and cannot
    /// be rebound; an attempt is ignored.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.namespaces.insert(prefix, uri.into());
        }
        self
    }

    pub fn with_namespaces<P, U>(mut self, bindings: impl IntoIterator<Item = (P, U)>) -> Self
    where
        P: Into<String>,
        U: Into<String>,
    {
        for (prefix, uri) in bindings {
            self = self.with_namespace(prefix, uri);
        }
        self
    }

    /// Registers the user function lookup hook, keyed by Clark name.
    pub fn with_functions(mut self, functions: Arc<dyn Functions<N>>) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Compiles an XPath 1.0 expression. Prefixes and function names are
    /// resolved now; variable values are looked up at evaluation time.
    pub fn compile(&self, source: &str) -> Result<XPath<N>, Error> {
        let ast = parser::parse(source)?;
        let expr = self.lower(&ast)?;
        Ok(XPath::new(source.to_string(), expr.simplify()))
    }

    fn resolve_prefix(&self, prefix: Option<&str>) -> Result<String, Error> {
        match prefix {
            None | Some("") => Ok(String::new()),
            Some(p) => self
                .namespaces
                .get(p)
                .cloned()
                .ok_or_else(|| Error::UnresolvedPrefix(p.to_string())),
        }
    }

    fn lower(&self, e: &ast::Expr) -> Result<Expr<N>, Error> {
        match e {
            ast::Expr::Number(x) => Ok(Expr::Number(*x)),
            ast::Expr::Literal(s) => Ok(Expr::String(s.clone())),
            ast::Expr::VarRef { prefix, local } => {
                let uri = self.resolve_prefix(prefix.as_deref())?;
                Ok(Expr::Variable {
                    name: clark_name(&uri, local),
                    returns: DataType::Unknown,
                })
            }
            ast::Expr::Negate(inner) => {
                Ok(Expr::Negate(Box::new(as_number(self.lower(inner)?))))
            }
            ast::Expr::Binary { op, lhs, rhs } => {
                let lhs = self.lower(lhs)?;
                let rhs = self.lower(rhs)?;
                self.lower_binary(*op, lhs, rhs)
            }
            ast::Expr::Path(path) => Ok(Expr::Path(self.lower_path(path)?)),
            ast::Expr::Filter {
                primary,
                predicates,
                path,
            } => {
                let primary = as_node_set(self.lower(primary)?)?;
                let filter = if predicates.is_empty() {
                    primary
                } else {
                    Expr::Filter {
                        primary: Box::new(primary),
                        predicates: self.lower_predicates(predicates)?,
                    }
                };
                match path {
                    None => Ok(filter),
                    Some(path) => Ok(Expr::FilterPath {
                        filter: Box::new(filter),
                        path: self.lower_path(path)?,
                    }),
                }
            }
            ast::Expr::FunctionCall {
                prefix,
                local,
                args,
            } => self.lower_call(prefix.as_deref(), local, args),
        }
    }

    fn lower_binary(
        &self,
        op: ast::BinaryOp,
        lhs: Expr<N>,
        rhs: Expr<N>,
    ) -> Result<Expr<N>, Error> {
        use ast::BinaryOp::*;
        let arith = |op, lhs, rhs| Expr::Arithmetic {
            op,
            lhs: Box::new(as_number(lhs)),
            rhs: Box::new(as_number(rhs)),
        };
        let relational = |op, lhs: Expr<N>, rhs: Expr<N>| Expr::Relational {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        Ok(match op {
            Add => arith(ArithOp::Add, lhs, rhs),
            Subtract => arith(ArithOp::Subtract, lhs, rhs),
            Multiply => arith(ArithOp::Multiply, lhs, rhs),
            Div => arith(ArithOp::Div, lhs, rhs),
            Mod => arith(ArithOp::Mod, lhs, rhs),
            And => Expr::Logical {
                skip: false,
                lhs: Box::new(as_boolean(lhs)),
                rhs: Box::new(as_boolean(rhs)),
            },
            Or => Expr::Logical {
                skip: true,
                lhs: Box::new(as_boolean(lhs)),
                rhs: Box::new(as_boolean(rhs)),
            },
            Eq => Expr::Equality {
                negated: false,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Neq => Expr::Equality {
                negated: true,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Lt => relational(RelOp::Lt, lhs, rhs),
            Lte => relational(RelOp::Lte, lhs, rhs),
            Gt => relational(RelOp::Gt, lhs, rhs),
            Gte => relational(RelOp::Gte, lhs, rhs),
            Union => Expr::Union {
                lhs: Box::new(as_node_set(lhs)?),
                rhs: Box::new(as_node_set(rhs)?),
            },
        })
    }

    fn lower_path(&self, path: &ast::LocationPath) -> Result<LocationPath<N>, Error> {
        let mut steps = Vec::with_capacity(path.steps.len());
        for step in &path.steps {
            let axis = lower_axis(step.axis);
            steps.push(Step {
                axis,
                test: self.lower_node_test(axis, &step.node_test)?,
                predicates: self.lower_predicates(&step.predicates)?,
            });
        }
        Ok(LocationPath {
            absolute: path.absolute,
            steps,
        })
    }

    fn lower_predicates(&self, predicates: &[ast::Expr]) -> Result<Vec<Expr<N>>, Error> {
        predicates.iter().map(|p| self.lower(p)).collect()
    }

    fn lower_node_test(&self, axis: Axis, test: &ast::NodeTest) -> Result<NodeTest, Error> {
        match test {
            ast::NodeTest::Node => Ok(NodeTest::AnyNode),
            ast::NodeTest::Text => Ok(NodeTest::Kind(NodeKind::Text)),
            ast::NodeTest::Comment => Ok(NodeTest::Kind(NodeKind::Comment)),
            ast::NodeTest::Pi(target) => Ok(NodeTest::Pi(target.clone())),
            ast::NodeTest::Name { prefix, local } => {
                let uri = self.resolve_prefix(prefix.as_deref())?;
                let uri = if uri.is_empty() { None } else { Some(uri) };
                Ok(match axis {
                    Axis::Attribute => name_test(NodeKind::Attribute, uri, local),
                    Axis::Namespace => {
                        if prefix.is_none() && local == "*" {
                            NodeTest::AnyNode
                        } else {
                            NodeTest::NamespacePrefix {
                                uri,
                                prefix: local.clone(),
                            }
                        }
                    }
                    _ => name_test(NodeKind::Element, uri, local),
                })
            }
        }
    }

    fn lower_call(
        &self,
        prefix: Option<&str>,
        local: &str,
        args: &[ast::Expr],
    ) -> Result<Expr<N>, Error> {
        let uri = self.resolve_prefix(prefix)?;
        let name = clark_name(&uri, local);

        let function = match self.core.get(name.as_str()) {
            Some(f) => f,
            None => self
                .functions
                .as_ref()
                .and_then(|fns| fns.resolve(&name))
                .ok_or_else(|| Error::UnresolvedFunction(name.clone()))?,
        };

        if !function.args.is_valid() {
            return Err(Error::Signature(name));
        }
        if !function.args.accepts(args.len()) {
            return Err(Error::ArgCount(name));
        }

        let mut lowered = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let arg = self.lower(arg)?;
            lowered.push(match function.args.type_of(i) {
                DataType::Unknown => arg,
                DataType::NodeSet => as_node_set(arg)?,
                DataType::String => as_string(arg),
                DataType::Number => as_number(arg),
                DataType::Boolean => as_boolean(arg),
            });
        }

        Ok(match &function.kind {
            FunctionKind::Core(core) => build_core_call(*core, function.returns, lowered),
            FunctionKind::User(implementation) => Expr::Call {
                returns: function.returns,
                target: CallTarget::User(implementation.clone()),
                args: lowered,
            },
        })
    }
}

/// Conversion wrappers are identities when the static type already fits.
fn as_string<N: XmlNode>(e: Expr<N>) -> Expr<N> {
    if e.return_type() == DataType::String {
        e
    } else {
        Expr::AsString(Box::new(e))
    }
}

fn as_number<N: XmlNode>(e: Expr<N>) -> Expr<N> {
    if e.return_type() == DataType::Number {
        e
    } else {
        Expr::AsNumber(Box::new(e))
    }
}

fn as_boolean<N: XmlNode>(e: Expr<N>) -> Expr<N> {
    if e.return_type() == DataType::Boolean {
        e
    } else {
        Expr::AsBoolean(Box::new(e))
    }
}

/// There is no runtime conversion into node-sets: only an expression that
/// is statically a node-set qualifies. A variable of unknown type is
/// refined to node-set and checked when its value is fetched.
fn as_node_set<N: XmlNode>(e: Expr<N>) -> Result<Expr<N>, Error> {
    match e {
        Expr::Variable { name, .. } => Ok(Expr::Variable {
            name,
            returns: DataType::NodeSet,
        }),
        e if e.return_type() == DataType::NodeSet => Ok(e),
        e => Err(Error::Conversion {
            from: e.return_type(),
            to: DataType::NodeSet,
        }),
    }
}

fn lower_axis(axis: ast::Axis) -> Axis {
    match axis {
        ast::Axis::Child => Axis::Child,
        ast::Axis::Descendant => Axis::Descendant,
        ast::Axis::Parent => Axis::Parent,
        ast::Axis::Ancestor => Axis::Ancestor,
        ast::Axis::FollowingSibling => Axis::FollowingSibling,
        ast::Axis::PrecedingSibling => Axis::PrecedingSibling,
        ast::Axis::Following => Axis::Following,
        ast::Axis::Preceding => Axis::Preceding,
        ast::Axis::Attribute => Axis::Attribute,
        ast::Axis::Namespace => Axis::Namespace,
        ast::Axis::SelfAxis => Axis::SelfAxis,
        ast::Axis::DescendantOrSelf => Axis::DescendantOrSelf,
        ast::Axis::AncestorOrSelf => Axis::AncestorOrSelf,
    }
}

fn name_test(kind: NodeKind, uri: Option<String>, local: &str) -> NodeTest {
    match (local, uri) {
        ("*", None) => {
            if kind == NodeKind::Attribute {
                NodeTest::AnyNode
            } else {
                NodeTest::Kind(kind)
            }
        }
        ("*", Some(uri)) => NodeTest::NamespaceWildcard { kind, uri },
        (local, uri) => NodeTest::Name {
            kind,
            uri,
            local: local.to_string(),
        },
    }
}

/// Builds the evaluator node for a core function call, supplying the
/// context-node defaults for the optional-argument functions.
fn build_core_call<N: XmlNode>(
    core: CoreFn,
    returns: DataType,
    mut args: Vec<Expr<N>>,
) -> Expr<N> {
    let call = |target, args| Expr::Call {
        returns,
        target,
        args,
    };
    match core {
        CoreFn::String => {
            let arg = args.pop().unwrap_or(Expr::Context);
            Expr::AsString(Box::new(arg))
        }
        CoreFn::Number => {
            let arg = args.pop().unwrap_or(Expr::Context);
            Expr::AsNumber(Box::new(arg))
        }
        CoreFn::Boolean => {
            let arg = args.pop().unwrap_or(Expr::Context);
            Expr::AsBoolean(Box::new(arg))
        }
        CoreFn::True => Expr::Boolean(true),
        CoreFn::False => Expr::Boolean(false),
        CoreFn::Name | CoreFn::LocalName | CoreFn::NamespaceUri => {
            if args.is_empty() {
                args.push(Expr::Context);
            }
            let target = match core {
                CoreFn::Name => CallTarget::Name,
                CoreFn::LocalName => CallTarget::LocalName,
                _ => CallTarget::NamespaceUri,
            };
            call(target, args)
        }
        CoreFn::NormalizeSpace | CoreFn::StringLength => {
            if args.is_empty() {
                args.push(Expr::AsString(Box::new(Expr::Context)));
            }
            let target = match core {
                CoreFn::NormalizeSpace => CallTarget::NormalizeSpace,
                _ => CallTarget::StringLength,
            };
            call(target, args)
        }
        CoreFn::Position => call(CallTarget::Position, args),
        CoreFn::Last => call(CallTarget::Last, args),
        CoreFn::Count => call(CallTarget::Count, args),
        CoreFn::Sum => call(CallTarget::Sum, args),
        CoreFn::Floor => call(CallTarget::Floor, args),
        CoreFn::Ceiling => call(CallTarget::Ceiling, args),
        CoreFn::Round => call(CallTarget::Round, args),
        CoreFn::StartsWith => call(CallTarget::StartsWith, args),
        CoreFn::EndsWith => call(CallTarget::EndsWith, args),
        CoreFn::Contains => call(CallTarget::Contains, args),
        CoreFn::Concat => call(CallTarget::Concat, args),
        CoreFn::Translate => call(CallTarget::Translate, args),
        CoreFn::Substring => call(CallTarget::Substring, args),
        CoreFn::SubstringBefore => call(CallTarget::SubstringBefore, args),
        CoreFn::SubstringAfter => call(CallTarget::SubstringAfter, args),
        CoreFn::Not => call(CallTarget::Not, args),
        CoreFn::Lang => call(CallTarget::Lang, args),
    }
}

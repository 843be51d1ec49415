//! Function descriptors: argument signatures, the core library table and
//! the registration surface shared with user functions.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::XmlNode;
use crate::runtime::Error;
use crate::value::{DataType, Value};

pub(crate) mod nodes;
pub(crate) mod numeric;
pub(crate) mod strings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Cardinality {
    Mandatory,
    Optional,
    Variadic,
}

/// One entry of a function's argument signature: how often it may appear
/// and which type the compiler coerces the argument expression to.
/// `DataType::Unknown` declares a polymorphic slot that accepts any type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arg {
    pub cardinality: Cardinality,
    pub data_type: DataType,
}

impl Arg {
    pub fn mandatory(data_type: DataType) -> Self {
        Arg {
            cardinality: Cardinality::Mandatory,
            data_type,
        }
    }

    pub fn optional(data_type: DataType) -> Self {
        Arg {
            cardinality: Cardinality::Optional,
            data_type,
        }
    }

    pub fn variadic(data_type: DataType) -> Self {
        Arg {
            cardinality: Cardinality::Variadic,
            data_type,
        }
    }
}

/// An ordered argument signature.
///
/// A signature is valid iff cardinalities are monotone non-decreasing under
/// `Mandatory < Optional < Variadic` with at most one variadic entry, which
/// must come last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature(Vec<Arg>);

impl Signature {
    pub fn new(args: impl IntoIterator<Item = Arg>) -> Self {
        Signature(args.into_iter().collect())
    }

    pub(crate) fn is_valid(&self) -> bool {
        let mut prev = Cardinality::Mandatory;
        for (i, arg) in self.0.iter().enumerate() {
            if arg.cardinality < prev {
                return false;
            }
            if prev == Cardinality::Variadic {
                return false;
            }
            if arg.cardinality == Cardinality::Variadic && i != self.0.len() - 1 {
                return false;
            }
            prev = arg.cardinality;
        }
        true
    }

    pub(crate) fn accepts(&self, n: usize) -> bool {
        n >= self.mandatory_count() && (self.is_variadic() || n <= self.0.len())
    }

    /// Declared type of the i-th call argument; extra variadic arguments
    /// take the type of the final entry.
    pub(crate) fn type_of(&self, i: usize) -> DataType {
        match self.0.get(i).or_else(|| self.0.last()) {
            Some(arg) => arg.data_type,
            None => DataType::Unknown,
        }
    }

    fn mandatory_count(&self) -> usize {
        self.0
            .iter()
            .take_while(|a| a.cardinality == Cardinality::Mandatory)
            .count()
    }

    fn is_variadic(&self) -> bool {
        matches!(
            self.0.last(),
            Some(Arg {
                cardinality: Cardinality::Variadic,
                ..
            })
        )
    }
}

impl<const K: usize> From<[Arg; K]> for Signature {
    fn from(args: [Arg; K]) -> Self {
        Signature(args.to_vec())
    }
}

/// Implementation of a user-registered function: called with the already
/// coerced argument values, once per evaluation of the call site.
pub type FunctionImpl<N> =
    Arc<dyn Fn(&[Value<N>]) -> Result<Value<N>, Error> + Send + Sync>;

/// Everything the compiler needs about a callable function.
pub struct Function<N: XmlNode> {
    pub returns: DataType,
    pub args: Signature,
    pub(crate) kind: FunctionKind<N>,
}

impl<N: XmlNode> Function<N> {
    /// Describes a user function backed by `implementation`.
    pub fn new<F>(returns: DataType, args: impl Into<Signature>, implementation: F) -> Self
    where
        F: Fn(&[Value<N>]) -> Result<Value<N>, Error> + Send + Sync + 'static,
    {
        Function {
            returns,
            args: args.into(),
            kind: FunctionKind::User(Arc::new(implementation)),
        }
    }

    fn core(returns: DataType, args: Signature, id: CoreFn) -> Self {
        Function {
            returns,
            args,
            kind: FunctionKind::Core(id),
        }
    }
}

pub(crate) enum FunctionKind<N: XmlNode> {
    Core(CoreFn),
    User(FunctionImpl<N>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CoreFn {
    String,
    Number,
    Boolean,
    Name,
    LocalName,
    NamespaceUri,
    Position,
    Last,
    Count,
    Sum,
    Floor,
    Ceiling,
    Round,
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
    True,
    False,
    Not,
    Lang,
}

/// The XPath 1.0 core library, keyed by name (core names have no
/// namespace, so the Clark name is the local name).
pub(crate) fn core_library<N: XmlNode>() -> HashMap<&'static str, Function<N>> {
    use DataType::{Boolean, NodeSet, Number, String as Str, Unknown};

    let mut fns: HashMap<&'static str, Function<N>> = HashMap::new();
    let mut put = |name, f| {
        fns.insert(name, f);
    };

    put(
        "string",
        Function::core(Str, Signature::from([Arg::optional(Unknown)]), CoreFn::String),
    );
    put(
        "number",
        Function::core(Number, Signature::from([Arg::optional(Unknown)]), CoreFn::Number),
    );
    put(
        "boolean",
        Function::core(
            Boolean,
            Signature::from([Arg::mandatory(Unknown)]),
            CoreFn::Boolean,
        ),
    );
    put(
        "name",
        Function::core(Str, Signature::from([Arg::optional(NodeSet)]), CoreFn::Name),
    );
    put(
        "local-name",
        Function::core(
            Str,
            Signature::from([Arg::optional(NodeSet)]),
            CoreFn::LocalName,
        ),
    );
    put(
        "namespace-uri",
        Function::core(
            Str,
            Signature::from([Arg::optional(NodeSet)]),
            CoreFn::NamespaceUri,
        ),
    );
    put(
        "position",
        Function::core(Number, Signature::default(), CoreFn::Position),
    );
    put("last", Function::core(Number, Signature::default(), CoreFn::Last));
    put(
        "count",
        Function::core(Number, Signature::from([Arg::mandatory(NodeSet)]), CoreFn::Count),
    );
    put(
        "sum",
        Function::core(Number, Signature::from([Arg::mandatory(NodeSet)]), CoreFn::Sum),
    );
    put(
        "floor",
        Function::core(Number, Signature::from([Arg::mandatory(Number)]), CoreFn::Floor),
    );
    put(
        "ceiling",
        Function::core(
            Number,
            Signature::from([Arg::mandatory(Number)]),
            CoreFn::Ceiling,
        ),
    );
    put(
        "round",
        Function::core(Number, Signature::from([Arg::mandatory(Number)]), CoreFn::Round),
    );
    put(
        "normalize-space",
        Function::core(
            Str,
            Signature::from([Arg::optional(Str)]),
            CoreFn::NormalizeSpace,
        ),
    );
    put(
        "string-length",
        Function::core(
            Number,
            Signature::from([Arg::optional(Str)]),
            CoreFn::StringLength,
        ),
    );
    put(
        "starts-with",
        Function::core(
            Boolean,
            Signature::from([Arg::mandatory(Str), Arg::mandatory(Str)]),
            CoreFn::StartsWith,
        ),
    );
    put(
        "ends-with",
        Function::core(
            Boolean,
            Signature::from([Arg::mandatory(Str), Arg::mandatory(Str)]),
            CoreFn::EndsWith,
        ),
    );
    put(
        "contains",
        Function::core(
            Boolean,
            Signature::from([Arg::mandatory(Str), Arg::mandatory(Str)]),
            CoreFn::Contains,
        ),
    );
    put(
        "concat",
        Function::core(
            Str,
            Signature::from([
                Arg::mandatory(Str),
                Arg::mandatory(Str),
                Arg::variadic(Str),
            ]),
            CoreFn::Concat,
        ),
    );
    put(
        "translate",
        Function::core(
            Str,
            Signature::from([
                Arg::mandatory(Str),
                Arg::mandatory(Str),
                Arg::mandatory(Str),
            ]),
            CoreFn::Translate,
        ),
    );
    put(
        "substring",
        Function::core(
            Str,
            Signature::from([
                Arg::mandatory(Str),
                Arg::mandatory(Number),
                Arg::optional(Number),
            ]),
            CoreFn::Substring,
        ),
    );
    put(
        "substring-before",
        Function::core(
            Str,
            Signature::from([Arg::mandatory(Str), Arg::mandatory(Str)]),
            CoreFn::SubstringBefore,
        ),
    );
    put(
        "substring-after",
        Function::core(
            Str,
            Signature::from([Arg::mandatory(Str), Arg::mandatory(Str)]),
            CoreFn::SubstringAfter,
        ),
    );
    put("true", Function::core(Boolean, Signature::default(), CoreFn::True));
    put(
        "false",
        Function::core(Boolean, Signature::default(), CoreFn::False),
    );
    put(
        "not",
        Function::core(Boolean, Signature::from([Arg::mandatory(Boolean)]), CoreFn::Not),
    );
    put(
        "lang",
        Function::core(Boolean, Signature::from([Arg::mandatory(Str)]), CoreFn::Lang),
    );

    fns
}

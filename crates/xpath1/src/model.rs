//! The DOM abstraction consumed by the engine.
//!
//! The engine never owns a document; it traverses any tree that implements
//! [`XmlNode`]. Node identity is reference identity: two handles compare
//! equal iff they designate the same node, and `Hash` must agree with `Eq`.

use core::fmt;
use core::hash::Hash;

/// Namespace URI implicitly bound to the `xml` prefix on every element.
pub const XML_NAMESPACE_URI: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

/// A lexical QName together with its resolved namespace URI.
///
/// For processing instructions `local` is the target; for namespace nodes
/// `local` is the prefix being bound and `uri` the bound URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub uri: Option<String>,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        QName {
            prefix: None,
            local: local.into(),
            uri: None,
        }
    }

    /// The qualified `prefix:local` form, or bare `local` without a prefix.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local),
            None => self.local.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// A node handle in some DOM implementation.
///
/// Handles are expected to be cheap to clone (an `Arc` or an index into an
/// arena). The engine relies on:
///
/// * `parent()` returning the *XPath* parent: for attribute and namespace
///   nodes that is the owning element, even if the host DOM does not record
///   it as a structural parent;
/// * `children()` and `attributes()` preserving document order;
/// * `namespace_declarations()` listing only the element's own `xmlns`
///   declarations (not inherited ones) as `(prefix, uri)` pairs, with the
///   empty string as the prefix of a default-namespace declaration;
/// * `namespace_node()` materialising a namespace pseudo-node whose parent
///   is `self`; the engine calls it only on elements, while walking the
///   ancestor chain for the namespace axis.
pub trait XmlNode: Clone + PartialEq + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> NodeKind;

    /// The expanded name of an element or attribute, the target of a
    /// processing instruction, or the prefix of a namespace node. `None`
    /// for document, text and comment nodes.
    fn name(&self) -> Option<QName>;

    /// Raw character data: text/comment/PI content, an attribute's value,
    /// a namespace node's URI. Empty for elements and documents, whose
    /// string-value the engine derives from their text descendants.
    fn data(&self) -> String;

    fn parent(&self) -> Option<Self>;

    fn children(&self) -> Vec<Self>;

    fn attributes(&self) -> Vec<Self>;

    fn namespace_declarations(&self) -> Vec<(String, String)>;

    fn namespace_node(&self, prefix: &str, uri: &str) -> Self;

    fn find_attribute(&self, uri: Option<&str>, local: &str) -> Option<Self>;
}

/// Walks the parent chain to the topmost node, normally the document node.
pub(crate) fn root_of<N: XmlNode>(n: &N) -> N {
    let mut cur = n.clone();
    while let Some(p) = cur.parent() {
        cur = p;
    }
    cur
}

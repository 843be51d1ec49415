//! A small `Arc`-backed in-memory DOM implementing [`XmlNode`].
//!
//! Intended for tests, benches and quick prototypes; real applications are
//! expected to adapt their own tree. Identity is `Arc` pointer identity.
//!
//! ```
//! use xpath1::simple_node::{doc, elem, text};
//! use xpath1::{Compiler, SimpleNode};
//!
//! let document = doc()
//!     .child(elem("developer").child(elem("name").child(text("mitchell"))))
//!     .build();
//! let expr = Compiler::<SimpleNode>::new().compile("string(/developer/name)").unwrap();
//! assert_eq!(expr.eval_string(Some(&document), None).unwrap(), "mitchell");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock, Weak};

use crate::model::{NodeKind, QName, XmlNode};

#[derive(Debug)]
struct Inner {
    kind: NodeKind,
    name: Option<QName>,
    data: String,
    parent: RwLock<Option<Weak<Inner>>>,
    children: RwLock<Vec<SimpleNode>>,
    attributes: RwLock<Vec<SimpleNode>>,
    ns_decls: RwLock<Vec<(String, String)>>,
}

/// A node of the simple in-memory tree.
#[derive(Clone)]
pub struct SimpleNode(Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SimpleNode {}

impl Hash for SimpleNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0)).hash(state)
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("kind", &self.0.kind)
            .field("name", &self.0.name)
            .field("data", &self.0.data)
            .finish()
    }
}

impl SimpleNode {
    fn new(kind: NodeKind, name: Option<QName>, data: impl Into<String>) -> Self {
        SimpleNode(Arc::new(Inner {
            kind,
            name,
            data: data.into(),
            parent: RwLock::new(None),
            children: RwLock::new(Vec::new()),
            attributes: RwLock::new(Vec::new()),
            ns_decls: RwLock::new(Vec::new()),
        }))
    }

    fn set_parent(&self, parent: &SimpleNode) {
        if let Ok(mut p) = self.0.parent.write() {
            *p = Some(Arc::downgrade(&parent.0));
        }
    }
}

/// Builder for documents and elements; leaf nodes are built directly.
pub struct SimpleNodeBuilder {
    node: SimpleNode,
    children: Vec<SimpleNode>,
    attributes: Vec<SimpleNode>,
    ns_decls: Vec<(String, String)>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<QName>) -> Self {
        SimpleNodeBuilder {
            node: SimpleNode::new(kind, name, ""),
            children: Vec::new(),
            attributes: Vec::new(),
            ns_decls: Vec::new(),
        }
    }

    pub fn child(mut self, child: impl Into<NodeOrBuilder>) -> Self {
        self.children.push(child.into().build());
        self
    }

    pub fn attr(mut self, attr: SimpleNode) -> Self {
        debug_assert_eq!(attr.kind(), NodeKind::Attribute);
        self.attributes.push(attr);
        self
    }

    /// Records an `xmlns` declaration of this element. The empty prefix
    /// declares the default namespace; an empty URI un-declares the prefix.
    pub fn declare_ns(mut self, prefix: &str, uri: &str) -> Self {
        self.ns_decls.push((prefix.to_string(), uri.to_string()));
        self
    }

    pub fn build(self) -> SimpleNode {
        for c in &self.children {
            c.set_parent(&self.node);
        }
        for a in &self.attributes {
            a.set_parent(&self.node);
        }
        if let Ok(mut ch) = self.node.0.children.write() {
            *ch = self.children;
        }
        if let Ok(mut at) = self.node.0.attributes.write() {
            *at = self.attributes;
        }
        if let Ok(mut ns) = self.node.0.ns_decls.write() {
            *ns = self.ns_decls;
        }
        self.node
    }
}

pub enum NodeOrBuilder {
    Node(SimpleNode),
    Builder(SimpleNodeBuilder),
}

impl NodeOrBuilder {
    fn build(self) -> SimpleNode {
        match self {
            NodeOrBuilder::Node(n) => n,
            NodeOrBuilder::Builder(b) => b.build(),
        }
    }
}

impl From<SimpleNode> for NodeOrBuilder {
    fn from(n: SimpleNode) -> Self {
        NodeOrBuilder::Node(n)
    }
}

impl From<SimpleNodeBuilder> for NodeOrBuilder {
    fn from(b: SimpleNodeBuilder) -> Self {
        NodeOrBuilder::Builder(b)
    }
}

pub fn doc() -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Document, None)
}

pub fn elem(local: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Element, Some(QName::local(local)))
}

pub fn elem_ns(prefix: &str, local: &str, uri: &str) -> SimpleNodeBuilder {
    let prefix = if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    };
    SimpleNodeBuilder::new(
        NodeKind::Element,
        Some(QName {
            prefix,
            local: local.to_string(),
            uri: Some(uri.to_string()),
        }),
    )
}

pub fn attr(local: &str, value: &str) -> SimpleNode {
    SimpleNode::new(NodeKind::Attribute, Some(QName::local(local)), value)
}

pub fn attr_ns(prefix: &str, local: &str, uri: &str, value: &str) -> SimpleNode {
    SimpleNode::new(
        NodeKind::Attribute,
        Some(QName {
            prefix: Some(prefix.to_string()),
            local: local.to_string(),
            uri: Some(uri.to_string()),
        }),
        value,
    )
}

pub fn text(data: &str) -> SimpleNode {
    SimpleNode::new(NodeKind::Text, None, data)
}

pub fn comment(data: &str) -> SimpleNode {
    SimpleNode::new(NodeKind::Comment, None, data)
}

pub fn pi(target: &str, data: &str) -> SimpleNode {
    SimpleNode::new(NodeKind::ProcessingInstruction, Some(QName::local(target)), data)
}

impl XmlNode for SimpleNode {
    fn kind(&self) -> NodeKind {
        self.0.kind
    }

    fn name(&self) -> Option<QName> {
        self.0.name.clone()
    }

    fn data(&self) -> String {
        self.0.data.clone()
    }

    fn parent(&self) -> Option<Self> {
        self.0
            .parent
            .read()
            .ok()?
            .as_ref()
            .and_then(Weak::upgrade)
            .map(SimpleNode)
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.read().map(|v| v.clone()).unwrap_or_default()
    }

    fn attributes(&self) -> Vec<Self> {
        self.0
            .attributes
            .read()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    fn namespace_declarations(&self) -> Vec<(String, String)> {
        self.0.ns_decls.read().map(|v| v.clone()).unwrap_or_default()
    }

    fn namespace_node(&self, prefix: &str, uri: &str) -> Self {
        let ns = SimpleNode::new(
            NodeKind::Namespace,
            Some(QName {
                prefix: Some(prefix.to_string()),
                local: prefix.to_string(),
                uri: Some(uri.to_string()),
            }),
            uri,
        );
        ns.set_parent(self);
        ns
    }

    fn find_attribute(&self, uri: Option<&str>, local: &str) -> Option<Self> {
        self.attributes().into_iter().find(|a| {
            a.name()
                .map(|n| n.uri.as_deref() == uri && n.local == local)
                .unwrap_or(false)
        })
    }
}

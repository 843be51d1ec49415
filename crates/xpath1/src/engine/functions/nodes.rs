//! Behaviours of the node-set core functions.

use crate::model::{NodeKind, XmlNode, XML_NAMESPACE_URI};

/// `local-name()`: local part for elements and attributes, the target for a
/// processing instruction, the prefix for a namespace node.
pub(crate) fn local_name<N: XmlNode>(ns: &[N]) -> String {
    match ns.first() {
        Some(n) => match n.kind() {
            NodeKind::Element
            | NodeKind::Attribute
            | NodeKind::ProcessingInstruction
            | NodeKind::Namespace => n.name().map(|q| q.local).unwrap_or_default(),
            _ => String::new(),
        },
        None => String::new(),
    }
}

/// `name()`: qualified name for elements and attributes, otherwise the same
/// as `local-name()`.
pub(crate) fn qualified_name<N: XmlNode>(ns: &[N]) -> String {
    match ns.first() {
        Some(n) => match n.kind() {
            NodeKind::Element | NodeKind::Attribute => {
                n.name().map(|q| q.qualified()).unwrap_or_default()
            }
            NodeKind::ProcessingInstruction | NodeKind::Namespace => {
                n.name().map(|q| q.local).unwrap_or_default()
            }
            _ => String::new(),
        },
        None => String::new(),
    }
}

/// `namespace-uri()`: only elements and attributes carry one.
pub(crate) fn namespace_uri<N: XmlNode>(ns: &[N]) -> String {
    match ns.first() {
        Some(n) => match n.kind() {
            NodeKind::Element | NodeKind::Attribute => n
                .name()
                .and_then(|q| q.uri)
                .unwrap_or_default(),
            _ => String::new(),
        },
        None => String::new(),
    }
}

/// `lang()`: the nearest ancestor-or-self element carrying `xml:lang`
/// decides; the match is case-insensitive, either exact or a `lang-…`
/// sub-tag.
pub(crate) fn lang_matches<N: XmlNode>(context: &N, lang: &str) -> bool {
    let mut cur = if context.kind() == NodeKind::Element {
        Some(context.clone())
    } else {
        context.parent()
    };
    while let Some(e) = cur {
        if e.kind() != NodeKind::Element {
            break;
        }
        if let Some(attr) = e.find_attribute(Some(XML_NAMESPACE_URI), "lang") {
            let sublang = attr.data();
            if sublang.eq_ignore_ascii_case(lang) {
                return true;
            }
            return sublang.len() > lang.len()
                && sublang.is_char_boundary(lang.len())
                && sublang.as_bytes()[lang.len()] == b'-'
                && sublang[..lang.len()].eq_ignore_ascii_case(lang);
        }
        cur = e.parent();
    }
    false
}

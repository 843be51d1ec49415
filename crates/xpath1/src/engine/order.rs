//! Total document order over the nodes of one tree.
//!
//! Attribute and namespace nodes sort after their element's opening and
//! before its children; namespaces precede attributes of the same element.
//! XPath 1.0 leaves the mutual order of attributes implementation-defined;
//! ordering them by Clark name keeps the relation stable and total.

use core::cmp::Ordering;

use crate::model::{NodeKind, QName, XmlNode};
use crate::value::clark_name;

pub(crate) fn sort_document_order<N: XmlNode>(ns: &mut [N]) {
    ns.sort_by(document_order);
}

pub(crate) fn document_order<N: XmlNode>(a: &N, b: &N) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    if !is_child_node(a) && !is_child_node(b) {
        let (pa, pb) = (a.parent(), b.parent());
        if pa == pb {
            return cmp_owned(a, b);
        }
        return match (pa, pb) {
            (Some(pa), Some(pb)) => document_order(&pa, &pb),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
    }

    let (mut d1, mut d2) = (depth(a), depth(b));
    let (mut a1, mut a2) = (a.clone(), b.clone());
    while d1 > d2 {
        match a1.parent() {
            Some(p) => a1 = p,
            None => break,
        }
        d1 -= 1;
    }
    if a1 == *b {
        return Ordering::Greater; // b is an ancestor of a
    }
    while d2 > d1 {
        match a2.parent() {
            Some(p) => a2 = p,
            None => break,
        }
        d2 -= 1;
    }
    if a2 == *a {
        return Ordering::Less; // a is an ancestor of b
    }

    // Walk both up in lockstep until they become siblings.
    loop {
        let (p1, p2) = (a1.parent(), a2.parent());
        if p1 == p2 {
            return match p1 {
                Some(p) => cmp_siblings(&a1, &a2, &p),
                None => Ordering::Equal, // distinct roots; no order defined
            };
        }
        match (p1, p2) {
            (Some(p1), Some(p2)) => {
                a1 = p1;
                a2 = p2;
            }
            _ => return Ordering::Equal,
        }
    }
}

/// Two attribute/namespace nodes of the same element.
fn cmp_owned<N: XmlNode>(a: &N, b: &N) -> Ordering {
    let a_ns = a.kind() == NodeKind::Namespace;
    let b_ns = b.kind() == NodeKind::Namespace;
    match (a_ns, b_ns) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => name_of(a).local.cmp(&name_of(b).local),
        (false, false) => attr_key(a).cmp(&attr_key(b)),
    }
}

fn cmp_siblings<N: XmlNode>(s1: &N, s2: &N, parent: &N) -> Ordering {
    // Attributes and namespaces come before child nodes.
    if !is_child_node(s1) {
        return Ordering::Less;
    }
    if !is_child_node(s2) {
        return Ordering::Greater;
    }
    let children = parent.children();
    let i1 = children.iter().position(|c| c == s1);
    let i2 = children.iter().position(|c| c == s2);
    match (i1, i2) {
        (Some(i1), Some(i2)) => i1.cmp(&i2),
        _ => Ordering::Equal,
    }
}

fn is_child_node<N: XmlNode>(n: &N) -> bool {
    !matches!(n.kind(), NodeKind::Attribute | NodeKind::Namespace)
}

fn depth<N: XmlNode>(n: &N) -> usize {
    let mut d = 0;
    let mut cur = n.parent();
    while let Some(p) = cur {
        d += 1;
        cur = p.parent();
    }
    d
}

fn name_of<N: XmlNode>(n: &N) -> QName {
    n.name().unwrap_or_else(|| QName::local(""))
}

fn attr_key<N: XmlNode>(n: &N) -> String {
    let name = name_of(n);
    clark_name(name.uri.as_deref().unwrap_or(""), &name.local)
}

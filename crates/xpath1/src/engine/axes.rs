//! The 13 XPath axes as lazy iterators over a DOM.
//!
//! Reverse axes (`ancestor`, `ancestor-or-self`, `preceding`,
//! `preceding-sibling`) yield nodes in reverse document order; predicate
//! positions count along that direction, and the step reverses its
//! accumulated output afterwards.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::model::{NodeKind, XmlNode, XML_NAMESPACE_URI};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
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

impl Axis {
    pub(crate) fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

pub(crate) fn axis_iter<N: XmlNode>(axis: Axis, n: &N) -> AxisIter<N> {
    match axis {
        Axis::SelfAxis => AxisIter::Once(Some(n.clone())),
        Axis::Parent => AxisIter::Once(n.parent()),
        Axis::Child => AxisIter::Forward(n.children().into_iter()),
        Axis::Attribute => AxisIter::Forward(n.attributes().into_iter()),
        Axis::Namespace => AxisIter::Forward(namespace_nodes(n).into_iter()),
        Axis::FollowingSibling => AxisIter::Forward(following_siblings(n)),
        Axis::PrecedingSibling => AxisIter::Backward(preceding_siblings(n)),
        Axis::Ancestor => AxisIter::Ancestors(AncestorIter { cur: n.parent() }),
        Axis::AncestorOrSelf => AxisIter::Ancestors(AncestorIter {
            cur: Some(n.clone()),
        }),
        Axis::Descendant => AxisIter::Descendants(DescendantIter::below(n)),
        Axis::DescendantOrSelf => AxisIter::Descendants(DescendantIter::at(n)),
        Axis::Following => AxisIter::Following(FollowingIter {
            ancestors: AncestorIter {
                cur: Some(n.clone()),
            },
            siblings: Vec::new().into_iter(),
            subtree: None,
        }),
        Axis::Preceding => AxisIter::Preceding(PrecedingIter {
            ancestors: AncestorIter {
                cur: Some(n.clone()),
            },
            siblings: RevIter::empty(),
            span: RevIter::empty(),
            stack: Vec::new(),
        }),
    }
}

pub(crate) enum AxisIter<N: XmlNode> {
    Once(Option<N>),
    Forward(std::vec::IntoIter<N>),
    Backward(RevIter<N>),
    Ancestors(AncestorIter<N>),
    Descendants(DescendantIter<N>),
    Following(FollowingIter<N>),
    Preceding(PrecedingIter<N>),
}

impl<N: XmlNode> Iterator for AxisIter<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        match self {
            AxisIter::Once(n) => n.take(),
            AxisIter::Forward(it) => it.next(),
            AxisIter::Backward(it) => it.next(),
            AxisIter::Ancestors(it) => it.next(),
            AxisIter::Descendants(it) => it.next(),
            AxisIter::Following(it) => it.next(),
            AxisIter::Preceding(it) => it.next(),
        }
    }
}

fn following_siblings<N: XmlNode>(n: &N) -> std::vec::IntoIter<N> {
    if let Some(p) = n.parent() {
        let siblings = p.children();
        if let Some(idx) = siblings.iter().position(|c| c == n) {
            let mut rest = siblings;
            rest.drain(..=idx);
            return rest.into_iter();
        }
    }
    Vec::new().into_iter()
}

fn preceding_siblings<N: XmlNode>(n: &N) -> RevIter<N> {
    if let Some(p) = n.parent() {
        let siblings = p.children();
        if let Some(idx) = siblings.iter().position(|c| c == n) {
            return RevIter::new_until(siblings, idx);
        }
    }
    RevIter::empty()
}

/// Iterates a vector from index `i` downwards.
pub(crate) struct RevIter<N> {
    arr: Vec<N>,
    next: Option<usize>,
}

impl<N: Clone> RevIter<N> {
    fn empty() -> Self {
        RevIter {
            arr: Vec::new(),
            next: None,
        }
    }

    /// Yields `arr[idx-1]`, `arr[idx-2]`, …, `arr[0]`.
    fn new_until(arr: Vec<N>, idx: usize) -> Self {
        RevIter {
            arr,
            next: idx.checked_sub(1),
        }
    }

    /// Yields all of `arr` from the last element down.
    fn new(arr: Vec<N>) -> Self {
        let next = arr.len().checked_sub(1);
        RevIter { arr, next }
    }

    fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn next(&mut self) -> Option<N> {
        let i = self.next?;
        self.next = i.checked_sub(1);
        self.arr.get(i).cloned()
    }
}

pub(crate) struct AncestorIter<N: XmlNode> {
    cur: Option<N>,
}

impl<N: XmlNode> AncestorIter<N> {
    fn next(&mut self) -> Option<N> {
        let n = self.cur.take()?;
        self.cur = n.parent();
        Some(n)
    }
}

/// Pre-order descendant traversal driven by an explicit stack of child
/// iterators, keeping memory at O(depth).
pub(crate) struct DescendantIter<N: XmlNode> {
    stack: SmallVec<[Frame<N>; 8]>,
    cur: Frame<N>,
}

enum Frame<N> {
    Once(Option<N>),
    Children(std::vec::IntoIter<N>),
}

impl<N: Clone> Frame<N> {
    fn next(&mut self) -> Option<N> {
        match self {
            Frame::Once(n) => n.take(),
            Frame::Children(it) => it.next(),
        }
    }
}

impl<N: XmlNode> DescendantIter<N> {
    fn below(n: &N) -> Self {
        DescendantIter {
            stack: SmallVec::new(),
            cur: Frame::Children(n.children().into_iter()),
        }
    }

    fn at(n: &N) -> Self {
        DescendantIter {
            stack: SmallVec::new(),
            cur: Frame::Once(Some(n.clone())),
        }
    }

    fn next(&mut self) -> Option<N> {
        loop {
            if let Some(n) = self.cur.next() {
                let parent_frame =
                    std::mem::replace(&mut self.cur, Frame::Children(n.children().into_iter()));
                self.stack.push(parent_frame);
                return Some(n);
            }
            match self.stack.pop() {
                Some(frame) => self.cur = frame,
                None => return None,
            }
        }
    }
}

/// Nodes after the context node in document order, excluding descendants,
/// attributes and namespaces: for each ancestor-or-self, every following
/// sibling's subtree in document order.
pub(crate) struct FollowingIter<N: XmlNode> {
    ancestors: AncestorIter<N>,
    siblings: std::vec::IntoIter<N>,
    subtree: Option<DescendantIter<N>>,
}

impl<N: XmlNode> FollowingIter<N> {
    fn next(&mut self) -> Option<N> {
        loop {
            if let Some(subtree) = &mut self.subtree {
                if let Some(n) = subtree.next() {
                    return Some(n);
                }
            }
            loop {
                if let Some(sib) = self.siblings.next() {
                    self.subtree = Some(DescendantIter::at(&sib));
                    break;
                }
                let ancestor = self.ancestors.next()?;
                if ancestor.kind() == NodeKind::Document {
                    return None;
                }
                self.siblings = following_siblings(&ancestor);
            }
        }
    }
}

/// Nodes before the context node, excluding ancestors, attributes and
/// namespaces, in *reverse* document order: for each ancestor-or-self,
/// every preceding sibling's subtree right-to-left, children before their
/// parent.
pub(crate) struct PrecedingIter<N: XmlNode> {
    ancestors: AncestorIter<N>,
    siblings: RevIter<N>,
    span: RevIter<N>,
    stack: Vec<RevIter<N>>,
}

impl<N: XmlNode> PrecedingIter<N> {
    fn next(&mut self) -> Option<N> {
        loop {
            match self.span.next() {
                None => {
                    if let Some(resumed) = self.stack.pop() {
                        self.span = resumed;
                        continue;
                    }
                    let sibling = loop {
                        if let Some(s) = self.siblings.next() {
                            break s;
                        }
                        let ancestor = self.ancestors.next()?;
                        self.siblings = preceding_siblings(&ancestor);
                    };
                    self.span = children_or_self(&sibling);
                }
                Some(n) => {
                    // While the span still holds earlier entries, `n` is not
                    // the subtree root yet: descend before emitting it.
                    if self.span.has_next() {
                        let outer = std::mem::replace(&mut self.span, children_or_self(&n));
                        self.stack.push(outer);
                        continue;
                    }
                    return Some(n);
                }
            }
        }
    }
}

/// `[self, child1, …, childK]` iterated backwards, so the node itself comes
/// out after its children.
fn children_or_self<N: XmlNode>(n: &N) -> RevIter<N> {
    let mut arr = vec![n.clone()];
    arr.extend(n.children());
    RevIter::new(arr)
}

/// In-scope namespace nodes of an element: the implicit `xml` binding plus
/// every declaration on the element or an ancestor, nearest declaration of
/// each prefix winning. All pseudo-nodes are owned by the context element.
/// A prefix re-declared to the empty URI is out of scope and yields no node.
fn namespace_nodes<N: XmlNode>(n: &N) -> Vec<N> {
    if n.kind() != NodeKind::Element {
        return Vec::new();
    }
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert("xml".to_string());
    let mut out = vec![n.namespace_node("xml", XML_NAMESPACE_URI)];
    let mut cur = Some(n.clone());
    while let Some(e) = cur {
        if e.kind() != NodeKind::Element {
            break;
        }
        for (prefix, uri) in e.namespace_declarations() {
            if seen.insert(prefix.clone()) && !uri.is_empty() {
                out.push(n.namespace_node(&prefix, &uri));
            }
        }
        cur = e.parent();
    }
    out
}

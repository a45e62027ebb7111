//! In-memory document implementing [`Dom`].
//!
//! Elements carry a tag, an optional id, classes and text. Selectors support
//! `tag`, `#id`, `.class`, compounds such as `button.primary` and the
//! descendant combinator. `template` elements hold inert content: `select`
//! does not look inside them and [`Dom::instantiate`] deep-copies it.
//!
//! Nodes live in an append-only arena. Detached nodes and the copies made by
//! every template render are never freed, so memory grows with each
//! re-render. Fine for tests and headless runs, not for long-lived documents.

use crate::domain::ports::{Dom, Listener, ListenerId};
use crate::utils::error::{CarpeError, Result};
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct MemoryEvent {
    pub kind: String,
    /// Node the event was dispatched on.
    pub target: NodeId,
    /// Node the listener matched: the bound node, or the delegated match.
    pub current_target: NodeId,
}

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Subscription {
    id: ListenerId,
    node: NodeId,
    event: String,
    selector: Option<Vec<Compound>>,
    listener: Listener<MemoryEvent>,
}

#[derive(Default)]
struct Document {
    nodes: Vec<NodeData>,
    subscriptions: Vec<Subscription>,
    next_listener: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

fn parse_compound(text: &str) -> Compound {
    fn flush(kind: Option<char>, current: &mut String, compound: &mut Compound) {
        if current.is_empty() {
            return;
        }
        let value = std::mem::take(current);
        match kind {
            Some('#') => compound.id = Some(value),
            Some('.') => compound.classes.push(value),
            _ => compound.tag = Some(value.to_ascii_lowercase()),
        }
    }

    let mut compound = Compound::default();
    let mut current = String::new();
    let mut kind = None;

    for ch in text.chars() {
        if ch == '#' || ch == '.' {
            flush(kind, &mut current, &mut compound);
            kind = Some(ch);
        } else {
            current.push(ch);
        }
    }
    flush(kind, &mut current, &mut compound);
    compound
}

fn parse_selector(selector: &str) -> Vec<Compound> {
    selector.split_whitespace().map(parse_compound).collect()
}

impl Document {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    fn matches_compound(&self, id: NodeId, compound: &Compound) -> bool {
        let node = self.node(id);
        compound.tag.as_ref().map_or(true, |tag| *tag == node.tag)
            && compound
                .id
                .as_ref()
                .map_or(true, |wanted| node.id.as_ref() == Some(wanted))
            && compound.classes.iter().all(|class| node.classes.contains(class))
    }

    fn matches(&self, id: NodeId, selector: &[Compound]) -> bool {
        let Some((last, ancestors)) = selector.split_last() else {
            return false;
        };
        if !self.matches_compound(id, last) {
            return false;
        }

        // Right to left, each ancestor compound matched by the nearest ancestor.
        let mut remaining = ancestors.len();
        let mut current = self.node(id).parent;
        while remaining > 0 {
            let Some(node) = current else {
                break;
            };
            if self.matches_compound(node, &ancestors[remaining - 1]) {
                remaining -= 1;
            }
            current = self.node(node).parent;
        }
        remaining == 0
    }

    fn descendants(&self, scope: NodeId, out: &mut Vec<NodeId>, skip_templates: bool) {
        for &child in &self.node(scope).children {
            out.push(child);
            if skip_templates && self.node(child).tag == "template" {
                continue;
            }
            self.descendants(child, out, skip_templates);
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|child| *child != id);
        }
    }

    fn attach(&mut self, target: NodeId, node: NodeId, first: bool) {
        self.detach(node);
        self.node_mut(node).parent = Some(target);
        let children = &mut self.node_mut(target).children;
        if first {
            children.insert(0, node);
        } else {
            children.push(node);
        }
    }

    /// [`Document::attach`] unless it would make `node` its own ancestor.
    fn insert(&mut self, target: NodeId, node: NodeId, first: bool) -> Result<()> {
        if self.ancestry(target).contains(&node) {
            return Err(CarpeError::HierarchyError {
                message: format!("{node:?} is {target:?} or one of its ancestors"),
            });
        }
        self.attach(target, node, first);
        Ok(())
    }

    fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let source = self.node(id).clone();
        let copy = self.push(NodeData {
            parent: None,
            children: Vec::new(),
            ..source.clone()
        });
        for child in source.children {
            let child_copy = self.deep_clone(child);
            self.node_mut(child_copy).parent = Some(copy);
            self.node_mut(copy).children.push(child_copy);
        }
        copy
    }

    fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.node(id).parent;
        while let Some(node) = current {
            path.push(node);
            current = self.node(node).parent;
        }
        path
    }
}

pub struct MemoryDom {
    doc: RefCell<Document>,
    root: NodeId,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        let mut doc = Document::default();
        let root = doc.push(NodeData {
            tag: "html".to_string(),
            ..NodeData::default()
        });
        Self {
            doc: RefCell::new(doc),
            root,
        }
    }

    pub fn document(&self) -> NodeId {
        self.root
    }

    /// Creates a detached element from a compound such as `button#save.btn`.
    pub fn create_element(&self, spec: &str) -> NodeId {
        let compound = parse_compound(spec);
        self.doc.borrow_mut().push(NodeData {
            tag: compound.tag.unwrap_or_else(|| "div".to_string()),
            id: compound.id,
            classes: compound.classes,
            ..NodeData::default()
        })
    }

    /// Creates an element and appends it to `parent`.
    pub fn element(&self, parent: NodeId, spec: &str) -> NodeId {
        let node = self.create_element(spec);
        self.doc.borrow_mut().attach(parent, node, false);
        node
    }

    /// Creates `<template id=..>` under the document root; build its content
    /// with [`MemoryDom::element`].
    pub fn template(&self, id: &str) -> NodeId {
        self.element(self.root, &format!("template#{id}"))
    }

    pub fn set_text(&self, node: NodeId, text: impl Into<String>) {
        self.doc.borrow_mut().node_mut(node).text = text.into();
    }

    pub fn text(&self, node: NodeId) -> String {
        self.doc.borrow().node(node).text.clone()
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.doc.borrow().node(node).tag.clone()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.doc.borrow().node(node).classes.iter().any(|c| c == class)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.doc.borrow().node(node).parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.doc.borrow().node(node).children.clone()
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.doc.borrow().ancestry(node).last() == Some(&self.root)
    }

    pub fn listener_count(&self) -> usize {
        self.doc.borrow().subscriptions.len()
    }

    /// Dispatches `kind` on `target` and bubbles it up to the root. Returns
    /// the number of listeners invoked.
    pub fn dispatch(&self, target: NodeId, kind: &str) -> usize {
        let pending: Vec<(Listener<MemoryEvent>, MemoryEvent)> = {
            let doc = self.doc.borrow();
            let path = doc.ancestry(target);
            let mut pending = Vec::new();

            for (depth, &node) in path.iter().enumerate() {
                for subscription in doc
                    .subscriptions
                    .iter()
                    .filter(|s| s.node == node && s.event == kind)
                {
                    let current_target = match &subscription.selector {
                        None => Some(node),
                        Some(selector) => path[..depth]
                            .iter()
                            .copied()
                            .find(|candidate| doc.matches(*candidate, selector)),
                    };
                    if let Some(current_target) = current_target {
                        pending.push((
                            subscription.listener.clone(),
                            MemoryEvent {
                                kind: kind.to_string(),
                                target,
                                current_target,
                            },
                        ));
                    }
                }
            }
            pending
        };

        tracing::trace!(event = kind, listeners = pending.len(), "dispatching");
        for (listener, event) in &pending {
            listener(event);
        }
        pending.len()
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;
    type Event = MemoryEvent;

    fn select(&self, selector: &str) -> Vec<NodeId> {
        let doc = self.doc.borrow();
        let selector = parse_selector(selector);
        let mut candidates = vec![self.root];
        doc.descendants(self.root, &mut candidates, true);
        candidates
            .into_iter()
            .filter(|node| doc.matches(*node, &selector))
            .collect()
    }

    fn select_within(&self, selector: &str, scope: &NodeId) -> Vec<NodeId> {
        let doc = self.doc.borrow();
        let selector = parse_selector(selector);
        let mut candidates = Vec::new();
        doc.descendants(*scope, &mut candidates, true);
        candidates
            .into_iter()
            .filter(|node| doc.matches(*node, &selector))
            .collect()
    }

    fn instantiate(&self, template: &NodeId) -> Vec<NodeId> {
        let mut doc = self.doc.borrow_mut();
        let content = doc.node(*template).children.clone();
        content.into_iter().map(|node| doc.deep_clone(node)).collect()
    }

    fn prepend(&self, target: &NodeId, node: &NodeId) -> Result<()> {
        self.doc.borrow_mut().insert(*target, *node, true)
    }

    fn append(&self, target: &NodeId, node: &NodeId) -> Result<()> {
        self.doc.borrow_mut().insert(*target, *node, false)
    }

    fn remove(&self, node: &NodeId) {
        let mut doc = self.doc.borrow_mut();
        doc.detach(*node);

        let mut subtree = vec![*node];
        doc.descendants(*node, &mut subtree, false);
        doc.subscriptions
            .retain(|subscription| !subtree.contains(&subscription.node));
    }

    fn on(
        &self,
        node: &NodeId,
        event: &str,
        selector: Option<&str>,
        listener: Listener<MemoryEvent>,
    ) -> ListenerId {
        let mut doc = self.doc.borrow_mut();
        doc.next_listener += 1;
        let id = ListenerId(doc.next_listener);
        doc.subscriptions.push(Subscription {
            id,
            node: *node,
            event: event.to_string(),
            selector: selector.map(parse_selector),
            listener,
        });
        id
    }

    fn off(&self, id: ListenerId) {
        self.doc
            .borrow_mut()
            .subscriptions
            .retain(|subscription| subscription.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_parse_compound() {
        assert_eq!(
            parse_compound("button#save.btn.primary"),
            Compound {
                tag: Some("button".to_string()),
                id: Some("save".to_string()),
                classes: vec!["btn".to_string(), "primary".to_string()],
            }
        );
        assert_eq!(parse_compound(".btn").tag, None);
    }

    #[test]
    fn test_select_by_descendant_selector() {
        let dom = MemoryDom::new();
        let list = dom.element(dom.document(), "ul.items");
        let first = dom.element(list, "li.item");
        let other = dom.element(dom.document(), "li.item");

        assert_eq!(dom.select("ul li"), vec![first]);
        assert_eq!(dom.select(".item"), vec![first, other]);
        assert_eq!(dom.select_within("li", &list), vec![first]);
    }

    #[test]
    fn test_select_skips_template_content() {
        let dom = MemoryDom::new();
        let template = dom.template("row");
        dom.element(template, "div.row");

        assert_eq!(dom.select("#row"), vec![template]);
        assert!(dom.select(".row").is_empty());
    }

    #[test]
    fn test_instantiate_copies_content() {
        let dom = MemoryDom::new();
        let template = dom.template("row");
        let row = dom.element(template, "div.row");
        dom.set_text(dom.element(row, "span.label"), "hello");

        let copies = dom.instantiate(&template);
        assert_eq!(copies.len(), 1);
        assert_ne!(copies[0], row);
        assert!(!dom.is_attached(copies[0]));
        let label = dom.select_within(".label", &copies[0]);
        assert_eq!(dom.text(label[0]), "hello");
    }

    #[test]
    fn test_prepend_and_append_order() {
        let dom = MemoryDom::new();
        let body = dom.element(dom.document(), "body");
        let a = dom.create_element("p#a");
        let b = dom.create_element("p#b");
        dom.append(&body, &a).unwrap();
        dom.prepend(&body, &b).unwrap();
        assert_eq!(dom.children(body), vec![b, a]);

        dom.append(&body, &b).unwrap();
        assert_eq!(dom.children(body), vec![a, b]);
    }

    #[test]
    fn test_insert_into_own_subtree_is_rejected() {
        let dom = MemoryDom::new();
        let outer = dom.element(dom.document(), "div.outer");
        let inner = dom.element(outer, "div.inner");
        let leaf = dom.element(inner, "span");

        for target in [outer, inner, leaf] {
            assert!(matches!(
                dom.append(&target, &outer),
                Err(CarpeError::HierarchyError { .. })
            ));
            assert!(matches!(
                dom.prepend(&target, &outer),
                Err(CarpeError::HierarchyError { .. })
            ));
        }

        assert_eq!(dom.parent(outer), Some(dom.document()));
        assert_eq!(dom.children(outer), vec![inner]);
        assert!(dom.is_attached(leaf));

        // Moving a node up out of its own parent is fine.
        dom.append(&outer, &leaf).unwrap();
        assert_eq!(dom.children(outer), vec![inner, leaf]);
    }

    #[test]
    fn test_delegated_listener_checks_selector_at_dispatch() {
        let dom = MemoryDom::new();
        let root = dom.element(dom.document(), "div.view");
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        dom.on(
            &root,
            "click",
            Some(".btn"),
            Rc::new(move |_event: &MemoryEvent| counter.set(counter.get() + 1)),
        );

        // Added after binding; still matched.
        let button = dom.element(root, "button.btn");
        let icon = dom.element(button, "i.icon");
        let label = dom.element(root, "span");

        assert_eq!(dom.dispatch(icon, "click"), 1);
        assert_eq!(dom.dispatch(label, "click"), 0);
        assert_eq!(dom.dispatch(button, "keyup"), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_remove_drops_subtree_listeners() {
        let dom = MemoryDom::new();
        let root = dom.element(dom.document(), "div");
        let child = dom.element(root, "span");
        dom.on(&child, "click", None, Rc::new(|_: &MemoryEvent| {}));
        let id = dom.on(&dom.document(), "click", None, Rc::new(|_: &MemoryEvent| {}));
        assert_eq!(dom.listener_count(), 2);

        dom.remove(&root);
        assert!(!dom.is_attached(child));
        assert_eq!(dom.listener_count(), 1);

        dom.off(id);
        assert_eq!(dom.listener_count(), 0);
    }
}

//! Live document arena.
//!
//! Contract:
//! - A node stays addressable by its `NodeId` until its detached subtree is
//!   released; detaching only unlinks it from its parent. Released slots are
//!   reused by later allocations.
//! - Children are kept as a doubly linked sibling list, so sibling stepping,
//!   insertion and detachment are O(1).
//! - `insert_before` moves a node that already has a parent (DOM semantics).
//! - A node is *connected* when its topmost ancestor is the document root.
//!   Moving a connected subtree somewhere disconnected discards its interaction
//!   state (see `control`); connected-to-connected moves preserve it.

use crate::control::ControlState;
use crate::error::DomError;
use crate::node::{ElementData, NodeCategory, NodeData, NodeId, NodeRecord};
use futures::channel::oneshot;
use std::collections::HashMap;

pub struct Document {
    nodes: Vec<NodeRecord>,
    free: Vec<NodeId>,
    root: NodeId,
    pub(crate) focused: Option<NodeId>,
    pub(crate) loads: HashMap<NodeId, Vec<oneshot::Sender<()>>>,
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
            focused: None,
            loads: HashMap::new(),
        };
        doc.root = doc.push(NodeData::Document { doctype: None });
        doc
    }

    /// The connected document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Arena slots, including released ones awaiting reuse.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes not released.
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = NodeRecord::new(data);
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::new(data));
        id
    }

    /// Create a detached document node, the root of a parsed whole-document tree.
    pub fn create_document(&mut self) -> NodeId {
        self.push(NodeData::Document { doctype: None })
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(name)))
    }

    pub fn create_element_with_attributes(
        &mut self,
        name: &str,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        let mut data = ElementData::new(name);
        data.attributes = attributes;
        self.push(NodeData::Element(data))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.index()].data
    }

    pub fn category(&self, node: NodeId) -> NodeCategory {
        self.data(node).category()
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.data(node) {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.nodes[node.index()].data {
            NodeData::Element(element) => Ok(element),
            _ => Err(DomError::NotAnElement(node)),
        }
    }

    pub(crate) fn control(&self, node: NodeId) -> Option<&ControlState> {
        self.element(node).map(|element| &element.control)
    }

    pub(crate) fn control_mut(&mut self, node: NodeId) -> Result<&mut ControlState, DomError> {
        self.element_mut(node).map(|element| &mut element.control)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(ElementData::name)
    }

    pub fn is_element_named(&self, node: NodeId, name: &str) -> bool {
        self.element(node).is_some_and(|element| element.is(name))
    }

    /// Stable identifier of an element (non-empty `id` attribute).
    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.element(node).and_then(ElementData::id)
    }

    /// Character data of a text or comment node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.data(node) {
            NodeData::Text(text) | NodeData::Comment(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        match &mut self.nodes[node.index()].data {
            NodeData::Text(text) | NodeData::Comment(text) => {
                text.clear();
                text.push_str(value);
                Ok(())
            }
            _ => Err(DomError::NotCharacterData(node)),
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(node) {
            out.push_str(text);
            return out;
        }
        for descendant in self.descendants(node) {
            if let NodeData::Text(text) = self.data(descendant) {
                out.push_str(text);
            }
        }
        out
    }

    pub fn doctype(&self, node: NodeId) -> Option<&str> {
        match self.data(node) {
            NodeData::Document { doctype } => doctype.as_deref(),
            _ => None,
        }
    }

    pub fn set_doctype(&mut self, node: NodeId, value: &str) {
        if let NodeData::Document { doctype } = &mut self.nodes[node.index()].data {
            *doctype = Some(value.to_string());
        }
    }

    // Attributes

    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        self.element(node).map_or(&[], ElementData::attributes)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|element| element.attribute(name))
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Set or replace an attribute; new attributes are appended in order.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let element = self.element_mut(node)?;
        match element
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => element
                .attributes
                .push((name.to_ascii_lowercase(), value.to_string())),
        }
        Ok(())
    }

    /// Returns whether the attribute was present.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<bool, DomError> {
        let element = self.element_mut(node)?;
        let before = element.attributes.len();
        element
            .attributes
            .retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        Ok(element.attributes.len() != before)
    }

    // Navigation

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].first_child
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].last_child
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].next_sibling
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].prev_sibling
    }

    pub fn children(&self, node: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(node),
        }
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .filter(move |child| self.category(*child) == NodeCategory::Element)
    }

    /// Pre-order descendants of `scope`, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            scope,
            next: self.first_child(scope),
        }
    }

    /// Pre-order walk of `scope` and its descendants.
    pub fn inclusive_descendants(&self, scope: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(scope).chain(self.descendants(scope))
    }

    fn following_within(&self, scope: NodeId, node: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(node) {
            return Some(child);
        }
        let mut current = node;
        loop {
            if current == scope {
                return None;
            }
            if let Some(sibling) = self.next_sibling(current) {
                return Some(sibling);
            }
            current = self.parent(current)?;
        }
    }

    /// Inclusive containment: `contains(a, a)` is true.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Topmost ancestor of `node` (the node itself when detached).
    pub fn top(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.top(node) == self.root
    }

    // Structure mutation

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `before` (or at the end), moving it out of its
    /// current parent first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.data(parent).allows_children() {
            return Err(DomError::NotAContainer(parent));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        let before = match before {
            Some(reference) if reference == child => self.next_sibling(child),
            other => other,
        };
        if let Some(reference) = before
            && self.parent(reference) != Some(parent)
        {
            return Err(DomError::NotAChild {
                parent,
                node: reference,
            });
        }

        let was_connected = self.is_connected(child);
        self.unlink(child);
        self.link_before(parent, child, before);
        if was_connected && !self.is_connected(child) {
            self.discard_interaction_state(child);
        }
        Ok(())
    }

    /// Remove `node` from its parent. No-op for detached nodes.
    pub fn detach(&mut self, node: NodeId) {
        if self.parent(node).is_none() {
            return;
        }
        let was_connected = self.is_connected(node);
        self.unlink(node);
        if was_connected {
            self.discard_interaction_state(node);
        }
    }

    /// Hand the slots of the detached subtree under `node` back to the arena.
    /// Every handle into the subtree is invalid afterwards. Returns the number
    /// of nodes released.
    pub fn release(&mut self, node: NodeId) -> Result<usize, DomError> {
        if self.nodes[node.index()].released {
            return Err(DomError::Released(node));
        }
        if node == self.root || self.parent(node).is_some() {
            return Err(DomError::Attached(node));
        }
        let subtree: Vec<NodeId> = self.inclusive_descendants(node).collect();
        for &slot in &subtree {
            // Dropping the senders settles any signal still waiting.
            self.loads.remove(&slot);
            if self.focused == Some(slot) {
                self.focused = None;
            }
            let record = &mut self.nodes[slot.index()];
            *record = NodeRecord::new(NodeData::Comment(String::new()));
            record.released = true;
            self.free.push(slot);
        }
        log::trace!(target: "dom.arena", "released {} nodes under {node:?}", subtree.len());
        Ok(subtree.len())
    }

    /// Deep copy of `node`; the copy is detached. Form values are copied,
    /// interaction state is not.
    pub fn clone_subtree(&mut self, node: NodeId) -> NodeId {
        let copy = self.clone_single(node);
        let mut stack = vec![(node, copy)];
        while let Some((from, to)) = stack.pop() {
            let mut cursor = self.first_child(from);
            while let Some(child) = cursor {
                let child_copy = self.clone_single(child);
                self.link_before(to, child_copy, None);
                stack.push((child, child_copy));
                cursor = self.next_sibling(child);
            }
        }
        copy
    }

    fn clone_single(&mut self, node: NodeId) -> NodeId {
        let mut data = self.data(node).clone();
        if let NodeData::Element(element) = &mut data {
            element.control.discard_interaction();
        }
        self.push(data)
    }

    fn unlink(&mut self, child: NodeId) {
        let record = &mut self.nodes[child.index()];
        let parent = record.parent.take();
        let prev = record.prev_sibling.take();
        let next = record.next_sibling.take();
        let Some(parent) = parent else {
            return;
        };
        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = next,
            None => self.nodes[parent.index()].first_child = next,
        }
        match next {
            Some(next) => self.nodes[next.index()].prev_sibling = prev,
            None => self.nodes[parent.index()].last_child = prev,
        }
    }

    fn link_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        let prev = match before {
            Some(reference) => self.nodes[reference.index()].prev_sibling,
            None => self.nodes[parent.index()].last_child,
        };
        {
            let record = &mut self.nodes[child.index()];
            record.parent = Some(parent);
            record.prev_sibling = prev;
            record.next_sibling = before;
        }
        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        match before {
            Some(reference) => self.nodes[reference.index()].prev_sibling = Some(child),
            None => self.nodes[parent.index()].last_child = Some(child),
        }
    }

    // Queries

    /// First element in `scope` (inclusive, document order) whose id is `id`.
    pub fn find_element_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.inclusive_descendants(scope)
            .find(|node| self.element_id(*node) == Some(id))
    }

    /// Every element in `scope` (inclusive) whose id is `id`.
    pub fn elements_with_id(&self, scope: NodeId, id: &str) -> Vec<NodeId> {
        self.inclusive_descendants(scope)
            .filter(|node| self.element_id(*node) == Some(id))
            .collect()
    }

    /// First element named `name` in `scope` (inclusive, document order).
    pub fn find_element_named(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        self.inclusive_descendants(scope)
            .find(|node| self.is_element_named(*node, name))
    }

    /// The `html` element of a document node.
    pub fn document_element(&self, document: NodeId) -> Option<NodeId> {
        self.element_children(document).next()
    }

    pub fn head(&self, document: NodeId) -> Option<NodeId> {
        let html = self.document_element(document)?;
        self.element_children(html)
            .find(|child| self.is_element_named(*child, "head"))
    }

    pub fn body(&self, document: NodeId) -> Option<NodeId> {
        let html = self.document_element(document)?;
        self.element_children(html)
            .find(|child| self.is_element_named(*child, "body"))
    }

    /// Structural equality of the child lists of `a` and `b`: same categories,
    /// names, attributes (in order) and character data, recursively.
    pub fn children_equal(&self, a: NodeId, b: NodeId) -> bool {
        let mut stack = vec![(self.first_child(a), self.first_child(b))];
        while let Some(pair) = stack.pop() {
            match pair {
                (None, None) => {}
                (Some(left), Some(right)) => {
                    if !self.shallow_equal(left, right) {
                        return false;
                    }
                    stack.push((self.next_sibling(left), self.next_sibling(right)));
                    stack.push((self.first_child(left), self.first_child(right)));
                }
                _ => return false,
            }
        }
        true
    }

    fn shallow_equal(&self, a: NodeId, b: NodeId) -> bool {
        match (self.data(a), self.data(b)) {
            (NodeData::Element(left), NodeData::Element(right)) => {
                left.name == right.name && left.attributes == right.attributes
            }
            (NodeData::Text(left), NodeData::Text(right))
            | (NodeData::Comment(left), NodeData::Comment(right)) => left == right,
            (NodeData::Document { doctype: left }, NodeData::Document { doctype: right }) => {
                left == right
            }
            _ => false,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    scope: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.following_within(self.scope, current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ul_with_items(doc: &mut Document, count: usize) -> (NodeId, Vec<NodeId>) {
        let ul = doc.create_element("ul");
        let items = (0..count)
            .map(|_| {
                let li = doc.create_element("li");
                doc.append_child(ul, li).expect("append");
                li
            })
            .collect();
        (ul, items)
    }

    #[test]
    fn insert_before_moves_within_parent() {
        let mut doc = Document::new();
        let (ul, items) = ul_with_items(&mut doc, 3);
        doc.insert_before(ul, items[2], Some(items[0])).expect("move");
        let order: Vec<_> = doc.children(ul).collect();
        assert_eq!(order, vec![items[2], items[0], items[1]]);
        assert_eq!(doc.first_child(ul), Some(items[2]));
        assert_eq!(doc.last_child(ul), Some(items[1]));
        assert_eq!(doc.prev_sibling(items[0]), Some(items[2]));
    }

    #[test]
    fn insert_before_self_is_a_no_op() {
        let mut doc = Document::new();
        let (ul, items) = ul_with_items(&mut doc, 2);
        doc.insert_before(ul, items[0], Some(items[0])).expect("insert");
        let order: Vec<_> = doc.children(ul).collect();
        assert_eq!(order, items);
    }

    #[test]
    fn insert_rejects_cycles_and_foreign_reference() {
        let mut doc = Document::new();
        let (ul, items) = ul_with_items(&mut doc, 1);
        assert_eq!(
            doc.append_child(items[0], ul),
            Err(DomError::HierarchyRequest {
                parent: items[0],
                child: ul
            })
        );
        let stray = doc.create_element("li");
        let other = doc.create_element("p");
        assert!(matches!(
            doc.insert_before(ul, other, Some(stray)),
            Err(DomError::NotAChild { .. })
        ));
        let text = doc.create_text("x");
        assert_eq!(
            doc.append_child(text, other),
            Err(DomError::NotAContainer(text))
        );
    }

    #[test]
    fn detach_unlinks_and_keeps_handle() {
        let mut doc = Document::new();
        let (ul, items) = ul_with_items(&mut doc, 3);
        doc.detach(items[1]);
        let order: Vec<_> = doc.children(ul).collect();
        assert_eq!(order, vec![items[0], items[2]]);
        assert_eq!(doc.parent(items[1]), None);
        assert_eq!(doc.tag_name(items[1]), Some("li"));
    }

    #[test]
    fn descendants_walk_in_document_order() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let p = doc.create_element("p");
        let text = doc.create_text("hi");
        let span = doc.create_element("span");
        doc.append_child(div, p).expect("append");
        doc.append_child(p, text).expect("append");
        doc.append_child(div, span).expect("append");
        let walk: Vec<_> = doc.descendants(div).collect();
        assert_eq!(walk, vec![p, text, span]);
        assert_eq!(doc.descendants(text).count(), 0);
        assert_eq!(doc.text_content(div), "hi");
    }

    #[test]
    fn clone_subtree_copies_structure_and_attributes() {
        let mut doc = Document::new();
        let div = doc.create_element_with_attributes(
            "div",
            vec![("class".to_string(), "box".to_string())],
        );
        let text = doc.create_text("hello");
        doc.append_child(div, text).expect("append");
        let copy = doc.clone_subtree(div);
        assert_ne!(copy, div);
        assert_eq!(doc.attribute(copy, "class"), Some("box"));
        assert!(doc.children_equal(div, copy));
        assert_eq!(doc.parent(copy), None);
    }

    #[test]
    fn attributes_keep_order_and_replace_in_place() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        doc.set_attribute(a, "href", "/one").expect("set");
        doc.set_attribute(a, "class", "x").expect("set");
        doc.set_attribute(a, "HREF", "/two").expect("set");
        assert_eq!(
            doc.attributes(a),
            &[
                ("href".to_string(), "/two".to_string()),
                ("class".to_string(), "x".to_string())
            ]
        );
        assert_eq!(doc.remove_attribute(a, "class"), Ok(true));
        assert_eq!(doc.remove_attribute(a, "class"), Ok(false));
    }

    #[test]
    fn released_slots_are_reused() {
        let mut doc = Document::new();
        let (ul, items) = ul_with_items(&mut doc, 2);
        let slots = doc.len();
        assert_eq!(doc.release(items[0]), Err(DomError::Attached(items[0])));
        assert_eq!(doc.release(doc.root()), Err(DomError::Attached(doc.root())));

        let signal = doc.watch_load(items[1]);
        assert_eq!(doc.release(ul), Ok(3));
        assert_eq!(doc.release(ul), Err(DomError::Released(ul)));
        assert_eq!(doc.live_count(), slots - 3);
        assert!(doc.pending_loads().is_empty());
        assert_eq!(pollster::block_on(signal), items[1]);

        let (_, again) = ul_with_items(&mut doc, 2);
        assert_eq!(doc.len(), slots);
        assert_eq!(doc.live_count(), slots);
        assert_eq!(doc.first_child(again[0]), None);
        assert_eq!(doc.tag_name(again[1]), Some("li"));
    }

    #[test]
    fn connectedness_follows_the_root() {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        assert!(!doc.is_connected(html));
        doc.append_child(doc.root(), html).expect("append");
        assert!(doc.is_connected(html));
        let detached = doc.create_document();
        assert!(!doc.is_connected(detached));
    }
}

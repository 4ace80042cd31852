//! Lifecycle hooks.
//!
//! Every method has a default, so implementors override only what they need.
//! `before_*` methods return `false` to veto the operation; a veto is normal
//! control flow, never an error. Hooks observe the document read-only.

use dom::{Document, NodeId};

/// The kind of attribute mutation offered to [`MorphHooks::before_attribute_updated`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeMutation {
    Update,
    Remove,
}

/// What a head merge did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadMergeReport {
    pub added: Vec<NodeId>,
    pub kept: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

pub trait MorphHooks {
    /// `node` is the new-content node about to be inserted (cloned or rebuilt).
    fn before_node_added(&mut self, _doc: &Document, _node: NodeId) -> bool {
        true
    }

    /// `node` is the freshly inserted old-tree node.
    fn after_node_added(&mut self, _doc: &Document, _node: NodeId) {}

    fn before_node_morphed(&mut self, _doc: &Document, _old: NodeId, _new: NodeId) -> bool {
        true
    }

    fn after_node_morphed(&mut self, _doc: &Document, _old: NodeId, _new: NodeId) {}

    fn before_node_removed(&mut self, _doc: &Document, _node: NodeId) -> bool {
        true
    }

    /// `node` is detached at this point.
    fn after_node_removed(&mut self, _doc: &Document, _node: NodeId) {}

    /// A node carrying persistent identifiers is about to move to the holding
    /// area instead of being removed.
    fn before_node_parked(&mut self, _doc: &Document, _node: NodeId) -> bool {
        true
    }

    fn after_node_parked(&mut self, _doc: &Document, _node: NodeId) {}

    fn before_attribute_updated(
        &mut self,
        _doc: &Document,
        _name: &str,
        _node: NodeId,
        _mutation: AttributeMutation,
    ) -> bool {
        true
    }

    fn should_preserve_head_node(&mut self, doc: &Document, node: NodeId) -> bool {
        doc.attribute(node, "im-preserve") == Some("true")
    }

    fn should_re_append_head_node(&mut self, doc: &Document, node: NodeId) -> bool {
        doc.attribute(node, "im-re-append") == Some("true")
    }

    fn should_remove_head_node(&mut self, _doc: &Document, _node: NodeId) -> bool {
        true
    }

    fn after_head_morphed(&mut self, _doc: &Document, _head: NodeId, _report: &HeadMergeReport) {}
}

/// Hooks that accept every operation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl MorphHooks for NoHooks {}

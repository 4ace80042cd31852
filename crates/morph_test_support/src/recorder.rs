//! Hooks that log every structural operation as serialized markup.

use dom::{Document, NodeId};
use morph::MorphHooks;

/// Records `Morphed`, `Added` and `Removed` operations in the order the
/// reconciler proposes them. Nothing is vetoed.
#[derive(Debug, Default)]
pub struct OpRecorder {
    ops: Vec<Vec<String>>,
}

impl OpRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[Vec<String>] {
        &self.ops
    }

    /// One line per operation, fields joined by ` | `.
    pub fn lines(&self) -> Vec<String> {
        self.ops.iter().map(|op| op.join(" | ")).collect()
    }
}

impl MorphHooks for OpRecorder {
    fn before_node_added(&mut self, doc: &Document, node: NodeId) -> bool {
        self.ops.push(vec!["Added".to_string(), doc.outer_html(node)]);
        true
    }

    fn before_node_morphed(&mut self, doc: &Document, old: NodeId, new: NodeId) -> bool {
        // Character data morphs are implied by their parent's entry.
        if doc.element(old).is_some() {
            self.ops.push(vec![
                "Morphed".to_string(),
                doc.outer_html(old),
                doc.outer_html(new),
            ]);
        }
        true
    }

    fn before_node_removed(&mut self, doc: &Document, node: NodeId) -> bool {
        self.ops.push(vec!["Removed".to_string(), doc.outer_html(node)]);
        true
    }
}

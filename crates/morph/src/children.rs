//! Greedy child reconciliation.
//!
//! A cursor walks the old children in `[insertion, end)` while the new
//! children are consumed in order. Each new child is placed by the first of:
//! a forward match (identity set, then soft), relocation of the persistent
//! node bearing its id, or fresh creation. Old nodes skipped over are parked
//! when they carry persistent ids and removed otherwise.

use crate::context::Reconciler;
use crate::error::MorphError;
use dom::{Document, NodeId};

/// Same category and tag, and the old node either has no id or the same one.
pub(crate) fn is_soft_match(doc: &Document, old: NodeId, new: NodeId) -> bool {
    if doc.category(old) != doc.category(new) || doc.tag_name(old) != doc.tag_name(new) {
        return false;
    }
    match doc.element_id(old) {
        None => true,
        Some(id) => doc.element_id(new) == Some(id),
    }
}

impl Reconciler<'_> {
    pub(crate) fn morph_children(
        &mut self,
        old_parent: NodeId,
        new_parent: NodeId,
        insertion: Option<NodeId>,
        end: Option<NodeId>,
    ) -> Result<(), MorphError> {
        let mut cursor = insertion.or_else(|| self.doc.first_child(old_parent));
        let new_children: Vec<NodeId> = self.doc.children(new_parent).collect();

        for new_child in new_children {
            if let Some(start) = cursor
                && cursor != end
                && let Some(matched) = self.find_best_match(new_child, start, end)
            {
                if matched != start {
                    self.remove_nodes_between(start, matched)?;
                }
                self.morph_node(matched, new_child)?;
                cursor = self.doc.next_sibling(matched);
                continue;
            }

            if let Some(id) = self.persistent_id(new_child)
                && let Some(moved) = self.move_before_by_id(old_parent, &id, cursor)?
            {
                self.morph_node(moved, new_child)?;
                cursor = self.doc.next_sibling(moved);
                continue;
            }

            if let Some(created) = self.create_node(old_parent, new_child, cursor)? {
                cursor = self.doc.next_sibling(created);
            }
        }

        while let Some(node) = cursor
            && cursor != end
        {
            cursor = self.doc.next_sibling(node);
            self.remove_node(node)?;
        }
        Ok(())
    }

    fn persistent_id(&self, node: NodeId) -> Option<String> {
        self.doc
            .element_id(node)
            .filter(|id| self.ctx.ids.is_persistent(id))
            .map(str::to_string)
    }

    /// Identity-set match first, soft match second.
    fn find_best_match(&self, node: NodeId, start: NodeId, end: Option<NodeId>) -> Option<NodeId> {
        if self.ctx.ids.contains(node)
            && let Some(matched) = self.find_id_set_match(node, start, end)
        {
            return Some(matched);
        }
        // A node with its own persistent id is relocated, never soft-matched.
        if self.persistent_id(node).is_some() {
            return None;
        }
        self.find_soft_match(node, start, end)
    }

    /// Scan for an old node sharing persistent ids with `node`, giving up
    /// once skipping would displace more ids than `node` carries.
    fn find_id_set_match(&self, node: NodeId, start: NodeId, end: Option<NodeId>) -> Option<NodeId> {
        let doc = &*self.doc;
        let ids = &self.ctx.ids;
        let budget = ids.count(node);
        let mut displaced = 0;

        let mut cursor = Some(start);
        while let Some(old) = cursor
            && cursor != end
        {
            if is_soft_match(doc, old, node) && ids.intersects(old, node) {
                log::trace!(target: "morph.children", "id set match {old:?} for {node:?}");
                return Some(old);
            }
            displaced += ids.count(old);
            if displaced > budget {
                break;
            }
            // Matching past the focused subtree would park it.
            if doc.contains_focus(old) {
                break;
            }
            cursor = doc.next_sibling(old);
        }
        None
    }

    /// Scan for an unreserved old node of the same shape. Reserved nodes
    /// (carrying persistent ids) are skipped. Gives up when the scanned old
    /// nodes keep matching the upcoming new siblings instead.
    fn find_soft_match(&self, node: NodeId, start: NodeId, end: Option<NodeId>) -> Option<NodeId> {
        let doc = &*self.doc;
        let ids = &self.ctx.ids;
        let mut upcoming = doc.next_sibling(node);
        let mut sibling_matches = 0;

        let mut cursor = Some(start);
        while let Some(old) = cursor
            && cursor != end
        {
            if !ids.contains(old) && is_soft_match(doc, old, node) {
                return Some(old);
            }
            if let Some(next_new) = upcoming
                && is_soft_match(doc, old, next_new)
            {
                sibling_matches += 1;
                upcoming = doc.next_sibling(next_new);
                if sibling_matches >= 2 {
                    log::trace!(target: "morph.children", "soft match for {node:?} blocked");
                    return None;
                }
            }
            if doc.contains_focus(old) {
                break;
            }
            cursor = doc.next_sibling(old);
        }
        None
    }

    /// Insert `new_child` before `before`. Returns the inserted node unless
    /// the addition was vetoed.
    fn create_node(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        before: Option<NodeId>,
    ) -> Result<Option<NodeId>, MorphError> {
        if !self.hooks.before_node_added(self.doc, new_child) {
            log::trace!(target: "morph.children", "addition of {new_child:?} vetoed");
            return Ok(None);
        }
        let tag = self.doc.tag_name(new_child).map(str::to_string);
        let created = match tag {
            // Persistent descendants get relocated into an empty shell.
            Some(tag) if self.ctx.ids.contains(new_child) => {
                let shell = self.doc.create_element(&tag);
                self.doc.insert_before(parent, shell, before)?;
                self.morph_node(shell, new_child)?;
                shell
            }
            _ => {
                let copy = self.doc.clone_subtree(new_child);
                self.doc.insert_before(parent, copy, before)?;
                copy
            }
        };
        self.hooks.after_node_added(self.doc, created);
        Ok(Some(created))
    }

    /// Park `node` if it carries persistent ids, remove it otherwise.
    fn remove_node(&mut self, node: NodeId) -> Result<(), MorphError> {
        if self.ctx.ids.contains(node) {
            if !self.hooks.before_node_parked(self.doc, node) {
                return Ok(());
            }
            self.doc.append_child(self.ctx.pantry, node)?;
            log::trace!(target: "morph.children", "parked {node:?}");
            self.hooks.after_node_parked(self.doc, node);
            return Ok(());
        }
        if !self.hooks.before_node_removed(self.doc, node) {
            return Ok(());
        }
        self.doc.detach(node);
        self.hooks.after_node_removed(self.doc, node);
        Ok(())
    }

    fn remove_nodes_between(&mut self, start: NodeId, end: NodeId) -> Result<(), MorphError> {
        let mut cursor = Some(start);
        while let Some(node) = cursor
            && node != end
        {
            cursor = self.doc.next_sibling(node);
            self.remove_node(node)?;
        }
        Ok(())
    }

    /// Move the element with `id` (found later in the target or parked
    /// earlier) before `before` in `parent`.
    fn move_before_by_id(
        &mut self,
        parent: NodeId,
        id: &str,
        before: Option<NodeId>,
    ) -> Result<Option<NodeId>, MorphError> {
        let found = self
            .doc
            .find_element_by_id(self.ctx.target, id)
            .or_else(|| self.doc.find_element_by_id(self.ctx.pantry, id));
        let Some(element) = found else {
            log::warn!(
                target: "morph.children",
                "persistent id `{id}` not found in target or pantry, creating it"
            );
            return Ok(None);
        };
        if self.doc.contains(element, parent) {
            log::warn!(
                target: "morph.children",
                "element with id `{id}` encloses its destination, creating it"
            );
            return Ok(None);
        }
        self.ctx.ids.forget_relocated(self.doc, element);
        self.doc.insert_before(parent, element, before)?;
        log::trace!(target: "morph.children", "relocated `{id}` into {parent:?}");
        Ok(Some(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_match_rules() {
        let mut doc = Document::new();
        let host = html::parse_fragment(
            &mut doc,
            r#"<p></p><p id="a"></p><p id="b"></p><span></span>text<!--c-->"#,
        )
        .expect("parse");
        let nodes: Vec<NodeId> = doc.children(host).collect();
        let (plain, a, b, span, text, comment) =
            (nodes[0], nodes[1], nodes[2], nodes[3], nodes[4], nodes[5]);

        assert!(is_soft_match(&doc, plain, a));
        assert!(is_soft_match(&doc, a, a));
        assert!(!is_soft_match(&doc, a, b));
        assert!(!is_soft_match(&doc, a, plain));
        assert!(!is_soft_match(&doc, plain, span));
        assert!(!is_soft_match(&doc, text, comment));
        let other_text = doc.create_text("other");
        assert!(is_soft_match(&doc, text, other_text));
    }
}

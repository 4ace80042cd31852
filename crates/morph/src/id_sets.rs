//! Persistent identifiers and the per-node identity index.
//!
//! An identifier is persistent when it appears exactly once in the old
//! target subtree and exactly once in the new content, on elements with the
//! same tag. Every persistent-identified element and its ancestors (up to,
//! not including, the target's parent or the new container) are indexed
//! with the set of persistent identifiers below them.

use dom::{Document, NodeId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub(crate) struct IdSets {
    persistent: HashSet<String>,
    map: HashMap<NodeId, HashSet<String>>,
}

impl IdSets {
    pub(crate) fn build(doc: &Document, target: NodeId, container: NodeId) -> Self {
        let old_elements = id_elements(doc, target);
        let new_elements = id_elements(doc, container);

        let mut duplicates: HashSet<&str> = HashSet::new();
        let mut old_tags: HashMap<&str, &str> = HashMap::new();
        for &(id, tag, _) in &old_elements {
            if old_tags.insert(id, tag).is_some() {
                duplicates.insert(id);
            }
        }

        let mut persistent: HashSet<String> = HashSet::new();
        for &(id, tag, _) in &new_elements {
            if persistent.contains(id) {
                duplicates.insert(id);
            } else if old_tags.get(id) == Some(&tag) {
                persistent.insert(id.to_string());
            }
        }
        for id in &duplicates {
            if persistent.remove(*id) {
                log::debug!(
                    target: "morph.children",
                    "id `{id}` is duplicated, matched without identity"
                );
            }
        }

        let mut sets = Self {
            persistent,
            map: HashMap::new(),
        };
        let old_root = doc.parent(target);
        sets.populate(doc, &old_elements, old_root);
        sets.populate(doc, &new_elements, Some(container));
        log::trace!(
            target: "morph.children",
            "{} persistent ids, {} indexed nodes",
            sets.persistent.len(),
            sets.map.len()
        );
        sets
    }

    fn populate(&mut self, doc: &Document, elements: &[(&str, &str, NodeId)], root: Option<NodeId>) {
        for &(id, _, element) in elements {
            if !self.persistent.contains(id) {
                continue;
            }
            let mut current = Some(element);
            while let Some(node) = current {
                if Some(node) == root {
                    break;
                }
                self.map.entry(node).or_default().insert(id.to_string());
                current = doc.parent(node);
            }
        }
    }

    pub(crate) fn is_persistent(&self, id: &str) -> bool {
        self.persistent.contains(id)
    }

    #[cfg(test)]
    pub(crate) fn persistent(&self) -> impl Iterator<Item = &str> {
        self.persistent.iter().map(String::as_str)
    }

    /// Whether `node` carries persistent identifiers (and so must never be
    /// dropped mid-scan).
    pub(crate) fn contains(&self, node: NodeId) -> bool {
        self.map.contains_key(&node)
    }

    pub(crate) fn count(&self, node: NodeId) -> usize {
        self.map.get(&node).map_or(0, HashSet::len)
    }

    /// Whether the identity sets of `old` and `new` share an identifier.
    pub(crate) fn intersects(&self, old: NodeId, new: NodeId) -> bool {
        match (self.map.get(&old), self.map.get(&new)) {
            (Some(old_set), Some(new_set)) => old_set.iter().any(|id| new_set.contains(id)),
            _ => false,
        }
    }

    /// `element` is about to move elsewhere: its former ancestors no longer
    /// hold the identifiers it carries.
    pub(crate) fn forget_relocated(&mut self, doc: &Document, element: NodeId) {
        let Some(moving) = self.map.get(&element).cloned() else {
            return;
        };
        let mut current = doc.parent(element);
        while let Some(node) = current {
            if let Some(set) = self.map.get_mut(&node) {
                set.retain(|id| !moving.contains(id));
                if set.is_empty() {
                    self.map.remove(&node);
                }
            }
            current = doc.parent(node);
        }
    }
}

fn id_elements(doc: &Document, scope: NodeId) -> Vec<(&str, &str, NodeId)> {
    doc.inclusive_descendants(scope)
        .filter_map(|node| {
            let element = doc.element(node)?;
            Some((element.id()?, element.name(), node))
        })
        .collect()
}

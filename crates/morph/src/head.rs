//! Head merging.
//!
//! Head children are matched by their full serialization rather than by
//! position: a stylesheet or script that is already present must stay put
//! (re-inserting it would reload it), everything new is appended, and under
//! `Merge` the leftovers are removed.

use crate::config::HeadStyle;
use crate::context::Reconciler;
use crate::error::MorphError;
use crate::hooks::HeadMergeReport;
use dom::{LoadSignal, NodeId};

impl Reconciler<'_> {
    /// Merge `new_head`'s children into `old_head`. With `track_loads`, every
    /// appended node referencing an external resource yields a load signal.
    pub(crate) fn merge_head(
        &mut self,
        old_head: NodeId,
        new_head: NodeId,
        track_loads: bool,
    ) -> Result<Vec<LoadSignal>, MorphError> {
        let append_only = self.ctx.head_style == HeadStyle::Append;

        // Serialization -> new node, in first-seen order.
        let mut incoming: Vec<(String, NodeId)> = Vec::new();
        let new_children: Vec<NodeId> = self.doc.element_children(new_head).collect();
        for node in new_children {
            let html = self.doc.outer_html(node);
            match incoming.iter_mut().find(|(key, _)| *key == html) {
                Some(entry) => entry.1 = node,
                None => incoming.push((html, node)),
            }
        }

        let mut report = HeadMergeReport::default();
        let mut to_append: Vec<NodeId> = Vec::new();
        let mut to_remove: Vec<NodeId> = Vec::new();

        let old_children: Vec<NodeId> = self.doc.element_children(old_head).collect();
        for current in old_children {
            let html = self.doc.outer_html(current);
            let position = incoming.iter().position(|(key, _)| *key == html);
            let re_append = self.hooks.should_re_append_head_node(self.doc, current);
            let preserve = self.hooks.should_preserve_head_node(self.doc, current);

            if position.is_some() || preserve {
                if re_append {
                    to_remove.push(current);
                } else {
                    if let Some(index) = position {
                        incoming.remove(index);
                    }
                    report.kept.push(current);
                }
            } else if append_only {
                if re_append {
                    to_remove.push(current);
                    to_append.push(current);
                } else {
                    report.kept.push(current);
                }
            } else if self.hooks.should_remove_head_node(self.doc, current) {
                to_remove.push(current);
            } else {
                report.kept.push(current);
            }
        }
        to_append.extend(incoming.into_iter().map(|(_, node)| node));

        let mut signals = Vec::new();
        for source in to_append {
            if !self.hooks.before_node_added(self.doc, source) {
                continue;
            }
            let copy = self.doc.clone_subtree(source);
            let external = ["href", "src"]
                .iter()
                .any(|name| self.doc.attribute(copy, name).is_some_and(|v| !v.is_empty()));
            if track_loads && external {
                signals.push(self.doc.watch_load(copy));
            }
            self.doc.append_child(old_head, copy)?;
            self.hooks.after_node_added(self.doc, copy);
            report.added.push(copy);
        }

        for node in to_remove {
            if !self.hooks.before_node_removed(self.doc, node) {
                continue;
            }
            self.doc.detach(node);
            self.hooks.after_node_removed(self.doc, node);
            report.removed.push(node);
        }

        log::debug!(
            target: "morph.head",
            "head merge: {} added, {} kept, {} removed, {} pending loads",
            report.added.len(),
            report.kept.len(),
            report.removed.len(),
            signals.len()
        );
        self.hooks.after_head_morphed(self.doc, old_head, &report);
        Ok(signals)
    }
}

//! Live state that the structural pass cannot carry by itself.
//!
//! Parking a node in the detached pantry, or rebuilding it from scratch,
//! drops interaction state. Before mutating anything we snapshot what is
//! needed (control state of persistent-looking ids for two-pass mode, the
//! focused text control and its selection) and replay it onto the final
//! nodes afterwards.

use crate::config::MorphOptions;
use crate::error::MorphError;
use dom::{ControlState, Document, NodeId, SelectionRange};
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct CapturedControl {
    id: String,
    tag: String,
    node: NodeId,
    state: ControlState,
}

#[derive(Clone, Debug)]
struct FocusMemo {
    id: String,
    node: NodeId,
    selection: Option<SelectionRange>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct StateSnapshot {
    captured: Vec<CapturedControl>,
    focus: Option<FocusMemo>,
}

/// Ids that occur exactly once in `scope` (inclusive), with their element.
fn unique_ids(doc: &Document, scope: NodeId) -> HashMap<&str, Option<NodeId>> {
    let mut seen: HashMap<&str, Option<NodeId>> = HashMap::new();
    for node in doc.inclusive_descendants(scope) {
        if let Some(id) = doc.element_id(node) {
            seen.entry(id)
                .and_modify(|slot| *slot = None)
                .or_insert(Some(node));
        }
    }
    seen
}

/// The single element carrying `id` below any of `roots`, if exactly one does.
fn sole_element(doc: &Document, roots: &[NodeId], id: &str) -> Option<NodeId> {
    let mut found = roots.iter().flat_map(|root| doc.elements_with_id(*root, id));
    let first = found.next()?;
    match found.next() {
        Some(_) => None,
        None => Some(first),
    }
}

impl StateSnapshot {
    pub(crate) fn capture(
        doc: &Document,
        target: NodeId,
        container: NodeId,
        options: &MorphOptions,
    ) -> Self {
        let mut snapshot = Self::default();

        if options.two_pass {
            let incoming = unique_ids(doc, container);
            for (id, node) in unique_ids(doc, target) {
                let (Some(node), Some(Some(_))) = (node, incoming.get(id)) else {
                    continue;
                };
                let Some(state) = doc.control_state(node) else {
                    continue;
                };
                if *state == ControlState::default() {
                    continue;
                }
                snapshot.captured.push(CapturedControl {
                    id: id.to_string(),
                    tag: doc.tag_name(node).unwrap_or_default().to_string(),
                    node,
                    state: state.clone(),
                });
            }
            log::debug!(
                target: "morph.state",
                "captured control state of {} elements",
                snapshot.captured.len()
            );
        }

        if options.restore_focus
            && let Some(active) = doc.active_element()
            && doc.is_text_control(active)
            && let Some(id) = doc.element_id(active)
        {
            snapshot.focus = Some(FocusMemo {
                id: id.to_string(),
                node: active,
                selection: doc.selection_range(active),
            });
        }
        snapshot
    }

    /// Replay captured state onto the elements now under `roots`.
    pub(crate) fn restore(
        &self,
        doc: &mut Document,
        roots: &[NodeId],
        options: &MorphOptions,
    ) -> Result<(), MorphError> {
        for captured in &self.captured {
            let Some(node) = sole_element(doc, roots, &captured.id) else {
                log::trace!(target: "morph.state", "`{}` not uniquely present", captured.id);
                continue;
            };
            if doc.tag_name(node) != Some(captured.tag.as_str()) {
                continue;
            }
            let state = &captured.state;
            if state.indeterminate {
                doc.set_indeterminate(node, true)?;
            }
            if let Some(range) = state.selection
                && doc.selection_range(node).is_none()
                && doc.is_text_control(node)
            {
                doc.set_selection_range(node, range)?;
            }
            if node != captured.node && !options.sync_input_value {
                if let Some(value) = &state.value {
                    doc.set_value(node, value)?;
                }
                if let Some(checked) = state.checked {
                    doc.set_checked(node, checked)?;
                }
                if let Some(selected) = state.selected {
                    doc.set_selected(node, selected)?;
                }
            }
        }

        if let Some(memo) = &self.focus {
            let active = doc.active_element();
            if active != Some(memo.node)
                && active.and_then(|node| doc.element_id(node)) != Some(memo.id.as_str())
                && let Some(node) = sole_element(doc, roots, &memo.id)
                && doc.focus(node)
            {
                log::debug!(target: "morph.state", "focus restored to `{}`", memo.id);
                if let Some(range) = memo.selection
                    && doc.selection_range(node).is_none()
                    && doc.is_text_control(node)
                {
                    doc.set_selection_range(node, range)?;
                }
            }
        }
        Ok(())
    }
}

/// Drop whatever is still parked; it was never removed from the caller's
/// point of view, so no hooks fire. The pantry itself goes back to the arena.
pub(crate) fn discard_pantry(doc: &mut Document, pantry: NodeId) -> Result<(), MorphError> {
    let leftovers: Vec<NodeId> = doc.children(pantry).collect();
    if !leftovers.is_empty() {
        log::debug!(target: "morph.state", "dropping {} parked nodes", leftovers.len());
    }
    for node in leftovers {
        doc.detach(node);
    }
    doc.release(pantry)?;
    Ok(())
}

//! Live form-control properties, focus and text selection.
//!
//! Attributes carry the *default* state of a control; what a user typed,
//! ticked or selected lives here and does not round-trip through attributes.
//! A `None` dirty field means "follow the attribute".

use crate::document::Document;
use crate::error::DomError;
use crate::node::NodeId;

/// A text selection as a byte range, normalized so `start <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    #[inline]
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlState {
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub selected: Option<bool>,
    pub indeterminate: bool,
    pub selection: Option<SelectionRange>,
}

impl ControlState {
    /// Drop the state that does not survive leaving the document.
    pub fn discard_interaction(&mut self) {
        self.indeterminate = false;
        self.selection = None;
    }
}

impl Document {
    /// `input` or `textarea`: elements with an editable value and selection.
    pub fn is_text_control(&self, node: NodeId) -> bool {
        self.element(node)
            .is_some_and(|element| element.is("input") || element.is("textarea"))
    }

    pub fn control_state(&self, node: NodeId) -> Option<&ControlState> {
        self.control(node)
    }

    pub fn set_control_state(&mut self, node: NodeId, state: ControlState) -> Result<(), DomError> {
        *self.control_mut(node)? = state;
        Ok(())
    }

    /// Value before any user edit: textarea content, otherwise the `value`
    /// attribute.
    pub fn default_value(&self, node: NodeId) -> String {
        if self.is_element_named(node, "textarea") {
            return self.text_content(node);
        }
        self.attribute(node, "value").unwrap_or_default().to_string()
    }

    pub fn value(&self, node: NodeId) -> String {
        match self.control(node).and_then(|state| state.value.clone()) {
            Some(value) => value,
            None => self.default_value(node),
        }
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        let state = self.control_mut(node)?;
        state.value = Some(value.to_string());
        if let Some(range) = state.selection {
            let end = value.len();
            state.selection = Some(SelectionRange::new(range.start.min(end), range.end.min(end)));
        }
        Ok(())
    }

    pub fn checked(&self, node: NodeId) -> bool {
        self.control(node)
            .and_then(|state| state.checked)
            .unwrap_or_else(|| self.has_attribute(node, "checked"))
    }

    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<(), DomError> {
        self.control_mut(node)?.checked = Some(checked);
        Ok(())
    }

    pub fn selected(&self, node: NodeId) -> bool {
        self.control(node)
            .and_then(|state| state.selected)
            .unwrap_or_else(|| self.has_attribute(node, "selected"))
    }

    pub fn set_selected(&mut self, node: NodeId, selected: bool) -> Result<(), DomError> {
        self.control_mut(node)?.selected = Some(selected);
        Ok(())
    }

    /// Reflects the `disabled` attribute.
    pub fn disabled(&self, node: NodeId) -> bool {
        self.has_attribute(node, "disabled")
    }

    pub fn set_disabled(&mut self, node: NodeId, disabled: bool) -> Result<(), DomError> {
        if disabled {
            self.set_attribute(node, "disabled", "")
        } else {
            self.remove_attribute(node, "disabled").map(|_| ())
        }
    }

    pub fn indeterminate(&self, node: NodeId) -> bool {
        self.control(node).is_some_and(|state| state.indeterminate)
    }

    pub fn set_indeterminate(&mut self, node: NodeId, value: bool) -> Result<(), DomError> {
        self.control_mut(node)?.indeterminate = value;
        Ok(())
    }

    pub fn selection_range(&self, node: NodeId) -> Option<SelectionRange> {
        self.control(node).and_then(|state| state.selection)
    }

    pub fn set_selection_range(&mut self, node: NodeId, range: SelectionRange) -> Result<(), DomError> {
        if !self.is_text_control(node) {
            return Err(DomError::NotAnElement(node));
        }
        let end = self.value(node).len();
        self.control_mut(node)?.selection =
            Some(SelectionRange::new(range.start.min(end), range.end.min(end)));
        Ok(())
    }

    /// Focus a connected element. Returns whether focus moved to it.
    pub fn focus(&mut self, node: NodeId) -> bool {
        if self.element(node).is_none() || !self.is_connected(node) {
            return false;
        }
        self.focused = Some(node);
        true
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.focused
    }

    /// Whether the focused element sits in `scope` (inclusive).
    pub fn contains_focus(&self, scope: NodeId) -> bool {
        self.focused
            .is_some_and(|focused| self.contains(scope, focused))
    }

    pub(crate) fn discard_interaction_state(&mut self, scope: NodeId) {
        if self.contains_focus(scope) {
            self.focused = None;
        }
        let nodes: Vec<NodeId> = self.inclusive_descendants(scope).collect();
        for node in nodes {
            if let Ok(state) = self.control_mut(node) {
                state.discard_interaction();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_input(doc: &mut Document) -> NodeId {
        let input = doc.create_element("input");
        let root = doc.root();
        doc.append_child(root, input).expect("append");
        input
    }

    #[test]
    fn dirty_value_overrides_attribute() {
        let mut doc = Document::new();
        let input = connected_input(&mut doc);
        doc.set_attribute(input, "value", "a").expect("attr");
        assert_eq!(doc.value(input), "a");
        doc.set_value(input, "typed").expect("value");
        assert_eq!(doc.value(input), "typed");
        assert_eq!(doc.attribute(input, "value"), Some("a"));
    }

    #[test]
    fn textarea_default_value_is_its_text() {
        let mut doc = Document::new();
        let textarea = doc.create_element("textarea");
        let text = doc.create_text("hello");
        doc.append_child(textarea, text).expect("append");
        assert_eq!(doc.default_value(textarea), "hello");
        assert_eq!(doc.value(textarea), "hello");
    }

    #[test]
    fn checked_follows_attribute_until_dirty() {
        let mut doc = Document::new();
        let input = connected_input(&mut doc);
        doc.set_attribute(input, "checked", "").expect("attr");
        assert!(doc.checked(input));
        doc.set_checked(input, false).expect("checked");
        assert!(!doc.checked(input));
        assert!(doc.has_attribute(input, "checked"));
    }

    #[test]
    fn disabled_reflects_attribute() {
        let mut doc = Document::new();
        let input = connected_input(&mut doc);
        doc.set_disabled(input, true).expect("disable");
        assert_eq!(doc.attribute(input, "disabled"), Some(""));
        doc.set_disabled(input, false).expect("enable");
        assert!(!doc.disabled(input));
    }

    #[test]
    fn focus_requires_a_connected_element() {
        let mut doc = Document::new();
        let loose = doc.create_element("input");
        assert!(!doc.focus(loose));
        let input = connected_input(&mut doc);
        assert!(doc.focus(input));
        assert_eq!(doc.active_element(), Some(input));
    }

    #[test]
    fn leaving_the_document_discards_interaction_state() {
        let mut doc = Document::new();
        let input = connected_input(&mut doc);
        doc.set_value(input, "hello").expect("value");
        doc.set_indeterminate(input, true).expect("indeterminate");
        doc.set_selection_range(input, SelectionRange::new(1, 3))
            .expect("select");
        doc.focus(input);

        let holder = doc.create_element("div");
        doc.append_child(holder, input).expect("park");

        assert_eq!(doc.active_element(), None);
        assert!(!doc.indeterminate(input));
        assert_eq!(doc.selection_range(input), None);
        assert_eq!(doc.value(input), "hello");
    }

    #[test]
    fn connected_moves_keep_interaction_state() {
        let mut doc = Document::new();
        let root = doc.root();
        let section = doc.create_element("section");
        doc.append_child(root, section).expect("append");
        let input = connected_input(&mut doc);
        doc.set_indeterminate(input, true).expect("indeterminate");
        doc.focus(input);

        doc.append_child(section, input).expect("move");

        assert!(doc.indeterminate(input));
        assert_eq!(doc.active_element(), Some(input));
    }

    #[test]
    fn selection_is_clamped_to_value() {
        let mut doc = Document::new();
        let input = connected_input(&mut doc);
        doc.set_value(input, "abc").expect("value");
        doc.set_selection_range(input, SelectionRange::new(9, 1))
            .expect("select");
        assert_eq!(doc.selection_range(input), Some(SelectionRange::new(1, 3)));
        let div = doc.create_element("div");
        assert!(doc.set_selection_range(div, SelectionRange::new(0, 0)).is_err());
    }
}

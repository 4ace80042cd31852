//! Hook events.
//!
//! A caller can ask for selected hooks to also be broadcast as named events
//! (`im-before-node-added`, ...) to listeners registered on an
//! [`EventTarget`]. For cancelable (`before_*`) events the operation goes
//! ahead only if no listener prevented the default *and* the wrapped hook
//! agreed.

use crate::error::MorphError;
use crate::hooks::{AttributeMutation, HeadMergeReport, MorphHooks};
use dom::{Document, NodeId};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforeNodeAdded,
    AfterNodeAdded,
    BeforeNodeMorphed,
    AfterNodeMorphed,
    BeforeNodeRemoved,
    AfterNodeRemoved,
    BeforeAttributeUpdated,
}

impl HookEvent {
    pub const ALL: [HookEvent; 7] = [
        HookEvent::BeforeNodeAdded,
        HookEvent::AfterNodeAdded,
        HookEvent::BeforeNodeMorphed,
        HookEvent::AfterNodeMorphed,
        HookEvent::BeforeNodeRemoved,
        HookEvent::AfterNodeRemoved,
        HookEvent::BeforeAttributeUpdated,
    ];

    pub fn event_name(self) -> &'static str {
        match self {
            HookEvent::BeforeNodeAdded => "im-before-node-added",
            HookEvent::AfterNodeAdded => "im-after-node-added",
            HookEvent::BeforeNodeMorphed => "im-before-node-morphed",
            HookEvent::AfterNodeMorphed => "im-after-node-morphed",
            HookEvent::BeforeNodeRemoved => "im-before-node-removed",
            HookEvent::AfterNodeRemoved => "im-after-node-removed",
            HookEvent::BeforeAttributeUpdated => "im-before-attribute-updated",
        }
    }

    pub fn cancelable(self) -> bool {
        matches!(
            self,
            HookEvent::BeforeNodeAdded
                | HookEvent::BeforeNodeMorphed
                | HookEvent::BeforeNodeRemoved
                | HookEvent::BeforeAttributeUpdated
        )
    }
}

impl FromStr for HookEvent {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beforeNodeAdded" => Ok(HookEvent::BeforeNodeAdded),
            "afterNodeAdded" => Ok(HookEvent::AfterNodeAdded),
            "beforeNodeMorphed" => Ok(HookEvent::BeforeNodeMorphed),
            "afterNodeMorphed" => Ok(HookEvent::AfterNodeMorphed),
            "beforeNodeRemoved" => Ok(HookEvent::BeforeNodeRemoved),
            "afterNodeRemoved" => Ok(HookEvent::AfterNodeRemoved),
            "beforeAttributeUpdated" => Ok(HookEvent::BeforeAttributeUpdated),
            other => Err(MorphError::UnknownEvent(other.to_string())),
        }
    }
}

/// Parse `"beforeNodeAdded,afterNodeAdded"`.
pub fn parse_event_list(raw: &str) -> Result<Vec<HookEvent>, MorphError> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::parse)
        .collect()
}

pub(crate) fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<HookEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_event_list(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn comma_separated_opt<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<HookEvent>>, D::Error>
where
    D: Deserializer<'de>,
{
    comma_separated(deserializer).map(Some)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventDetail {
    Node(NodeId),
    Morph {
        old: NodeId,
        new: NodeId,
    },
    Attribute {
        name: String,
        node: NodeId,
        mutation: AttributeMutation,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MorphEvent {
    pub kind: HookEvent,
    pub detail: EventDetail,
    default_prevented: bool,
}

impl MorphEvent {
    pub fn name(&self) -> &'static str {
        self.kind.event_name()
    }

    /// No effect on non-cancelable (`after_*`) events.
    pub fn prevent_default(&mut self) {
        if self.kind.cancelable() {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

type Listener = Box<dyn FnMut(&Document, &mut MorphEvent)>;

/// Listener registry events are dispatched to.
#[derive(Default)]
pub struct EventTarget {
    listeners: Vec<(HookEvent, Listener)>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &mut self,
        kind: HookEvent,
        listener: impl FnMut(&Document, &mut MorphEvent) + 'static,
    ) {
        self.listeners.push((kind, Box::new(listener)));
    }

    pub fn remove_listeners(&mut self, kind: HookEvent) {
        self.listeners.retain(|(registered, _)| *registered != kind);
    }

    /// Returns `false` when a listener prevented the default.
    pub fn dispatch(&mut self, doc: &Document, kind: HookEvent, detail: EventDetail) -> bool {
        let mut event = MorphEvent {
            kind,
            detail,
            default_prevented: false,
        };
        log::trace!(target: "morph.events", "dispatch {}", event.name());
        for (registered, listener) in &mut self.listeners {
            if *registered == kind {
                listener(doc, &mut event);
            }
        }
        !event.default_prevented
    }

    /// Wrap `inner` so that the hooks listed in `enabled` also dispatch here.
    pub fn hooks<'a>(
        &'a mut self,
        enabled: &[HookEvent],
        inner: &'a mut dyn MorphHooks,
    ) -> EventHooks<'a> {
        EventHooks {
            target: self,
            enabled: enabled.to_vec(),
            inner,
        }
    }
}

pub struct EventHooks<'a> {
    target: &'a mut EventTarget,
    enabled: Vec<HookEvent>,
    inner: &'a mut dyn MorphHooks,
}

impl EventHooks<'_> {
    /// Dispatch if `kind` is enabled. The event always runs before the hook
    /// and both run even if the first says no.
    fn event(&mut self, doc: &Document, kind: HookEvent, detail: EventDetail) -> bool {
        if !self.enabled.contains(&kind) {
            return true;
        }
        self.target.dispatch(doc, kind, detail)
    }
}

impl MorphHooks for EventHooks<'_> {
    fn before_node_added(&mut self, doc: &Document, node: NodeId) -> bool {
        let event = self.event(doc, HookEvent::BeforeNodeAdded, EventDetail::Node(node));
        let hook = self.inner.before_node_added(doc, node);
        event && hook
    }

    fn after_node_added(&mut self, doc: &Document, node: NodeId) {
        self.event(doc, HookEvent::AfterNodeAdded, EventDetail::Node(node));
        self.inner.after_node_added(doc, node);
    }

    fn before_node_morphed(&mut self, doc: &Document, old: NodeId, new: NodeId) -> bool {
        let event = self.event(doc, HookEvent::BeforeNodeMorphed, EventDetail::Morph { old, new });
        let hook = self.inner.before_node_morphed(doc, old, new);
        event && hook
    }

    fn after_node_morphed(&mut self, doc: &Document, old: NodeId, new: NodeId) {
        self.event(doc, HookEvent::AfterNodeMorphed, EventDetail::Morph { old, new });
        self.inner.after_node_morphed(doc, old, new);
    }

    fn before_node_removed(&mut self, doc: &Document, node: NodeId) -> bool {
        let event = self.event(doc, HookEvent::BeforeNodeRemoved, EventDetail::Node(node));
        let hook = self.inner.before_node_removed(doc, node);
        event && hook
    }

    fn after_node_removed(&mut self, doc: &Document, node: NodeId) {
        self.event(doc, HookEvent::AfterNodeRemoved, EventDetail::Node(node));
        self.inner.after_node_removed(doc, node);
    }

    fn before_node_parked(&mut self, doc: &Document, node: NodeId) -> bool {
        self.inner.before_node_parked(doc, node)
    }

    fn after_node_parked(&mut self, doc: &Document, node: NodeId) {
        self.inner.after_node_parked(doc, node);
    }

    fn before_attribute_updated(
        &mut self,
        doc: &Document,
        name: &str,
        node: NodeId,
        mutation: AttributeMutation,
    ) -> bool {
        let detail = EventDetail::Attribute {
            name: name.to_string(),
            node,
            mutation,
        };
        let event = self.event(doc, HookEvent::BeforeAttributeUpdated, detail);
        let hook = self.inner.before_attribute_updated(doc, name, node, mutation);
        event && hook
    }

    fn should_preserve_head_node(&mut self, doc: &Document, node: NodeId) -> bool {
        self.inner.should_preserve_head_node(doc, node)
    }

    fn should_re_append_head_node(&mut self, doc: &Document, node: NodeId) -> bool {
        self.inner.should_re_append_head_node(doc, node)
    }

    fn should_remove_head_node(&mut self, doc: &Document, node: NodeId) -> bool {
        self.inner.should_remove_head_node(doc, node)
    }

    fn after_head_morphed(&mut self, doc: &Document, head: NodeId, report: &HeadMergeReport) {
        self.inner.after_head_morphed(doc, head, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoHooks;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn event_names_are_kebab_cased() {
        assert_eq!(HookEvent::BeforeNodeAdded.event_name(), "im-before-node-added");
        assert_eq!(
            HookEvent::BeforeAttributeUpdated.event_name(),
            "im-before-attribute-updated"
        );
        assert!(!HookEvent::AfterNodeMorphed.cancelable());
    }

    #[test]
    fn event_lists_parse() {
        assert_eq!(
            parse_event_list("beforeNodeAdded, afterNodeRemoved,"),
            Ok(vec![HookEvent::BeforeNodeAdded, HookEvent::AfterNodeRemoved])
        );
        assert_eq!(
            parse_event_list("beforeLunch"),
            Err(MorphError::UnknownEvent("beforeLunch".to_string()))
        );
    }

    #[test]
    fn prevented_event_vetoes_and_disabled_event_is_silent() {
        let doc = Document::new();
        let node = doc.root();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut target = EventTarget::new();
        let log = Rc::clone(&seen);
        target.add_listener(HookEvent::BeforeNodeAdded, move |_, event| {
            log.borrow_mut().push(event.name());
            event.prevent_default();
        });
        let log = Rc::clone(&seen);
        target.add_listener(HookEvent::BeforeNodeRemoved, move |_, event| {
            log.borrow_mut().push(event.name());
        });

        let mut inner = NoHooks;
        let mut hooks = target.hooks(&[HookEvent::BeforeNodeAdded], &mut inner);
        assert!(!hooks.before_node_added(&doc, node));
        assert!(hooks.before_node_removed(&doc, node));
        assert_eq!(*seen.borrow(), vec!["im-before-node-added"]);
    }

    #[test]
    fn after_events_cannot_be_prevented() {
        let doc = Document::new();
        let mut target = EventTarget::new();
        target.add_listener(HookEvent::AfterNodeAdded, |_, event| event.prevent_default());
        assert!(target.dispatch(&doc, HookEvent::AfterNodeAdded, EventDetail::Node(doc.root())));
    }
}

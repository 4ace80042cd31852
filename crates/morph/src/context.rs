use crate::config::{HeadStyle, MorphOptions};
use crate::hooks::MorphHooks;
use crate::id_sets::IdSets;
use crate::state::StateSnapshot;
use dom::{Document, NodeId};

/// Everything one top-level call needs; nested recursion shares it.
pub(crate) struct MorphContext {
    pub(crate) target: NodeId,
    pub(crate) container: NodeId,
    pub(crate) options: MorphOptions,
    pub(crate) ids: IdSets,
    /// Detached holding area for displaced identity-bearing nodes.
    pub(crate) pantry: NodeId,
    /// Root of the parsed content when this call created it; released at
    /// the end.
    pub(crate) scratch: Option<NodeId>,
    /// `Ignore` once a blocking head merge already ran.
    pub(crate) head_style: HeadStyle,
    pub(crate) snapshot: StateSnapshot,
}

impl MorphContext {
    pub(crate) fn new(
        doc: &mut Document,
        target: NodeId,
        container: NodeId,
        options: &MorphOptions,
    ) -> Self {
        let ids = IdSets::build(doc, target, container);
        let snapshot = StateSnapshot::capture(doc, target, container, options);
        Self {
            target,
            container,
            options: options.clone(),
            ids,
            pantry: doc.create_element("div"),
            scratch: None,
            head_style: options.head.style,
            snapshot,
        }
    }
}

pub(crate) struct Reconciler<'a> {
    pub(crate) doc: &'a mut Document,
    pub(crate) hooks: &'a mut dyn MorphHooks,
    pub(crate) ctx: &'a mut MorphContext,
}

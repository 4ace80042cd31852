//! Reconcile a live document tree toward new content in place.
//!
//! [`reconcile`] mutates the old tree as little as it can: nodes that persist
//! (same stable `id`, same tag, unique in both trees) keep their identity and
//! their live state, siblings outside the morphed window are never touched,
//! and every mutation passes through [`MorphHooks`], which may veto it.
//!
//! ```ignore
//! let mut doc = dom::Document::new();
//! // ... build the live tree under doc.root() ...
//! let placed = morph::morph(&mut doc, target, "<div id=\"x\">new</div>".into(), &Default::default())?;
//! ```

mod children;
mod config;
mod context;
mod error;
mod events;
mod head;
mod hooks;
mod id_sets;
mod normalize;
mod state;
mod sync;

pub use config::{HeadOptions, HeadPatch, HeadStyle, MorphOptions, MorphStyle, OptionsPatch};
pub use error::MorphError;
pub use events::{EventDetail, EventHooks, EventTarget, HookEvent, MorphEvent, parse_event_list};
pub use hooks::{AttributeMutation, HeadMergeReport, MorphHooks, NoHooks};
pub use normalize::{Content, Normalized, normalize_content};

use context::{MorphContext, Reconciler};
use dom::{Document, LoadSignal, NodeId};
use futures::future::join_all;

/// Outcome of [`reconcile`].
#[derive(Debug)]
pub enum Morph {
    /// The nodes now occupying the morphed range.
    Done(Vec<NodeId>),
    /// A blocking head merge is waiting for resources to load.
    Pending(PendingMorph),
}

impl Morph {
    /// The placed nodes, if the morph already completed.
    pub fn done(self) -> Option<Vec<NodeId>> {
        match self {
            Morph::Done(nodes) => Some(nodes),
            Morph::Pending(_) => None,
        }
    }
}

/// The remainder of a morph whose head merge is waiting on loads.
///
/// Holds no borrow of the document: await [`PendingMorph::loaded`] while
/// whoever fetches the resources reports them through
/// [`Document::complete_load`], then run [`PendingMorph::finish`]. The caller
/// must not touch the morphed region in between.
pub struct PendingMorph {
    ctx: MorphContext,
    signals: Vec<LoadSignal>,
}

impl std::fmt::Debug for PendingMorph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMorph")
            .field("target", &self.ctx.target)
            .field("waiting_on", &self.waiting_on())
            .finish()
    }
}

impl PendingMorph {
    /// Nodes whose load completion is awaited.
    pub fn waiting_on(&self) -> Vec<NodeId> {
        self.signals.iter().map(LoadSignal::node).collect()
    }

    /// Resolves once every awaited load has settled.
    pub async fn loaded(&mut self) {
        let settled = join_all(self.signals.iter_mut()).await;
        log::debug!(target: "morph.head", "{} head resources settled", settled.len());
    }

    /// Run the rest of the morph. Loads still in flight are no longer waited for.
    pub fn finish(
        mut self,
        doc: &mut Document,
        hooks: &mut dyn MorphHooks,
    ) -> Result<Vec<NodeId>, MorphError> {
        finish(doc, hooks, &mut self.ctx)
    }
}

/// [`reconcile`] without hooks.
pub fn morph(
    doc: &mut Document,
    target: NodeId,
    content: Content<'_>,
    options: &MorphOptions,
) -> Result<Morph, MorphError> {
    reconcile(doc, target, content, options, &mut NoHooks)
}

/// Morph `target` toward `content`.
///
/// Configuration errors (a non-element target, an outer morph of a node
/// without a parent) are reported before anything is mutated.
///
/// Markup (and [`Content::Empty`]) is parsed into nodes owned by this call;
/// they are released when the morph finishes, so their handles must not be
/// kept past the hooks that receive them. Removed old nodes stay valid until
/// the caller releases them with [`Document::release`].
pub fn reconcile(
    doc: &mut Document,
    target: NodeId,
    content: Content<'_>,
    options: &MorphOptions,
    hooks: &mut dyn MorphHooks,
) -> Result<Morph, MorphError> {
    let target = normalize::normalize_target(doc, target)?;
    if options.style == MorphStyle::Outer && doc.parent(target).is_none() {
        return Err(MorphError::InvalidTarget(target, "outer morph needs a parent"));
    }
    let owned = matches!(content, Content::Markup(_) | Content::Empty);
    let normalized = normalize_content(doc, content)?;
    let mut ctx = MorphContext::new(doc, target, normalized.container, options);
    if owned {
        ctx.scratch = Some(doc.top(normalized.container));
    }
    log::debug!(
        target: "morph.children",
        "morph {:?} ({}) into {:?}",
        target,
        options.style,
        normalized.container
    );

    if options.head.block && matches!(options.head.style, HeadStyle::Merge | HeadStyle::Append) {
        let old_head = doc.find_element_named(target, "head");
        let new_head = doc.find_element_named(normalized.container, "head");
        if let (Some(old_head), Some(new_head)) = (old_head, new_head) {
            let signals = Reconciler {
                doc: &mut *doc,
                hooks: &mut *hooks,
                ctx: &mut ctx,
            }
            .merge_head(old_head, new_head, true)?;
            ctx.head_style = HeadStyle::Ignore;
            if !signals.is_empty() {
                log::debug!(
                    target: "morph.head",
                    "morph pending on {} head resources",
                    signals.len()
                );
                return Ok(Morph::Pending(PendingMorph { ctx, signals }));
            }
        }
    }

    finish(doc, hooks, &mut ctx).map(Morph::Done)
}

fn finish(
    doc: &mut Document,
    hooks: &mut dyn MorphHooks,
    ctx: &mut MorphContext,
) -> Result<Vec<NodeId>, MorphError> {
    let target = ctx.target;
    let container = ctx.container;
    let mut reconciler = Reconciler { doc, hooks, ctx };

    let placed: Vec<NodeId> = match reconciler.ctx.options.style {
        MorphStyle::Inner => {
            reconciler.morph_children(target, container, None, None)?;
            reconciler.doc.children(target).collect()
        }
        MorphStyle::Attributes => {
            if let Some(first) = reconciler.doc.first_child(container) {
                reconciler.morph_attributes(target, first)?;
            }
            vec![target]
        }
        MorphStyle::Outer => {
            let parent = reconciler
                .doc
                .parent(target)
                .ok_or(MorphError::InvalidTarget(target, "outer morph needs a parent"))?;
            let before_start = reconciler.doc.prev_sibling(target);
            let end = reconciler.doc.next_sibling(target);
            reconciler.morph_children(parent, container, Some(target), end)?;

            let mut placed = Vec::new();
            let mut cursor = match before_start {
                Some(node) => reconciler.doc.next_sibling(node),
                None => reconciler.doc.first_child(parent),
            };
            while let Some(node) = cursor
                && cursor != end
            {
                placed.push(node);
                cursor = reconciler.doc.next_sibling(node);
            }
            placed
        }
    };

    let Reconciler { doc, ctx, .. } = reconciler;
    let roots = match ctx.options.style {
        MorphStyle::Outer => placed.clone(),
        MorphStyle::Inner | MorphStyle::Attributes => vec![target],
    };
    ctx.snapshot.restore(doc, &roots, &ctx.options)?;
    state::discard_pantry(doc, ctx.pantry)?;
    if let Some(scratch) = ctx.scratch.take() {
        let released = doc.release(scratch)?;
        log::trace!(target: "morph.state", "released {released} parsed nodes");
    }
    log::debug!(target: "morph.children", "morph placed {} nodes", placed.len());
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(doc: &mut Document, markup: &str) -> NodeId {
        let root = doc.root();
        let host = doc.create_element("main");
        doc.append_child(root, host).expect("append");
        html::parse_into(doc, host, markup).expect("parse");
        host
    }

    fn done(result: Result<Morph, MorphError>) -> Vec<NodeId> {
        result.expect("morph").done().expect("completed synchronously")
    }

    #[test]
    fn inner_morph_reuses_matching_nodes() {
        let mut doc = Document::new();
        let host = live(&mut doc, r#"<p id="a">one</p><p>two</p>"#);
        let a = doc.find_element_by_id(host, "a").expect("a");
        let options = MorphOptions::default().with_style(MorphStyle::Inner);
        let placed = done(morph(
            &mut doc,
            host,
            Content::Markup(r#"<p>zero</p><p id="a">uno</p>"#),
            &options,
        ));
        assert_eq!(doc.inner_html(host), r#"<p>zero</p><p id="a">uno</p>"#);
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1], a);
    }

    #[test]
    fn outer_morph_returns_the_window() {
        let mut doc = Document::new();
        let host = live(&mut doc, r#"<i>before</i><p id="t">x</p><i>after</i>"#);
        let target = doc.find_element_by_id(host, "t").expect("target");
        let placed = done(morph(
            &mut doc,
            target,
            Content::Markup(r#"<p id="t">y</p><b>extra</b>"#),
            &MorphOptions::default(),
        ));
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0], target);
        assert_eq!(
            doc.inner_html(host),
            r#"<i>before</i><p id="t">y</p><b>extra</b><i>after</i>"#
        );
    }

    #[test]
    fn outer_morph_of_a_parentless_node_fails_before_mutation() {
        let mut doc = Document::new();
        let lonely = doc.create_element("div");
        let err = morph(&mut doc, lonely, Content::Markup("<p></p>"), &MorphOptions::default())
            .expect_err("no parent");
        assert!(matches!(err, MorphError::InvalidTarget(node, _) if node == lonely));
        assert_eq!(doc.first_child(lonely), None);
    }

    #[test]
    fn attribute_style_only_touches_attributes() {
        let mut doc = Document::new();
        let host = live(&mut doc, r#"<div class="a" title="t"><span>keep</span></div>"#);
        let div = doc.first_child(host).expect("div");
        let options = MorphOptions::default().with_style(MorphStyle::Attributes);
        let placed = done(morph(
            &mut doc,
            div,
            Content::Markup(r#"<div class="b"><em>ignored</em></div>"#),
            &options,
        ));
        assert_eq!(placed, vec![div]);
        assert_eq!(doc.outer_html(div), r#"<div class="b"><span>keep</span></div>"#);
    }

    #[test]
    fn empty_content_clears_an_inner_target() {
        let mut doc = Document::new();
        let host = live(&mut doc, "<p>a</p>text");
        let options = MorphOptions::default().with_style(MorphStyle::Inner);
        let placed = done(morph(&mut doc, host, Content::Empty, &options));
        assert!(placed.is_empty());
        assert_eq!(doc.first_child(host), None);
    }
}

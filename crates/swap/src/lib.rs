//! Swap-string front end for `morph`.
//!
//! A swap string such as `morph:innerHTML` or `morph:compact,slow` selects a
//! morph style or a set of named configuration bundles. Bundles live in an
//! explicit [`ConfigRegistry`], so independent callers (and tests) never
//! share configuration by accident.

use dom::{Document, NodeId};
use morph::{
    AttributeMutation, Content, EventTarget, HeadMergeReport, Morph, MorphError, MorphHooks,
    MorphOptions, MorphStyle, OptionsPatch,
};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("invalid configuration bundle: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{0}` is not a morph swap style")]
    Style(String),
    #[error(transparent)]
    Morph(#[from] MorphError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwapStyle {
    Outer,
    Inner,
    Attributes,
    /// Attributes style that never adds or changes an attribute.
    RemoveAttributes,
    /// Attributes style that never removes an attribute.
    AddAttributes,
    /// Named bundles, merged in order over the defaults.
    Named(Vec<String>),
}

/// Parse a swap string. Anything that does not start with `morph` (or has an
/// unrecognized suffix) is not ours and yields `None`.
pub fn parse_swap_style(swap: &str) -> Option<SwapStyle> {
    let rest = swap.strip_prefix("morph")?.replace(';', ":");
    let style = match rest.as_str() {
        "" | ":outerHTML" => SwapStyle::Outer,
        ":innerHTML" => SwapStyle::Inner,
        ":attributes" => SwapStyle::Attributes,
        ":removeAttributes" => SwapStyle::RemoveAttributes,
        ":addAttributes" => SwapStyle::AddAttributes,
        other => {
            let names = other.strip_prefix(':')?;
            SwapStyle::Named(names.split(',').map(str::to_string).collect())
        }
    };
    Some(style)
}

/// Resolved options for one swap, plus the attribute mutation it forbids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapConfig {
    pub options: MorphOptions,
    pub veto: Option<AttributeMutation>,
}

impl SwapConfig {
    /// Wrap `inner` so that the forbidden attribute mutation is vetoed.
    pub fn hooks<'a>(&self, inner: &'a mut dyn MorphHooks) -> SwapHooks<'a> {
        SwapHooks {
            veto: self.veto,
            inner,
        }
    }
}

pub struct SwapHooks<'a> {
    veto: Option<AttributeMutation>,
    inner: &'a mut dyn MorphHooks,
}

impl MorphHooks for SwapHooks<'_> {
    fn before_node_added(&mut self, doc: &Document, node: NodeId) -> bool {
        self.inner.before_node_added(doc, node)
    }

    fn after_node_added(&mut self, doc: &Document, node: NodeId) {
        self.inner.after_node_added(doc, node);
    }

    fn before_node_morphed(&mut self, doc: &Document, old: NodeId, new: NodeId) -> bool {
        self.inner.before_node_morphed(doc, old, new)
    }

    fn after_node_morphed(&mut self, doc: &Document, old: NodeId, new: NodeId) {
        self.inner.after_node_morphed(doc, old, new);
    }

    fn before_node_removed(&mut self, doc: &Document, node: NodeId) -> bool {
        self.inner.before_node_removed(doc, node)
    }

    fn after_node_removed(&mut self, doc: &Document, node: NodeId) {
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
        if self.veto == Some(mutation) {
            return false;
        }
        self.inner.before_attribute_updated(doc, name, node, mutation)
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

#[derive(Deserialize)]
struct BundleFile {
    #[serde(default)]
    defaults: OptionsPatch,
    #[serde(flatten)]
    bundles: HashMap<String, OptionsPatch>,
}

/// Default options plus named partial bundles.
#[derive(Clone, Debug, Default)]
pub struct ConfigRegistry {
    defaults: MorphOptions,
    bundles: HashMap<String, OptionsPatch>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: MorphOptions) -> Self {
        Self {
            defaults,
            bundles: HashMap::new(),
        }
    }

    /// Load `{"defaults": {...}, "<name>": {...}, ...}`.
    pub fn from_json(json: &str) -> Result<Self, SwapError> {
        let file: BundleFile = serde_json::from_str(json)?;
        let mut registry = Self::new();
        file.defaults.apply_to(&mut registry.defaults);
        for (name, bundle) in file.bundles {
            registry.add(name, bundle);
        }
        log::debug!(target: "swap", "loaded {} configuration bundles", registry.bundles.len());
        Ok(registry)
    }

    pub fn defaults(&self) -> &MorphOptions {
        &self.defaults
    }

    /// Register `bundle` under `name`, replacing any previous one.
    pub fn add(&mut self, name: impl Into<String>, bundle: OptionsPatch) {
        self.bundles.insert(name.into(), bundle);
    }

    pub fn get(&self, name: &str) -> Option<&OptionsPatch> {
        self.bundles.get(name)
    }

    /// Merge the named bundles, in order, over the defaults.
    pub fn resolve<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> MorphOptions {
        let mut options = self.defaults.clone();
        for name in names {
            match self.bundles.get(name) {
                Some(bundle) => bundle.apply_to(&mut options),
                None => log::debug!(target: "swap", "no configuration bundle named `{name}`"),
            }
        }
        options
    }

    pub fn config_for(&self, swap: &str) -> Result<SwapConfig, SwapError> {
        let style = parse_swap_style(swap).ok_or_else(|| SwapError::Style(swap.to_string()))?;
        Ok(self.config_for_style(&style))
    }

    fn config_for_style(&self, style: &SwapStyle) -> SwapConfig {
        let with_style = |style| self.defaults.clone().with_style(style);
        match style {
            SwapStyle::Outer => SwapConfig {
                options: with_style(MorphStyle::Outer),
                veto: None,
            },
            SwapStyle::Inner => SwapConfig {
                options: with_style(MorphStyle::Inner),
                veto: None,
            },
            SwapStyle::Attributes => SwapConfig {
                options: with_style(MorphStyle::Attributes),
                veto: None,
            },
            SwapStyle::RemoveAttributes => SwapConfig {
                options: with_style(MorphStyle::Attributes),
                veto: Some(AttributeMutation::Update),
            },
            SwapStyle::AddAttributes => SwapConfig {
                options: with_style(MorphStyle::Attributes),
                veto: Some(AttributeMutation::Remove),
            },
            SwapStyle::Named(names) => SwapConfig {
                options: self.resolve(names.iter().map(String::as_str)),
                veto: None,
            },
        }
    }

    /// Whether a swap replaces the target itself rather than its children.
    /// Strings that are not morph swaps resolve to the defaults.
    pub fn is_inline_swap(&self, swap: &str) -> bool {
        let style = match parse_swap_style(swap) {
            Some(style) => self.config_for_style(&style).options.style,
            None => self.defaults.style,
        };
        style != MorphStyle::Inner
    }
}

/// Morph `target` toward the element children of `fragment`.
///
/// Returns `Ok(None)` when `swap` is not a morph swap string.
pub fn handle_swap(
    doc: &mut Document,
    registry: &ConfigRegistry,
    swap: &str,
    target: NodeId,
    fragment: NodeId,
    hooks: &mut dyn MorphHooks,
) -> Result<Option<Morph>, SwapError> {
    let Some(style) = parse_swap_style(swap) else {
        return Ok(None);
    };
    let config = registry.config_for_style(&style);
    let mut hooks = config.hooks(hooks);
    run_swap(doc, &config, target, fragment, &mut hooks).map(Some)
}

/// [`handle_swap`], also dispatching the configured hook events to `events`.
pub fn handle_swap_with_events(
    doc: &mut Document,
    registry: &ConfigRegistry,
    swap: &str,
    target: NodeId,
    fragment: NodeId,
    hooks: &mut dyn MorphHooks,
    events: &mut EventTarget,
) -> Result<Option<Morph>, SwapError> {
    let Some(style) = parse_swap_style(swap) else {
        return Ok(None);
    };
    let config = registry.config_for_style(&style);
    let mut swap_hooks = config.hooks(hooks);
    let mut hooks = events.hooks(&config.options.event_callbacks, &mut swap_hooks);
    run_swap(doc, &config, target, fragment, &mut hooks).map(Some)
}

fn run_swap(
    doc: &mut Document,
    config: &SwapConfig,
    target: NodeId,
    fragment: NodeId,
    hooks: &mut dyn MorphHooks,
) -> Result<Morph, SwapError> {
    let nodes: Vec<NodeId> = doc.element_children(fragment).collect();
    log::trace!(
        target: "swap",
        "{} swap of {target:?} with {} nodes",
        config.options.style,
        nodes.len()
    );
    let morph = morph::reconcile(doc, target, Content::Nodes(nodes), &config.options, hooks)?;
    Ok(morph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph::{HookEvent, NoHooks};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn swap_strings_parse() {
        assert_eq!(parse_swap_style("morph"), Some(SwapStyle::Outer));
        assert_eq!(parse_swap_style("morph:outerHTML"), Some(SwapStyle::Outer));
        assert_eq!(parse_swap_style("morph;innerHTML"), Some(SwapStyle::Inner));
        assert_eq!(parse_swap_style("morph:attributes"), Some(SwapStyle::Attributes));
        assert_eq!(
            parse_swap_style("morph:removeAttributes"),
            Some(SwapStyle::RemoveAttributes)
        );
        assert_eq!(
            parse_swap_style("morph:addAttributes"),
            Some(SwapStyle::AddAttributes)
        );
        assert_eq!(
            parse_swap_style("morph:compact,quiet"),
            Some(SwapStyle::Named(vec!["compact".into(), "quiet".into()]))
        );
        assert_eq!(parse_swap_style("innerHTML"), None);
        assert_eq!(parse_swap_style("morphing"), None);
    }

    #[test]
    fn registry_merges_bundles_in_order() {
        let registry = ConfigRegistry::from_json(
            r#"{
                "defaults": {"ignoreActive": true},
                "inner": {"morphStyle": "innerHTML", "twoPass": true},
                "outer": {"morphStyle": "outerHTML"}
            }"#,
        )
        .expect("registry");
        assert!(registry.defaults().ignore_active);

        let options = registry.resolve(["inner", "missing"]);
        assert_eq!(options.style, MorphStyle::Inner);
        assert!(options.two_pass);
        assert!(options.ignore_active);

        let options = registry.resolve(["inner", "outer"]);
        assert_eq!(options.style, MorphStyle::Outer);
        assert!(options.two_pass);

        let config = registry.config_for("morph:inner").expect("config");
        assert_eq!(config.options.style, MorphStyle::Inner);
        assert_eq!(config.veto, None);
    }

    #[test]
    fn registries_are_independent() {
        let mut first = ConfigRegistry::new();
        let second = ConfigRegistry::new();
        first.add("inner", OptionsPatch::style(MorphStyle::Inner));
        assert_eq!(first.resolve(["inner"]).style, MorphStyle::Inner);
        assert_eq!(second.resolve(["inner"]).style, MorphStyle::Outer);
    }

    #[test]
    fn inline_swaps() {
        let mut registry = ConfigRegistry::new();
        registry.add("inside", OptionsPatch::style(MorphStyle::Inner));
        assert!(registry.is_inline_swap("morph"));
        assert!(registry.is_inline_swap("morph:attributes"));
        assert!(!registry.is_inline_swap("morph:innerHTML"));
        assert!(!registry.is_inline_swap("morph:inside"));
        assert!(registry.is_inline_swap("outerHTML"));
    }

    #[test]
    fn bad_inputs_are_reported() {
        let registry = ConfigRegistry::new();
        assert!(matches!(registry.config_for("swap"), Err(SwapError::Style(_))));
        assert!(matches!(
            ConfigRegistry::from_json(r#"{"x": {"morphStyle": "sideways"}}"#),
            Err(SwapError::Json(_))
        ));
    }

    fn live_div(doc: &mut Document, markup: &str) -> NodeId {
        let root = doc.root();
        let host = doc.create_element("body");
        doc.append_child(root, host).expect("append");
        html::parse_into(doc, host, markup).expect("parse");
        doc.first_child(host).expect("div")
    }

    #[test]
    fn attribute_only_variants_veto_one_direction() {
        let registry = ConfigRegistry::new();

        let mut doc = Document::new();
        let div = live_div(&mut doc, r#"<div class="old" title="t"></div>"#);
        let fragment = html::parse_fragment(&mut doc, r#"<div class="new" lang="en"></div>"#)
            .expect("parse");
        handle_swap(&mut doc, &registry, "morph:addAttributes", div, fragment, &mut NoHooks)
            .expect("swap");
        assert_eq!(
            doc.outer_html(div),
            r#"<div class="new" title="t" lang="en"></div>"#
        );

        let mut doc = Document::new();
        let div = live_div(&mut doc, r#"<div class="old" title="t"></div>"#);
        let fragment = html::parse_fragment(&mut doc, r#"<div class="new" lang="en"></div>"#)
            .expect("parse");
        handle_swap(&mut doc, &registry, "morph:removeAttributes", div, fragment, &mut NoHooks)
            .expect("swap");
        assert_eq!(doc.outer_html(div), r#"<div class="old"></div>"#);
    }

    #[test]
    fn non_morph_swaps_are_left_alone() {
        let registry = ConfigRegistry::new();
        let mut doc = Document::new();
        let div = live_div(&mut doc, "<div>x</div>");
        let fragment = html::parse_fragment(&mut doc, "<p>y</p>").expect("parse");
        let result = handle_swap(&mut doc, &registry, "innerHTML", div, fragment, &mut NoHooks)
            .expect("swap");
        assert!(result.is_none());
        assert_eq!(doc.outer_html(div), "<div>x</div>");
    }

    #[test]
    fn swap_dispatches_configured_events() {
        let mut registry = ConfigRegistry::new();
        let mut bundle = OptionsPatch::style(MorphStyle::Inner);
        bundle.event_callbacks = Some(vec![HookEvent::BeforeNodeAdded]);
        registry.add("noisy", bundle);

        let mut doc = Document::new();
        let div = live_div(&mut doc, "<div><p>a</p></div>");
        let fragment = html::parse_fragment(&mut doc, "<p>a</p><p>b</p>text").expect("parse");

        let names = Rc::new(RefCell::new(Vec::new()));
        let mut events = EventTarget::new();
        let seen = Rc::clone(&names);
        events.add_listener(HookEvent::BeforeNodeAdded, move |doc, event| {
            if let morph::EventDetail::Node(node) = event.detail {
                seen.borrow_mut().push(doc.outer_html(node));
            }
        });
        handle_swap_with_events(
            &mut doc,
            &registry,
            "morph:noisy",
            div,
            fragment,
            &mut NoHooks,
            &mut events,
        )
        .expect("swap");
        assert_eq!(doc.inner_html(div), "<p>a</p><p>b</p>");
        assert_eq!(*names.borrow(), vec!["<p>b</p>".to_string()]);
    }
}

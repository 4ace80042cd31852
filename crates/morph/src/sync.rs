//! Per-node synchronization: attributes, character data, live form values.

use crate::config::HeadStyle;
use crate::context::Reconciler;
use crate::error::MorphError;
use crate::hooks::AttributeMutation;
use dom::{NodeCategory, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BooleanProperty {
    Checked,
    Disabled,
    Selected,
}

impl BooleanProperty {
    fn name(self) -> &'static str {
        match self {
            BooleanProperty::Checked => "checked",
            BooleanProperty::Disabled => "disabled",
            BooleanProperty::Selected => "selected",
        }
    }
}

impl Reconciler<'_> {
    pub(crate) fn morph_node(&mut self, old: NodeId, new: NodeId) -> Result<(), MorphError> {
        if self.ctx.options.ignore_active && self.doc.active_element() == Some(old) {
            log::trace!(target: "morph.children", "focused {old:?} left alone");
            return Ok(());
        }
        if !self.hooks.before_node_morphed(self.doc, old, new) {
            return Ok(());
        }

        let heads = self.doc.is_element_named(old, "head") && self.doc.is_element_named(new, "head");
        match self.ctx.head_style {
            HeadStyle::Ignore if heads => {}
            HeadStyle::Merge | HeadStyle::Append if heads => {
                self.merge_head(old, new, false)?;
            }
            _ => {
                self.morph_attributes(old, new)?;
                if self.ctx.options.sync_input_value || !self.doc.children_equal(old, new) {
                    self.morph_children(old, new, None, None)?;
                }
            }
        }

        self.hooks.after_node_morphed(self.doc, old, new);
        Ok(())
    }

    fn attribute_allowed(&mut self, name: &str, node: NodeId, mutation: AttributeMutation) -> bool {
        let allowed = self.hooks.before_attribute_updated(self.doc, name, node, mutation);
        if !allowed {
            log::trace!(target: "morph.children", "{mutation:?} of `{name}` on {node:?} vetoed");
        }
        allowed
    }

    pub(crate) fn morph_attributes(&mut self, old: NodeId, new: NodeId) -> Result<(), MorphError> {
        match self.doc.category(new) {
            NodeCategory::Element => {}
            NodeCategory::Text | NodeCategory::Comment => {
                if let Some(text) = self.doc.text(new)
                    && let Some(current) = self.doc.text(old)
                    && current != text
                {
                    let text = text.to_string();
                    self.doc.set_text(old, &text)?;
                }
                return Ok(());
            }
            NodeCategory::Document => return Ok(()),
        }
        if self.doc.element(old).is_none() {
            return Ok(());
        }

        let new_attributes = self.doc.attributes(new).to_vec();
        for (name, value) in &new_attributes {
            if !self.attribute_allowed(name, old, AttributeMutation::Update) {
                continue;
            }
            if self.doc.attribute(old, name) != Some(value.as_str()) {
                self.doc.set_attribute(old, name, value)?;
            }
        }

        let old_names: Vec<String> = self
            .doc
            .attributes(old)
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        for name in old_names.iter().rev() {
            if self.doc.has_attribute(new, name) {
                continue;
            }
            if !self.attribute_allowed(name, old, AttributeMutation::Remove) {
                continue;
            }
            self.doc.remove_attribute(old, name)?;
        }

        if self.ctx.options.ignore_active_value && self.doc.active_element() == Some(old) {
            return Ok(());
        }
        if self.ctx.options.sync_input_value {
            self.sync_input_value(old, new)?;
        } else if self.both_named(old, new, "textarea")
            && self.doc.default_value(old) != self.doc.default_value(new)
            && self.attribute_allowed("value", old, AttributeMutation::Update)
        {
            let value = self.doc.value(new);
            self.doc.set_value(old, &value)?;
        }
        Ok(())
    }

    fn sync_input_value(&mut self, old: NodeId, new: NodeId) -> Result<(), MorphError> {
        if self.both_named(old, new, "input") && self.doc.attribute(new, "type") != Some("file") {
            self.sync_boolean(old, new, BooleanProperty::Checked)?;
            self.sync_boolean(old, new, BooleanProperty::Disabled)?;

            match self.doc.attribute(new, "value").map(str::to_string) {
                None => {
                    if self.attribute_allowed("value", old, AttributeMutation::Remove) {
                        self.doc.set_value(old, "")?;
                        self.doc.remove_attribute(old, "value")?;
                    }
                }
                Some(_) => {
                    let new_value = self.doc.value(new);
                    if self.doc.value(old) != new_value
                        && self.attribute_allowed("value", old, AttributeMutation::Update)
                    {
                        self.doc.set_attribute(old, "value", &new_value)?;
                        self.doc.set_value(old, &new_value)?;
                    }
                }
            }
        } else if self.both_named(old, new, "option") {
            self.sync_boolean(old, new, BooleanProperty::Selected)?;
        } else if self.both_named(old, new, "textarea") {
            if !self.attribute_allowed("value", old, AttributeMutation::Update) {
                return Ok(());
            }
            let new_value = self.doc.value(new);
            if self.doc.value(old) != new_value {
                self.doc.set_value(old, &new_value)?;
            }
        }
        Ok(())
    }

    fn both_named(&self, old: NodeId, new: NodeId, name: &str) -> bool {
        self.doc.is_element_named(old, name) && self.doc.is_element_named(new, name)
    }

    fn live(&self, node: NodeId, property: BooleanProperty) -> bool {
        match property {
            BooleanProperty::Checked => self.doc.checked(node),
            BooleanProperty::Disabled => self.doc.disabled(node),
            BooleanProperty::Selected => self.doc.selected(node),
        }
    }

    /// Sync a boolean property and its attribute reflection.
    fn sync_boolean(
        &mut self,
        old: NodeId,
        new: NodeId,
        property: BooleanProperty,
    ) -> Result<(), MorphError> {
        let new_value = self.live(new, property);
        if new_value == self.live(old, property) {
            return Ok(());
        }
        let name = property.name();
        let ignore_update = !self.attribute_allowed(name, old, AttributeMutation::Update);
        if !ignore_update {
            match property {
                BooleanProperty::Checked => self.doc.set_checked(old, new_value)?,
                BooleanProperty::Disabled => self.doc.set_disabled(old, new_value)?,
                BooleanProperty::Selected => self.doc.set_selected(old, new_value)?,
            }
        }
        if new_value {
            if !ignore_update {
                self.doc.set_attribute(old, name, "")?;
            }
        } else if self.attribute_allowed(name, old, AttributeMutation::Remove) {
            self.doc.remove_attribute(old, name)?;
        }
        Ok(())
    }
}

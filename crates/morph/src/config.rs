//! Morph options.
//!
//! Options are plain data with a `Default` and serde support, so callers can
//! keep them in JSON or TOML alongside the rest of their configuration. Keys
//! are camelCase; `morphStyle` is accepted as an alias of `style`.

use crate::error::MorphError;
use crate::events::{HookEvent, comma_separated, comma_separated_opt};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Which part of the target the new content replaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum MorphStyle {
    /// The target itself may be replaced; its siblings are left alone.
    #[default]
    Outer,
    /// Only the target's children are reconciled.
    Inner,
    /// Only the attributes of the first new node are copied onto the target.
    Attributes,
}

impl FromStr for MorphStyle {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outer" | "outerHTML" => Ok(MorphStyle::Outer),
            "inner" | "innerHTML" => Ok(MorphStyle::Inner),
            "attributes" => Ok(MorphStyle::Attributes),
            other => Err(MorphError::UnknownStyle(other.to_string())),
        }
    }
}

impl TryFrom<String> for MorphStyle {
    type Error = MorphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for MorphStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MorphStyle::Outer => "outerHTML",
            MorphStyle::Inner => "innerHTML",
            MorphStyle::Attributes => "attributes",
        })
    }
}

/// Strategy for `head` regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum HeadStyle {
    /// Keep matching children, append new ones, remove the rest.
    #[default]
    Merge,
    /// Keep everything, append new children.
    Append,
    /// Leave the head untouched.
    Ignore,
    /// Treat the head as ordinary content.
    Morph,
}

impl FromStr for HeadStyle {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(HeadStyle::Merge),
            "append" => Ok(HeadStyle::Append),
            "ignore" | "none" => Ok(HeadStyle::Ignore),
            "morph" => Ok(HeadStyle::Morph),
            other => Err(MorphError::UnknownHeadStyle(other.to_string())),
        }
    }
}

impl TryFrom<String> for HeadStyle {
    type Error = MorphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadOptions {
    pub style: HeadStyle,
    /// Merge the head first and finish the morph only once every newly added
    /// resource has loaded.
    pub block: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MorphOptions {
    #[serde(alias = "morphStyle")]
    pub style: MorphStyle,
    /// Leave the focused element completely untouched.
    pub ignore_active: bool,
    /// Leave the focused element's live value alone, morph everything else.
    pub ignore_active_value: bool,
    /// Force live values (value, checked, selected) to follow the new content.
    pub sync_input_value: bool,
    /// Snapshot control state before the morph and replay it afterwards.
    pub two_pass: bool,
    pub restore_focus: bool,
    pub head: HeadOptions,
    /// Hooks that also dispatch a [`MorphEvent`](crate::MorphEvent).
    #[serde(deserialize_with = "comma_separated")]
    pub event_callbacks: Vec<HookEvent>,
}

impl Default for MorphOptions {
    fn default() -> Self {
        Self {
            style: MorphStyle::Outer,
            ignore_active: false,
            ignore_active_value: false,
            sync_input_value: false,
            two_pass: false,
            restore_focus: true,
            head: HeadOptions::default(),
            event_callbacks: Vec::new(),
        }
    }
}

impl MorphOptions {
    pub fn with_style(mut self, style: MorphStyle) -> Self {
        self.style = style;
        self
    }

    /// A copy of `self` with every field set in `patch` overridden.
    pub fn patched(&self, patch: &OptionsPatch) -> Self {
        let mut options = self.clone();
        patch.apply_to(&mut options);
        options
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadPatch {
    pub style: Option<HeadStyle>,
    pub block: Option<bool>,
}

/// A partial [`MorphOptions`]: only the fields present override.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptionsPatch {
    #[serde(alias = "morphStyle")]
    pub style: Option<MorphStyle>,
    pub ignore_active: Option<bool>,
    pub ignore_active_value: Option<bool>,
    pub sync_input_value: Option<bool>,
    pub two_pass: Option<bool>,
    pub restore_focus: Option<bool>,
    pub head: Option<HeadPatch>,
    #[serde(deserialize_with = "comma_separated_opt")]
    pub event_callbacks: Option<Vec<HookEvent>>,
}

impl OptionsPatch {
    pub fn style(style: MorphStyle) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, options: &mut MorphOptions) {
        if let Some(style) = self.style {
            options.style = style;
        }
        if let Some(value) = self.ignore_active {
            options.ignore_active = value;
        }
        if let Some(value) = self.ignore_active_value {
            options.ignore_active_value = value;
        }
        if let Some(value) = self.sync_input_value {
            options.sync_input_value = value;
        }
        if let Some(value) = self.two_pass {
            options.two_pass = value;
        }
        if let Some(value) = self.restore_focus {
            options.restore_focus = value;
        }
        if let Some(head) = &self.head {
            if let Some(style) = head.style {
                options.head.style = style;
            }
            if let Some(block) = head.block {
                options.head.block = block;
            }
        }
        if let Some(events) = &self.event_callbacks {
            options.event_callbacks = events.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_strings_parse() {
        assert_eq!("outerHTML".parse::<MorphStyle>(), Ok(MorphStyle::Outer));
        assert_eq!("inner".parse::<MorphStyle>(), Ok(MorphStyle::Inner));
        assert_eq!("attributes".parse::<MorphStyle>(), Ok(MorphStyle::Attributes));
        assert_eq!(
            "sideways".parse::<MorphStyle>(),
            Err(MorphError::UnknownStyle("sideways".to_string()))
        );
    }

    #[test]
    fn defaults_restore_focus_and_merge_head() {
        let options = MorphOptions::default();
        assert_eq!(options.style, MorphStyle::Outer);
        assert!(options.restore_focus);
        assert_eq!(options.head, HeadOptions::default());
        assert_eq!(options.head.style, HeadStyle::Merge);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: MorphOptions = serde_json::from_str(
            r#"{"morphStyle": "innerHTML", "twoPass": true, "head": {"style": "append"}}"#,
        )
        .expect("options");
        assert_eq!(options.style, MorphStyle::Inner);
        assert!(options.two_pass);
        assert!(options.restore_focus);
        assert_eq!(options.head.style, HeadStyle::Append);
        assert!(!options.head.block);
    }

    #[test]
    fn unknown_style_is_rejected_by_serde() {
        let err = serde_json::from_str::<MorphOptions>(r#"{"style": "diagonal"}"#)
            .expect_err("unknown style");
        assert!(err.to_string().contains("unknown morph style"));
    }

    #[test]
    fn patch_overrides_only_present_fields() {
        let patch: OptionsPatch =
            serde_json::from_str(r#"{"ignoreActive": true, "head": {"block": true}}"#)
                .expect("patch");
        let base = MorphOptions::default().with_style(MorphStyle::Inner);
        let merged = base.patched(&patch);
        assert_eq!(merged.style, MorphStyle::Inner);
        assert!(merged.ignore_active);
        assert!(merged.head.block);
        assert_eq!(merged.head.style, HeadStyle::Merge);
    }
}

//! HTML serialization of document subtrees.
//!
//! Attribute values escape `&` and `"`; text escapes `&`, `<` and `>` unless
//! the parent is a raw-text element. Void elements have no end tag.

use crate::document::Document;
use crate::node::{NodeData, NodeId, is_raw_text_element, is_void_element};

enum Step<'a> {
    Enter(NodeId),
    Close(&'a str),
}

impl Document {
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.serialize_into(&mut out, node, true);
        out
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.serialize_into(&mut out, node, false);
        out
    }

    fn serialize_into(&self, out: &mut String, node: NodeId, include_self: bool) {
        let mut stack: Vec<Step<'_>> = Vec::new();
        if include_self {
            stack.push(Step::Enter(node));
        } else {
            self.push_children(&mut stack, node);
        }

        while let Some(step) = stack.pop() {
            let current = match step {
                Step::Close(name) => {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                    continue;
                }
                Step::Enter(current) => current,
            };
            match self.data(current) {
                NodeData::Document { doctype } => {
                    if let Some(doctype) = doctype {
                        out.push_str("<!DOCTYPE ");
                        out.push_str(doctype);
                        out.push('>');
                    }
                    self.push_children(&mut stack, current);
                }
                NodeData::Element(element) => {
                    out.push('<');
                    out.push_str(&element.name);
                    for (name, value) in &element.attributes {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        escape_attribute(out, value);
                        out.push('"');
                    }
                    out.push('>');
                    if is_void_element(&element.name) {
                        continue;
                    }
                    stack.push(Step::Close(&element.name));
                    self.push_children(&mut stack, current);
                }
                NodeData::Text(text) => {
                    let raw = self
                        .parent(current)
                        .and_then(|parent| self.tag_name(parent))
                        .is_some_and(is_raw_text_element);
                    if raw {
                        out.push_str(text);
                    } else {
                        escape_text(out, text);
                    }
                }
                NodeData::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
            }
        }
    }

    fn push_children<'a>(&'a self, stack: &mut Vec<Step<'a>>, node: NodeId) {
        let start = stack.len();
        stack.extend(self.children(node).map(Step::Enter));
        stack[start..].reverse();
    }
}

fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

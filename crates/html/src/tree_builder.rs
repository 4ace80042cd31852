//! Builds document trees from tokens, directly into a [`dom::Document`] arena.
//!
//! Two modes:
//! - fragment: every token lands under a caller-provided container;
//! - document: `html`, `head` and `body` are synthesized when missing and
//!   metadata elements seen before any body content go to `head`.
//!
//! Implied end tags cover the common cases (`p`, `li`, `dt`/`dd`, `option`,
//! table rows and cells). Everything else follows the open-element stack:
//! an end tag closes the nearest matching open element, or is ignored.

use crate::tokenizer::{Token, tokenize};
use dom::{Document, DomError, NodeCategory, NodeId, is_void_element};

/// Result of a whole-document parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Detached document node.
    pub document: NodeId,
    pub html: NodeId,
    pub head: NodeId,
    pub body: NodeId,
    /// `head` did not appear in the markup and has no content.
    pub head_implied: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    BeforeHead,
    InHead,
    AfterHead,
    InBody,
}

fn is_head_content(name: &str) -> bool {
    matches!(
        name,
        "base" | "link" | "meta" | "noscript" | "script" | "style" | "template" | "title"
    )
}

fn closes_paragraph(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "details"
            | "div"
            | "dl"
            | "fieldset"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

struct TreeBuilder<'a> {
    doc: &'a mut Document,
    /// Open elements; entries below `floor` are never popped.
    stack: Vec<NodeId>,
    floor: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(doc: &'a mut Document, root: NodeId) -> Self {
        Self {
            doc,
            stack: vec![root],
            floor: 1,
        }
    }

    fn current(&self) -> NodeId {
        // The stack never drops below `floor >= 1`.
        self.stack[self.stack.len() - 1]
    }

    fn is_open_on_top(&self, name: &str) -> bool {
        self.stack.len() > self.floor && self.doc.is_element_named(self.current(), name)
    }

    fn append_text(&mut self, text: &str) -> Result<(), DomError> {
        let parent = self.current();
        if let Some(last) = self.doc.last_child(parent)
            && self.doc.category(last) == NodeCategory::Text
        {
            let merged = format!("{}{}", self.doc.text(last).unwrap_or_default(), text);
            return self.doc.set_text(last, &merged);
        }
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node)
    }

    fn append_comment(&mut self, text: &str) -> Result<(), DomError> {
        let parent = self.current();
        let node = self.doc.create_comment(text);
        self.doc.append_child(parent, node)
    }

    fn in_foreign_content(&self) -> bool {
        self.stack[self.floor..].iter().any(|node| {
            self.doc.is_element_named(*node, "svg") || self.doc.is_element_named(*node, "math")
        })
    }

    /// Pop up to and including the nearest open `name`, unless a boundary
    /// element is found first.
    fn close_open(&mut self, name: &str, boundaries: &[&str]) -> bool {
        let Some(position) = self.find_open(name, boundaries) else {
            return false;
        };
        self.stack.truncate(position);
        true
    }

    fn find_open(&self, name: &str, boundaries: &[&str]) -> Option<usize> {
        for position in (self.floor..self.stack.len()).rev() {
            let node = self.stack[position];
            if self.doc.is_element_named(node, name) {
                return Some(position);
            }
            if boundaries
                .iter()
                .any(|boundary| self.doc.is_element_named(node, boundary))
            {
                return None;
            }
        }
        None
    }

    fn apply_implied_end_tags(&mut self, name: &str) {
        if closes_paragraph(name) {
            self.close_open("p", &["button", "table", "td", "th", "template"]);
        }
        match name {
            "li" => {
                self.close_open("li", &["ul", "ol", "template"]);
            }
            "dt" | "dd" => {
                if !self.close_open("dt", &["dl", "template"]) {
                    self.close_open("dd", &["dl", "template"]);
                }
            }
            "option" => {
                if self.is_open_on_top("option") {
                    self.stack.pop();
                }
            }
            "optgroup" => {
                if self.is_open_on_top("option") {
                    self.stack.pop();
                }
                if self.is_open_on_top("optgroup") {
                    self.stack.pop();
                }
            }
            "tr" => {
                self.close_open("tr", &["table", "tbody", "thead", "tfoot", "template"]);
            }
            "td" | "th" => {
                if !self.close_open("td", &["tr", "table", "template"]) {
                    self.close_open("th", &["tr", "table", "template"]);
                }
            }
            "tbody" | "thead" | "tfoot" => {
                if !self.close_open("tbody", &["table", "template"])
                    && !self.close_open("thead", &["table", "template"])
                {
                    self.close_open("tfoot", &["table", "template"]);
                }
            }
            _ => {}
        }
    }

    fn start_element(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
        self_closing: bool,
    ) -> Result<NodeId, DomError> {
        self.apply_implied_end_tags(name);
        let parent = self.current();
        let node = self
            .doc
            .create_element_with_attributes(name, attributes.to_vec());
        self.doc.append_child(parent, node)?;
        // Only void elements and foreign content honour `/>`.
        let foreign = matches!(name, "svg" | "math") || self.in_foreign_content();
        let void = self_closing && (is_void_element(name) || foreign);
        if !void {
            self.stack.push(node);
        }
        Ok(node)
    }

    fn end_element(&mut self, name: &str) {
        if let Some(position) = self.find_open(name, &[]) {
            self.stack.truncate(position);
        }
    }

    fn body_token(&mut self, token: &Token) -> Result<(), DomError> {
        match token {
            Token::Text(text) => self.append_text(text),
            Token::Comment(text) => self.append_comment(text),
            Token::Doctype(_) => Ok(()),
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if matches!(name.as_str(), "html" | "head" | "body") {
                    return Ok(());
                }
                self.start_element(name, attributes, *self_closing).map(|_| ())
            }
            Token::EndTag(name) => {
                self.end_element(name);
                Ok(())
            }
        }
    }
}

/// Parse `input` as a fragment appended to `parent`'s children.
pub fn parse_into(doc: &mut Document, parent: NodeId, input: &str) -> Result<(), DomError> {
    let mut builder = TreeBuilder::new(doc, parent);
    for token in tokenize(input) {
        builder.body_token(&token)?;
    }
    Ok(())
}

/// Parse `input` as a fragment into a fresh, detached `template` container.
pub fn parse_fragment(doc: &mut Document, input: &str) -> Result<NodeId, DomError> {
    let template = doc.create_element("template");
    parse_into(doc, template, input)?;
    Ok(template)
}

/// Parse `input` as a whole document into a fresh detached document node.
pub fn parse_document(doc: &mut Document, input: &str) -> Result<ParsedDocument, DomError> {
    let document = doc.create_document();
    let mut html: Option<NodeId> = None;
    let mut head: Option<NodeId> = None;
    let mut head_implied = false;
    let mut mode = Mode::BeforeHead;
    let mut builder = TreeBuilder::new(doc, document);

    for token in tokenize(input) {
        if mode == Mode::InBody {
            builder.body_token(&token)?;
            continue;
        }

        match &token {
            Token::Doctype(name) => {
                if mode == Mode::BeforeHead && html.is_none() {
                    builder.doc.set_doctype(document, name);
                }
                continue;
            }
            Token::Comment(text) => {
                builder.append_comment(text)?;
                continue;
            }
            Token::Text(text) if mode == Mode::InHead => {
                let in_element = builder.stack.len() > builder.floor;
                if in_element || text.trim_matches(is_html_space).is_empty() {
                    builder.append_text(text)?;
                    continue;
                }
            }
            Token::Text(text) if text.trim_matches(is_html_space).is_empty() => continue,
            Token::StartTag {
                name, attributes, ..
            } if name == "html" => {
                let node = ensure_html(&mut builder, &mut html, document)?;
                merge_attributes(builder.doc, node, attributes)?;
                continue;
            }
            Token::StartTag {
                name, attributes, ..
            } if name == "head" && head.is_none() => {
                let root = ensure_html(&mut builder, &mut html, document)?;
                let node = builder
                    .doc
                    .create_element_with_attributes("head", attributes.clone());
                builder.doc.append_child(root, node)?;
                builder.stack = vec![root, node];
                builder.floor = 2;
                head = Some(node);
                mode = Mode::InHead;
                continue;
            }
            Token::EndTag(name) if name == "head" => {
                if mode == Mode::InHead {
                    builder.stack.truncate(1);
                    builder.floor = 1;
                    mode = Mode::AfterHead;
                }
                continue;
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } if is_head_content(name) && mode != Mode::AfterHead => {
                if head.is_none() {
                    let root = ensure_html(&mut builder, &mut html, document)?;
                    let node = builder.doc.create_element("head");
                    builder.doc.append_child(root, node)?;
                    builder.stack = vec![root, node];
                    builder.floor = 2;
                    head = Some(node);
                    head_implied = true;
                    mode = Mode::InHead;
                }
                builder.start_element(name, attributes, *self_closing)?;
                continue;
            }
            Token::EndTag(name) if mode == Mode::InHead && builder.stack.len() > builder.floor => {
                builder.end_element(name);
                continue;
            }
            Token::EndTag(_) if mode != Mode::InHead => continue,
            _ => {}
        }

        // Anything else starts the body.
        let root = ensure_html(&mut builder, &mut html, document)?;
        if head.is_none() {
            let node = builder.doc.create_element("head");
            builder.doc.append_child(root, node)?;
            head = Some(node);
            head_implied = true;
        }
        let body = match &token {
            Token::StartTag {
                name, attributes, ..
            } if name == "body" => {
                let node = builder
                    .doc
                    .create_element_with_attributes("body", attributes.clone());
                builder.doc.append_child(root, node)?;
                node
            }
            _ => {
                let node = builder.doc.create_element("body");
                builder.doc.append_child(root, node)?;
                node
            }
        };
        builder.stack = vec![root, body];
        builder.floor = 2;
        mode = Mode::InBody;
        if !matches!(&token, Token::StartTag { name, .. } if name == "body") {
            builder.body_token(&token)?;
        }
    }

    let root = ensure_html(&mut builder, &mut html, document)?;
    let head = match head {
        Some(head) => head,
        None => {
            let node = builder.doc.create_element("head");
            builder.doc.append_child(root, node)?;
            head_implied = true;
            node
        }
    };
    let body = match builder.doc.body(document) {
        Some(body) => body,
        None => {
            let node = builder.doc.create_element("body");
            builder.doc.append_child(root, node)?;
            node
        }
    };
    let head_implied = head_implied && builder.doc.first_child(head).is_none();

    log::debug!(
        target: "html.tokenizer",
        "parsed document {document:?} (head implied: {head_implied})"
    );
    Ok(ParsedDocument {
        document,
        html: root,
        head,
        body,
        head_implied,
    })
}

fn is_html_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

fn ensure_html(
    builder: &mut TreeBuilder<'_>,
    html: &mut Option<NodeId>,
    document: NodeId,
) -> Result<NodeId, DomError> {
    if let Some(node) = *html {
        return Ok(node);
    }
    let node = builder.doc.create_element("html");
    builder.doc.append_child(document, node)?;
    builder.stack = vec![node];
    builder.floor = 1;
    *html = Some(node);
    Ok(node)
}

fn merge_attributes(
    doc: &mut Document,
    node: NodeId,
    attributes: &[(String, String)],
) -> Result<(), DomError> {
    for (name, value) in attributes {
        if !doc.has_attribute(node, name) {
            doc.set_attribute(node, name, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_lands_in_template() {
        let mut doc = Document::new();
        let template = parse_fragment(&mut doc, "<p>a</p><p>b</p>text").expect("parse");
        assert_eq!(doc.inner_html(template), "<p>a</p><p>b</p>text");
        assert_eq!(doc.parent(template), None);
    }

    #[test]
    fn paragraphs_and_list_items_close_implicitly() {
        let mut doc = Document::new();
        let template =
            parse_fragment(&mut doc, "<p>one<div>two</div><ul><li>a<li>b</ul>").expect("parse");
        assert_eq!(
            doc.inner_html(template),
            "<p>one</p><div>two</div><ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        let mut doc = Document::new();
        let template = parse_fragment(&mut doc, "</span><b>x</i></b>").expect("parse");
        assert_eq!(doc.inner_html(template), "<b>x</b>");
    }

    #[test]
    fn options_close_each_other() {
        let mut doc = Document::new();
        let template = parse_fragment(
            &mut doc,
            "<select><option value=1>a<option value=2 selected>b</select>",
        )
        .expect("parse");
        assert_eq!(
            doc.inner_html(template),
            "<select><option value=\"1\">a</option><option value=\"2\" selected=\"\">b</option></select>"
        );
    }

    #[test]
    fn foreign_self_closing_elements_do_not_nest() {
        let mut doc = Document::new();
        let template =
            parse_fragment(&mut doc, "<svg><circle r=1 /><rect/></svg><div/>x").expect("parse");
        assert_eq!(
            doc.inner_html(template),
            "<svg><circle r=\"1\"></circle><rect></rect></svg><div>x</div>"
        );
    }

    #[test]
    fn document_synthesizes_structure() {
        let mut doc = Document::new();
        let parsed = parse_document(&mut doc, "<title>t</title><p>hi</p>").expect("parse");
        assert_eq!(
            doc.outer_html(parsed.document),
            "<html><head><title>t</title></head><body><p>hi</p></body></html>"
        );
        assert!(!parsed.head_implied);
        assert_eq!(doc.head(parsed.document), Some(parsed.head));
    }

    #[test]
    fn explicit_document_keeps_attributes_and_doctype() {
        let mut doc = Document::new();
        let parsed = parse_document(
            &mut doc,
            "<!DOCTYPE html>\n<html lang=en><head>\n<meta charset=utf-8></head>\n<body class=x><div>a</div></body></html>",
        )
        .expect("parse");
        assert_eq!(doc.doctype(parsed.document), Some("html"));
        assert_eq!(doc.attribute(parsed.html, "lang"), Some("en"));
        assert_eq!(doc.attribute(parsed.body, "class"), Some("x"));
        assert_eq!(doc.inner_html(parsed.body), "<div>a</div>");
        assert_eq!(doc.inner_html(parsed.head), "\n<meta charset=\"utf-8\">");
    }

    #[test]
    fn missing_head_is_flagged_as_implied() {
        let mut doc = Document::new();
        let parsed = parse_document(&mut doc, "<body><div>a</div></body>").expect("parse");
        assert!(parsed.head_implied);
        assert_eq!(doc.first_child(parsed.head), None);
    }
}

//! Turns whatever the caller hands in into a single detached container whose
//! children are the new content.

use crate::error::MorphError;
use dom::{Document, NodeCategory, NodeId};

/// New content for a morph.
#[derive(Clone, Debug)]
pub enum Content<'a> {
    /// Markup, parsed as a fragment or a whole document.
    Markup(&'a str),
    /// A single node; a detached document node serves as its own container.
    Node(NodeId),
    /// Nodes gathered, in order, under one container.
    Nodes(Vec<NodeId>),
    /// A container produced by [`normalize_content`] earlier.
    Normalized(Normalized),
    /// Nothing: morph toward an empty container.
    Empty,
}

impl<'a> From<&'a str> for Content<'a> {
    fn from(markup: &'a str) -> Self {
        Content::Markup(markup)
    }
}

impl From<NodeId> for Content<'_> {
    fn from(node: NodeId) -> Self {
        Content::Node(node)
    }
}

impl From<Vec<NodeId>> for Content<'_> {
    fn from(nodes: Vec<NodeId>) -> Self {
        Content::Nodes(nodes)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Normalized {
    pub container: NodeId,
    /// The container was created by normalization and may be used as is.
    pub generated: bool,
}

impl Normalized {
    fn generated(container: NodeId) -> Self {
        Self {
            container,
            generated: true,
        }
    }
}

/// Map the morph target to the element actually reconciled: a document node
/// becomes its `html` element.
pub(crate) fn normalize_target(doc: &Document, target: NodeId) -> Result<NodeId, MorphError> {
    match doc.category(target) {
        NodeCategory::Element => Ok(target),
        NodeCategory::Document => doc
            .document_element(target)
            .ok_or(MorphError::InvalidTarget(target, "document has no root element")),
        NodeCategory::Text | NodeCategory::Comment => {
            Err(MorphError::InvalidTarget(target, "not an element"))
        }
    }
}

pub fn normalize_content(doc: &mut Document, content: Content<'_>) -> Result<Normalized, MorphError> {
    match content {
        Content::Empty => Ok(Normalized::generated(doc.create_element("div"))),
        Content::Markup(markup) => parse_markup(doc, markup),
        Content::Normalized(normalized) if normalized.generated => Ok(normalized),
        Content::Normalized(Normalized { container, .. }) => wrap_single(doc, container),
        Content::Node(node) => wrap_single(doc, node),
        Content::Nodes(nodes) => {
            let container = doc.create_element("div");
            for node in nodes {
                doc.append_child(container, node)?;
            }
            Ok(Normalized::generated(container))
        }
    }
}

fn wrap_single(doc: &mut Document, node: NodeId) -> Result<Normalized, MorphError> {
    if doc.category(node) == NodeCategory::Document && !doc.is_connected(node) {
        return Ok(Normalized::generated(node));
    }
    let container = doc.create_element("div");
    doc.append_child(container, node)?;
    Ok(Normalized::generated(container))
}

fn parse_markup(doc: &mut Document, markup: &str) -> Result<Normalized, MorphError> {
    let sniffed = strip_svg_blocks(markup);
    if sniffed.contains("</html>") {
        let parsed = html::parse_document(doc, markup)?;
        log::debug!(target: "morph.normalize", "markup parsed as a whole document");
        return Ok(Normalized::generated(parsed.document));
    }
    if sniffed.contains("</head>") || sniffed.contains("</body>") {
        let parsed = html::parse_document(doc, markup)?;
        if parsed.head_implied {
            doc.detach(parsed.head);
            doc.release(parsed.head)?;
        }
        log::debug!(
            target: "morph.normalize",
            "markup parsed as a document, html element is the container"
        );
        return Ok(Normalized::generated(parsed.html));
    }
    let template = html::parse_fragment(doc, markup)?;
    log::trace!(target: "morph.normalize", "markup parsed as a fragment");
    Ok(Normalized::generated(template))
}

/// Drop `<svg ...>...</svg>` blocks so that markup inside them cannot make a
/// fragment look like a whole document.
fn strip_svg_blocks(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut copied = 0;
    let mut search = 0;
    while let Some(start) = html::find_ignore_ascii_case(markup, "<svg", search) {
        let after = markup.as_bytes().get(start + 4).copied();
        if !matches!(after, Some(b) if b == b'>' || b.is_ascii_whitespace()) {
            search = start + 4;
            continue;
        }
        let Some(close) = html::find_ignore_ascii_case(markup, "</svg>", start + 4) else {
            break;
        };
        out.push_str(&markup[copied..start]);
        copied = close + "</svg>".len();
        search = copied;
    }
    out.push_str(&markup[copied..]);
    out
}

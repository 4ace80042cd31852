use crate::control::ControlState;

/// Arena handle for a node owned by a [`Document`](crate::Document).
///
/// Handles stay valid after the node has been detached from its tree, until
/// the detached subtree is handed back with [`Document::release`](crate::Document::release).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw arena index, for diagnostics.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Coarse node category, the unit of "same kind of node" comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeCategory {
    Document,
    Element,
    Text,
    Comment,
}

#[derive(Clone, Debug)]
pub enum NodeData {
    Document { doctype: Option<String> },
    Element(ElementData),
    Text(String),
    Comment(String),
}

impl NodeData {
    pub fn category(&self) -> NodeCategory {
        match self {
            NodeData::Document { .. } => NodeCategory::Document,
            NodeData::Element(_) => NodeCategory::Element,
            NodeData::Text(_) => NodeCategory::Text,
            NodeData::Comment(_) => NodeCategory::Comment,
        }
    }

    pub(crate) fn allows_children(&self) -> bool {
        matches!(self, NodeData::Document { .. } | NodeData::Element(_))
    }
}

/// Element payload: canonical lowercase tag name, ordered attributes and the
/// live control properties that do not round-trip through attributes.
#[derive(Clone, Debug)]
pub struct ElementData {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) control: ControlState,
}

impl ElementData {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            control: ControlState::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The stable identifier: a non-empty `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id").filter(|id| !id.is_empty())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

pub(crate) struct NodeRecord {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) released: bool,
}

impl NodeRecord {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            released: false,
        }
    }
}

/// Elements that never have content or an end tag.
pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

pub(crate) fn is_raw_text_element(name: &str) -> bool {
    matches!(
        name,
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes"
    )
}

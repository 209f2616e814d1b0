use std::sync::Arc;

/// Arena index of a node inside a [`crate::Document`].
///
/// Ids are never reused: a detached node keeps its id and can be re-inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The document node is always allocated first.
    pub const DOCUMENT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
    ProcessingInstruction {
        target: Arc<str>,
        data: String,
    },
    /// Encapsulated subtree root attached to a host element.
    ShadowRoot,
}

impl NodeKind {
    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text { .. })
    }

    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element { .. })
    }
}

/// Owned, id-less tree used to seed a document and to snapshot one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Document {
        children: Vec<Node>,
    },
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
        shadow: Option<Vec<Node>>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
    ProcessingInstruction {
        target: Arc<str>,
        data: String,
    },
}

impl Node {
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children } | Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

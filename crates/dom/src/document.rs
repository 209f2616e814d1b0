use crate::feed::{ChangeRecord, FeedRegistry};
use crate::types::{Node, NodeId, NodeKind};
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} has the wrong kind for this operation")]
    WrongNodeKind(NodeId),
    #[error("node {0:?} cannot have children")]
    InvalidParent(NodeId),
    #[error("{before:?} is not a child of {parent:?}")]
    InvalidSibling { parent: NodeId, before: NodeId },
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("element {0:?} already hosts a shadow root")]
    ShadowRootExists(NodeId),
}

struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow_root: Option<NodeId>,
    host: Option<NodeId>,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            shadow_root: None,
            host: None,
        }
    }

    fn allows_children(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Document | NodeKind::Element { .. } | NodeKind::ShadowRoot
        )
    }
}

/// Live, mutable node arena.
///
/// Every structural, character-data and attribute mutation made through this
/// type is queued as a [`ChangeRecord`] for the feeds observing it. Nodes are
/// never freed; removal only detaches.
pub struct Document {
    nodes: Vec<NodeRecord>,
    pub(crate) feeds: FeedRegistry,
    adopted_styles: Vec<(Arc<str>, String)>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeRecord::new(NodeKind::Document)],
            feeds: FeedRegistry::new(),
            adopted_styles: Vec::new(),
        }
    }

    /// Build a document from an owned tree. A top-level [`Node::Document`]
    /// contributes its children; any other node becomes the sole child.
    pub fn from_tree(tree: &Node) -> Self {
        let mut doc = Self::new();
        doc.build(tree, NodeId::DOCUMENT);
        doc
    }

    fn build(&mut self, node: &Node, parent: NodeId) {
        let id = match node {
            Node::Document { children } => {
                for c in children {
                    self.build(c, parent);
                }
                return;
            }
            Node::Element {
                name,
                attributes,
                shadow,
                children,
            } => {
                let attributes = attributes
                    .iter()
                    .map(|(k, v)| (lowercase(k), v.clone()))
                    .collect();
                let id = self.alloc(NodeKind::Element {
                    name: lowercase(name),
                    attributes,
                });
                if let Some(shadow_children) = shadow {
                    let root = self.alloc(NodeKind::ShadowRoot);
                    self.nodes[root.index()].host = Some(id);
                    self.nodes[id.index()].shadow_root = Some(root);
                    for c in shadow_children {
                        self.build(c, root);
                    }
                }
                for c in children {
                    self.build(c, id);
                }
                id
            }
            Node::Text { text } => self.alloc(NodeKind::Text { text: text.clone() }),
            Node::Comment { text } => self.alloc(NodeKind::Comment { text: text.clone() }),
            Node::ProcessingInstruction { target, data } => {
                self.alloc(NodeKind::ProcessingInstruction {
                    target: Arc::clone(target),
                    data: data.clone(),
                })
            }
        };
        self.nodes[parent.index()].children.push(id);
        self.nodes[id.index()].parent = Some(parent);
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::new(kind));
        id
    }

    fn record(&self, id: NodeId) -> Result<&NodeRecord, MutationError> {
        self.nodes
            .get(id.index())
            .ok_or(MutationError::UnknownNode(id))
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, MutationError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(MutationError::UnknownNode(id))
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(|n| &n.kind)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.kind(id).is_some_and(NodeKind::is_text)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id).is_some_and(NodeKind::is_element)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn shadow_root(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.shadow_root)
    }

    /// Host element of a shadow root.
    pub fn host(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.host)
    }

    /// Parent, or host element when `id` is a shadow root.
    pub fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).or_else(|| self.host(id))
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { name, .. } => Some(name.as_ref()),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(Arc<str>, String)] {
        match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => attributes.as_slice(),
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Character data of a text, comment or processing-instruction node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text { text } | NodeKind::Comment { text } => Some(text.as_str()),
            NodeKind::ProcessingInstruction { data, .. } => Some(data.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of all light-tree text descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in crate::traverse::descendants(self, id) {
            if let Some(NodeKind::Text { text }) = self.kind(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Whether the composed ancestor chain reaches the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == NodeId::DOCUMENT {
                return true;
            }
            current = self.composed_parent(node);
        }
        false
    }

    /// First connected light-tree element whose `id` attribute equals `value`.
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        crate::traverse::descendants(self, NodeId::DOCUMENT)
            .into_iter()
            .find(|&node| self.attr(node, "id") == Some(value))
    }

    pub fn adopted_stylesheets(&self) -> impl Iterator<Item = &str> {
        self.adopted_styles.iter().map(|(_, css)| css.as_str())
    }

    pub fn materialize(&self, id: NodeId) -> Option<Node> {
        let record = self.nodes.get(id.index())?;
        let children = record
            .children
            .iter()
            .filter_map(|c| self.materialize(*c))
            .collect();
        let node = match &record.kind {
            NodeKind::Document | NodeKind::ShadowRoot => Node::Document { children },
            NodeKind::Element { name, attributes } => Node::Element {
                name: Arc::clone(name),
                attributes: attributes.clone(),
                shadow: record.shadow_root.map(|root| {
                    self.children(root)
                        .iter()
                        .filter_map(|c| self.materialize(*c))
                        .collect()
                }),
                children,
            },
            NodeKind::Text { text } => Node::Text { text: text.clone() },
            NodeKind::Comment { text } => Node::Comment { text: text.clone() },
            NodeKind::ProcessingInstruction { target, data } => Node::ProcessingInstruction {
                target: Arc::clone(target),
                data: data.clone(),
            },
        };
        Some(node)
    }

    // ---------------------------------------------------------------------
    // Node creation (detached, not observable)
    // ---------------------------------------------------------------------

    pub fn create_element(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        let attributes = attributes
            .iter()
            .map(|(k, v)| (lowercase(k), (*v).to_string()))
            .collect();
        self.alloc(NodeKind::Element {
            name: lowercase(name),
            attributes,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text {
            text: text.to_string(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Comment {
            text: text.to_string(),
        })
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        self.alloc(NodeKind::ProcessingInstruction {
            target: Arc::from(target),
            data: data.to_string(),
        })
    }

    // ---------------------------------------------------------------------
    // Observable mutations
    // ---------------------------------------------------------------------

    /// Append `child` to `parent`, moving it if it is already attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), MutationError> {
        self.insert_child(parent, child, None)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), MutationError> {
        self.insert_child(parent, child, Some(before))
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), MutationError> {
        if !self.record(parent)?.allows_children() {
            return Err(MutationError::InvalidParent(parent));
        }
        if matches!(
            self.record(child)?.kind,
            NodeKind::Document | NodeKind::ShadowRoot
        ) {
            return Err(MutationError::WrongNodeKind(child));
        }
        if parent == child || self.is_inclusive_ancestor(child, parent) {
            return Err(MutationError::CycleDetected { parent, child });
        }
        if let Some(before) = before
            && (before == child || self.record(before)?.parent != Some(parent))
        {
            return Err(MutationError::InvalidSibling { parent, before });
        }

        if self.nodes[child.index()].parent.is_some() {
            self.detach(child);
        }

        let siblings = &mut self.nodes[parent.index()].children;
        let pos = match before {
            Some(before) => siblings
                .iter()
                .position(|k| *k == before)
                .ok_or(MutationError::InvalidSibling { parent, before })?,
            None => siblings.len(),
        };
        siblings.insert(pos, child);
        self.nodes[child.index()].parent = Some(parent);
        self.queue(ChangeRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Detach `node` from its parent. Detaching a detached node is a no-op.
    pub fn remove(&mut self, node: NodeId) -> Result<(), MutationError> {
        if self.record(node)?.parent.is_some() {
            self.detach(node);
        }
        Ok(())
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.index()].parent.take() else {
            return;
        };
        self.nodes[parent.index()].children.retain(|k| *k != node);
        self.queue(ChangeRecord::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![node],
        });
    }

    /// Replace the character data of a text, comment or processing instruction.
    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), MutationError> {
        let old = match &mut self.record_mut(id)?.kind {
            NodeKind::Text { text } | NodeKind::Comment { text } => {
                std::mem::replace(text, value.to_string())
            }
            NodeKind::ProcessingInstruction { data, .. } => {
                std::mem::replace(data, value.to_string())
            }
            _ => return Err(MutationError::WrongNodeKind(id)),
        };
        self.queue(ChangeRecord::CharacterData {
            target: id,
            old_value: Some(old),
        });
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), MutationError> {
        let NodeKind::Element { attributes, .. } = &mut self.record_mut(id)?.kind else {
            return Err(MutationError::WrongNodeKind(id));
        };
        let name = lowercase(name);
        let old_value = match attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value.to_string())),
            None => {
                attributes.push((Arc::clone(&name), value.to_string()));
                None
            }
        };
        self.queue(ChangeRecord::Attribute {
            target: id,
            name,
            old_value,
        });
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), MutationError> {
        let NodeKind::Element { attributes, .. } = &mut self.record_mut(id)?.kind else {
            return Err(MutationError::WrongNodeKind(id));
        };
        let Some(pos) = attributes
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
        else {
            return Ok(());
        };
        let (name, old) = attributes.remove(pos);
        self.queue(ChangeRecord::Attribute {
            target: id,
            name,
            old_value: Some(old),
        });
        Ok(())
    }

    /// Attach an empty shadow root to `host`. Not reported to feeds.
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, MutationError> {
        let record = self.record(host)?;
        if !record.kind.is_element() {
            return Err(MutationError::WrongNodeKind(host));
        }
        if record.shadow_root.is_some() {
            return Err(MutationError::ShadowRootExists(host));
        }
        let root = self.alloc(NodeKind::ShadowRoot);
        self.nodes[root.index()].host = Some(host);
        self.nodes[host.index()].shadow_root = Some(root);
        Ok(root)
    }

    /// Install or replace a document-level stylesheet owned by `key`.
    /// Adopted sheets cascade after `<style>` elements, in insertion order.
    pub fn set_adopted_stylesheet(&mut self, key: &str, css: String) {
        match self.adopted_styles.iter_mut().find(|(k, _)| k.as_ref() == key) {
            Some((_, existing)) => *existing = css,
            None => self.adopted_styles.push((Arc::from(key), css)),
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.composed_parent(n);
        }
        false
    }

    fn queue(&mut self, record: ChangeRecord) {
        let mut ancestors = Vec::new();
        let mut current = Some(record.target());
        while let Some(node) = current {
            ancestors.push(node);
            current = self.parent(node);
        }
        log::trace!(target: "dom.feed", "queue {record:?}");
        self.feeds.queue(&record, &ancestors);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn lowercase(name: &str) -> Arc<str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Arc::from(name.to_ascii_lowercase())
    } else {
        Arc::from(name)
    }
}

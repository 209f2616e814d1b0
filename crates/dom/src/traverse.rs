use crate::{Document, NodeId, NodeKind};

/// Light-tree nodes under `root` (inclusive), in pre-order document order.
pub fn descendants(doc: &Document, root: NodeId) -> Vec<NodeId> {
    descendants_pruned(doc, root, |_| false)
}

/// Like [`descendants`], but the children of any node for which `prune`
/// returns true are skipped. The pruned node itself is still yielded.
pub fn descendants_pruned(
    doc: &Document,
    root: NodeId,
    mut prune: impl FnMut(NodeId) -> bool,
) -> Vec<NodeId> {
    let mut out = Vec::new();
    if !doc.contains(root) {
        return out;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        if prune(node) {
            continue;
        }
        stack.extend(doc.children(node).iter().rev().copied());
    }
    out
}

/// Ancestors of `node` (exclusive), hopping from shadow roots to their hosts.
pub fn composed_ancestors(doc: &Document, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(doc.composed_parent(node), move |&n| doc.composed_parent(n))
}

pub fn first_element_by_name(doc: &Document, root: NodeId, name: &str) -> Option<NodeId> {
    descendants(doc, root)
        .into_iter()
        .find(|&node| doc.element_name(node).is_some_and(|n| n.eq_ignore_ascii_case(name)))
}

/// Containers whose text content is never rendered as document text.
pub fn is_non_rendering_element(doc: &Document, node: NodeId) -> bool {
    match doc.element_name(node) {
        Some(name) => matches!(
            name,
            "head" | "style" | "script" | "noscript" | "template" | "title" | "meta" | "link"
        ),
        None => false,
    }
}

/// Concatenated text of connected `<style>` elements followed by the
/// adopted stylesheets, in cascade order.
pub fn collect_style_texts(doc: &Document) -> String {
    let mut out = String::new();
    for node in descendants(doc, NodeId::DOCUMENT) {
        if doc.element_name(node) == Some("style") {
            for &c in doc.children(node) {
                if let Some(NodeKind::Text { text }) = doc.kind(c) {
                    out.push_str(text);
                    out.push('\n');
                }
            }
        }
    }
    for sheet in doc.adopted_stylesheets() {
        out.push_str(sheet);
        out.push('\n');
    }
    out
}

/// One line per node, indented by depth. Shadow content is shown under a
/// `#shadow-root` marker.
pub fn outline(doc: &Document, root: NodeId) -> Vec<String> {
    fn walk(doc: &Document, node: NodeId, depth: usize, out: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        match doc.kind(node) {
            Some(NodeKind::Document) => out.push(format!("{indent}#document")),
            Some(NodeKind::ShadowRoot) => out.push(format!("{indent}#shadow-root")),
            Some(NodeKind::Element { name, attributes }) => {
                let mut line = format!("{indent}<{name}");
                for (k, v) in attributes {
                    line.push_str(&format!(r#" {k}="{v}""#));
                }
                line.push('>');
                out.push(line);
                if let Some(shadow) = doc.shadow_root(node) {
                    walk(doc, shadow, depth + 1, out);
                }
            }
            Some(NodeKind::Text { text }) => out.push(format!("{indent}\"{text}\"")),
            Some(NodeKind::Comment { text }) => out.push(format!("{indent}<!-- {text} -->")),
            Some(NodeKind::ProcessingInstruction { target, data }) => {
                out.push(format!("{indent}<?{target} {data}?>"))
            }
            None => return,
        }
        for &c in doc.children(node) {
            walk(doc, c, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(doc, root, 0, &mut out);
    out
}

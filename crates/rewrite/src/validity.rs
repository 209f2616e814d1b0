//! Whether a node is a rewritable unit right now.
//!
//! Validity is checked at write time, not discovery time: a node that was
//! detached (itself or through any ancestor) or moved under a skipped
//! container in between is silently skipped.

use crate::options::WatcherOptions;
use crate::table;
use css::StyleResolver;
use dom::traverse::{composed_ancestors, is_non_rendering_element};
use dom::{Document, NodeId};

pub(crate) fn is_text_unit(
    doc: &Document,
    node: NodeId,
    options: &WatcherOptions,
    styles: Option<&StyleResolver>,
) -> bool {
    if !doc.is_text(node) {
        return false;
    }
    let Some(parent) = doc.parent(node) else {
        return false;
    };
    if !doc.is_connected(node) || in_non_rendering_container(doc, node) {
        return false;
    }
    if options.content_editable && is_editable(doc, node) {
        return false;
    }
    if options.icon_fonts
        && let Some(styles) = styles
        && styles
            .font_family(doc, parent)
            .is_some_and(|family| table::is_icon_font(&family))
    {
        return false;
    }
    true
}

/// Attribute and generated-content units live on attached, rendered elements.
pub(crate) fn is_element_unit(doc: &Document, element: NodeId) -> bool {
    doc.is_element(element)
        && doc.parent(element).is_some()
        && doc.is_connected(element)
        && !is_non_rendering_element(doc, element)
        && !in_non_rendering_container(doc, element)
}

fn in_non_rendering_container(doc: &Document, node: NodeId) -> bool {
    composed_ancestors(doc, node).any(|a| is_non_rendering_element(doc, a))
}

/// The nearest ancestor carrying a recognised `contenteditable` value decides.
pub(crate) fn is_editable(doc: &Document, node: NodeId) -> bool {
    for ancestor in composed_ancestors(doc, node) {
        let Some(value) = doc.attr(ancestor, "contenteditable") else {
            continue;
        };
        let value = value.trim();
        if value.is_empty()
            || value.eq_ignore_ascii_case("true")
            || value.eq_ignore_ascii_case("plaintext-only")
        {
            return true;
        }
        if value.eq_ignore_ascii_case("false") {
            return false;
        }
    }
    false
}

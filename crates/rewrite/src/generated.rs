//! Rewritten pseudo-element content.
//!
//! Pseudo-element content cannot be edited in place, so a rewrite is expressed
//! as an `!important` rule in an adopted stylesheet owned by the coordinator,
//! scoped to one element through a marker attribute.

use css::{PseudoElement, quote_string};
use dom::{Document, MutationError, NodeId};
use std::collections::BTreeMap;
use std::fmt::Write;

pub const MARKER_ATTRIBUTE: &str = "data-retext-generated";
pub const STYLESHEET_KEY: &str = "retext-generated-content";

/// Overrides collected during a cycle and rendered into the sheet once at its
/// end by [`GeneratedContent::flush`].
#[derive(Default)]
pub(crate) struct GeneratedContent {
    next_marker: u32,
    elements: BTreeMap<u32, NodeId>,
    rules: BTreeMap<(u32, PseudoElement), String>,
    dirty: bool,
}

impl GeneratedContent {
    /// The override recorded for `slot` of `element`, if any. Takes
    /// precedence over the cascade, which only sees flushed rules.
    pub(crate) fn current(
        &self,
        doc: &Document,
        element: NodeId,
        slot: PseudoElement,
    ) -> Option<&str> {
        let marker = marker_of(doc, element)?;
        if self.elements.get(&marker) != Some(&element) {
            return None;
        }
        self.rules.get(&(marker, slot)).map(String::as_str)
    }

    pub(crate) fn set(
        &mut self,
        doc: &mut Document,
        element: NodeId,
        slot: PseudoElement,
        content: &str,
    ) -> Result<(), MutationError> {
        let marker = match marker_of(doc, element) {
            Some(marker) => marker,
            None => {
                let marker = self.next_marker;
                self.next_marker += 1;
                doc.set_attribute(element, MARKER_ATTRIBUTE, &marker.to_string())?;
                marker
            }
        };
        self.elements.insert(marker, element);
        self.rules.insert((marker, slot), content.to_string());
        self.dirty = true;
        Ok(())
    }

    /// Drop rules of elements no longer in the document and, if anything
    /// changed since the last flush, re-render the adopted sheet.
    pub(crate) fn flush(&mut self, doc: &mut Document) {
        let stale: Vec<u32> = self
            .elements
            .iter()
            .filter(|&(_, &element)| !doc.is_connected(element))
            .map(|(&marker, _)| marker)
            .collect();
        if !stale.is_empty() {
            log::trace!(target: "retext.scan", "pruning {} generated marker(s)", stale.len());
            for marker in &stale {
                self.elements.remove(marker);
            }
            self.rules.retain(|(marker, _), _| !stale.contains(marker));
            self.dirty = true;
        }
        if std::mem::take(&mut self.dirty) {
            doc.set_adopted_stylesheet(STYLESHEET_KEY, self.render());
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for ((marker, slot), content) in &self.rules {
            let _ = writeln!(
                out,
                "[{MARKER_ATTRIBUTE}=\"{marker}\"]{} {{ content: {} !important }}",
                slot.as_css(),
                quote_string(content)
            );
        }
        out
    }
}

fn marker_of(doc: &Document, element: NodeId) -> Option<u32> {
    doc.attr(element, MARKER_ATTRIBUTE)
        .and_then(|v| v.parse::<u32>().ok())
}

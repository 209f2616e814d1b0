use crate::error::RewriteError;
use crate::generated::GeneratedContent;
use crate::options::WatcherOptions;
use crate::table::{self, PSEUDO_SLOTS};
use crate::validity;
use css::{StyleResolver, parse_string_literal};
use dom::{BoxError, Document, NodeId};
use std::collections::HashSet;

pub(crate) type TransformFn = dyn Fn(&str) -> Result<String, BoxError>;

/// Dedup key: one transform application per unit per cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Unit {
    Text(NodeId),
    /// All watched attributes of an element.
    Attributes(NodeId),
    /// All pseudo-element slots of an element.
    Generated(NodeId),
}

/// Everything one Watcher needs to rewrite units during one cycle.
pub(crate) struct RewriteContext<'a> {
    pub(crate) doc: &'a mut Document,
    pub(crate) options: &'a WatcherOptions,
    pub(crate) visited: &'a mut HashSet<Unit>,
    pub(crate) targets: &'a mut Vec<NodeId>,
    transform: &'a TransformFn,
    generated: &'a mut GeneratedContent,
    styles: Option<StyleResolver>,
}

impl<'a> RewriteContext<'a> {
    pub(crate) fn new(
        doc: &'a mut Document,
        transform: &'a TransformFn,
        options: &'a WatcherOptions,
        visited: &'a mut HashSet<Unit>,
        targets: &'a mut Vec<NodeId>,
        generated: &'a mut GeneratedContent,
    ) -> Self {
        let styles = options.needs_styles().then(|| StyleResolver::new(doc));
        Self {
            doc,
            options,
            visited,
            targets,
            transform,
            generated,
            styles,
        }
    }

    fn apply(&self, input: &str) -> Result<String, RewriteError> {
        (self.transform)(input).map_err(|source| RewriteError::Transform { source })
    }

    pub(crate) fn is_text_unit(&self, node: NodeId) -> bool {
        validity::is_text_unit(self.doc, node, self.options, self.styles.as_ref())
    }

    /// Transform one text node unless it was already handled this cycle or is
    /// not a valid unit. Returns whether the transform ran.
    pub(crate) fn rewrite_text(&mut self, node: NodeId) -> Result<bool, RewriteError> {
        if self.visited.contains(&Unit::Text(node)) || !self.is_text_unit(node) {
            return Ok(false);
        }
        let current = self.doc.text(node).unwrap_or_default().to_string();
        let next = self.apply(&current)?;
        self.visited.insert(Unit::Text(node));
        if next.is_empty() {
            log::trace!(target: "retext.scan", "suppressed empty rewrite of {node:?}");
            return Ok(true);
        }
        log::trace!(target: "retext.scan", "text {node:?}: {current:?} -> {next:?}");
        self.doc.set_text(node, &next)?;
        Ok(true)
    }

    /// Transform a present, non-empty attribute value. Does not consult or
    /// update the dedup set; callers mark the element.
    pub(crate) fn rewrite_attribute(
        &mut self,
        element: NodeId,
        name: &str,
    ) -> Result<bool, RewriteError> {
        if !validity::is_element_unit(self.doc, element) {
            return Ok(false);
        }
        let Some(current) = self.doc.attr(element, name).filter(|v| !v.is_empty()) else {
            return Ok(false);
        };
        let current = current.to_string();
        let next = self.apply(&current)?;
        if next.is_empty() {
            log::trace!(target: "retext.scan", "suppressed empty rewrite of {element:?}[{name}]");
            return Ok(true);
        }
        log::trace!(target: "retext.scan", "attr {element:?}[{name}]: {current:?} -> {next:?}");
        self.doc.set_attribute(element, name, &next)?;
        Ok(true)
    }

    /// Replace the document title with its transformed text, collapsing it
    /// into a single text child.
    pub(crate) fn rewrite_title(&mut self, title: NodeId) -> Result<bool, RewriteError> {
        let current = self.doc.text_content(title);
        if current.is_empty() {
            return Ok(false);
        }
        let next = self.apply(&current)?;
        if next.is_empty() {
            return Ok(true);
        }
        log::trace!(target: "retext.scan", "title: {current:?} -> {next:?}");
        let children = self.doc.children(title).to_vec();
        match children.split_first() {
            Some((&first, rest)) if self.doc.is_text(first) => {
                for &child in rest {
                    self.doc.remove(child)?;
                }
                self.doc.set_text(first, &next)?;
            }
            _ => {
                for &child in &children {
                    self.doc.remove(child)?;
                }
                let text = self.doc.create_text(&next);
                self.doc.append_child(title, text)?;
            }
        }
        Ok(true)
    }

    /// Rewrite quoted `::before`/`::after` content of one element.
    pub(crate) fn rewrite_generated_content(&mut self, element: NodeId) -> Result<(), RewriteError> {
        if !self.visited.insert(Unit::Generated(element))
            || !validity::is_element_unit(self.doc, element)
        {
            return Ok(());
        }
        for &slot in PSEUDO_SLOTS {
            // an override recorded earlier this cycle is not in the cascade yet
            let pending = self.generated.current(self.doc, element, slot).map(str::to_string);
            let Some(literal) = pending.or_else(|| {
                self.styles
                    .as_ref()
                    .and_then(|styles| styles.pseudo_content(self.doc, element, slot))
                    .and_then(|value| parse_string_literal(&value))
            }) else {
                continue;
            };
            let next = self.apply(&literal)?;
            if next.is_empty() {
                continue;
            }
            log::trace!(
                target: "retext.scan",
                "generated {element:?}{}: {literal:?} -> {next:?}",
                slot.as_css()
            );
            self.generated.set(self.doc, element, slot, &next)?;
        }
        Ok(())
    }

    /// Record a discovered shadow root as a watched target.
    pub(crate) fn adopt_target(&mut self, root: NodeId) {
        if !self.targets.contains(&root) {
            log::debug!(target: "retext.scan", "watching shadow root {root:?}");
            self.targets.push(root);
        }
    }

    pub(crate) fn is_watched_attribute(&self, element: NodeId, name: &str) -> bool {
        table::is_watched(self.doc, element, name)
    }
}

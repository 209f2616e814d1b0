//! Cold sweep of whole subtrees.

use crate::context::{RewriteContext, Unit};
use crate::error::RewriteError;
use crate::table::WATCH_TABLE;
use dom::NodeId;
use dom::traverse::{descendants_pruned, is_non_rendering_element};
use std::collections::{HashSet, VecDeque};

/// Sweep every unit reachable from `roots`, including shadow roots discovered
/// on the way, each subtree at most once.
///
/// Per subtree the order is: text nodes in document order, watched
/// attributes (table order, then document order), generated content, then
/// shadow roots found in that subtree are queued.
pub(crate) fn scan(
    ctx: &mut RewriteContext<'_>,
    roots: impl IntoIterator<Item = NodeId>,
) -> Result<(), RewriteError> {
    let mut worklist: VecDeque<NodeId> = roots.into_iter().collect();
    let mut swept = HashSet::new();

    while let Some(root) = worklist.pop_front() {
        if !swept.insert(root) {
            continue;
        }
        let nodes = descendants_pruned(ctx.doc, root, |n| is_non_rendering_element(ctx.doc, n));
        let elements: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|&n| ctx.doc.is_element(n))
            .collect();
        log::trace!(
            target: "retext.scan",
            "sweep {root:?}: {} node(s), {} element(s)",
            nodes.len(),
            elements.len()
        );

        for &node in &nodes {
            if ctx.doc.is_text(node) {
                ctx.rewrite_text(node)?;
            }
        }

        if ctx.options.attributes {
            rewrite_attributes(ctx, &elements)?;
        }

        if ctx.options.css_generated_content {
            for &element in &elements {
                ctx.rewrite_generated_content(element)?;
            }
        }

        if ctx.options.shadow_subtrees {
            for &element in &elements {
                if let Some(shadow) = ctx.doc.shadow_root(element) {
                    ctx.adopt_target(shadow);
                    worklist.push_back(shadow);
                }
            }
        }
    }
    Ok(())
}

fn rewrite_attributes(ctx: &mut RewriteContext<'_>, elements: &[NodeId]) -> Result<(), RewriteError> {
    let mut matched = Vec::new();
    for entry in WATCH_TABLE.iter() {
        for &element in elements {
            if ctx.visited.contains(&Unit::Attributes(element)) || !entry.applies_to(ctx.doc, element) {
                continue;
            }
            ctx.rewrite_attribute(element, entry.name)?;
            matched.push(element);
        }
    }
    // marked after the whole table so every watched attribute of an element
    // gets its turn
    for element in matched {
        ctx.visited.insert(Unit::Attributes(element));
    }
    Ok(())
}

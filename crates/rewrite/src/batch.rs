//! Incremental rewrite of one delivered batch.

use crate::context::{RewriteContext, Unit};
use crate::error::RewriteError;
use crate::scan;
use dom::{ChangeRecord, NodeId, NodeKind};
use std::sync::Arc;

/// Apply the transform once per distinct unit implicated by `records`.
///
/// Callers clear the dedup set first. Attribute edits are deferred until
/// every record has been seen, so that an element whose subtree insertion
/// already covered it is not rewritten a second time.
pub(crate) fn process_batch(
    ctx: &mut RewriteContext<'_>,
    records: &[ChangeRecord],
) -> Result<(), RewriteError> {
    log::trace!(target: "retext.batch", "processing {} record(s)", records.len());
    let mut pending: Vec<(NodeId, Vec<Arc<str>>)> = Vec::new();

    for record in records {
        match record {
            ChangeRecord::ChildList { added, .. } => {
                for &node in added {
                    match ctx.doc.kind(node) {
                        Some(NodeKind::Text { .. }) => {
                            ctx.rewrite_text(node)?;
                        }
                        Some(NodeKind::Comment { .. } | NodeKind::ProcessingInstruction { .. })
                        | None => {}
                        Some(_) => {
                            log::trace!(target: "retext.batch", "sweeping inserted {node:?}");
                            scan::scan(ctx, [node])?
                        }
                    }
                }
            }
            ChangeRecord::CharacterData { target, old_value } => {
                // unchanged since the record was queued: nothing new to react to
                if ctx.doc.text(*target) == old_value.as_deref() {
                    log::trace!(target: "retext.batch", "{target:?} unchanged; skipped");
                    continue;
                }
                ctx.rewrite_text(*target)?;
            }
            ChangeRecord::Attribute { target, name, .. } => {
                if !ctx.options.attributes {
                    continue;
                }
                match pending.iter_mut().find(|(element, _)| element == target) {
                    Some((_, names)) => {
                        if !names.contains(name) {
                            names.push(Arc::clone(name));
                        }
                    }
                    None => pending.push((*target, vec![Arc::clone(name)])),
                }
            }
        }
    }

    for (element, names) in pending {
        if ctx.visited.contains(&Unit::Attributes(element)) {
            log::trace!(target: "retext.batch", "{element:?} attributes already handled");
            continue;
        }
        log::trace!(target: "retext.batch", "deferred attributes on {element:?}: {names:?}");
        for name in &names {
            if ctx.is_watched_attribute(element, name) {
                ctx.rewrite_attribute(element, name)?;
            }
        }
        ctx.visited.insert(Unit::Attributes(element));
    }
    Ok(())
}

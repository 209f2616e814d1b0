//! Change feed: batched, per-observer notification queues.
//!
//! Invariants:
//! - Records are queued in mutation order and delivered in that order.
//! - A feed receives a given record at most once, however many of its
//!   registrations cover the mutated node.
//! - Subtree registrations follow `parent` links only; they never cross into
//!   (or out of) a shadow root.
//! - A disconnected feed queues nothing and drops whatever was pending.

use crate::types::NodeId;
use std::error::Error;
use std::rc::Rc;
use std::sync::Arc;

pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

pub(crate) type FeedCallback = Rc<dyn Fn(Vec<ChangeRecord>) -> Result<(), BoxError>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedId(pub u32);

/// One low-level edit, as reported to observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeRecord {
    /// Children were inserted into and/or removed from `target`.
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// The character data of a text, comment or processing instruction changed.
    CharacterData {
        target: NodeId,
        old_value: Option<String>,
    },
    /// An attribute was set or removed. `old_value` is `None` when the
    /// attribute did not exist before.
    Attribute {
        target: NodeId,
        name: Arc<str>,
        old_value: Option<String>,
    },
}

impl ChangeRecord {
    pub fn target(&self) -> NodeId {
        match self {
            ChangeRecord::ChildList { target, .. }
            | ChangeRecord::CharacterData { target, .. }
            | ChangeRecord::Attribute { target, .. } => *target,
        }
    }

    fn wanted_by(&self, options: &ObserveOptions) -> bool {
        match self {
            ChangeRecord::ChildList { .. } => options.child_list,
            ChangeRecord::CharacterData { .. } => options.character_data,
            ChangeRecord::Attribute { name, .. } => {
                options.attributes
                    && options
                        .attribute_filter
                        .as_ref()
                        .is_none_or(|filter| filter.iter().any(|f| f.as_ref() == name.as_ref()))
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub subtree: bool,
    pub child_list: bool,
    pub character_data: bool,
    pub attributes: bool,
    /// Restricts attribute records to these (lowercase) names.
    pub attribute_filter: Option<Vec<Arc<str>>>,
}

impl ObserveOptions {
    pub fn everything() -> Self {
        Self {
            subtree: true,
            child_list: true,
            character_data: true,
            attributes: true,
            attribute_filter: None,
        }
    }
}

struct FeedSlot {
    id: FeedId,
    registrations: Vec<(NodeId, ObserveOptions)>,
    pending: Vec<ChangeRecord>,
    callback: FeedCallback,
}

pub(crate) struct FeedRegistry {
    next_id: u32,
    slots: Vec<FeedSlot>,
}

impl FeedRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            slots: Vec::new(),
        }
    }

    pub(crate) fn create(&mut self, callback: FeedCallback) -> FeedId {
        let id = FeedId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.slots.push(FeedSlot {
            id,
            registrations: Vec::new(),
            pending: Vec::new(),
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: FeedId) {
        self.slots.retain(|slot| slot.id != id);
    }

    fn slot_mut(&mut self, id: FeedId) -> Option<&mut FeedSlot> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }

    /// Observing the same root twice replaces the earlier options.
    pub(crate) fn observe(&mut self, id: FeedId, root: NodeId, options: ObserveOptions) {
        let Some(slot) = self.slot_mut(id) else {
            return;
        };
        if let Some(existing) = slot.registrations.iter_mut().find(|(r, _)| *r == root) {
            existing.1 = options;
        } else {
            slot.registrations.push((root, options));
        }
    }

    pub(crate) fn disconnect(&mut self, id: FeedId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.registrations.clear();
            slot.pending.clear();
        }
    }

    pub(crate) fn take(&mut self, id: FeedId) -> Vec<ChangeRecord> {
        self.slot_mut(id)
            .map(|slot| std::mem::take(&mut slot.pending))
            .unwrap_or_default()
    }

    pub(crate) fn is_observing(&self, id: FeedId) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.id == id && !slot.registrations.is_empty())
    }

    /// `ancestors` is the inclusive parent chain of the record target,
    /// starting with the target itself.
    pub(crate) fn queue(&mut self, record: &ChangeRecord, ancestors: &[NodeId]) {
        let Some((&target, above)) = ancestors.split_first() else {
            return;
        };
        for slot in &mut self.slots {
            let covered = slot.registrations.iter().any(|(root, options)| {
                record.wanted_by(options)
                    && (*root == target || (options.subtree && above.contains(root)))
            });
            if covered {
                slot.pending.push(record.clone());
            }
        }
    }

    /// Feeds with pending records, in creation order.
    pub(crate) fn ready(&self) -> Vec<FeedId> {
        self.slots
            .iter()
            .filter(|slot| !slot.pending.is_empty())
            .map(|slot| slot.id)
            .collect()
    }

    pub(crate) fn take_for_delivery(
        &mut self,
        id: FeedId,
    ) -> Option<(Vec<ChangeRecord>, FeedCallback)> {
        let slot = self.slot_mut(id)?;
        if slot.pending.is_empty() {
            return None;
        }
        Some((std::mem::take(&mut slot.pending), Rc::clone(&slot.callback)))
    }
}

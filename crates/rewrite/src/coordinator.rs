//! Registry of live watchers and the freeze / dispatch / resume barrier.

use crate::error::RewriteError;
use crate::generated::GeneratedContent;
use crate::watcher::WatcherInner;
use dom::{ChangeRecord, DocumentHandle};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Shared state of every watcher over one document.
///
/// A watcher about to rewrite anything first freezes all registered feeds,
/// so that no watcher ever observes another's writes (or its own) as fresh
/// changes. Watchers hold the coordinator strongly; the coordinator holds
/// them weakly and prunes the dead ones.
pub struct Coordinator {
    doc: DocumentHandle,
    watchers: RefCell<Vec<Weak<WatcherInner>>>,
    in_cycle: Cell<bool>,
    pub(crate) generated: RefCell<GeneratedContent>,
}

/// Resets the cycle flag even when a cycle unwinds early.
struct CycleGuard<'a>(&'a Cell<bool>);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Coordinator {
    pub fn new(doc: DocumentHandle) -> Rc<Self> {
        Rc::new(Self {
            doc,
            watchers: RefCell::new(Vec::new()),
            in_cycle: Cell::new(false),
            generated: RefCell::new(GeneratedContent::default()),
        })
    }

    pub fn document(&self) -> &DocumentHandle {
        &self.doc
    }

    /// Number of registered, still-alive watchers.
    pub fn len(&self) -> usize {
        self.live_watchers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn register(&self, watcher: &Rc<WatcherInner>) {
        let mut watchers = self.watchers.borrow_mut();
        if !watchers.iter().any(|w| std::ptr::eq(w.as_ptr(), Rc::as_ptr(watcher))) {
            watchers.push(Rc::downgrade(watcher));
        }
    }

    pub(crate) fn unregister(&self, watcher: &WatcherInner) {
        self.watchers
            .borrow_mut()
            .retain(|w| !std::ptr::eq(w.as_ptr(), watcher) && w.strong_count() > 0);
    }

    /// Registered watchers in registration order, pruning dropped ones.
    fn live_watchers(&self) -> Vec<Rc<WatcherInner>> {
        let mut watchers = self.watchers.borrow_mut();
        watchers.retain(|w| w.strong_count() > 0);
        watchers.iter().filter_map(Weak::upgrade).collect()
    }

    /// Run one freeze / dispatch / resume cycle.
    ///
    /// `trigger` is the watcher whose feed just delivered, with the batch it
    /// was handed. `action` runs after every watcher drained and before the
    /// feeds restart. Inside a running cycle the action runs directly.
    ///
    /// Every taken batch is processed and every feed resumed even when one
    /// step fails; the first error is returned.
    pub(crate) fn synchronize<F>(
        &self,
        trigger: Option<(&Rc<WatcherInner>, Vec<ChangeRecord>)>,
        action: F,
    ) -> Result<(), RewriteError>
    where
        F: FnOnce() -> Result<(), RewriteError>,
    {
        if self.in_cycle.get() {
            log::trace!(target: "retext.barrier", "nested cycle request runs inline");
            if let Some((watcher, records)) = trigger {
                watcher.process_batch(&records)?;
            }
            return action();
        }
        self.in_cycle.set(true);
        let _guard = CycleGuard(&self.in_cycle);

        // freeze
        let watchers = self.live_watchers();
        let mut batches: Vec<(Rc<WatcherInner>, Vec<ChangeRecord>)> = watchers
            .into_iter()
            .map(|watcher| {
                let outstanding = watcher.feed.take_outstanding();
                watcher.feed.disconnect();
                (watcher, outstanding)
            })
            .collect();
        if let Some((trigger, handed)) = trigger {
            match batches.iter_mut().find(|(w, _)| Rc::ptr_eq(w, trigger)) {
                Some((_, records)) => {
                    let outstanding = std::mem::replace(records, handed);
                    records.extend(outstanding);
                }
                None => batches.insert(0, (Rc::clone(trigger), handed)),
            }
        }
        log::debug!(
            target: "retext.barrier",
            "freeze: {} watcher(s), {} record(s)",
            batches.len(),
            batches.iter().map(|(_, records)| records.len()).sum::<usize>()
        );

        // dispatch
        let mut first_error = None;
        for (watcher, records) in &batches {
            if records.is_empty() {
                continue;
            }
            if let Err(err) = watcher.process_batch(records) {
                log::debug!(target: "retext.barrier", "batch failed: {err}");
                first_error.get_or_insert(err);
            }
        }
        drop(batches);

        let outcome = action();
        self.generated
            .borrow_mut()
            .flush(&mut self.doc.borrow_mut());

        // resume
        for watcher in self.live_watchers() {
            if let Err(err) = watcher.start_feed() {
                first_error.get_or_insert(err);
            }
        }
        log::debug!(target: "retext.barrier", "resume");

        match first_error {
            Some(err) => Err(err),
            None => outcome,
        }
    }
}

use crate::document::{Document, MutationError};
use crate::feed::{BoxError, ChangeRecord, FeedId, ObserveOptions};
use crate::types::NodeId;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};
use thiserror::Error;

/// Upper bound on delivery rounds in one [`DocumentHandle::run_until_idle`].
pub const MAX_DELIVERY_ROUNDS: usize = 1024;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("change feed {feed:?} callback failed: {source}")]
    Callback { feed: FeedId, source: BoxError },
    #[error("change delivery still pending after {rounds} rounds")]
    Runaway { rounds: usize },
}

/// Shared, single-threaded handle to a live document.
///
/// The handle is the host side of the change feed: mutations queue records,
/// and [`run_until_idle`](Self::run_until_idle) plays the role of the host
/// event loop that delivers them.
#[derive(Clone)]
pub struct DocumentHandle {
    inner: Rc<RefCell<Document>>,
}

impl DocumentHandle {
    pub fn new(doc: Document) -> Self {
        Self {
            inner: Rc::new(RefCell::new(doc)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, Document> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Document> {
        self.inner.borrow_mut()
    }

    /// Create a feed that observes nothing until [`ChangeFeed::observe`].
    pub fn create_feed<F>(&self, callback: F) -> ChangeFeed
    where
        F: Fn(Vec<ChangeRecord>) -> Result<(), BoxError> + 'static,
    {
        let id = self.inner.borrow_mut().feeds.create(Rc::new(callback));
        ChangeFeed {
            id,
            doc: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver queued batches until no feed has pending records.
    ///
    /// Each round visits the feeds that had pending records when it started,
    /// in feed-creation order; a feed drained earlier in the round (for
    /// example through `take_outstanding`) is skipped. Returns the number of
    /// batches delivered. A failing callback aborts delivery.
    pub fn run_until_idle(&self) -> Result<usize, DeliveryError> {
        let mut delivered = 0;
        let mut rounds = 0;
        loop {
            let ready = self.inner.borrow().feeds.ready();
            if ready.is_empty() {
                return Ok(delivered);
            }
            rounds += 1;
            if rounds > MAX_DELIVERY_ROUNDS {
                return Err(DeliveryError::Runaway { rounds: rounds - 1 });
            }
            for feed in ready {
                let Some((records, callback)) = self.inner.borrow_mut().feeds.take_for_delivery(feed)
                else {
                    continue;
                };
                log::debug!(
                    target: "dom.feed",
                    "deliver {} record(s) to {feed:?}",
                    records.len()
                );
                delivered += 1;
                callback(records).map_err(|source| DeliveryError::Callback { feed, source })?;
            }
        }
    }
}

/// Handle to one registered feed. Dropping it unregisters the feed.
///
/// Methods borrow the document; they must not be called while the caller
/// holds a borrow from [`DocumentHandle::borrow_mut`].
pub struct ChangeFeed {
    id: FeedId,
    doc: Weak<RefCell<Document>>,
}

impl ChangeFeed {
    pub fn id(&self) -> FeedId {
        self.id
    }

    pub fn observe(&self, root: NodeId, options: ObserveOptions) -> Result<(), MutationError> {
        let Some(doc) = self.doc.upgrade() else {
            return Ok(());
        };
        let mut doc = doc.borrow_mut();
        if !doc.contains(root) {
            return Err(MutationError::UnknownNode(root));
        }
        doc.feeds.observe(self.id, root, options);
        Ok(())
    }

    /// Stop observing and drop undelivered records.
    pub fn disconnect(&self) {
        if let Some(doc) = self.doc.upgrade() {
            doc.borrow_mut().feeds.disconnect(self.id);
        }
    }

    /// Atomically take the records queued but not yet delivered.
    pub fn take_outstanding(&self) -> Vec<ChangeRecord> {
        self.doc
            .upgrade()
            .map(|doc| doc.borrow_mut().feeds.take(self.id))
            .unwrap_or_default()
    }

    pub fn is_observing(&self) -> bool {
        self.doc
            .upgrade()
            .is_some_and(|doc| doc.borrow().feeds.is_observing(self.id))
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        let Some(doc) = self.doc.upgrade() else {
            return;
        };
        match doc.try_borrow_mut() {
            Ok(mut doc) => doc.feeds.remove(self.id),
            Err(_) => log::warn!(
                target: "dom.feed",
                "feed {:?} dropped while the document was borrowed; left registered",
                self.id
            ),
        };
    }
}

use crate::batch;
use crate::context::{RewriteContext, TransformFn, Unit};
use crate::coordinator::Coordinator;
use crate::error::RewriteError;
use crate::options::WatcherOptions;
use crate::scan;
use crate::table::watched_attribute_names;
use dom::traverse::first_element_by_name;
use dom::{BoxError, ChangeFeed, ChangeRecord, NodeId, ObserveOptions};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// What a [`Watcher`] is rooted at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// The whole document: the title is rewritten once and the body element
    /// becomes the root.
    Document,
    /// One subtree. A node that is unknown or not attached to the document
    /// yields an inert watcher.
    Node(NodeId),
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Target::Node(node)
    }
}

struct WatcherState {
    targets: Vec<NodeId>,
    visited: HashSet<Unit>,
    connected: bool,
    inert: bool,
}

pub(crate) struct WatcherInner {
    transform: Box<TransformFn>,
    options: WatcherOptions,
    coordinator: Rc<Coordinator>,
    pub(crate) feed: ChangeFeed,
    state: RefCell<WatcherState>,
}

/// One registered transform over a set of subtrees.
///
/// The transform is called with the document borrowed; it must not touch the
/// document or any watcher.
#[derive(Clone)]
pub struct Watcher {
    inner: Rc<WatcherInner>,
}

impl Watcher {
    pub fn new<F>(
        coordinator: &Rc<Coordinator>,
        transform: F,
        target: impl Into<Target>,
        options: WatcherOptions,
    ) -> Result<Self, RewriteError>
    where
        F: Fn(&str) -> String + 'static,
    {
        Self::try_new(
            coordinator,
            move |input: &str| Ok(transform(input)),
            target,
            options,
        )
    }

    /// Like [`Watcher::new`] with a transform that may fail. A failure stops
    /// the batch it happened in and surfaces from whichever operation ran the
    /// cycle; units rewritten before it stay rewritten.
    pub fn try_new<F>(
        coordinator: &Rc<Coordinator>,
        transform: F,
        target: impl Into<Target>,
        options: WatcherOptions,
    ) -> Result<Self, RewriteError>
    where
        F: Fn(&str) -> Result<String, BoxError> + 'static,
    {
        let handle = coordinator.document();
        let (root, title) = match target.into() {
            Target::Node(node) => {
                let doc = handle.borrow();
                let valid = doc.contains(node) && doc.is_connected(node);
                (valid.then_some(node), None)
            }
            Target::Document => {
                let doc = handle.borrow();
                (
                    first_element_by_name(&doc, NodeId::DOCUMENT, "body"),
                    first_element_by_name(&doc, NodeId::DOCUMENT, "title"),
                )
            }
        };

        let inner = Rc::new_cyclic(|weak: &Weak<WatcherInner>| {
            let weak = weak.clone();
            let feed = handle.create_feed(move |records| match weak.upgrade() {
                Some(inner) => Ok(inner.on_batch(records)?),
                None => Ok(()),
            });
            WatcherInner {
                transform: Box::new(transform),
                options,
                coordinator: Rc::clone(coordinator),
                feed,
                state: RefCell::new(WatcherState {
                    targets: root.into_iter().collect(),
                    visited: HashSet::new(),
                    connected: false,
                    inert: root.is_none(),
                }),
            }
        });

        let scan_existing = root.is_some() && inner.options.scan_existing;
        if title.is_some() || scan_existing {
            coordinator.synchronize(None, || {
                if let Some(title) = title {
                    inner.rewrite_title(title)?;
                }
                if scan_existing {
                    inner.scan_targets()?;
                }
                Ok(())
            })?;
        }

        if root.is_none() {
            log::warn!(
                target: "retext.watcher",
                "no body or attached target node; watcher is inert"
            );
            return Ok(Self { inner });
        }

        inner.start_feed()?;
        coordinator.register(&inner);
        inner.state.borrow_mut().connected = true;
        log::debug!(target: "retext.watcher", "connected over {:?}", inner.targets());
        Ok(Self { inner })
    }

    /// Leave the registry and stop observing. With `flush`, pending changes
    /// of every watcher are processed first; otherwise this watcher's are
    /// discarded.
    pub fn disconnect(&self, flush: bool) -> Result<(), RewriteError> {
        let inner = &self.inner;
        if !inner.ready_for("disconnect", true) {
            return Ok(());
        }
        let outcome = if flush {
            inner.coordinator.synchronize(None, || Ok(()))
        } else {
            Ok(())
        };
        inner.coordinator.unregister(inner);
        inner.feed.disconnect();
        inner.state.borrow_mut().connected = false;
        log::debug!(target: "retext.watcher", "disconnected (flush: {flush})");
        outcome
    }

    /// Rejoin the registry and resume observing. With `rescan`, every target
    /// is swept again first, picking up whatever changed while disconnected.
    pub fn reconnect(&self, rescan: bool) -> Result<(), RewriteError> {
        let inner = &self.inner;
        if !inner.ready_for("reconnect", false) {
            return Ok(());
        }
        let outcome = if rescan {
            inner.coordinator.synchronize(None, || inner.scan_targets())
        } else {
            Ok(())
        };
        let started = inner.start_feed();
        inner.coordinator.register(inner);
        inner.state.borrow_mut().connected = true;
        log::debug!(target: "retext.watcher", "reconnected (rescan: {rescan})");
        outcome.and(started)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.borrow().connected
    }

    pub fn is_inert(&self) -> bool {
        self.inner.state.borrow().inert
    }

    /// Watched roots: the initial root followed by discovered shadow roots.
    pub fn targets(&self) -> Vec<NodeId> {
        self.inner.targets()
    }
}

impl WatcherInner {
    fn targets(&self) -> Vec<NodeId> {
        self.state.borrow().targets.clone()
    }

    /// Lifecycle calls on an inert watcher, or into the state it is already
    /// in, are ignored.
    fn ready_for(&self, operation: &str, connected: bool) -> bool {
        let state = self.state.borrow();
        if state.inert {
            log::warn!(target: "retext.watcher", "{operation} on an inert watcher ignored");
            return false;
        }
        if state.connected != connected {
            log::warn!(
                target: "retext.watcher",
                "{operation} ignored: watcher already {}",
                if state.connected { "connected" } else { "disconnected" }
            );
            return false;
        }
        true
    }

    fn on_batch(self: &Rc<Self>, records: Vec<ChangeRecord>) -> Result<(), RewriteError> {
        log::debug!(target: "retext.watcher", "batch of {} record(s)", records.len());
        self.coordinator.synchronize(Some((self, records)), || Ok(()))
    }

    fn with_context<R>(
        &self,
        f: impl FnOnce(&mut RewriteContext<'_>) -> Result<R, RewriteError>,
    ) -> Result<R, RewriteError> {
        let handle = self.coordinator.document();
        let mut doc = handle.borrow_mut();
        let mut generated = self.coordinator.generated.borrow_mut();
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        state.visited.clear();
        let mut ctx = RewriteContext::new(
            &mut doc,
            &*self.transform,
            &self.options,
            &mut state.visited,
            &mut state.targets,
            &mut generated,
        );
        f(&mut ctx)
    }

    pub(crate) fn process_batch(&self, records: &[ChangeRecord]) -> Result<(), RewriteError> {
        self.with_context(|ctx| batch::process_batch(ctx, records))
    }

    /// Sweep every current target with a fresh dedup set.
    pub(crate) fn scan_targets(&self) -> Result<(), RewriteError> {
        let roots = self.targets();
        log::debug!(target: "retext.watcher", "sweeping {} target(s)", roots.len());
        self.with_context(|ctx| scan::scan(ctx, roots))
    }

    fn rewrite_title(&self, title: NodeId) -> Result<(), RewriteError> {
        self.with_context(|ctx| ctx.rewrite_title(title).map(drop))
    }

    /// Observe every current target.
    pub(crate) fn start_feed(&self) -> Result<(), RewriteError> {
        let options = if self.options.attributes {
            ObserveOptions {
                attribute_filter: Some(watched_attribute_names().map(Arc::from).collect()),
                ..ObserveOptions::everything()
            }
        } else {
            ObserveOptions {
                attributes: false,
                ..ObserveOptions::everything()
            }
        };
        for target in self.targets() {
            self.feed.observe(target, options.clone())?;
        }
        Ok(())
    }
}

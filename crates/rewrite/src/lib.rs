//! Rewrite engine for the rendered text of a live document.
//!
//! A [`Watcher`] applies a string transform to every text node, rendered-text
//! attribute and (optionally) quoted generated content under its targets,
//! once on construction and then incrementally for every delivered batch of
//! changes. All watchers over one document share a [`Coordinator`] that
//! freezes every feed while any of them writes.

pub mod table;

mod batch;
mod context;
mod coordinator;
mod error;
mod generated;
mod options;
mod scan;
mod validity;
mod watcher;

pub use crate::coordinator::Coordinator;
pub use crate::error::{OptionsError, RewriteError};
pub use crate::generated::{MARKER_ATTRIBUTE, STYLESHEET_KEY};
pub use crate::options::WatcherOptions;
pub use crate::watcher::{Target, Watcher};

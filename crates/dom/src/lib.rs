//! In-memory live document with an observable change feed.
//!
//! This is the host side consumed by the rewrite engine: a node arena with
//! parent/child links, attributes and shadow roots, plus feeds that batch
//! mutation records per observer and deliver them asynchronously through
//! [`DocumentHandle::run_until_idle`].

pub mod traverse;

mod document;
mod feed;
mod handle;
mod types;

use memchr::{memchr, memchr2};

pub use crate::document::{Document, MutationError};
pub use crate::feed::{BoxError, ChangeRecord, FeedId, ObserveOptions};
pub use crate::handle::{ChangeFeed, DeliveryError, DocumentHandle, MAX_DELIVERY_ROUNDS};
pub use crate::types::{Node, NodeId, NodeKind};

/// ASCII case-insensitive substring search.
pub fn contains_ignore_ascii_case(haystack: &str, needle: &[u8]) -> bool {
    let hay = haystack.as_bytes();
    let n = needle.len();
    if n == 0 {
        return true;
    }
    if hay.len() < n {
        return false;
    }
    let first = needle[0];
    let (a, b) = (first.to_ascii_lowercase(), first.to_ascii_uppercase());
    let mut i = 0;
    while i + n <= hay.len() {
        let rel = if a == b {
            memchr(a, &hay[i..])
        } else {
            memchr2(a, b, &hay[i..])
        };
        let Some(rel) = rel else {
            return false;
        };
        let pos = i + rel;
        if pos + n <= hay.len() && hay[pos..pos + n].eq_ignore_ascii_case(needle) {
            return true;
        }
        i = pos + 1;
    }
    false
}

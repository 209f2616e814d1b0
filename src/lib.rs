//! Rewrite the rendered text of a live document as it changes.
//!
//! ```
//! use retext::dom::{Document, DocumentHandle, Node};
//! use retext::{Coordinator, Target, Watcher, WatcherOptions};
//! use std::sync::Arc;
//!
//! let tree = Node::Document {
//!     children: vec![Node::Element {
//!         name: Arc::from("body"),
//!         attributes: Vec::new(),
//!         shadow: None,
//!         children: vec![Node::Text { text: "hello world".into() }],
//!     }],
//! };
//! let doc = DocumentHandle::new(Document::from_tree(&tree));
//! let coordinator = Coordinator::new(doc.clone());
//! let watcher = Watcher::new(
//!     &coordinator,
//!     |s: &str| s.replace("world", "earth"),
//!     Target::Document,
//!     WatcherOptions::default(),
//! )?;
//! assert!(watcher.is_connected());
//!
//! let body = doc.borrow().children(retext::dom::NodeId::DOCUMENT)[0];
//! assert_eq!(doc.borrow().text_content(body), "hello earth");
//! # Ok::<(), retext::RewriteError>(())
//! ```

pub use css;
pub use dom;
pub use rewrite::*;

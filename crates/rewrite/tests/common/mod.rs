#![allow(dead_code)]

use dom::{Document, DocumentHandle, Node, NodeId};
use rewrite::Coordinator;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

pub fn elem(name: &str, attributes: &[(&str, &str)], children: Vec<Node>) -> Node {
    Node::Element {
        name: Arc::from(name),
        attributes: attributes
            .iter()
            .map(|(k, v)| (Arc::from(*k), v.to_string()))
            .collect(),
        shadow: None,
        children,
    }
}

pub fn host(name: &str, attributes: &[(&str, &str)], shadow: Vec<Node>, children: Vec<Node>) -> Node {
    Node::Element {
        name: Arc::from(name),
        attributes: attributes
            .iter()
            .map(|(k, v)| (Arc::from(*k), v.to_string()))
            .collect(),
        shadow: Some(shadow),
        children,
    }
}

pub fn text(value: &str) -> Node {
    Node::Text {
        text: value.to_string(),
    }
}

pub fn comment(value: &str) -> Node {
    Node::Comment {
        text: value.to_string(),
    }
}

/// `<html><head><title>..</title></head><body>..</body></html>`
pub fn page(title: &str, body: Vec<Node>) -> Node {
    Node::Document {
        children: vec![elem(
            "html",
            &[],
            vec![
                elem("head", &[], vec![elem("title", &[], vec![text(title)])]),
                elem("body", &[], body),
            ],
        )],
    }
}

pub fn setup(tree: Node) -> (DocumentHandle, Rc<Coordinator>) {
    let doc = DocumentHandle::new(Document::from_tree(&tree));
    let coordinator = Coordinator::new(doc.clone());
    (doc, coordinator)
}

pub fn by_id(doc: &DocumentHandle, id: &str) -> NodeId {
    doc.borrow()
        .element_by_id(id)
        .unwrap_or_else(|| panic!("no element with id {id:?}"))
}

pub fn first_child(doc: &DocumentHandle, node: NodeId) -> NodeId {
    doc.borrow().children(node)[0]
}

pub fn text_of(doc: &DocumentHandle, node: NodeId) -> String {
    doc.borrow().text_content(node)
}

pub fn attr_of(doc: &DocumentHandle, node: NodeId, name: &str) -> Option<String> {
    doc.borrow().attr(node, name).map(str::to_string)
}

pub fn body(doc: &DocumentHandle) -> NodeId {
    let doc = doc.borrow();
    dom::traverse::first_element_by_name(&doc, NodeId::DOCUMENT, "body").expect("page has a body")
}

/// Every input the transform saw, in call order.
pub type CallLog = Rc<RefCell<Vec<String>>>;

/// A transform that records its inputs and applies `f`.
pub fn recording(f: impl Fn(&str) -> String + 'static) -> (CallLog, impl Fn(&str) -> String + 'static) {
    let log: CallLog = Rc::default();
    let sink = Rc::clone(&log);
    let transform = move |input: &str| {
        sink.borrow_mut().push(input.to_string());
        f(input)
    };
    (log, transform)
}

pub fn upper(input: &str) -> String {
    input.to_uppercase()
}

pub fn identity(input: &str) -> String {
    input.to_string()
}

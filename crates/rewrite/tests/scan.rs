mod common;

use common::*;
use css::{PseudoElement, StyleResolver, parse_string_literal};
use dom::{Node, NodeId};
use rewrite::{MARKER_ATTRIBUTE, Target, Watcher, WatcherOptions};

fn mixed_body() -> Node {
    page(
        "Mixed",
        vec![
            elem("p", &[("id", "a"), ("title", "")], vec![text("one")]),
            elem("input", &[("id", "field"), ("placeholder", "Search"), ("title", "Tip")], vec![]),
            elem("img", &[("id", "logo"), ("alt", "Logo")], vec![]),
            elem("script", &[], vec![text("ignored()")]),
            comment("not text"),
            host(
                "div",
                &[("id", "host")],
                vec![
                    elem("span", &[], vec![text("inner")]),
                    elem("input", &[("type", "submit"), ("value", "Go")], vec![]),
                ],
                vec![text("light")],
            ),
        ],
    )
}

#[test]
fn cold_scan_visits_each_unit_once_in_order() {
    let (doc, coordinator) = setup(mixed_body());
    let root = body(&doc);
    let (calls, transform) = recording(upper);
    let watcher = Watcher::new(&coordinator, transform, root, WatcherOptions::default()).unwrap();

    assert_eq!(
        *calls.borrow(),
        ["one", "light", "Search", "Logo", "Tip", "inner", "Go"]
    );
    assert_eq!(text_of(&doc, by_id(&doc, "a")), "ONE");
    assert_eq!(attr_of(&doc, by_id(&doc, "field"), "placeholder").as_deref(), Some("SEARCH"));
    assert_eq!(attr_of(&doc, by_id(&doc, "field"), "title").as_deref(), Some("TIP"));
    assert_eq!(attr_of(&doc, by_id(&doc, "a"), "title").as_deref(), Some(""));

    let shadow = doc.borrow().shadow_root(by_id(&doc, "host")).unwrap();
    assert_eq!(watcher.targets(), vec![root, shadow]);
    assert!(watcher.is_connected());
    assert_eq!(coordinator.len(), 1);
}

#[test]
fn shadow_subtrees_can_be_left_alone() {
    let (doc, coordinator) = setup(mixed_body());
    let root = body(&doc);
    let (calls, transform) = recording(upper);
    let options = WatcherOptions {
        shadow_subtrees: false,
        ..WatcherOptions::default()
    };
    let watcher = Watcher::new(&coordinator, transform, root, options).unwrap();

    assert_eq!(calls.borrow().len(), 5);
    assert_eq!(watcher.targets(), vec![root]);
}

#[test]
fn attributes_can_be_left_alone() {
    let (doc, coordinator) = setup(mixed_body());
    let (calls, transform) = recording(upper);
    let options = WatcherOptions {
        attributes: false,
        ..WatcherOptions::default()
    };
    Watcher::new(&coordinator, transform, body(&doc), options).unwrap();

    assert_eq!(*calls.borrow(), ["one", "light", "inner"]);
    assert_eq!(attr_of(&doc, by_id(&doc, "field"), "placeholder").as_deref(), Some("Search"));
}

#[test]
fn nested_shadow_roots_are_swept_to_a_fixpoint() {
    let (doc, coordinator) = setup(page(
        "Nested",
        vec![host(
            "outer-el",
            &[("id", "outer")],
            vec![host(
                "inner-el",
                &[("id", "inner")],
                vec![elem("b", &[("aria-label", "deep")], vec![text("deepest")])],
                vec![],
            )],
            vec![text("outside")],
        )],
    ));
    let (calls, transform) = recording(upper);
    let watcher =
        Watcher::new(&coordinator, transform, body(&doc), WatcherOptions::default()).unwrap();

    assert_eq!(*calls.borrow(), ["outside", "deepest", "deep"]);
    assert_eq!(watcher.targets().len(), 3);
}

#[test]
fn document_target_rewrites_title_then_body() {
    let (doc, coordinator) = setup(page(
        "Welcome",
        vec![elem("p", &[("id", "p")], vec![text("hi")])],
    ));
    let (calls, transform) = recording(upper);
    let watcher =
        Watcher::new(&coordinator, transform, Target::Document, WatcherOptions::default()).unwrap();

    assert_eq!(*calls.borrow(), ["Welcome", "hi"]);
    let title = {
        let d = doc.borrow();
        dom::traverse::first_element_by_name(&d, NodeId::DOCUMENT, "title").unwrap()
    };
    assert_eq!(text_of(&doc, title), "WELCOME");
    assert_eq!(watcher.targets(), vec![body(&doc)]);
    assert!(!watcher.is_inert());
}

#[test]
fn document_without_body_is_inert() {
    let (doc, coordinator) = setup(Node::Document {
        children: vec![elem(
            "html",
            &[],
            vec![elem("head", &[], vec![elem("title", &[], vec![text("Lonely")])])],
        )],
    });
    let (calls, transform) = recording(upper);
    let watcher =
        Watcher::new(&coordinator, transform, Target::Document, WatcherOptions::default()).unwrap();

    assert!(watcher.is_inert());
    assert!(!watcher.is_connected());
    assert!(watcher.targets().is_empty());
    assert_eq!(*calls.borrow(), ["Lonely"]);
    assert!(coordinator.is_empty());

    let html = by_name(&doc, "html");
    {
        let mut d = doc.borrow_mut();
        let p = d.create_element("p", &[]);
        let t = d.create_text("late");
        d.append_child(p, t).unwrap();
        d.append_child(html, p).unwrap();
    }
    assert_eq!(doc.run_until_idle().unwrap(), 0);
    watcher.disconnect(true).unwrap();
    watcher.reconnect(true).unwrap();
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn unknown_or_detached_target_node_is_inert() {
    let (doc, coordinator) = setup(page("T", vec![elem("p", &[("id", "p")], vec![text("a")])]));
    let (calls, transform) = recording(upper);
    let unknown =
        Watcher::new(&coordinator, transform, NodeId(9999), WatcherOptions::default()).unwrap();
    assert!(unknown.is_inert());
    assert!(unknown.targets().is_empty());

    let p = by_id(&doc, "p");
    doc.borrow_mut().remove(p).unwrap();
    let (detached_calls, transform) = recording(upper);
    let detached = Watcher::new(&coordinator, transform, p, WatcherOptions::default()).unwrap();
    assert!(detached.is_inert());
    assert!(!detached.is_connected());

    assert!(coordinator.is_empty());
    assert!(calls.borrow().is_empty());
    assert!(detached_calls.borrow().is_empty());
    assert_eq!(text_of(&doc, p), "a");
}

fn by_name(doc: &dom::DocumentHandle, name: &str) -> NodeId {
    let d = doc.borrow();
    dom::traverse::first_element_by_name(&d, NodeId::DOCUMENT, name).unwrap()
}

#[test]
fn scan_existing_false_only_watches() {
    let (doc, coordinator) = setup(page("T", vec![elem("p", &[("id", "p")], vec![text("old")])]));
    let (calls, transform) = recording(upper);
    let options = WatcherOptions {
        scan_existing: false,
        ..WatcherOptions::default()
    };
    Watcher::new(&coordinator, transform, body(&doc), options).unwrap();
    assert!(calls.borrow().is_empty());
    assert_eq!(text_of(&doc, by_id(&doc, "p")), "old");
}

#[test]
fn empty_results_never_blank_content() {
    let (doc, coordinator) = setup(page(
        "T",
        vec![
            elem("p", &[("id", "p")], vec![text("keep me")]),
            elem("textarea", &[("id", "t"), ("placeholder", "keep")], vec![]),
        ],
    ));
    let (calls, transform) = recording(|_| String::new());
    Watcher::new(&coordinator, transform, body(&doc), WatcherOptions::default()).unwrap();

    assert_eq!(calls.borrow().len(), 2);
    assert_eq!(text_of(&doc, by_id(&doc, "p")), "keep me");
    assert_eq!(attr_of(&doc, by_id(&doc, "t"), "placeholder").as_deref(), Some("keep"));
}

#[test]
fn hidden_and_editable_text_is_skipped() {
    let (doc, coordinator) = setup(page(
        "T",
        vec![
            elem("style", &[], vec![text("p { color: red }")]),
            elem("noscript", &[], vec![elem("p", &[], vec![text("enable js")])]),
            elem("div", &[("contenteditable", "true")], vec![text("draft")]),
            elem("p", &[("id", "shown")], vec![text("shown")]),
        ],
    ));
    let (calls, transform) = recording(upper);
    Watcher::new(&coordinator, transform, body(&doc), WatcherOptions::default()).unwrap();
    assert_eq!(*calls.borrow(), ["shown"]);
}

#[test]
fn icon_font_text_is_skipped_when_enabled() {
    let tree = || {
        page(
            "T",
            vec![
                elem("style", &[], vec![text(".fa { font-family: \"Font Awesome 6 Free\" }")]),
                elem("i", &[("class", "fa")], vec![text("star")]),
                elem("span", &[], vec![text("label")]),
            ],
        )
    };

    let (doc, coordinator) = setup(tree());
    let (calls, transform) = recording(upper);
    let options = WatcherOptions {
        icon_fonts: true,
        ..WatcherOptions::default()
    };
    Watcher::new(&coordinator, transform, body(&doc), options).unwrap();
    assert_eq!(*calls.borrow(), ["label"]);

    let (doc, coordinator) = setup(tree());
    let (calls, transform) = recording(upper);
    Watcher::new(&coordinator, transform, body(&doc), WatcherOptions::default()).unwrap();
    assert_eq!(*calls.borrow(), ["star", "label"]);
}

#[test]
fn generated_content_is_overridden_through_adopted_sheet() {
    let (doc, coordinator) = setup(page(
        "T",
        vec![
            elem(
                "style",
                &[],
                vec![text(".q::before { content: \"quote: \" } .q::after { content: attr(title) }")],
            ),
            elem("p", &[("id", "q"), ("class", "q")], vec![text("body")]),
        ],
    ));
    let (calls, transform) = recording(upper);
    let options = WatcherOptions {
        css_generated_content: true,
        ..WatcherOptions::default()
    };
    Watcher::new(&coordinator, transform, body(&doc), options).unwrap();

    assert_eq!(*calls.borrow(), ["body", "quote: "]);
    let q = by_id(&doc, "q");
    assert_eq!(attr_of(&doc, q, MARKER_ATTRIBUTE).as_deref(), Some("0"));

    let d = doc.borrow();
    let styles = StyleResolver::new(&d);
    let before = styles.pseudo_content(&d, q, PseudoElement::Before).unwrap();
    assert_eq!(parse_string_literal(&before).as_deref(), Some("QUOTE: "));
    assert_eq!(
        styles.pseudo_content(&d, q, PseudoElement::After).as_deref(),
        Some("attr(title)")
    );
}

#[test]
fn identity_transform_is_neutral() {
    let tree = mixed_body();
    let (doc, coordinator) = setup(tree.clone());
    Watcher::new(&coordinator, identity, Target::Document, WatcherOptions::default()).unwrap();
    {
        let mut d = doc.borrow_mut();
        let p = d.element_by_id("a").unwrap();
        let t = d.create_text(" more");
        d.append_child(p, t).unwrap();
        d.set_attribute(p, "title", "hint").unwrap();
    }
    doc.run_until_idle().unwrap();

    let mut expected = dom::Document::from_tree(&tree);
    let p = expected.element_by_id("a").unwrap();
    let t = expected.create_text(" more");
    expected.append_child(p, t).unwrap();
    expected.set_attribute(p, "title", "hint").unwrap();
    assert_eq!(
        doc.borrow().materialize(NodeId::DOCUMENT),
        expected.materialize(NodeId::DOCUMENT)
    );
}

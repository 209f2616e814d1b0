//! Static configuration: which attributes carry rendered text, on which
//! elements, plus the generated-content slots and icon-font markers.

use css::{PseudoElement, Selector};
use dom::{Document, NodeId};
use std::sync::LazyLock;

pub struct WatchedAttribute {
    pub name: &'static str,
    pub selectors: Vec<Selector>,
}

const WATCH_TABLE_SOURCE: &[(&str, &[&str])] = &[
    ("placeholder", &["input", "textarea"]),
    ("alt", &["img", "area", "input[type=image]"]),
    (
        "value",
        &["input[type=button]", "input[type=submit]", "input[type=reset]"],
    ),
    ("title", &["*"]),
    ("aria-label", &["*"]),
    ("label", &["optgroup", "option", "track"]),
];

pub static WATCH_TABLE: LazyLock<Vec<WatchedAttribute>> = LazyLock::new(|| {
    WATCH_TABLE_SOURCE
        .iter()
        .map(|&(name, selectors)| WatchedAttribute {
            name,
            selectors: selectors.iter().filter_map(|s| Selector::parse(s)).collect(),
        })
        .collect()
});

pub const PSEUDO_SLOTS: &[PseudoElement] = &[PseudoElement::Before, PseudoElement::After];

pub const ICON_FONT_MARKERS: &[&str] = &["icon", "awesome", "glyph", "material symbols", "dashicons"];

impl WatchedAttribute {
    pub fn applies_to(&self, doc: &Document, element: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(doc, element))
    }
}

/// Whether `name` on `element` is a rendered-text attribute.
pub fn is_watched(doc: &Document, element: NodeId, name: &str) -> bool {
    WATCH_TABLE
        .iter()
        .any(|entry| entry.name == name && entry.applies_to(doc, element))
}

pub fn watched_attribute_names() -> impl Iterator<Item = &'static str> {
    WATCH_TABLE_SOURCE.iter().map(|(name, _)| *name)
}

pub fn is_icon_font(font_family: &str) -> bool {
    ICON_FONT_MARKERS
        .iter()
        .any(|marker| dom::contains_ignore_ascii_case(font_family, marker.as_bytes()))
}

use crate::cascade::cascaded_value;
use crate::syntax::{PseudoElement, Stylesheet, parse_stylesheet};
use dom::traverse::{collect_style_texts, composed_ancestors};
use dom::{Document, NodeId};

/// Computed-style queries over a snapshot of the document's stylesheets.
///
/// The sheet is parsed once at construction; build a new resolver after
/// stylesheets change.
pub struct StyleResolver {
    sheet: Stylesheet,
}

impl StyleResolver {
    pub fn new(doc: &Document) -> Self {
        Self {
            sheet: parse_stylesheet(&collect_style_texts(doc)),
        }
    }

    pub fn from_stylesheet(sheet: Stylesheet) -> Self {
        Self { sheet }
    }

    /// Computed `font-family` of `node`, or of its parent element when `node`
    /// is not an element. Inherited through shadow boundaries.
    pub fn font_family(&self, doc: &Document, node: NodeId) -> Option<String> {
        let start = std::iter::once(node).filter(|&n| doc.is_element(n));
        for element in start.chain(composed_ancestors(doc, node).filter(|&n| doc.is_element(n))) {
            match cascaded_value(&self.sheet, doc, element, None, "font-family") {
                Some(value) if value.eq_ignore_ascii_case("inherit") => continue,
                Some(value) => return Some(value),
                None => continue,
            }
        }
        None
    }

    /// Resolved `content` of a pseudo-element. Not inherited.
    pub fn pseudo_content(
        &self,
        doc: &Document,
        element: NodeId,
        pseudo: PseudoElement,
    ) -> Option<String> {
        cascaded_value(&self.sheet, doc, element, Some(pseudo), "content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::Node;
    use std::sync::Arc;

    fn elem(name: &str, attributes: &[(&str, &str)], children: Vec<Node>) -> Node {
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

    fn text(value: &str) -> Node {
        Node::Text {
            text: value.to_string(),
        }
    }

    #[test]
    fn font_family_inherits_from_ancestors() {
        let mut d = Document::from_tree(&Node::Document {
            children: vec![
                elem("style", &[], vec![text(".fa { font-family: 'Font Awesome 6' }")]),
                elem(
                    "div",
                    &[("class", "fa")],
                    vec![elem("i", &[("id", "glyph")], vec![text("x")])],
                ),
                elem("p", &[("id", "plain")], vec![text("y")]),
            ],
        });
        let glyph = d.element_by_id("glyph").unwrap();
        let glyph_text = d.children(glyph)[0];
        let plain = d.element_by_id("plain").unwrap();

        let styles = StyleResolver::new(&d);
        assert_eq!(
            styles.font_family(&d, glyph_text).as_deref(),
            Some("'Font Awesome 6'")
        );
        assert_eq!(styles.font_family(&d, plain), None);

        d.set_adopted_stylesheet("override", "#plain { font-family: serif }".into());
        let styles = StyleResolver::new(&d);
        assert_eq!(styles.font_family(&d, plain).as_deref(), Some("serif"));
    }

    #[test]
    fn pseudo_content_comes_from_matching_rules() {
        let d = Document::from_tree(&Node::Document {
            children: vec![
                elem(
                    "style",
                    &[],
                    vec![text(r#".tag::after { content: "new" } .tag::before { content: none }"#)],
                ),
                elem("span", &[("class", "tag"), ("id", "t")], vec![]),
            ],
        });
        let t = d.element_by_id("t").unwrap();
        let styles = StyleResolver::new(&d);
        assert_eq!(
            styles.pseudo_content(&d, t, PseudoElement::After).as_deref(),
            Some(r#""new""#)
        );
        assert_eq!(
            styles.pseudo_content(&d, t, PseudoElement::Before).as_deref(),
            Some("none")
        );
    }
}

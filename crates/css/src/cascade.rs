use crate::syntax::{PseudoElement, Selector, Stylesheet, parse_declarations};
use dom::{Document, NodeId};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct Specificity(pub u16, pub u16, pub u16); // (id, class/attribute, type/pseudo)

// Field order is cascade precedence: importance, then inline-ness, then
// specificity, then source order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
struct Precedence {
    important: bool,
    inline: bool,
    specificity: Specificity,
    order: u32,
}

pub fn specificity_of(selector: &Selector) -> Specificity {
    let ids = selector.ids.len() as u16;
    let classes = (selector.classes.len() + selector.attributes.len()) as u16;
    let types = u16::from(selector.element.is_some()) + u16::from(selector.pseudo.is_some());
    Specificity(ids, classes, types)
}

// If the element has an inline style attribute, return its value
pub fn get_inline_style(doc: &Document, element: NodeId) -> Option<&str> {
    doc.attr(element, "style")
}

/// Cascaded (specified, not inherited) value of `property` for `element`, or
/// for one of its pseudo-elements. Inline styles never apply to pseudo-elements.
pub fn cascaded_value(
    sheet: &Stylesheet,
    doc: &Document,
    element: NodeId,
    pseudo: Option<PseudoElement>,
    property: &str,
) -> Option<String> {
    let inline = match pseudo {
        None => get_inline_style(doc, element).map(parse_declarations),
        Some(_) => None,
    };
    let mut candidates: Vec<(Precedence, &str)> = Vec::new();

    for (order, rule) in sheet.rules.iter().enumerate() {
        let matched = rule
            .selectors
            .iter()
            .filter(|s| s.pseudo == pseudo && s.matches(doc, element))
            .map(specificity_of)
            .max();
        let Some(specificity) = matched else {
            continue;
        };
        candidates.extend(
            rule.declarations
                .iter()
                .filter(|d| d.name == property)
                .map(|d| {
                    let precedence = Precedence {
                        important: d.important,
                        inline: false,
                        specificity,
                        order: order as u32,
                    };
                    (precedence, d.value.as_str())
                }),
        );
    }

    if let Some(declarations) = &inline {
        candidates.extend(
            declarations
                .iter()
                .filter(|d| d.name == property)
                .map(|d| {
                    let precedence = Precedence {
                        important: d.important,
                        inline: true,
                        specificity: Specificity::default(),
                        order: u32::MAX,
                    };
                    (precedence, d.value.as_str())
                }),
        );
    }

    // `max_by` keeps the last of equal candidates, so later declarations win ties
    candidates
        .into_iter()
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, value)| value.to_string())
}

pub mod syntax;
pub mod cascade;
pub mod values;
pub mod computed;

// Re-exports so other crates can just use `css::...` nicely.
pub use syntax::{
    AttributeSelector, Declaration, PseudoElement, Rule, Selector, Stylesheet, parse_declarations,
    parse_stylesheet,
};
pub use cascade::{Specificity, cascaded_value, get_inline_style, specificity_of};
pub use values::{parse_string_literal, quote_string};
pub use computed::StyleResolver;

use dom::{Document, NodeId};

// A single CSS property: "color: red"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

// Set of selectors and declarations
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PseudoElement {
    Before,
    After,
}

impl PseudoElement {
    pub fn as_css(self) -> &'static str {
        match self {
            PseudoElement::Before => "::before",
            PseudoElement::After => "::after",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    /// `None` for a presence test (`[name]`), otherwise exact match.
    pub value: Option<String>,
}

/// A compound selector: `type#id.class[attr=value]::pseudo`.
///
/// Combinators are not supported; rules using them are dropped at parse time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    /// `None` is the universal selector.
    pub element: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
    pub pseudo: Option<PseudoElement>,
}

impl Selector {
    // input: "input[type=submit]", ".icon::before", "*"
    pub fn parse(s: &str) -> Option<Selector> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        let mut selector = Selector::default();
        let mut rest = s;

        if let Some(r) = rest.strip_prefix('*') {
            rest = r;
        } else {
            let n = ident_len(rest);
            if n > 0 {
                selector.element = Some(rest[..n].to_ascii_lowercase());
                rest = &rest[n..];
            }
        }

        while !rest.is_empty() {
            if let Some(r) = rest.strip_prefix("::").or_else(|| rest.strip_prefix(':')) {
                let n = ident_len(r);
                selector.pseudo = match r[..n].to_ascii_lowercase().as_str() {
                    "before" => Some(PseudoElement::Before),
                    "after" => Some(PseudoElement::After),
                    _ => return None,
                };
                // a pseudo-element must come last
                if n != r.len() {
                    return None;
                }
                rest = "";
            } else if let Some(r) = rest.strip_prefix('#') {
                let n = ident_len(r);
                if n == 0 {
                    return None;
                }
                selector.ids.push(r[..n].to_string());
                rest = &r[n..];
            } else if let Some(r) = rest.strip_prefix('.') {
                let n = ident_len(r);
                if n == 0 {
                    return None;
                }
                selector.classes.push(r[..n].to_string());
                rest = &r[n..];
            } else if let Some(r) = rest.strip_prefix('[') {
                let end = find_unquoted(r, ']')?;
                selector.attributes.push(parse_attribute_selector(&r[..end])?);
                rest = &r[end + 1..];
            } else {
                return None;
            }
        }
        Some(selector)
    }

    /// Match against an element, ignoring any pseudo-element part.
    pub fn matches(&self, doc: &Document, element: NodeId) -> bool {
        let Some(name) = doc.element_name(element) else {
            return false;
        };
        if let Some(want) = &self.element
            && !name.eq_ignore_ascii_case(want)
        {
            return false;
        }
        if self.ids.iter().any(|id| doc.attr(element, "id") != Some(id.as_str())) {
            return false;
        }
        if !self.classes.is_empty() {
            let classlist = doc.attr(element, "class").unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|want| classlist.split_whitespace().any(|c| c == want))
            {
                return false;
            }
        }
        self.attributes.iter().all(|a| {
            match (doc.attr(element, &a.name), &a.value) {
                (None, _) => false,
                (Some(_), None) => true,
                // `type` values are matched case-insensitively in HTML
                (Some(v), Some(want)) if a.name == "type" => v.eq_ignore_ascii_case(want),
                (Some(v), Some(want)) => v == want,
            }
        })
    }
}

// A full stylesheet: multiple rules
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

// input: "div, #id { color: red; } .class::before { content: \"}\"; }"
// Quoted strings and comments are respected; at-rule blocks are skipped.
pub fn parse_stylesheet(input: &str) -> Stylesheet {
    let input = strip_comments(input);
    let mut rules = Vec::new();
    let mut rest = input.as_str();
    while let Some(open) = find_unquoted(rest, '{') {
        let prelude = &rest[..open];
        let after = &rest[open + 1..];
        let Some(close) = find_block_end(after) else {
            break;
        };
        let body = &after[..close];
        rest = &after[close + 1..];

        // stray statements such as `@import ...;` end up in front of the prelude
        let prelude = match prelude.rfind(';') {
            Some(i) => &prelude[i + 1..],
            None => prelude,
        }
        .trim();
        if prelude.starts_with('@') {
            continue;
        }
        let selectors = split_unquoted(prelude, ',')
            .into_iter()
            .map(Selector::parse)
            .collect::<Option<Vec<_>>>();
        // an unsupported selector invalidates the whole rule, as in CSS
        let Some(selectors) = selectors else {
            continue;
        };
        let declarations = parse_declarations(body);
        if selectors.is_empty() || declarations.is_empty() {
            continue;
        }
        rules.push(Rule {
            selectors,
            declarations,
        });
    }
    Stylesheet { rules }
}

// input: "color: red; content: \"a;b\" !important"
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    split_unquoted(input, ';')
        .into_iter()
        .filter_map(|pair| {
            let (n, v) = pair.split_once(':')?;
            let name = n.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            let mut value = v.trim();
            let mut important = false;
            if let Some(i) = value.rfind('!')
                && value[i + 1..].trim().eq_ignore_ascii_case("important")
            {
                important = true;
                value = value[..i].trim_end();
            }
            Some(Declaration {
                name,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

fn parse_attribute_selector(inner: &str) -> Option<AttributeSelector> {
    match inner.split_once('=') {
        None => {
            let name = inner.trim();
            if ident_len(name) != name.len() || name.is_empty() {
                return None;
            }
            Some(AttributeSelector {
                name: name.to_ascii_lowercase(),
                value: None,
            })
        }
        Some((name, value)) => {
            let name = name.trim();
            // `~=`, `|=`, `^=` and friends leave their operator char in `name`
            if ident_len(name) != name.len() || name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = crate::values::parse_string_literal(value).unwrap_or_else(|| value.to_string());
            Some(AttributeSelector {
                name: name.to_ascii_lowercase(),
                value: Some(value),
            })
        }
    }
}

fn ident_len(s: &str) -> usize {
    s.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_')
        .count()
}

/// Byte offset of the first `needle` outside quotes.
fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (c, None) if c == needle => return Some(i),
            _ => {}
        }
    }
    None
}

/// Offset of the `}` closing a block whose `{` was just consumed.
fn find_block_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut rest = s;
    let mut offset = 0;
    loop {
        let open = find_unquoted(rest, '{');
        let close = find_unquoted(rest, '}')?;
        match open {
            Some(o) if o < close => {
                depth += 1;
                offset += o + 1;
                rest = &rest[o + 1..];
            }
            _ => {
                if depth == 0 {
                    return Some(offset + close);
                }
                depth -= 1;
                offset += close + 1;
                rest = &rest[close + 1..];
            }
        }
    }
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = s;
    while let Some(i) = find_unquoted(rest, sep) {
        out.push(&rest[..i]);
        rest = &rest[i + sep.len_utf8()..];
    }
    out.push(rest);
    out.retain(|part| !part.trim().is_empty());
    out
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_selectors() {
        let s = Selector::parse("input.big#q[type=\"submit\"]").unwrap();
        assert_eq!(s.element.as_deref(), Some("input"));
        assert_eq!(s.ids, vec!["q"]);
        assert_eq!(s.classes, vec!["big"]);
        assert_eq!(
            s.attributes,
            vec![AttributeSelector {
                name: "type".into(),
                value: Some("submit".into())
            }]
        );
        assert_eq!(s.pseudo, None);

        let p = Selector::parse(".icon:before").unwrap();
        assert_eq!(p.pseudo, Some(PseudoElement::Before));
        assert_eq!(p.element, None);
    }

    #[test]
    fn rejects_combinators_and_unknown_pseudos() {
        assert_eq!(Selector::parse("div p"), None);
        assert_eq!(Selector::parse("div > p"), None);
        assert_eq!(Selector::parse("a:hover"), None);
        assert_eq!(Selector::parse("[title~=x]"), None);
        assert_eq!(Selector::parse("p::after.x"), None);
    }

    #[test]
    fn stylesheet_respects_quotes_comments_and_at_rules() {
        let sheet = parse_stylesheet(
            r#"/* { */ @media print { p { color: red } }
               .a::after { content: "};{"; }
               b, div p { color: blue }
               i { font-family: Icons !important }"#,
        );
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.rules[0].declarations[0].value, r#""};{""#);
        assert_eq!(sheet.rules[0].selectors[0].pseudo, Some(PseudoElement::After));
        assert!(sheet.rules[1].declarations[0].important);
        assert_eq!(sheet.rules[1].declarations[0].value, "Icons");
    }
}

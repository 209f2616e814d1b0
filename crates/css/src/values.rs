/// Parse a value that is exactly one CSS string literal and return its
/// unescaped content. Anything else (`attr(x)`, `"a" "b"`, `none`) is `None`.
pub fn parse_string_literal(value: &str) -> Option<String> {
    let value = value.trim();
    let mut chars = value.chars();
    let quote = chars.next().filter(|c| *c == '"' || *c == '\'')?;
    let mut out = String::new();
    let mut closed = false;
    while let Some(c) = chars.next() {
        if closed {
            return None;
        }
        match c {
            '\\' => {
                let next = chars.next()?;
                if next.is_ascii_hexdigit() {
                    let mut hex = String::from(next);
                    let mut lookahead = chars.clone();
                    while hex.len() < 6 {
                        match lookahead.next() {
                            Some(h) if h.is_ascii_hexdigit() => {
                                hex.push(h);
                                chars.next();
                            }
                            Some(' ') => {
                                chars.next();
                                break;
                            }
                            _ => break,
                        }
                    }
                    let code = u32::from_str_radix(&hex, 16).ok()?;
                    out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                } else if next != '\n' {
                    out.push(next);
                }
            }
            c if c == quote => closed = true,
            c => out.push(c),
        }
    }
    closed.then_some(out)
}

/// Serialize `s` as a double-quoted CSS string literal.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

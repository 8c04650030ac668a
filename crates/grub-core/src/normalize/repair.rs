//! Textual repairs for near-JSON produced by language models.
//!
//! Each pass tracks whether it is inside a double-quoted string literal and
//! leaves string contents untouched, so a URL such as `"http://x"` or a
//! value such as `"salt, pepper: to taste"` survives every pass. For text that
//! is already strict JSON every pass is the identity.

/// Apply all repairs in order: comments, trailing commas, bare keys.
pub fn repair(span: &str) -> String {
    let without_comments = strip_comments(span);
    let without_commas = strip_trailing_commas(&without_comments);
    quote_bare_keys(&without_commas)
}

/// Tracks string-literal state while scanning.
#[derive(Default)]
struct StringState {
    in_string: bool,
    escaped: bool,
}

impl StringState {
    /// Feed one character. Returns true if `c` belongs to a string literal
    /// (including its quotes) and must be copied through verbatim.
    fn feed(&mut self, c: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            return true;
        }
        if c == '"' {
            self.in_string = true;
            return true;
        }
        false
    }
}

/// Remove `/* ... */` and `// ...` comments outside string literals.
///
/// Block comments become a single space so adjacent tokens stay separated;
/// line comments keep their terminating newline. An unterminated block
/// comment swallows the rest of the input.
pub fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut state = StringState::default();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if state.feed(c) {
            out.push(c);
            continue;
        }
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                while chars.next_if(|n| *n != '\n').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Drop commas whose next non-whitespace character is `]` or `}`.
pub fn strip_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut state = StringState::default();

    for (i, &c) in chars.iter().enumerate() {
        if state.feed(c) {
            out.push(c);
            continue;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some(']') | Some('}')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Wrap unquoted object keys in double quotes.
///
/// A bare identifier is treated as a key only in key position (right after
/// `{` or `,`) and only when the next non-whitespace character is `:`.
/// Literals such as `true` inside arrays are therefore left alone.
pub fn quote_bare_keys(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 16);
    let mut state = StringState::default();
    let mut last_significant: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if state.feed(c) {
            out.push(c);
            last_significant = Some('"');
            i += 1;
            continue;
        }

        if is_ident_start(c) && matches!(last_significant, Some('{') | Some(',')) {
            let end = chars[i..]
                .iter()
                .position(|n| !is_ident_continue(*n))
                .map_or(chars.len(), |p| i + p);
            let followed_by_colon = chars[end..]
                .iter()
                .find(|n| !n.is_whitespace())
                .is_some_and(|n| *n == ':');
            if followed_by_colon {
                out.push('"');
                out.extend(&chars[i..end]);
                out.push('"');
            } else {
                out.extend(&chars[i..end]);
            }
            last_significant = chars.get(end - 1).copied();
            i = end;
            continue;
        }

        out.push(c);
        if !c.is_whitespace() {
            last_significant = Some(c);
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_and_block_comments() {
        let input = "{\n  // the first day\n  \"a\": 1, /* inline */ \"b\": 2\n}";
        let out = strip_comments(input);
        assert!(!out.contains("first day"));
        assert!(!out.contains("inline"));
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["b"], 2);
    }

    #[test]
    fn comment_markers_inside_strings_survive() {
        let input = r#"{"url": "http://example.com/*x*/", "note": "a // b"}"#;
        assert_eq!(strip_comments(input), input);
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let input = r#"{"a": "say \"hi\" // not a comment"}"#;
        assert_eq!(strip_comments(input), input);
    }

    #[test]
    fn unterminated_block_comment_swallows_rest() {
        assert_eq!(strip_comments("{\"a\":1 /* oops"), "{\"a\":1  ");
    }

    #[test]
    fn removes_trailing_commas() {
        let out = strip_trailing_commas("{\"a\": [1, 2, ], \"b\": {\"c\": 3,\n},}");
        assert_eq!(out, "{\"a\": [1, 2 ], \"b\": {\"c\": 3\n}}");
    }

    #[test]
    fn keeps_commas_inside_strings() {
        let input = r#"{"a": "x,]", "b": "y,}"}"#;
        assert_eq!(strip_trailing_commas(input), input);
    }

    #[test]
    fn quotes_bare_keys() {
        let out = quote_bare_keys("{name:\"Oats\", calories: 300, _id$2 :1}");
        assert_eq!(out, "{\"name\":\"Oats\", \"calories\": 300, \"_id$2\" :1}");
    }

    #[test]
    fn leaves_literals_alone() {
        let input = "{\"a\": [true, false, null], \"b\": true}";
        assert_eq!(quote_bare_keys(input), input);
    }

    #[test]
    fn does_not_touch_key_like_text_in_strings() {
        let input = r#"{"note": "salt, pepper: to taste"}"#;
        assert_eq!(quote_bare_keys(input), input);
    }

    #[test]
    fn strict_json_is_unchanged() {
        let input = r#"{"plans": [{"label": "Plan A", "Monday": [{"name": "Eggs", "calories": 200, "protein": 12}]}]}"#;
        assert_eq!(repair(input), input);
    }

    #[test]
    fn repairs_compose() {
        let input = "{ /* model note */ Monday: [ {name: \"Toast\", calories: 150, protein: 4,}, ], // end\n }";
        let v: serde_json::Value = serde_json::from_str(&repair(input)).unwrap();
        assert_eq!(v["Monday"][0]["name"], "Toast");
    }
}

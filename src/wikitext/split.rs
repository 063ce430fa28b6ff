//! Bracket-aware string helpers.
//!
//! Template bodies, link bodies and table lines are split on separators that
//! only count at the top level: a `|` inside a nested `{{...}}`, `[[...]]` or an
//! HTML tag belongs to the nested construct. Separators are ASCII, so working
//! on bytes never splits a UTF-8 sequence.

use lazy_regex::regex;
use std::collections::BTreeMap;

/// Walk `s`, calling `on_top` with the byte offset of every position that is
/// outside nested constructs. Returns the open `{{` and `[[` depths at the end.
fn walk_top_level(s: &str, mut on_top: impl FnMut(usize)) -> (usize, usize) {
    let b = s.as_bytes();
    let n = b.len();
    let mut i = 0usize;
    let mut depth_brace = 0usize;
    let mut depth_bracket = 0usize;
    let mut in_tag = false;

    while i < n {
        let next = b.get(i + 1).copied();
        match b[i] {
            b'{' if next == Some(b'{') => {
                depth_brace += 1;
                i += 2;
                continue;
            }
            b'}' if next == Some(b'}') && depth_brace > 0 => {
                depth_brace -= 1;
                i += 2;
                continue;
            }
            b'[' if next == Some(b'[') => {
                depth_bracket += 1;
                i += 2;
                continue;
            }
            b']' if next == Some(b']') && depth_bracket > 0 => {
                depth_bracket -= 1;
                i += 2;
                continue;
            }
            b'<' if next.is_some_and(|c| c.is_ascii_alphabetic() || c == b'/') => {
                in_tag = true;
            }
            b'>' if in_tag => {
                in_tag = false;
                i += 1;
                continue;
            }
            _ => {}
        }
        if depth_brace == 0 && depth_bracket == 0 && !in_tag {
            on_top(i);
        }
        i += 1;
    }
    (depth_brace, depth_bracket)
}

/// Split by `sep` only at top level.
pub fn split_top_level<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
    split_top_level_any(s, &[sep])
}

/// Split at top-level occurrences of any of `seps` (first listed wins on overlap).
pub fn split_top_level_any<'a>(s: &'a str, seps: &[&str]) -> Vec<&'a str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut last = 0usize;
    let mut skip_until = 0usize;
    walk_top_level(s, |i| {
        if i < skip_until {
            return;
        }
        if let Some(sep) = seps.iter().find(|sep| bytes[i..].starts_with(sep.as_bytes())) {
            parts.push(&s[last..i]);
            last = i + sep.len();
            skip_until = last;
        }
    });
    parts.push(&s[last..]);
    parts
}

/// Byte offset of the first top-level `c`.
pub fn find_top_level_char(s: &str, c: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut found = None;
    walk_top_level(s, |i| {
        if found.is_none() && bytes[i] == c {
            found = Some(i);
        }
    });
    found
}

/// Split `key=value` at the first top-level `=`.
pub fn split_key_value(s: &str) -> Option<(&str, &str)> {
    let eq = find_top_level_char(s, b'=')?;
    Some((&s[..eq], &s[eq + 1..]))
}

/// True when every `{{` and `[[` in `s` is closed.
pub fn is_balanced(s: &str) -> bool {
    walk_top_level(s, |_| {}) == (0, 0)
}

/// Parse HTML-style attributes (`a="x" b='y' c=z d`). Names are lowercased;
/// valueless attributes map to an empty string.
pub fn parse_attrs(s: &str) -> BTreeMap<String, String> {
    regex!(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .captures_iter(s)
        .map(|caps| {
            let name = caps[1].to_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_ignores_nested_pipes() {
        let parts = split_top_level("Infobox|name=[[a|b]]|{{x|y}}|<span title=\"p|q\">z</span>", "|");
        assert_eq!(
            parts,
            vec!["Infobox", "name=[[a|b]]", "{{x|y}}", "<span title=\"p|q\">z</span>"]
        );
    }

    #[test]
    fn split_double_separators() {
        assert_eq!(split_top_level("one||two", "||"), vec!["one", "two"]);
        assert_eq!(split_top_level("a|b||c", "||"), vec!["a|b", "c"]);
        assert_eq!(
            split_top_level_any(" a !! b || c", &["!!", "||"]),
            vec![" a ", " b ", " c"]
        );
        assert_eq!(split_top_level("{{x||y}}||z", "||"), vec!["{{x||y}}", "z"]);
    }

    #[test]
    fn split_keeps_unicode() {
        let parts = split_top_level("Garden_of_Eeshöl|Zoë", "|");
        assert_eq!(parts, vec!["Garden_of_Eeshöl", "Zoë"]);
    }

    #[test]
    fn stray_angle_bracket_is_not_a_tag() {
        assert_eq!(split_top_level("a < b|c", "|"), vec!["a < b", "c"]);
    }

    #[test]
    fn key_value() {
        assert_eq!(split_key_value(" name = x "), Some((" name ", " x ")));
        assert_eq!(split_key_value("{{a|b=c}}"), None);
        assert_eq!(split_key_value("[[a|b=c]]"), None);
        assert_eq!(split_key_value("url=http://x?a=b"), Some(("url", "http://x?a=b")));
    }

    #[test]
    fn balance() {
        assert!(is_balanced("{{a|[[b]]}}"));
        assert!(!is_balanced("{{a|b"));
        assert!(!is_balanced("[[a"));
        assert!(is_balanced("a }} b"));
    }

    #[test]
    fn attrs() {
        let a = parse_attrs(r#" class="wikitable sortable" style='width:50%' colspan=2 hidden"#);
        assert_eq!(a.get("class").map(String::as_str), Some("wikitable sortable"));
        assert_eq!(a.get("style").map(String::as_str), Some("width:50%"));
        assert_eq!(a.get("colspan").map(String::as_str), Some("2"));
        assert_eq!(a.get("hidden").map(String::as_str), Some(""));
    }
}

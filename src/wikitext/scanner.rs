//! Line-oriented scan context.
//!
//! The scanner holds the input split into lines plus a byte position inside the
//! current line. Every parser routine reads input through it: anchored matches
//! (`scan`, `check`, `skip`), searches within the line (`scan_until`), and
//! searches that may cross lines (`scan_through_until`, `scan_raw_until`).
//!
//! HTML comments are removed from the whole input once, before line splitting.

use lazy_regex::{regex, regex_replace_all};
use regex::Regex;
use std::collections::HashSet;

use crate::wikitext::errors::{Result, WtError};

/// Saved scanner position, for pushback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mark {
    line: usize,
    pos: usize,
}

/// Result of a search within the current line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Until {
    /// Text before the match.
    pub text: String,
    /// The matched delimiter.
    pub delim: String,
    /// Index of the pattern that matched, for `scan_until_any`.
    pub which: usize,
}

#[derive(Debug, Clone)]
pub struct Scanner {
    lines: Vec<String>,
    line: usize,
    pos: usize,
    /// 1-based line number of `lines[0]` in the outermost input.
    base_line: usize,
}

/// Remove `<!-- ... -->` (also across lines, also unterminated at the end).
pub fn strip_comments(input: &str) -> String {
    regex_replace_all!(r"(?s)<!--.*?(?:-->|\z)", input, "").into_owned()
}

impl Scanner {
    pub fn new(input: &str) -> Self {
        let cleaned = strip_comments(&input.replace("\r\n", "\n"));
        Self::nested(&cleaned, 1)
    }

    /// Scanner over an already cleaned piece of a larger input that starts at `base_line`.
    pub(crate) fn nested(input: &str, base_line: usize) -> Self {
        Self {
            lines: input.split('\n').map(str::to_string).collect(),
            line: 0,
            pos: 0,
            base_line,
        }
    }

    pub fn eof(&self) -> bool {
        self.line >= self.lines.len()
    }

    /// The whole current line.
    pub fn current(&self) -> Option<&str> {
        self.lines.get(self.line).map(String::as_str)
    }

    /// Unconsumed part of the current line; empty at end of input.
    pub fn rest(&self) -> &str {
        match self.lines.get(self.line) {
            Some(line) => &line[self.pos..],
            None => "",
        }
    }

    /// 1-based line number in the outermost input.
    pub fn line_no(&self) -> usize {
        self.base_line + self.line.min(self.lines.len().saturating_sub(1))
    }

    pub fn mark(&self) -> Mark {
        Mark {
            line: self.line,
            pos: self.pos,
        }
    }

    pub fn reset(&mut self, mark: Mark) {
        self.line = mark.line;
        self.pos = mark.pos;
    }

    /// Parse error at the current position.
    pub fn error(&self, msg: impl Into<String>) -> WtError {
        WtError::parse_at(msg, self.line_no(), self.rest())
    }

    /// Consume `n` bytes of the current line.
    pub fn advance(&mut self, n: usize) {
        if let Some(line) = self.lines.get(self.line) {
            self.pos = (self.pos + n).min(line.len());
        }
    }

    /// Give back the last `n` consumed bytes of the current line.
    pub fn unread(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    /// Consume the rest of the current line and return it.
    pub fn skip_rest(&mut self) -> String {
        let rest = self.rest().to_string();
        self.advance(rest.len());
        rest
    }

    /// Consume a match of `re` at the current position.
    pub fn scan(&mut self, re: &Regex) -> Option<String> {
        let found = self.check(re)?.to_string();
        self.advance(found.len());
        Some(found)
    }

    /// Like `scan`, without consuming.
    pub fn check(&self, re: &Regex) -> Option<&str> {
        let rest = self.rest();
        re.find(rest)
            .filter(|m| m.start() == 0)
            .map(|m| &rest[..m.end()])
    }

    pub fn skip(&mut self, re: &Regex) -> bool {
        self.scan(re).is_some()
    }

    /// Consume up to and including the first match of `re` on the current line.
    pub fn scan_until(&mut self, re: &Regex) -> Option<Until> {
        self.scan_until_any(&[re])
    }

    /// `scan_until` over several patterns: the earliest match wins, ties go to
    /// the pattern listed first.
    pub fn scan_until_any(&mut self, patterns: &[&Regex]) -> Option<Until> {
        let rest = self.rest();
        let (which, m) = patterns
            .iter()
            .enumerate()
            .filter_map(|(i, re)| re.find(rest).map(|m| (i, m)))
            .min_by_key(|(i, m)| (m.start(), *i))?;
        let until = Until {
            text: rest[..m.start()].to_string(),
            delim: m.as_str().to_string(),
            which,
        };
        let end = m.end();
        self.advance(end);
        Some(until)
    }

    /// Consume everything up to and including the first match of `re`, which
    /// may be on a later line. Nested `{{`/`[[` are consumed together with
    /// their `}}`/`]]` first, so a closer inside them does not end the scan; a
    /// nested opener that never closes is kept as plain text. Lines are joined
    /// with `\n`; the delimiter is not part of the result.
    pub fn scan_through_until(&mut self, re: &Regex) -> Result<String> {
        let mut unclosed = HashSet::new();
        self.scan_through(re, &mut unclosed)
    }

    /// `scan_through_until` restricted to the rest of the current line.
    pub fn scan_through_until_on_line(&mut self, re: &Regex) -> Result<String> {
        let mut line = Scanner::nested(self.rest(), self.line_no());
        let found = line.scan_through_until(re)?;
        self.advance(line.pos);
        Ok(found)
    }

    /// `unclosed` holds the positions right after nested openers whose closer
    /// is known to be missing. A scan from a given position always ends the
    /// same way, so each of them is searched at most once.
    fn scan_through(&mut self, re: &Regex, unclosed: &mut HashSet<Mark>) -> Result<String> {
        let start = self.mark();
        let start_line = self.line_no();
        let start_rest = self.rest().to_string();
        let mut out = String::new();
        loop {
            if self.eof() {
                self.reset(start);
                return Err(WtError::parse_at(
                    format!("expected {:?} before end of input", re.as_str()),
                    start_line,
                    start_rest,
                ));
            }
            let rest = self.rest();
            let term = re.find(rest);
            let open = regex!(r"\{\{|\[\[").find(rest);
            match (term, open) {
                (Some(t), None) => {
                    out.push_str(&rest[..t.start()]);
                    let end = t.end();
                    self.advance(end);
                    return Ok(out);
                }
                (Some(t), Some(o)) if t.start() <= o.start() => {
                    out.push_str(&rest[..t.start()]);
                    let end = t.end();
                    self.advance(end);
                    return Ok(out);
                }
                (_, Some(o)) => {
                    let braces = o.as_str() == "{{";
                    out.push_str(&rest[..o.end()]);
                    let end = o.end();
                    self.advance(end);
                    let inner_start = self.mark();
                    if unclosed.contains(&inner_start) {
                        continue;
                    }
                    let closer = if braces { regex!(r"\}\}") } else { regex!(r"\]\]") };
                    match self.scan_through(closer, unclosed) {
                        Ok(inner) => {
                            out.push_str(&inner);
                            out.push_str(if braces { "}}" } else { "]]" });
                        }
                        Err(_) => {
                            unclosed.insert(inner_start);
                            self.reset(inner_start);
                        }
                    }
                }
                (None, None) => {
                    out.push_str(rest);
                    out.push('\n');
                    self.line += 1;
                    self.pos = 0;
                }
            }
        }
    }

    /// Like `scan_through_until` but without bracket awareness, for raw
    /// content such as `<nowiki>` or `<math>`.
    pub fn scan_raw_until(&mut self, re: &Regex) -> Result<String> {
        let start = self.mark();
        let start_line = self.line_no();
        let start_rest = self.rest().to_string();
        let mut out = String::new();
        while !self.eof() {
            let rest = self.rest();
            if let Some(m) = re.find(rest) {
                out.push_str(&rest[..m.start()]);
                let end = m.end();
                self.advance(end);
                return Ok(out);
            }
            out.push_str(rest);
            out.push('\n');
            self.line += 1;
            self.pos = 0;
        }
        self.reset(start);
        Err(WtError::parse_at(
            format!("expected {:?} before end of input", re.as_str()),
            start_line,
            start_rest,
        ))
    }

    /// Move to the start of the next line. Fails when already past the end.
    pub fn next_line(&mut self) -> Result<()> {
        if self.eof() {
            return Err(self.error("unexpected end of input"));
        }
        self.line += 1;
        self.pos = 0;
        Ok(())
    }

    /// Move back to the start of the previous line.
    pub fn prev_line(&mut self) -> Result<()> {
        if self.line == 0 {
            return Err(self.error("already at the first line"));
        }
        self.line -= 1;
        self.pos = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_regex::regex;
    use std::time::{Duration, Instant};

    #[test]
    fn comments_are_stripped_once() {
        let sc = Scanner::new("a<!-- x\ny -->b\nc<!-- open");
        assert_eq!(sc.current(), Some("ab"));
        let mut sc = sc;
        sc.next_line().unwrap();
        assert_eq!(sc.rest(), "c");
    }

    #[test]
    fn scan_check_skip() {
        let mut sc = Scanner::new("== Title ==");
        assert_eq!(sc.check(regex!("=+")), Some("=="));
        assert_eq!(sc.rest(), "== Title ==");
        assert_eq!(sc.scan(regex!("=+")).as_deref(), Some("=="));
        assert!(!sc.skip(regex!("=+")));
        assert!(sc.skip(regex!(r"\s+")));
        assert_eq!(sc.rest(), "Title ==");
        // no match at position: nothing consumed
        assert_eq!(sc.scan(regex!("==")), None);
        assert_eq!(sc.rest(), "Title ==");
    }

    #[test]
    fn scan_until_strips_delimiter() {
        let mut sc = Scanner::new("one||two");
        let u = sc.scan_until(regex!(r"\|\|")).unwrap();
        assert_eq!(u.text, "one");
        assert_eq!(u.delim, "||");
        assert_eq!(sc.rest(), "two");
        assert_eq!(sc.scan_until(regex!(r"\|\|")), None);
        assert_eq!(sc.rest(), "two");
    }

    #[test]
    fn scan_until_any_prefers_earliest_then_first() {
        let mut sc = Scanner::new("ab'''c");
        let u = sc
            .scan_until_any(&[regex!("''"), regex!("'''")])
            .unwrap();
        assert_eq!(u.which, 0);
        assert_eq!(u.text, "ab");
    }

    #[test]
    fn scan_through_until_skips_nested_brackets() {
        let mut sc = Scanner::new("name|{{inner|x}}|[[a|b]]}} tail");
        let body = sc.scan_through_until(regex!(r"\}\}")).unwrap();
        assert_eq!(body, "name|{{inner|x}}|[[a|b]]");
        assert_eq!(sc.rest(), " tail");
    }

    #[test]
    fn scan_through_until_crosses_lines() {
        let mut sc = Scanner::new("Infobox\n| a = 1\n| b = 2\n}} after");
        let body = sc.scan_through_until(regex!(r"\}\}")).unwrap();
        assert_eq!(body, "Infobox\n| a = 1\n| b = 2\n");
        assert_eq!(sc.rest(), " after");
        assert_eq!(sc.line_no(), 4);
    }

    #[test]
    fn scan_through_until_keeps_unclosed_nested_opener() {
        let mut sc = Scanner::new("a [[b }} c");
        let body = sc.scan_through_until(regex!(r"\}\}")).unwrap();
        assert_eq!(body, "a [[b ");
        assert_eq!(sc.rest(), " c");
    }

    #[test]
    fn scan_through_until_fails_at_eof_and_resets() {
        let mut sc = Scanner::new("x\n{{never\nclosed");
        sc.next_line().unwrap();
        sc.advance(2);
        let err = sc.scan_through_until(regex!(r"\}\}")).unwrap_err();
        assert!(err.is_parse_error());
        assert_eq!(err.line(), Some(2));
        assert_eq!(sc.rest(), "never");
    }

    #[test]
    fn raw_until_ignores_brackets() {
        let mut sc = Scanner::new("{{x</nowiki>y");
        let raw = sc.scan_raw_until(regex!("</nowiki>")).unwrap();
        assert_eq!(raw, "{{x");
        assert_eq!(sc.rest(), "y");
    }

    #[test]
    fn line_navigation() {
        let mut sc = Scanner::new("a\nb");
        assert!(sc.prev_line().is_err());
        sc.next_line().unwrap();
        assert_eq!(sc.rest(), "b");
        sc.prev_line().unwrap();
        assert_eq!(sc.rest(), "a");
        sc.next_line().unwrap();
        sc.next_line().unwrap();
        assert!(sc.eof());
        assert_eq!(sc.rest(), "");
        assert!(sc.next_line().is_err());
    }

    #[test]
    fn many_unclosed_openers_scan_in_one_pass() {
        let input = format!("x|{}}}}} tail", "[[a ".repeat(40));
        let started = Instant::now();
        let mut sc = Scanner::new(&input);
        let body = sc.scan_through_until(regex!(r"\}\}")).unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(body, format!("x|{}", "[[a ".repeat(40)));
        assert_eq!(sc.rest(), " tail");
    }

    #[test]
    fn scan_through_until_on_line_stays_on_line() {
        let mut sc = Scanner::new("a {{b|</i>}} </i> c
d");
        let content = sc.scan_through_until_on_line(regex!("</i>")).unwrap();
        assert_eq!(content, "a {{b|</i>}} ");
        assert_eq!(sc.rest(), " c");

        let mut sc = Scanner::new("a\n</i>");
        assert!(sc.scan_through_until_on_line(regex!("</i>")).is_err());
        assert_eq!(sc.rest(), "a");
    }

    #[test]
    fn nested_scanner_reports_absolute_lines() {
        let sc = Scanner::nested("x", 7);
        assert_eq!(sc.error("boom").line(), Some(7));
    }
}

//! Lexer for C/C++ module source
//!
//! Only distinguishes what comment stripping needs:
//! - `//` line comments and `/* */` block comments
//! - string and character literals, so comment markers inside them survive
//! - everything else as opaque code
//!
//! Stripping blanks comment bytes instead of removing them, so byte offsets
//! and line numbers in the stripped text match the original file.

use logos::{Logos, Span};

/// Byte range in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

impl Location {
    /// 1-based line of `start` within `source`
    pub fn line(&self, source: &str) -> usize {
        let end = self.start.min(source.len());
        source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
    }
}

/// Token types for C-family source
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum CToken {
    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    CharLiteral,

    /// A lone slash (division, or the start of an unterminated comment)
    #[token("/")]
    Slash,

    #[regex(r#"[^/"']+"#)]
    Code,
}

impl CToken {
    pub fn is_comment(self) -> bool {
        matches!(self, CToken::LineComment | CToken::BlockComment)
    }
}

/// Replace every comment in `source` with blanks, keeping newlines.
///
/// Text the lexer cannot classify (an unterminated literal) is copied as is.
pub fn strip_comments(source: &str) -> String {
    let mut stripped = String::with_capacity(source.len());

    for (result, span) in CToken::lexer(source).spanned() {
        let text = &source[span];
        match result {
            Ok(token) if token.is_comment() => {
                for c in text.chars() {
                    if c == '\n' {
                        stripped.push('\n');
                    } else {
                        stripped.extend(std::iter::repeat_n(' ', c.len_utf8()));
                    }
                }
            }
            _ => stripped.push_str(text),
        }
    }

    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment() {
        let stripped = strip_comments("a = 1; // trailing\nb = 2;");
        assert_eq!(stripped, format!("a = 1; {}\nb = 2;", " ".repeat(11)));
    }

    #[test]
    fn test_block_comment_keeps_lines() {
        let source = "x /* one\n two */ y";
        let stripped = strip_comments(source);
        assert_eq!(stripped.len(), source.len());
        assert_eq!(stripped.lines().count(), 2);
        assert!(!stripped.contains("one"));
        assert!(stripped.ends_with(" y"));
    }

    #[test]
    fn test_comment_markers_inside_strings() {
        let source = r#"ngx_string("http://x"), /* gone */ '/'"#;
        let stripped = strip_comments(source);
        assert!(stripped.contains(r#"ngx_string("http://x")"#));
        assert!(!stripped.contains("gone"));
        assert!(stripped.ends_with("'/'"));
    }

    #[test]
    fn test_division_and_unterminated_comment() {
        assert_eq!(strip_comments("a / b"), "a / b");
        assert_eq!(strip_comments("a /* open"), "a /* open");
    }

    #[test]
    fn test_multibyte_comment_preserves_offsets() {
        let source = "/* héllo */x";
        let stripped = strip_comments(source);
        assert_eq!(stripped.len(), source.len());
        assert!(stripped.ends_with('x'));
    }

    #[test]
    fn test_location_line() {
        let source = "a\nb\nc";
        assert_eq!(Location { start: 0, end: 1 }.line(source), 1);
        assert_eq!(Location { start: 4, end: 5 }.line(source), 3);
    }
}

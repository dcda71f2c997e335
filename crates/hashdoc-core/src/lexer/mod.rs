//! Lexer for Perl-style source files
//!
//! The lexer is deliberately forgiving: it never fails, and anything it
//! does not understand becomes a [`TokenKind::Punct`]. On top of the logos
//! token set it handles a few context-dependent constructs by hand:
//! - POD blocks (`=head1` ... `=cut`) starting at column 0 are skipped
//! - `__END__` / `__DATA__` at the start of a line ends the token stream
//! - quote-like operators (`q`, `qw`, `m`, `s`, `tr`, ...) and `/.../`
//!   matches become opaque [`TokenKind::String`] tokens, so a `#` or brace
//!   inside them is never read as a comment or block delimiter

#![allow(clippy::cast_possible_truncation)] // u32 spans; sources over 4GB are not supported

mod span;
mod token;

pub use span::{LineIndex, Span};
pub use token::TokenKind;

use logos::Logos;

/// Bare words that open a quote-like construct
const QUOTE_OPERATORS: &[&str] = &["m", "q", "qq", "qr", "qw", "qx", "s", "tr", "y"];

/// Quote-like operators with a pattern and a replacement part
const SUBSTITUTIONS: &[&str] = &["s", "tr", "y"];

/// Bare words after which a `/` starts a match rather than a division
const REGEX_KEYWORDS: &[&str] = &[
    "and", "grep", "if", "map", "not", "or", "return", "split", "unless", "until", "when",
    "while",
];

/// A token with its kind and location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Source text of this token
    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.as_range()]
    }
}

/// Streaming lexer over one source file
pub struct Lexer<'source> {
    source: &'source str,
    /// Current byte offset
    position: usize,
    /// True when `position` is at column 0
    at_line_start: bool,
    /// Last token returned, comments excluded
    previous: Option<Token>,
}

impl<'source> Lexer<'source> {
    #[must_use]
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            position: 0,
            at_line_start: true,
            previous: None,
        }
    }

    /// Tokenize the whole source
    #[must_use]
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            if self.position >= self.source.len() {
                return None;
            }

            let remaining = &self.source[self.position..];
            if self.at_line_start && starts_pod(remaining) {
                self.skip_pod();
                continue;
            }

            let mut logos_lexer = TokenKind::lexer(remaining);
            let Some(result) = logos_lexer.next() else {
                // only skipped whitespace was left
                self.position = self.source.len();
                return None;
            };

            let range = logos_lexer.span();
            let start = self.position + range.start;
            let end = self.position + range.end;
            let kind = result.unwrap_or(TokenKind::Punct);
            let was_line_start = self.at_line_start && range.start == 0;
            self.position = end;

            match kind {
                TokenKind::Newline => {
                    self.at_line_start = true;
                }
                TokenKind::End if was_line_start => {
                    self.position = self.source.len();
                    return None;
                }
                TokenKind::End => {
                    self.at_line_start = false;
                    return Some(Token {
                        kind: TokenKind::BareWord,
                        span: Span::new(start as u32, end as u32),
                    });
                }
                _ => {
                    self.at_line_start = false;
                    let mut token = Token {
                        kind,
                        span: Span::new(start as u32, end as u32),
                    };
                    if let Some(quoted_end) = self.quote_like(token) {
                        token = Token {
                            kind: TokenKind::String,
                            span: Span::new(start as u32, quoted_end as u32),
                        };
                        self.position = quoted_end;
                    }
                    if !kind.is_comment() {
                        self.previous = Some(token);
                    }
                    return Some(token);
                }
            }
        }
    }

    /// End offset of the quote-like construct opened by `token`, if any
    fn quote_like(&self, token: Token) -> Option<usize> {
        let text = token.text(self.source);
        match token.kind {
            TokenKind::BareWord if QUOTE_OPERATORS.contains(&text) => {
                let start = token.span.start as usize;
                let before = self.source[..start].chars().next_back();
                // `sub s`, `->y`, `-s $file`
                if matches!(before, Some('-' | '>'))
                    || self.previous.is_some_and(|p| p.kind == TokenKind::Sub)
                {
                    return None;
                }
                let parts = if SUBSTITUTIONS.contains(&text) { 2 } else { 1 };
                quoted_end(self.source, token.span.end as usize, parts)
            }
            TokenKind::Punct if text == "/" && self.regex_allowed() => {
                let start = token.span.start as usize;
                quoted_end(self.source, start, 1)
                    .filter(|&end| !self.source[start..end].contains('\n'))
            }
            _ => None,
        }
    }

    /// Whether a `/` here starts a match, judged by the token before it
    fn regex_allowed(&self) -> bool {
        let Some(previous) = self.previous else {
            return true;
        };
        match previous.kind {
            TokenKind::Semi | TokenKind::LBrace => true,
            TokenKind::Punct => !matches!(previous.text(self.source), ")" | "]"),
            TokenKind::BareWord => REGEX_KEYWORDS.contains(&previous.text(self.source)),
            _ => false,
        }
    }

    /// Skip from a POD command line through the matching `=cut` line
    fn skip_pod(&mut self) {
        let mut offset = self.position;
        for line in self.source[self.position..].split_inclusive('\n') {
            offset += line.len();
            if is_pod_cut(line) {
                break;
            }
        }
        self.position = offset;
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// End offset of a quoted body whose opening delimiter is the first
/// non-blank character at or after `from`, including trailing modifiers
///
/// Returns `None` when no delimiter follows or the body is never closed.
fn quoted_end(source: &str, from: usize, parts: usize) -> Option<usize> {
    let rest = &source[from..];
    let trimmed = rest.trim_start_matches([' ', '\t']);
    let gap = rest.len() - trimmed.len();
    let open = trimmed.chars().next()?;
    if open.is_alphanumeric()
        || open == '_'
        || open.is_whitespace()
        || matches!(open, ',' | ';' | '=' | ')' | ']' | '}' | '>')
        || (gap > 0 && open == '#')
    {
        return None;
    }

    let mut pos = delimited_end(source, from + gap + open.len_utf8(), open)?;
    for _ in 1..parts {
        if closing_delimiter(open).is_some() {
            // bracketed forms take a fresh delimiter: s{...}{...}
            let rest = &source[pos..];
            let trimmed = rest.trim_start();
            let second = trimmed.chars().next()?;
            let body = pos + rest.len() - trimmed.len() + second.len_utf8();
            pos = delimited_end(source, body, second)?;
        } else {
            pos = delimited_end(source, pos, open)?;
        }
    }

    let modifiers = source[pos..]
        .bytes()
        .take_while(u8::is_ascii_lowercase)
        .count();
    Some(pos + modifiers)
}

/// Offset just past the delimiter closing a body that starts at `from`
fn delimited_end(source: &str, from: usize, open: char) -> Option<usize> {
    let close = closing_delimiter(open).unwrap_or(open);
    let mut depth = 0usize;
    let mut chars = source[from..].char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == close {
            if depth == 0 {
                return Some(from + i + c.len_utf8());
            }
            depth -= 1;
        } else if c == open {
            depth += 1;
        }
    }
    None
}

const fn closing_delimiter(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '<' => Some('>'),
        _ => None,
    }
}

fn starts_pod(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next() == Some('=') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn is_pod_cut(line: &str) -> bool {
    line.strip_prefix("=cut")
        .is_some_and(|rest| rest.chars().next().map_or(true, char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn comment_markers() {
        let source = "##! module\n### item\n# plain\n#### deeper\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::PackageDoc,
                TokenKind::ItemDoc,
                TokenKind::Comment,
                TokenKind::ItemDoc,
            ]
        );
    }

    #[test]
    fn comment_text_excludes_newline() {
        let source = "### hello  \nsub";
        let tokens = Lexer::tokenize(source);
        assert_eq!(tokens[0].text(source), "### hello  ");
        assert_eq!(tokens[1].kind, TokenKind::Sub);
    }

    #[test]
    fn keywords_and_words() {
        assert_eq!(
            kinds("package Foo::Bar; sub packages {}"),
            vec![
                TokenKind::Package,
                TokenKind::BareWord,
                TokenKind::Semi,
                TokenKind::Sub,
                TokenKind::BareWord,
                TokenKind::LBrace,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        assert_eq!(
            kinds(r#"my $x = "a # b";"#),
            vec![
                TokenKind::BareWord,
                TokenKind::Variable,
                TokenKind::Punct,
                TokenKind::String,
                TokenKind::Semi,
            ]
        );
    }

    #[test]
    fn last_index_variable_is_not_a_comment() {
        let found = kinds("my $n = $#list;");
        assert!(!found.contains(&TokenKind::Comment));
        assert_eq!(found.last(), Some(&TokenKind::Semi));
    }

    #[test]
    fn pod_is_skipped() {
        let source = "=head1 NAME\n\nsub hidden {}\n\n=cut\nsub visible {}\n";
        let tokens = Lexer::tokenize(source);
        let words: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::BareWord)
            .map(|t| t.text(source))
            .collect();
        assert_eq!(words, vec!["visible"]);
    }

    #[test]
    fn indented_equals_is_not_pod() {
        assert_eq!(kinds("  =head1")[0], TokenKind::Punct);
    }

    #[test]
    fn end_marker_stops_lexing() {
        let source = "sub a {}\n__END__\nsub b {}\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Sub,
                TokenKind::BareWord,
                TokenKind::LBrace,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn quote_like_operators_are_opaque() {
        let source = r#"$s =~ s/#.*//g; my @w = qw{ a {b} }; tr/a-z/A-Z/;"#;
        let found = kinds(source);
        assert!(!found.contains(&TokenKind::Comment));
        assert!(!found.contains(&TokenKind::LBrace));
        assert!(!found.contains(&TokenKind::RBrace));

        let tokens = Lexer::tokenize("s{ # }{x}e;");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text("s{ # }{x}e;"), "s{ # }{x}e");
        assert_eq!(tokens[1].kind, TokenKind::Semi);
    }

    #[test]
    fn match_after_binding_operator() {
        let found = kinds("return 1 if $line =~ /^#/;\n");
        assert!(!found.contains(&TokenKind::Comment));
        assert_eq!(found.last(), Some(&TokenKind::Semi));
    }

    #[test]
    fn division_is_not_a_match() {
        let found = kinds("my $half = $total / 2; # half\n");
        assert_eq!(found.last(), Some(&TokenKind::Comment));
    }

    #[test]
    fn quote_words_in_other_roles_stay_words() {
        let source = "sub s { $h{y} = -s $file; $p->q(x => 1, y => 2) }";
        let found = kinds(source);
        assert!(!found.contains(&TokenKind::String));
        assert_eq!(found.last(), Some(&TokenKind::RBrace));
    }

    #[test]
    fn unterminated_quote_falls_back_to_words() {
        assert_eq!(kinds("q(never closed")[0], TokenKind::BareWord);
    }

    #[test]
    fn end_marker_mid_line_is_a_word() {
        assert_eq!(kinds("print __END__;")[1], TokenKind::BareWord);
    }
}

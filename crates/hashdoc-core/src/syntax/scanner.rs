//! Groups lexer tokens into top-level syntax elements

use tracing::warn;

use super::{Element, ElementKind, Marker};
use crate::lexer::{Lexer, LineIndex, Token, TokenKind};

/// Bare word that opens an attribute declaration
const ATTRIBUTE_KEYWORD: &str = "has";

/// Bare words that open a method modifier declaration
const MODIFIER_KEYWORDS: &[&str] = &["before", "after", "around", "override", "augment"];

/// Statements terminated by their first block instead of a `;`
const BLOCK_KEYWORDS: &[&str] = &[
    "if", "unless", "while", "until", "for", "foreach", "else", "elsif", "BEGIN", "END", "INIT",
    "CHECK", "UNITCHECK",
];

/// Scan a source file into its ordered top-level elements
///
/// Never fails: constructs the scanner does not recognise come out as
/// [`ElementKind::Other`], and unbalanced braces simply close at end of input.
#[must_use]
pub fn scan(source: &str) -> Vec<Element> {
    Scanner::new(source).run()
}

struct Scanner<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    lines: LineIndex,
    pos: usize,
    /// Open `package NAME { ... }` blocks whose contents are scanned as top level
    package_blocks: usize,
    elements: Vec<Element>,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            tokens: Lexer::tokenize(source),
            lines: LineIndex::new(source),
            pos: 0,
            package_blocks: 0,
            elements: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Element> {
        while let Some(&token) = self.tokens.get(self.pos) {
            match token.kind {
                TokenKind::PackageDoc => self.comment(token, Marker::PackageDoc),
                TokenKind::ItemDoc => self.comment(token, Marker::ItemDoc),
                TokenKind::Comment => self.comment(token, Marker::Plain),
                TokenKind::Semi => self.pos += 1,
                TokenKind::RBrace => {
                    // closes a package block, or is stray
                    self.package_blocks = self.package_blocks.saturating_sub(1);
                    self.push(ElementKind::Other, "}".to_string(), self.pos, self.pos + 1);
                    self.pos += 1;
                }
                TokenKind::Package => self.package(),
                TokenKind::Sub if self.kind_at(self.pos + 1) == Some(TokenKind::BareWord) => {
                    self.routine();
                }
                _ => self.statement(),
            }
        }
        self.elements
    }

    fn comment(&mut self, token: Token, marker: Marker) {
        // a marker only counts at the start of its line
        let marker = if self.starts_line(token) {
            marker
        } else {
            Marker::Plain
        };
        let text = token.text(self.source).trim_end_matches('\r').to_string();
        self.push(ElementKind::Comment { marker }, text, self.pos, self.pos + 1);
        self.pos += 1;
    }

    fn package(&mut self) {
        let start = self.pos;
        let mut end = start + 1;
        while let Some(kind) = self.kind_at(end) {
            if matches!(kind, TokenKind::Semi | TokenKind::LBrace | TokenKind::RBrace)
                || kind.is_comment()
            {
                break;
            }
            end += 1;
        }

        let resume = match self.kind_at(end) {
            Some(TokenKind::Semi) => end + 1,
            Some(TokenKind::LBrace) => {
                self.package_blocks += 1;
                end + 1
            }
            _ => end,
        };

        let kind = match self.kind_at(start + 1) {
            Some(TokenKind::BareWord) => ElementKind::Package {
                name: self.tokens[start + 1].text(self.source).to_string(),
            },
            _ => ElementKind::Other,
        };
        let text = self.normalize(start, end);
        self.push(kind, text, start, end);
        self.pos = resume;
    }

    fn routine(&mut self) {
        let start = self.pos;
        let name = self.tokens[start + 1].text(self.source).to_string();

        // braces inside the parenthesised signature are default values
        let mut parens = 0usize;
        let mut end = start + 2;
        while let Some(token) = self.tokens.get(end) {
            match token.kind {
                TokenKind::Semi => break,
                TokenKind::LBrace | TokenKind::RBrace if parens == 0 => break,
                // a prototype like `($)` lexes its closer into the variable `$)`
                TokenKind::Punct | TokenKind::Variable => {
                    let text = token.text(self.source);
                    if text.ends_with('(') {
                        parens += 1;
                    } else if text.ends_with(')') {
                        parens = parens.saturating_sub(1);
                    }
                }
                _ => {}
            }
            end += 1;
        }

        let resume = match self.kind_at(end) {
            Some(TokenKind::LBrace) => self.block_end(end).unwrap_or_else(|| {
                warn!(
                    routine = %name,
                    line = self.lines.line(self.tokens[start].span.start),
                    "routine body is not closed before end of input"
                );
                self.tokens.len()
            }),
            Some(TokenKind::Semi) => end + 1,
            _ => end,
        };

        let text = self.normalize(start, end);
        self.push(ElementKind::Routine { name }, text, start, resume);
        self.pos = resume;
    }

    fn statement(&mut self) {
        let start = self.pos;
        let first = self.tokens[start];
        let first_text = first.text(self.source);
        let block_ends = first.kind == TokenKind::LBrace
            || (first.kind == TokenKind::BareWord && BLOCK_KEYWORDS.contains(&first_text));

        let (end, resume) = self.statement_end(start, block_ends);
        let resume = resume.max(start + 1);

        let kind = match first.kind {
            TokenKind::Use => match self.kind_at(start + 1) {
                Some(TokenKind::BareWord) => ElementKind::Include {
                    module: self.tokens[start + 1].text(self.source).to_string(),
                },
                _ => ElementKind::Other,
            },
            TokenKind::BareWord if first_text == ATTRIBUTE_KEYWORD => ElementKind::Attribute,
            TokenKind::BareWord if MODIFIER_KEYWORDS.contains(&first_text) => {
                ElementKind::Modifier
            }
            _ => ElementKind::Other,
        };

        let text = if kind == ElementKind::Modifier {
            self.modifier_signature(start, end)
        } else {
            self.normalize(start, end)
        };
        self.push(kind, text, start, resume);
        self.pos = resume;
    }

    /// Returns (end of statement text, index to resume scanning at)
    fn statement_end(&self, start: usize, block_ends: bool) -> (usize, usize) {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(start) {
            match token.kind {
                TokenKind::LBrace => depth += 1,
                // belongs to an enclosing package block
                TokenKind::RBrace if depth == 0 => return (i, i),
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 && block_ends {
                        return (i + 1, i + 1);
                    }
                }
                TokenKind::Semi if depth == 0 => return (i, i + 1),
                _ => {}
            }
        }
        (self.tokens.len(), self.tokens.len())
    }

    /// Index just past the brace matching the one at `open`
    fn block_end(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open) {
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// `around name => sub { ... }` is signed as `around name`
    fn modifier_signature(&self, start: usize, end: usize) -> String {
        let cut = (start..end)
            .find(|&i| self.tokens[i].kind == TokenKind::Sub)
            .unwrap_or(end);
        let text = self.normalize(start, cut);
        let text = text.trim_end();
        let text = text.strip_suffix("=>").unwrap_or(text).trim_end();
        let text = text.strip_suffix(',').unwrap_or(text).trim_end();
        text.to_string()
    }

    /// Source text of `tokens[start..end]` without comments, with every
    /// whitespace gap collapsed to one space
    fn normalize(&self, start: usize, end: usize) -> String {
        let mut text = String::new();
        let mut prev_end = None;
        for token in &self.tokens[start..end.min(self.tokens.len())] {
            if token.kind.is_comment() {
                continue;
            }
            if prev_end.is_some_and(|e| e < token.span.start) {
                text.push(' ');
            }
            text.push_str(token.text(self.source));
            prev_end = Some(token.span.end);
        }
        text
    }

    /// Whether only blanks precede `token` on its line
    fn starts_line(&self, token: Token) -> bool {
        let before = &self.source[..token.span.start as usize];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        before[line_start..].trim().is_empty()
    }

    fn kind_at(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(|t| t.kind)
    }

    /// Record an element covering `tokens[start..end]`
    fn push(&mut self, kind: ElementKind, text: String, start: usize, end: usize) {
        let first = self.tokens[start];
        let last = self.tokens[end.clamp(start + 1, self.tokens.len()) - 1];
        self.elements.push(Element {
            kind,
            text,
            span: first.span.merge(last.span),
            line: self.lines.line(first.span.start),
        });
    }
}

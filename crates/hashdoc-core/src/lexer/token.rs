//! Token kinds for the Perl source lexer

use logos::Logos;

/// The kind of token produced by the lexer
///
/// Only the distinctions the scanner needs are kept: comment markers,
/// declaration keywords, bare words, braces and statement terminators.
/// Everything else collapses into a handful of opaque kinds.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\f]+")]
pub enum TokenKind {
    // ========== Comments ==========
    /// Module-level doc line: `##! ...`
    #[regex(r"##![^\n]*")]
    PackageDoc,

    /// Item-level doc line: `### ...`
    #[regex(r"###[^\n]*")]
    ItemDoc,

    /// Any other `#` comment
    #[regex(r"#[^\n]*")]
    Comment,

    #[token("\n")]
    Newline,

    // ========== Keywords ==========
    #[token("package")]
    Package,
    #[token("sub")]
    Sub,
    #[token("use")]
    Use,

    /// `__END__` / `__DATA__`; only honoured at the start of a line
    #[token("__END__")]
    #[token("__DATA__")]
    End,

    // ========== Words and literals ==========
    /// Identifier, possibly qualified: `Foo::Bar::baz`
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*(::)?")]
    BareWord,

    #[regex(r"[\$@%&][A-Za-z_][A-Za-z0-9_]*(::[A-Za-z0-9_]+)*")]
    #[regex(r#"\$[0-9!@/;,.&`'"+<>\[\]()|?$-]"#)]
    #[token("$#")]
    Variable,

    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    #[regex(r"'([^'\\]|\\(.|\n))*'")]
    #[regex(r"`([^`\\]|\\(.|\n))*`")]
    String,

    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?")]
    Number,

    // ========== Punctuation ==========
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,

    /// Any other single character
    #[regex(r"[^A-Za-z0-9_\s]", priority = 1)]
    Punct,
}

impl TokenKind {
    /// Whether this token is a comment of any kind
    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(self, Self::PackageDoc | Self::ItemDoc | Self::Comment)
    }
}

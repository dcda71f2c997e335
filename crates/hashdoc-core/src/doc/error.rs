//! Extraction outcomes and errors

use thiserror::Error;

/// A failure that excludes one source file from the module set
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no package declaration found")]
    MissingPackage,

    #[error("malformed comment block at line {line}: {reason}")]
    MalformedCommentBlock { line: usize, reason: MalformedReason },

    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a comment block could not be classified
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("unrecognized directive `{0}`")]
    UnknownDirective(String),

    #[error("test fence opened but never closed")]
    UnterminatedFence,
}

/// Why an item (or a whole module) was deliberately left out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Routine name carries the private-name marker
    Private,
    /// First doc line is the ignore directive
    Ignored,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Private => f.write_str("private"),
            Self::Ignored => f.write_str("ignored"),
        }
    }
}

/// Result of building one item: either the item, or a silent skip
///
/// Skips are not errors. Anything that must abort extraction travels in the
/// surrounding `Result` as an [`ExtractError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction<T> {
    Found(T),
    Skip(SkipReason),
}

impl<T> Extraction<T> {
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Skip(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extraction<U> {
        match self {
            Self::Found(value) => Extraction::Found(f(value)),
            Self::Skip(reason) => Extraction::Skip(reason),
        }
    }
}

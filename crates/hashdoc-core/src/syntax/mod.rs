//! Syntax element stream
//!
//! A flat, ordered sequence of top-level [`Element`]s per source file. This
//! is all the extraction engine needs to know about a file: where the
//! declarations are, what they look like, and which comment lines sit next
//! to them.

mod scanner;

pub use scanner::scan;

use serde::Serialize;

use crate::lexer::Span;

/// Comment-line marker kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    /// `##!` module-level documentation
    PackageDoc,
    /// `###` item-level documentation
    ItemDoc,
    /// Any other `#` comment
    Plain,
}

impl Marker {
    /// The literal comment prefix, if this marker has one
    #[must_use]
    pub const fn prefix(self) -> Option<&'static str> {
        match self {
            Self::PackageDoc => Some(crate::doc::PACKAGE_DOC_MARKER),
            Self::ItemDoc => Some(crate::doc::ITEM_DOC_MARKER),
            Self::Plain => None,
        }
    }
}

/// What a top-level element is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ElementKind {
    /// `package NAME ...`
    Package { name: String },
    /// `sub NAME ...`
    Routine { name: String },
    /// `has ...` call
    Attribute,
    /// `before|after|around|override|augment ...` call
    Modifier,
    /// `use MODULE ...`
    Include { module: String },
    /// A single comment line
    Comment { marker: Marker },
    /// Any other statement, block or stray token
    Other,
}

/// One top-level syntax element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub kind: ElementKind,
    /// Declaration signature for declarations, the raw line for comments,
    /// the normalized statement text otherwise
    pub text: String,
    pub span: Span,
    /// 1-based line of the first token
    pub line: usize,
}

impl Element {
    #[must_use]
    pub fn is_package(&self) -> bool {
        matches!(self.kind, ElementKind::Package { .. })
    }

    /// The comment marker, if this element is a comment line
    #[must_use]
    pub fn marker(&self) -> Option<Marker> {
        match self.kind {
            ElementKind::Comment { marker } => Some(marker),
            _ => None,
        }
    }

    /// True for a comment line carrying exactly `marker`
    #[must_use]
    pub fn is_comment_with(&self, marker: Marker) -> bool {
        self.marker() == Some(marker)
    }
}

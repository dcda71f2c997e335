//! Documentation extraction for Perl-style source code
//!
//! This module walks the element stream of a source file, pairs `##!` and
//! `###` comment blocks with the declarations they document, and produces
//! [`Module`] records. Those records feed the namespace [`IndexNode`] tree,
//! the Markdown renderer and the test synthesizer.

mod comment;
mod error;
mod extractor;
mod index;
mod item;
mod markdown;
mod project;
mod types;

pub use comment::{
    classify, strip_marker, CommentLine, DocBlock, FENCE, IGNORE_DIRECTIVE, ITEM_DOC_MARKER,
    PACKAGE_DOC_MARKER,
};
pub use error::{ExtractError, Extraction, MalformedReason, SkipReason};
pub use extractor::DocExtractor;
pub use index::{document_segments, IndexLeaf, IndexNode};
pub use item::{is_private, ItemBuilder, PRIVATE_PREFIX};
pub use markdown::{MarkdownGenerator, INDEX_PAGE};
pub use project::{FileFailure, Project};
pub use types::{
    AttributeItem, DocItem, Document, ModifierItem, Module, ModuleFlavor, PackageItem,
    RoutineItem, NAMESPACE_SEPARATOR,
};

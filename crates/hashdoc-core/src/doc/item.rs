//! Item construction from a declaration and its neighbouring doc lines

use tracing::debug;

use super::comment::{classify, CommentLine, DocBlock};
use super::error::{ExtractError, Extraction, SkipReason};
use super::types::{AttributeItem, ModifierItem, PackageItem, RoutineItem, NAMESPACE_SEPARATOR};
use crate::syntax::{Element, ElementKind, Marker};

/// Leading character of private routine names
pub const PRIVATE_PREFIX: char = '_';

/// Builds documentation items for declarations in one element stream
///
/// The package block is the run of `##!` lines directly *after* the package
/// declaration; every other item's block is the run of `###` lines directly
/// *before* its declaration. Any other element between the two severs the
/// association.
pub struct ItemBuilder<'e> {
    elements: &'e [Element],
}

impl<'e> ItemBuilder<'e> {
    #[must_use]
    pub fn new(elements: &'e [Element]) -> Self {
        Self { elements }
    }

    /// Build the package item for the declaration at `at`
    pub fn package(&self, at: usize) -> Result<Extraction<PackageItem>, ExtractError> {
        let element = &self.elements[at];
        let block = classify(&self.following_doc(at), Marker::PackageDoc)?;
        if block.ignored {
            return Ok(Extraction::Skip(SkipReason::Ignored));
        }
        Ok(Extraction::Found(PackageItem {
            statement: element.text.clone(),
            description: block.description,
            line: element.line,
        }))
    }

    /// Build the routine item for the declaration at `at`
    pub fn routine(&self, at: usize) -> Result<Extraction<RoutineItem>, ExtractError> {
        let element = &self.elements[at];
        if let ElementKind::Routine { name } = &element.kind {
            if is_private(name) {
                debug!(routine = %name, line = element.line, "skipping private routine");
                return Ok(Extraction::Skip(SkipReason::Private));
            }
        }

        Ok(self.item_block(at)?.map(|block| RoutineItem {
            statement: element.text.clone(),
            description: block.description,
            test: block.test,
            line: element.line,
        }))
    }

    /// Build the attribute item for the `has` call at `at`
    pub fn attribute(&self, at: usize) -> Result<Extraction<AttributeItem>, ExtractError> {
        let element = &self.elements[at];
        Ok(self.item_block(at)?.map(|block| AttributeItem {
            statement: element.text.clone(),
            description: block.description,
            line: element.line,
        }))
    }

    /// Build the modifier item for the modifier call at `at`
    pub fn modifier(&self, at: usize) -> Result<Extraction<ModifierItem>, ExtractError> {
        let element = &self.elements[at];
        Ok(self.item_block(at)?.map(|block| ModifierItem {
            statement: element.text.clone(),
            description: block.description,
            line: element.line,
        }))
    }

    /// Classify the `###` block in front of `at`, turning an ignore directive into a skip
    fn item_block(&self, at: usize) -> Result<Extraction<DocBlock>, ExtractError> {
        let block = classify(&self.preceding_doc(at), Marker::ItemDoc)?;
        if block.ignored {
            debug!(line = self.elements[at].line, "skipping ignored item");
            Ok(Extraction::Skip(SkipReason::Ignored))
        } else {
            Ok(Extraction::Found(block))
        }
    }

    /// Contiguous `##!` lines right after `at`, in source order
    fn following_doc(&self, at: usize) -> Vec<CommentLine<'e>> {
        self.elements[at + 1..]
            .iter()
            .take_while(|e| e.is_comment_with(Marker::PackageDoc))
            .filter_map(CommentLine::from_element)
            .collect()
    }

    /// Contiguous `###` lines right before `at`, restored to source order
    fn preceding_doc(&self, at: usize) -> Vec<CommentLine<'e>> {
        let mut lines: Vec<_> = self.elements[..at]
            .iter()
            .rev()
            .take_while(|e| e.is_comment_with(Marker::ItemDoc))
            .filter_map(CommentLine::from_element)
            .collect();
        lines.reverse();
        lines
    }
}

/// Whether a routine name is private: its last `::` segment starts with `_`
#[must_use]
pub fn is_private(name: &str) -> bool {
    name.rsplit(NAMESPACE_SEPARATOR)
        .next()
        .is_some_and(|last| last.starts_with(PRIVATE_PREFIX))
}

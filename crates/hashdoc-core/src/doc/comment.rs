//! Comment classification
//!
//! Turns a collected run of doc-comment lines into a [`DocBlock`]: the
//! description text, an optional fenced test body, and whether the block
//! opens with the ignore directive.
//!
//! ```text
//! ### Adds two numbers.
//! ###
//! ### ```perl
//! ### is(add(1, 2), 3);
//! ### ```
//! ```

use super::error::{ExtractError, MalformedReason};
use crate::syntax::{Element, Marker};

/// Prefix of module-level doc lines
pub const PACKAGE_DOC_MARKER: &str = "##!";

/// Prefix of item-level doc lines
pub const ITEM_DOC_MARKER: &str = "###";

/// First-line directive that drops an item (or, in a package block, the module)
pub const IGNORE_DIRECTIVE: &str = "#[ignore(item)]";

/// Test-body fence delimiter
pub const FENCE: &str = "```";

/// Prefix shared by every directive spelling, valid or not
const DIRECTIVE_PREFIX: &str = "#[ignore";

/// One raw comment line as it appears in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentLine<'a> {
    pub marker: Marker,
    /// Full line text including the marker
    pub raw: &'a str,
    /// 1-based source line
    pub line: usize,
}

impl<'a> CommentLine<'a> {
    /// View a comment element as a comment line; `None` for other elements
    #[must_use]
    pub fn from_element(element: &'a Element) -> Option<Self> {
        element.marker().map(|marker| Self {
            marker,
            raw: &element.text,
            line: element.line,
        })
    }
}

/// A classified comment block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    pub description: String,
    pub test: Option<String>,
    pub ignored: bool,
}

impl DocBlock {
    fn ignored() -> Self {
        Self {
            ignored: true,
            ..Self::default()
        }
    }
}

/// Strip `marker` and at most one following space from a raw line
///
/// Returns `None` when the line does not carry `marker`.
#[must_use]
pub fn strip_marker(raw: &str, marker: Marker) -> Option<&str> {
    let rest = raw.strip_prefix(marker.prefix()?)?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Classify a comment block expected to carry `expected` markers
///
/// Collection stops at the first line of another kind. The first fenced
/// region becomes the test body; a later fenced region stays in the
/// description verbatim. An opening fence without a closing fence is an
/// error, as is a first line that looks like a directive but is not the
/// ignore directive.
pub fn classify(lines: &[CommentLine<'_>], expected: Marker) -> Result<DocBlock, ExtractError> {
    let stripped: Vec<(usize, &str)> = lines
        .iter()
        .take_while(|l| l.marker == expected)
        .filter_map(|l| strip_marker(l.raw, expected).map(|text| (l.line, text)))
        .collect();

    let Some(&(first_line, first)) = stripped.first() else {
        return Ok(DocBlock::default());
    };

    let first = first.trim_end();
    if first == IGNORE_DIRECTIVE {
        return Ok(DocBlock::ignored());
    }
    if first.trim_start().starts_with(DIRECTIVE_PREFIX) {
        return Err(ExtractError::MalformedCommentBlock {
            line: first_line,
            reason: MalformedReason::UnknownDirective(first.trim().to_string()),
        });
    }

    let mut description = Vec::new();
    let mut test = Vec::new();
    let mut fence = FenceState::Before;

    for &(line, text) in &stripped {
        match fence {
            FenceState::Before if is_opening_fence(text) => fence = FenceState::Open(line),
            FenceState::Open(_) if text.trim_end() == FENCE => fence = FenceState::Closed,
            FenceState::Open(_) => test.push(text),
            FenceState::Before | FenceState::Closed => description.push(text),
        }
    }

    match fence {
        FenceState::Open(line) => Err(ExtractError::MalformedCommentBlock {
            line,
            reason: MalformedReason::UnterminatedFence,
        }),
        FenceState::Before => Ok(DocBlock {
            description: join_description(&description),
            test: None,
            ignored: false,
        }),
        FenceState::Closed => Ok(DocBlock {
            description: join_description(&description),
            test: Some(test.join("\n")),
            ignored: false,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    Before,
    /// Opened at the given line
    Open(usize),
    Closed,
}

/// "```" optionally followed by a language tag
fn is_opening_fence(text: &str) -> bool {
    text.trim_end().strip_prefix(FENCE).is_some_and(|tag| {
        tag.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
    })
}

/// Join lines, dropping leading and trailing blank lines
fn join_description(lines: &[&str]) -> String {
    let is_blank = |l: &&str| l.trim().is_empty();
    let start = lines.iter().position(|l| !is_blank(l)).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !is_blank(l)).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

//! Extracted documentation records

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Separator between package name segments
pub const NAMESPACE_SEPARATOR: &str = "::";

/// The module/package declaration and its trailing `##!` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageItem {
    /// Declaration signature, e.g. `package Foo::Bar 1.02`
    pub statement: String,
    pub description: String,
    pub line: usize,
}

impl PackageItem {
    /// Declared package name: the word after `package`
    #[must_use]
    pub fn name(&self) -> &str {
        self.statement.split_whitespace().nth(1).unwrap_or_default()
    }

    /// Package name split on `::`
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name()
            .split(NAMESPACE_SEPARATOR)
            .filter(|segment| !segment.is_empty())
    }
}

/// A documented `sub`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineItem {
    /// Declaration signature, e.g. `sub add ($x, $y)`
    pub statement: String,
    pub description: String,
    pub test: Option<String>,
    pub line: usize,
}

impl RoutineItem {
    /// First identifier-like token after the `sub` keyword
    #[must_use]
    pub fn name(&self) -> &str {
        let rest = self
            .statement
            .trim_start()
            .strip_prefix("sub")
            .unwrap_or(&self.statement)
            .trim_start();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// The non-empty test body, if any
    #[must_use]
    pub fn test_body(&self) -> Option<&str> {
        self.test.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// A documented `has` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeItem {
    pub statement: String,
    pub description: String,
    pub line: usize,
}

/// A documented method modifier (`before`, `after`, `around`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifierItem {
    pub statement: String,
    pub description: String,
    pub line: usize,
}

/// One documented item inside a module, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocItem {
    Routine(RoutineItem),
    Attribute(AttributeItem),
    Modifier(ModifierItem),
}

impl DocItem {
    #[must_use]
    pub fn statement(&self) -> &str {
        match self {
            Self::Routine(item) => &item.statement,
            Self::Attribute(item) => &item.statement,
            Self::Modifier(item) => &item.statement,
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Routine(item) => &item.description,
            Self::Attribute(item) => &item.description,
            Self::Modifier(item) => &item.description,
        }
    }

    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Routine(item) => item.line,
            Self::Attribute(item) => item.line,
            Self::Modifier(item) => item.line,
        }
    }

    /// Display name for the item kind
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Routine(_) => "Routine",
            Self::Attribute(_) => "Attribute",
            Self::Modifier(_) => "Modifier",
        }
    }
}

/// Whether a module uses the object-system extension
///
/// Decided once per file from its `use` statements. Only extended modules
/// carry attribute and modifier items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFlavor {
    #[default]
    Core,
    Extended,
}

impl ModuleFlavor {
    /// Pick the flavor from the modules a file imports
    pub fn detect<'a>(
        mut imports: impl Iterator<Item = &'a str>,
        extensions: &[String],
    ) -> Self {
        if imports.any(|module| extensions.iter().any(|ext| ext == module)) {
            Self::Extended
        } else {
            Self::Core
        }
    }

    #[must_use]
    pub fn is_extended(self) -> bool {
        self == Self::Extended
    }
}

/// Documentation for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub file_path: PathBuf,
    pub package_item: PackageItem,
    pub items: Vec<DocItem>,
    pub flavor: ModuleFlavor,
}

impl Module {
    /// Declared package name
    #[must_use]
    pub fn name(&self) -> &str {
        self.package_item.name()
    }

    pub fn routines(&self) -> impl Iterator<Item = &RoutineItem> {
        self.items.iter().filter_map(|item| match item {
            DocItem::Routine(routine) => Some(routine),
            _ => None,
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeItem> {
        self.items.iter().filter_map(|item| match item {
            DocItem::Attribute(attribute) => Some(attribute),
            _ => None,
        })
    }

    pub fn modifiers(&self) -> impl Iterator<Item = &ModifierItem> {
        self.items.iter().filter_map(|item| match item {
            DocItem::Modifier(modifier) => Some(modifier),
            _ => None,
        })
    }

    /// Directory to put on the include path so the package can be loaded
    ///
    /// For `lib/Foo/Bar.pm` declaring `Foo::Bar` this is `lib`. When the
    /// directory layout does not mirror the package name, the file's own
    /// directory is used.
    #[must_use]
    pub fn library_root(&self) -> PathBuf {
        let dir = match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => return PathBuf::from("."),
        };

        let segments: Vec<&str> = self.package_item.segments().collect();
        let parents = segments.len().saturating_sub(1);
        let mut root: &Path = dir;
        for segment in segments[..parents].iter().rev() {
            match (root.file_name(), root.parent()) {
                (Some(name), Some(parent)) if name == *segment => root = parent,
                _ => return dir.to_path_buf(),
            }
        }

        if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        }
    }
}

/// A plain Markdown document, passed through without classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub file_path: PathBuf,
    pub content: String,
}

impl Document {
    /// Read a document from disk
    pub fn load(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let file_path = path.into();
        let content = std::fs::read_to_string(&file_path)?;
        Ok(Self { file_path, content })
    }
}

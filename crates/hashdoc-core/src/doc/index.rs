//! Namespace index over a project's modules and documents
//!
//! Modules are placed by package name (`Foo::Bar` → `Foo` / `Bar`), documents
//! by their path relative to the project root with the extension removed
//! (`docs/guide.md` → `docs` / `guide`). A node may hold a leaf and children
//! at the same time, e.g. `Foo` next to `Foo::Bar`.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use tracing::warn;

use super::types::{Document, Module};

/// What sits at an index node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLeaf<'a> {
    Module(&'a Module),
    Document(&'a Document),
}

impl<'a> IndexLeaf<'a> {
    /// Source file behind the leaf
    pub fn file_path(&self) -> &'a Path {
        match *self {
            Self::Module(module) => &module.file_path,
            Self::Document(document) => &document.file_path,
        }
    }
}

/// One node of the namespace tree; children are kept in segment order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexNode<'a> {
    /// Path segment naming this node, empty for the root
    pub segment: String,
    pub children: BTreeMap<String, IndexNode<'a>>,
    pub leaf: Option<IndexLeaf<'a>>,
}

impl<'a> IndexNode<'a> {
    /// An empty root node
    pub fn root() -> Self {
        Self::default()
    }

    fn named(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    /// Build the index for a project rooted at `root`
    ///
    /// Modules are inserted before documents, each in slice order; an entry
    /// landing on an occupied node replaces the earlier one.
    pub fn build(root: &Path, modules: &'a [Module], documents: &'a [Document]) -> Self {
        let mut index = Self::root();
        for module in modules {
            let segments: Vec<&str> = module.package_item.segments().collect();
            index.insert_logged(&segments, IndexLeaf::Module(module));
        }
        for document in documents {
            let segments = document_segments(root, &document.file_path);
            let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
            index.insert_logged(&segments, IndexLeaf::Document(document));
        }
        index
    }

    fn insert_logged(&mut self, segments: &[&str], leaf: IndexLeaf<'a>) {
        if segments.is_empty() {
            warn!(path = %leaf.file_path().display(), "entry has no namespace path, not indexed");
            return;
        }
        if let Some(replaced) = self.insert(segments, leaf) {
            warn!(
                namespace = %segments.join("::"),
                replaced = %replaced.file_path().display(),
                by = %leaf.file_path().display(),
                "index collision, later entry wins"
            );
        }
    }

    /// Place `leaf` at `segments`, creating intermediate nodes
    ///
    /// Returns the leaf previously stored there, if any.
    pub fn insert(&mut self, segments: &[&str], leaf: IndexLeaf<'a>) -> Option<IndexLeaf<'a>> {
        let mut node = self;
        for segment in segments {
            node = node
                .children
                .entry((*segment).to_string())
                .or_insert_with(|| Self::named(segment));
        }
        node.leaf.replace(leaf)
    }

    /// Node at `segments`, if present
    pub fn get(&self, segments: &[&str]) -> Option<&Self> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.children.get(*segment))
    }

    pub fn is_empty(&self) -> bool {
        self.leaf.is_none() && self.children.is_empty()
    }

    /// Visit every descendant depth-first in segment order
    ///
    /// The callback receives the node's depth, starting at 0 for the root's
    /// children.
    pub fn walk(&self, visit: &mut impl FnMut(usize, &Self)) {
        self.walk_at(0, visit);
    }

    fn walk_at(&self, depth: usize, visit: &mut impl FnMut(usize, &Self)) {
        for child in self.children.values() {
            visit(depth, child);
            child.walk_at(depth + 1, visit);
        }
    }

    /// All leaves in walk order
    pub fn leaves(&self) -> Vec<IndexLeaf<'a>> {
        let mut leaves = Vec::new();
        self.walk(&mut |_, node| leaves.extend(node.leaf));
        leaves
    }
}

/// Namespace path of a document: relative path segments without the extension
pub fn document_segments(root: &Path, path: &Path) -> Vec<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let stem = relative.with_extension("");
    stem.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{ModuleFlavor, PackageItem};
    use std::path::PathBuf;

    fn module(path: &str, package: &str) -> Module {
        Module {
            file_path: PathBuf::from(path),
            package_item: PackageItem {
                statement: format!("package {package}"),
                description: String::new(),
                line: 1,
            },
            items: Vec::new(),
            flavor: ModuleFlavor::Core,
        }
    }

    fn document(path: &str) -> Document {
        Document {
            file_path: PathBuf::from(path),
            content: String::from("# Doc"),
        }
    }

    fn walked(index: &IndexNode<'_>) -> Vec<(usize, String, bool)> {
        let mut seen = Vec::new();
        index.walk(&mut |depth, node| {
            seen.push((depth, node.segment.clone(), node.leaf.is_some()));
        });
        seen
    }

    #[test]
    fn node_holds_leaf_and_children() {
        let modules = vec![module("lib/Foo/Bar.pm", "Foo::Bar"), module("lib/Foo.pm", "Foo")];
        let index = IndexNode::build(Path::new("."), &modules, &[]);

        let foo = index.get(&["Foo"]).unwrap();
        assert_eq!(foo.leaf, Some(IndexLeaf::Module(&modules[1])));
        assert_eq!(
            foo.children["Bar"].leaf,
            Some(IndexLeaf::Module(&modules[0]))
        );
    }

    #[test]
    fn children_are_ordered_by_segment() {
        let modules = vec![
            module("lib/Zed.pm", "Zed"),
            module("lib/Alpha/Two.pm", "Alpha::Two"),
            module("lib/Alpha/One.pm", "Alpha::One"),
        ];
        let index = IndexNode::build(Path::new("."), &modules, &[]);
        assert_eq!(
            walked(&index),
            vec![
                (0, "Alpha".to_string(), false),
                (1, "One".to_string(), true),
                (1, "Two".to_string(), true),
                (0, "Zed".to_string(), true),
            ]
        );
    }

    #[test]
    fn documents_use_relative_path_without_extension() {
        let documents = vec![document("/proj/docs/guide.md"), document("/proj/README.md")];
        let index = IndexNode::build(Path::new("/proj"), &[], &documents);
        assert_eq!(
            index.get(&["docs", "guide"]).unwrap().leaf,
            Some(IndexLeaf::Document(&documents[0]))
        );
        assert!(index.get(&["README"]).unwrap().leaf.is_some());
        assert!(index.get(&["proj"]).is_none());
    }

    #[test]
    fn later_entry_replaces_earlier() {
        let modules = vec![module("a/Foo.pm", "Foo"), module("b/Foo.pm", "Foo")];
        let index = IndexNode::build(Path::new("."), &modules, &[]);
        assert_eq!(index.leaves(), vec![IndexLeaf::Module(&modules[1])]);
    }

    #[test]
    fn insert_reports_replaced_leaf() {
        let first = module("a.pm", "A");
        let second = module("b.pm", "A");
        let mut index = IndexNode::root();
        assert_eq!(index.insert(&["A"], IndexLeaf::Module(&first)), None);
        assert_eq!(
            index.insert(&["A"], IndexLeaf::Module(&second)),
            Some(IndexLeaf::Module(&first))
        );
    }

    #[test]
    fn empty_index() {
        let index = IndexNode::build(Path::new("."), &[], &[]);
        assert!(index.is_empty());
        assert!(index.leaves().is_empty());
    }

    #[test]
    fn document_segment_paths() {
        assert_eq!(
            document_segments(Path::new("root"), Path::new("root/a/b.md")),
            vec!["a", "b"]
        );
        assert_eq!(
            document_segments(Path::new("elsewhere"), Path::new("notes.md")),
            vec!["notes"]
        );
    }
}

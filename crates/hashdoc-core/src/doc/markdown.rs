//! Markdown documentation generator

use std::fmt::{self, Write};
use std::path::{Path, PathBuf};

use super::index::{document_segments, IndexLeaf, IndexNode};
use super::types::{DocItem, Document, Module};

/// Code block language tag for statements and examples
const CODE_LANG: &str = "perl";

/// File name of the generated index page
pub const INDEX_PAGE: &str = "index.md";

/// Generates Markdown pages from extracted documentation
pub struct MarkdownGenerator;

impl MarkdownGenerator {
    /// Generate the page for one module
    pub fn module_page(module: &Module) -> String {
        let mut output = String::new();
        // writing into a String cannot fail
        let _ = Self::write_module(&mut output, module);
        output
    }

    /// Plain documents are emitted as-is
    pub fn document_page(document: &Document) -> String {
        document.content.clone()
    }

    /// Generate the index page as a nested list of links
    pub fn index_page(title: &str, index: &IndexNode<'_>, root: &Path) -> String {
        let mut output = String::new();
        let _ = Self::write_index(&mut output, title, index, root);
        output
    }

    /// Output path of a module page relative to the output directory
    ///
    /// `Foo::Bar` → `Foo/Bar.md`
    pub fn module_path(module: &Module) -> PathBuf {
        let mut path: PathBuf = module.package_item.segments().collect();
        path.set_extension("md");
        path
    }

    /// Output path of a document page: its path relative to `root`
    pub fn document_path(root: &Path, document: &Document) -> PathBuf {
        let mut path: PathBuf = document_segments(root, &document.file_path)
            .into_iter()
            .collect();
        path.set_extension("md");
        path
    }

    pub fn leaf_path(root: &Path, leaf: IndexLeaf<'_>) -> PathBuf {
        match leaf {
            IndexLeaf::Module(module) => Self::module_path(module),
            IndexLeaf::Document(document) => Self::document_path(root, document),
        }
    }

    fn write_module(output: &mut String, module: &Module) -> fmt::Result {
        writeln!(output, "# {}", module.name())?;
        writeln!(output)?;

        if !module.package_item.description.is_empty() {
            writeln!(output, "{}", module.package_item.description)?;
            writeln!(output)?;
        }

        if module.items.is_empty() {
            return Ok(());
        }

        writeln!(output, "## Contents")?;
        writeln!(output)?;
        for item in &module.items {
            let title = item_title(item);
            writeln!(output, "- [`{}`](#{})", title, anchor(item.kind_name(), &title))?;
        }
        writeln!(output)?;

        let sections: [(&str, Vec<&DocItem>); 3] = [
            (
                "Routines",
                module.items.iter().filter(|i| matches!(i, DocItem::Routine(_))).collect(),
            ),
            (
                "Attributes",
                module.items.iter().filter(|i| matches!(i, DocItem::Attribute(_))).collect(),
            ),
            (
                "Modifiers",
                module.items.iter().filter(|i| matches!(i, DocItem::Modifier(_))).collect(),
            ),
        ];

        for (heading, items) in sections {
            if items.is_empty() {
                continue;
            }
            writeln!(output, "## {}", heading)?;
            writeln!(output)?;
            for item in items {
                Self::write_item(output, item)?;
            }
        }

        Ok(())
    }

    fn write_item(output: &mut String, item: &DocItem) -> fmt::Result {
        let title = item_title(item);
        writeln!(
            output,
            "### <a id=\"{}\"></a>`{}`",
            anchor(item.kind_name(), &title),
            title
        )?;
        writeln!(output)?;

        writeln!(output, "```{}", CODE_LANG)?;
        writeln!(output, "{}", item.statement())?;
        writeln!(output, "```")?;
        writeln!(output)?;

        if !item.description().is_empty() {
            writeln!(output, "{}", item.description())?;
            writeln!(output)?;
        }

        if let DocItem::Routine(routine) = item {
            if let Some(test) = routine.test_body() {
                writeln!(output, "**Example:**")?;
                writeln!(output)?;
                writeln!(output, "```{}", CODE_LANG)?;
                writeln!(output, "{}", test)?;
                writeln!(output, "```")?;
                writeln!(output)?;
            }
        }

        writeln!(output, "---")?;
        writeln!(output)
    }

    fn write_index(
        output: &mut String,
        title: &str,
        index: &IndexNode<'_>,
        root: &Path,
    ) -> fmt::Result {
        writeln!(output, "# {}", title)?;
        writeln!(output)?;

        let mut result = Ok(());
        index.walk(&mut |depth, node| {
            if result.is_err() {
                return;
            }
            let indent = "  ".repeat(depth);
            result = match node.leaf {
                Some(leaf) => {
                    let link = Self::leaf_path(root, leaf);
                    writeln!(
                        output,
                        "{}- [{}]({})",
                        indent,
                        node.segment,
                        link_target(&link)
                    )
                }
                None => writeln!(output, "{}- {}", indent, node.segment),
            };
        });
        result
    }
}

/// Heading text for an item
///
/// Routines use their name, attributes the attribute name, modifiers the
/// full modifier signature.
fn item_title(item: &DocItem) -> String {
    match item {
        DocItem::Routine(routine) => routine.name().to_string(),
        DocItem::Attribute(attribute) => attribute
            .statement
            .split_whitespace()
            .nth(1)
            .map(|name| {
                name.trim_matches(|c: char| matches!(c, '\'' | '"' | '[' | ']' | '+' | ',' | '('))
            })
            .unwrap_or(attribute.statement.as_str())
            .to_string(),
        DocItem::Modifier(modifier) => modifier.statement.clone(),
    }
}

fn anchor(kind: &str, title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    format!("{}-{}", kind.to_lowercase(), slug)
}

/// Forward-slash link regardless of platform separator
fn link_target(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;
    use crate::doc::DocExtractor;

    fn extract(source: &str) -> Module {
        let config = ExtractConfig::default();
        DocExtractor::new(&config)
            .extract(Path::new("lib/Shape/Circle.pm"), source)
            .unwrap()
            .found()
            .unwrap()
    }

    #[test]
    fn module_page() {
        let module = extract(
            "package Shape::Circle;\n\
             ##! Circles.\n\
             use Moo;\n\
             ### Radius in cm.\n\
             has radius => (is => 'ro');\n\
             ### Area of the circle.\n\
             ### ```\n\
             ### is(Shape::Circle->new(radius => 1)->area, 3.14159);\n\
             ### ```\n\
             sub area { 3.14159 * $_[0]->radius ** 2 }\n\
             1;\n",
        );
        let page = MarkdownGenerator::module_page(&module);

        assert!(page.starts_with("# Shape::Circle\n\nCircles.\n"));
        assert!(page.contains("## Contents"));
        assert!(page.contains("- [`area`](#routine-area)"));
        assert!(page.contains("- [`radius`](#attribute-radius)"));
        assert!(page.contains("## Routines"));
        assert!(page.contains("## Attributes"));
        assert!(!page.contains("## Modifiers"));
        assert!(page.contains("```perl\nsub area\n```"));
        assert!(page.contains("Area of the circle."));
        assert!(page.contains("**Example:**"));
        assert!(page.contains("is(Shape::Circle->new(radius => 1)->area, 3.14159);"));
    }

    #[test]
    fn module_without_items() {
        let module = extract("package Empty;\n1;\n");
        assert_eq!(MarkdownGenerator::module_page(&module), "# Empty\n\n");
    }

    #[test]
    fn page_paths() {
        let module = extract("package Shape::Circle;\n");
        assert_eq!(
            MarkdownGenerator::module_path(&module),
            PathBuf::from("Shape/Circle.md")
        );

        let document = Document {
            file_path: PathBuf::from("proj/docs/guide.md"),
            content: String::from("# Guide\n"),
        };
        assert_eq!(
            MarkdownGenerator::document_path(Path::new("proj"), &document),
            PathBuf::from("docs/guide.md")
        );
        assert_eq!(MarkdownGenerator::document_page(&document), "# Guide\n");
    }

    #[test]
    fn index_page_nests_namespaces() {
        let modules = vec![
            extract("package Shape::Circle;\n"),
            extract("package Shape::Square;\n"),
        ];
        let documents = vec![Document {
            file_path: PathBuf::from("README.md"),
            content: String::new(),
        }];
        let index = IndexNode::build(Path::new("."), &modules, &documents);
        let page = MarkdownGenerator::index_page("Project", &index, Path::new("."));

        assert_eq!(
            page,
            "# Project\n\n\
             - [README](README.md)\n\
             - Shape\n\
             \x20 - [Circle](Shape/Circle.md)\n\
             \x20 - [Square](Shape/Square.md)\n"
        );
    }
}

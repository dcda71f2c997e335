//! Module extractor - walks the element stream and builds a [`Module`]

use std::path::Path;

use tracing::debug;

use super::error::{ExtractError, Extraction, SkipReason};
use super::item::ItemBuilder;
use super::types::{DocItem, Module, ModuleFlavor};
use crate::config::ExtractConfig;
use crate::syntax::{self, Element, ElementKind};

/// Extracts documentation from one source file at a time
pub struct DocExtractor<'c> {
    config: &'c ExtractConfig,
}

impl<'c> DocExtractor<'c> {
    pub fn new(config: &'c ExtractConfig) -> Self {
        Self { config }
    }

    /// Read and extract a source file
    pub fn extract_file(&self, path: &Path) -> Result<Extraction<Module>, ExtractError> {
        let source = std::fs::read_to_string(path)?;
        self.extract(path, &source)
    }

    /// Extract a module from source text
    pub fn extract(&self, path: &Path, source: &str) -> Result<Extraction<Module>, ExtractError> {
        self.extract_elements(path, &syntax::scan(source))
    }

    /// Extract a module from an already scanned element stream
    ///
    /// Fails when the stream has no package declaration or when any comment
    /// block is malformed; a malformed block anywhere aborts the whole file.
    /// An ignored package block skips the whole module.
    pub fn extract_elements(
        &self,
        path: &Path,
        elements: &[Element],
    ) -> Result<Extraction<Module>, ExtractError> {
        let package_at = elements
            .iter()
            .position(Element::is_package)
            .ok_or(ExtractError::MissingPackage)?;

        let builder = ItemBuilder::new(elements);
        let package_item = match builder.package(package_at)? {
            Extraction::Found(item) => item,
            Extraction::Skip(reason) => {
                debug!(path = %path.display(), %reason, "skipping module");
                return Ok(Extraction::Skip(reason));
            }
        };

        let flavor = ModuleFlavor::detect(
            elements.iter().filter_map(|e| match &e.kind {
                ElementKind::Include { module } => Some(module.as_str()),
                _ => None,
            }),
            &self.config.extensions,
        );

        let mut items = Vec::new();
        for (at, element) in elements.iter().enumerate() {
            let extraction = match element.kind {
                ElementKind::Routine { .. } => builder.routine(at)?.map(DocItem::Routine),
                ElementKind::Attribute if flavor.is_extended() => {
                    builder.attribute(at)?.map(DocItem::Attribute)
                }
                ElementKind::Modifier if flavor.is_extended() => {
                    builder.modifier(at)?.map(DocItem::Modifier)
                }
                _ => continue,
            };

            match extraction {
                Extraction::Found(item) => {
                    debug!(
                        kind = item.kind_name(),
                        statement = item.statement(),
                        line = item.line(),
                        "extracted item"
                    );
                    items.push(item);
                }
                Extraction::Skip(reason) => log_skip(element, reason),
            }
        }

        let module = Module {
            file_path: path.to_path_buf(),
            package_item,
            items,
            flavor,
        };
        debug!(
            package = module.name(),
            items = module.items.len(),
            ?flavor,
            "extracted module"
        );
        Ok(Extraction::Found(module))
    }
}

fn log_skip(element: &Element, reason: SkipReason) {
    debug!(statement = %element.text, line = element.line, %reason, "item omitted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::MalformedReason;
    use std::path::PathBuf;

    fn extract(source: &str) -> Result<Extraction<Module>, ExtractError> {
        let config = ExtractConfig::default();
        DocExtractor::new(&config).extract(Path::new("lib/X/Y.pm"), source)
    }

    fn module(source: &str) -> Module {
        extract(source).unwrap().found().expect("module extracted")
    }

    #[test]
    fn missing_package() {
        assert!(matches!(
            extract("sub f {}\n"),
            Err(ExtractError::MissingPackage)
        ));
        assert!(matches!(extract(""), Err(ExtractError::MissingPackage)));
    }

    #[test]
    fn documented_module() {
        let module = module(
            "package X::Y;\n\
             ##! Module docs.\n\
             \n\
             ### Frobs.\n\
             ### ```\n\
             ### ok(f());\n\
             ### ```\n\
             sub f { 1 }\n\
             \n\
             sub g { 2 }\n\
             sub _h { 3 }\n\
             1;\n",
        );
        assert_eq!(module.name(), "X::Y");
        assert_eq!(module.package_item.description, "Module docs.");
        assert_eq!(module.file_path, PathBuf::from("lib/X/Y.pm"));
        assert_eq!(module.flavor, ModuleFlavor::Core);

        let routines: Vec<_> = module.routines().collect();
        assert_eq!(routines.len(), 2);
        assert_eq!(routines[0].name(), "f");
        assert_eq!(routines[0].description, "Frobs.");
        assert_eq!(routines[0].test.as_deref(), Some("ok(f());"));
        assert_eq!(routines[1].name(), "g");
        assert!(routines[1].description.is_empty());
    }

    #[test]
    fn ignored_package_skips_module() {
        let result = extract("package X::Y;\n##! #[ignore(item)]\n##! Hidden.\nsub f {}\n");
        assert_eq!(result.unwrap(), Extraction::Skip(SkipReason::Ignored));
    }

    #[test]
    fn ignored_routine_is_omitted() {
        let module = module("package X;\n### #[ignore(item)]\n### Secret.\nsub f {}\nsub g {}\n");
        let names: Vec<_> = module.routines().map(|r| r.name()).collect();
        assert_eq!(names, vec!["g"]);
    }

    #[test]
    fn malformed_block_fails_whole_module() {
        let err = extract("package X;\nsub ok {}\n### ```\n### never closed\nsub f {}\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MalformedCommentBlock {
                line: 3,
                reason: MalformedReason::UnterminatedFence
            }
        ));
    }

    #[test]
    fn core_module_ignores_attributes() {
        let module = module("package X;\n### Name.\nhas name => (is => 'ro');\nsub f {}\n");
        assert_eq!(module.items.len(), 1);
        assert_eq!(module.attributes().count(), 0);
    }

    #[test]
    fn extended_module_interleaves_items() {
        let module = module(
            "package Counter;\n\
             use Moose;\n\
             ### Current count.\n\
             has count => (is => 'rw', default => 0);\n\
             ### Increments.\n\
             sub inc { $_[0]->count($_[0]->count + 1) }\n\
             ### Logs each increment.\n\
             after inc => sub { warn 'inc' };\n\
             sub _reset {}\n\
             1;\n",
        );
        assert_eq!(module.flavor, ModuleFlavor::Extended);
        let kinds: Vec<_> = module.items.iter().map(|i| i.kind_name()).collect();
        assert_eq!(kinds, vec!["Attribute", "Routine", "Modifier"]);
        assert_eq!(module.attributes().next().unwrap().description, "Current count.");
        assert_eq!(module.modifiers().next().unwrap().statement, "after inc");
    }

    #[test]
    fn extension_list_is_configurable() {
        let config = ExtractConfig {
            extensions: vec![String::from("My::OO")],
            ..ExtractConfig::default()
        };
        let source = "package X;\nuse My::OO;\nhas x => (is => 'ro');\n";
        let module = DocExtractor::new(&config)
            .extract(Path::new("X.pm"), source)
            .unwrap()
            .found()
            .unwrap();
        assert!(module.flavor.is_extended());
        assert_eq!(module.attributes().count(), 1);
    }

    #[test]
    fn extraction_is_idempotent() {
        let source = "package X;\n##! Doc.\n### F.\nsub f {}\n";
        assert_eq!(extract(source).unwrap(), extract(source).unwrap());
    }

    #[test]
    fn extract_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Foo.pm");
        std::fs::write(&path, "package Foo;\nsub bar {}\n1;\n").unwrap();

        let config = ExtractConfig::default();
        let extractor = DocExtractor::new(&config);
        let module = extractor.extract_file(&path).unwrap().found().unwrap();
        assert_eq!(module.name(), "Foo");

        let missing = extractor.extract_file(&dir.path().join("Nope.pm"));
        assert!(matches!(missing, Err(ExtractError::Io(_))));
    }
}

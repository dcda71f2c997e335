//! Project-wide documentation collection
//!
//! Runs the extractor over every source file of a project and loads every
//! plain document. A file that fails is recorded and left out; it never
//! stops the rest of the batch.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::error::{ExtractError, Extraction};
use super::extractor::DocExtractor;
use super::index::IndexNode;
use super::types::{Document, Module};
use crate::config::ExtractConfig;

/// A file excluded from the project because extraction failed
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ExtractError,
}

/// All modules and documents of one project
#[derive(Debug, Default)]
pub struct Project {
    pub root: PathBuf,
    /// Extracted modules, in input order
    pub modules: Vec<Module>,
    /// Plain documents, in input order
    pub documents: Vec<Document>,
    pub failures: Vec<FileFailure>,
    /// Files whose package block carries the ignore directive
    pub skipped: Vec<PathBuf>,
}

enum FileOutcome {
    Module(Module),
    Document(Document),
    Skipped,
    Failed(ExtractError),
    Unrecognized,
}

impl Project {
    /// Extract every file in `files`
    ///
    /// Files are classified by extension: source files become modules,
    /// document files are loaded verbatim, anything else is ignored.
    pub fn collect(root: impl Into<PathBuf>, files: &[PathBuf], config: &ExtractConfig) -> Self {
        let extractor = DocExtractor::new(config);
        let outcomes: Vec<(PathBuf, FileOutcome)> = files
            .par_iter()
            .map(|path| {
                let outcome = if config.is_source(path) {
                    from_extraction(extractor.extract_file(path))
                } else if config.is_document(path) {
                    match Document::load(path) {
                        Ok(document) => FileOutcome::Document(document),
                        Err(e) => FileOutcome::Failed(e.into()),
                    }
                } else {
                    FileOutcome::Unrecognized
                };
                (path.clone(), outcome)
            })
            .collect();

        Self::merge(root.into(), outcomes)
    }

    /// Build a project from in-memory `(path, contents)` pairs
    ///
    /// Classification follows [`Project::collect`]; nothing is read from disk.
    pub fn from_sources(
        root: impl Into<PathBuf>,
        sources: &[(PathBuf, String)],
        config: &ExtractConfig,
    ) -> Self {
        let extractor = DocExtractor::new(config);
        let outcomes: Vec<(PathBuf, FileOutcome)> = sources
            .par_iter()
            .map(|(path, content)| {
                let outcome = if config.is_source(path) {
                    from_extraction(extractor.extract(path, content))
                } else if config.is_document(path) {
                    FileOutcome::Document(Document {
                        file_path: path.clone(),
                        content: content.clone(),
                    })
                } else {
                    FileOutcome::Unrecognized
                };
                (path.clone(), outcome)
            })
            .collect();

        Self::merge(root.into(), outcomes)
    }

    fn merge(root: PathBuf, outcomes: Vec<(PathBuf, FileOutcome)>) -> Self {
        let mut project = Self {
            root,
            ..Self::default()
        };

        for (path, outcome) in outcomes {
            match outcome {
                FileOutcome::Module(module) => project.modules.push(module),
                FileOutcome::Document(document) => project.documents.push(document),
                FileOutcome::Skipped => {
                    debug!(path = %path.display(), "module ignored");
                    project.skipped.push(path);
                }
                FileOutcome::Failed(error) => {
                    warn!(path = %path.display(), %error, "skipping file");
                    project.failures.push(FileFailure { path, error });
                }
                FileOutcome::Unrecognized => {
                    debug!(path = %path.display(), "not a source or document file");
                }
            }
        }

        debug!(
            modules = project.modules.len(),
            documents = project.documents.len(),
            failures = project.failures.len(),
            skipped = project.skipped.len(),
            "collected project"
        );
        project
    }

    /// Namespace index over the project's modules and documents
    pub fn index(&self) -> IndexNode<'_> {
        IndexNode::build(&self.root, &self.modules, &self.documents)
    }

    /// Look up a module by package name
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.name() == name)
    }
}

fn from_extraction(result: Result<Extraction<Module>, ExtractError>) -> FileOutcome {
    match result {
        Ok(Extraction::Found(module)) => FileOutcome::Module(module),
        Ok(Extraction::Skip(_)) => FileOutcome::Skipped,
        Err(error) => FileOutcome::Failed(error),
    }
}

//! Test utilities for hashdoc
//!
//! Helpers shared by unit and integration tests: extracting a module from a
//! source string and laying out small project trees on disk.

use std::path::{Path, PathBuf};

use crate::config::ExtractConfig;
use crate::doc::{DocExtractor, Extraction, Module, SkipReason};

/// Result type for test helpers
pub type TestResult<T> = Result<T, String>;

/// Extract `source` as if read from `path`, with the default configuration
///
/// # Errors
/// Returns error if extraction fails
pub fn extract_outcome(path: &str, source: &str) -> TestResult<Extraction<Module>> {
    let config = ExtractConfig::default();
    DocExtractor::new(&config)
        .extract(Path::new(path), source)
        .map_err(|e| format!("Extract error: {e}"))
}

/// Extract `source` and expect a module
///
/// # Errors
/// Returns error if extraction fails or the module was skipped
pub fn extract_module(path: &str, source: &str) -> TestResult<Module> {
    match extract_outcome(path, source)? {
        Extraction::Found(module) => Ok(module),
        Extraction::Skip(reason) => Err(format!("Module skipped: {reason}")),
    }
}

/// Extract `source` and expect the module to be skipped
///
/// # Errors
/// Returns error if extraction fails or a module was produced
pub fn extract_skip(path: &str, source: &str) -> TestResult<SkipReason> {
    match extract_outcome(path, source)? {
        Extraction::Skip(reason) => Ok(reason),
        Extraction::Found(module) => Err(format!("Expected skip, got module {}", module.name())),
    }
}

/// Write `files` (relative path, contents) under `root`, creating directories
///
/// Returns the written paths in input order.
///
/// # Errors
/// Returns error if any directory or file cannot be written
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> TestResult<Vec<PathBuf>> {
    files
        .iter()
        .map(|(relative, contents)| -> TestResult<PathBuf> {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Cannot create {}: {e}", parent.display()))?;
            }
            std::fs::write(&path, contents)
                .map_err(|e| format!("Cannot write {}: {e}", path.display()))?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers() {
        assert_eq!(extract_module("A.pm", "package A;\n").unwrap().name(), "A");
        assert_eq!(
            extract_skip("A.pm", "package A;\n##! #[ignore(item)]\n").unwrap(),
            SkipReason::Ignored
        );
        assert!(extract_module("A.pm", "1;\n").is_err());

        let dir = tempfile::tempdir().unwrap();
        let paths = write_tree(dir.path(), &[("lib/A/B.pm", "package A::B;\n")]).unwrap();
        assert!(paths[0].is_file());
    }
}

//! Source and document discovery

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hashdoc_core::ExtractConfig;

/// Project root and the files to process under it
#[derive(Debug)]
pub struct Inputs {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Resolve a command's PATH argument
///
/// A single file is processed alone with its directory as the root; a
/// directory is searched recursively.
pub fn resolve(path: &Path, config: &ExtractConfig) -> Result<Inputs> {
    if path.is_file() {
        Ok(Inputs {
            root: project_root(path),
            files: vec![path.to_path_buf()],
        })
    } else if path.is_dir() {
        let files = collect_files(path, config)?;
        Ok(Inputs {
            root: path.to_path_buf(),
            files,
        })
    } else {
        bail!("Path '{}' does not exist", path.display());
    }
}

/// The directory a PATH argument is rooted at: the path itself, or a
/// file's parent directory
pub fn project_root(path: &Path) -> PathBuf {
    if path.is_file() {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    } else {
        path.to_path_buf()
    }
}

/// Drop every file that lives under `dir`
///
/// Paths are compared canonically. A `dir` that does not exist yet holds
/// nothing, so the list is left alone.
pub fn exclude_dir(files: &mut Vec<PathBuf>, dir: &Path) {
    let Ok(dir) = dir.canonicalize() else {
        return;
    };
    files.retain(|file| {
        file.canonicalize()
            .map_or(true, |file| !file.starts_with(&dir))
    });
}

/// Collect every source and document file under `dir`, sorted
///
/// Hidden directories and the configured exclude list are not descended into.
pub fn collect_files(dir: &Path, config: &ExtractConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(dir, config, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, config: &ExtractConfig, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read '{}'", dir.display()))?;

    for entry in entries {
        let path = entry?.path();

        if path.is_dir() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !name.starts_with('.') && !config.is_excluded_dir(name) {
                    walk(&path, config, files)?;
                }
            }
        } else if config.is_source(&path) || config.is_document(&path) {
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashdoc_core::testutil::write_tree;

    #[test]
    fn collects_sorted_and_skips_excluded() {
        let dir = tempfile::tempdir().unwrap();
        write_tree(
            dir.path(),
            &[
                ("lib/B.pm", "package B;\n"),
                ("lib/A.pm", "package A;\n"),
                ("bin/tool.pl", "package main;\n"),
                ("docs/guide.md", "# Guide\n"),
                ("blib/lib/A.pm", "package A;\n"),
                (".git/hooks/x.pl", "1;\n"),
                ("Makefile.PL.bak", "1;\n"),
                ("README", "x\n"),
            ],
        )
        .unwrap();

        let config = ExtractConfig::default();
        let files = collect_files(dir.path(), &config).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("bin/tool.pl"),
                PathBuf::from("docs/guide.md"),
                PathBuf::from("lib/A.pm"),
                PathBuf::from("lib/B.pm"),
            ]
        );
    }

    #[test]
    fn resolve_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_tree(dir.path(), &[("Foo.pm", "package Foo;\n")]).unwrap();

        let inputs = resolve(&paths[0], &ExtractConfig::default()).unwrap();
        assert_eq!(inputs.root, dir.path());
        assert_eq!(inputs.files, paths);
    }

    #[test]
    fn output_directory_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        write_tree(
            dir.path(),
            &[
                ("lib/A.pm", "package A;\n"),
                ("doc/A.md", "# A\n"),
                ("docs/guide.md", "# Guide\n"),
            ],
        )
        .unwrap();

        let mut files = collect_files(dir.path(), &ExtractConfig::default()).unwrap();
        assert_eq!(files.len(), 3);
        exclude_dir(&mut files, &dir.path().join("doc"));
        assert_eq!(
            files,
            vec![dir.path().join("docs/guide.md"), dir.path().join("lib/A.pm")]
        );

        exclude_dir(&mut files, &dir.path().join("not-created"));
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn resolve_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(&dir.path().join("nope"), &ExtractConfig::default()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}

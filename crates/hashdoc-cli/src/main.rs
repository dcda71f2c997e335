//! hashdoc CLI - documentation and embedded tests for Perl modules

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

use hashdoc_core::doc::{MarkdownGenerator, INDEX_PAGE};
use hashdoc_core::testing::TestStatus;
use hashdoc_core::{Config, Project, TestRunner};

mod files;
mod logging;

/// Output directory of `doc`, relative to the project root
const DEFAULT_OUTPUT_DIR: &str = "doc";

#[derive(Parser)]
#[command(name = "hashdoc")]
#[command(version = hashdoc_core::VERSION)]
#[command(about = "Documentation and embedded tests from ### comments", long_about = None)]
struct Cli {
    /// Configuration file (defaults to hashdoc.toml in the project root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Markdown documentation
    Doc {
        /// Path to a source file or project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output directory for generated documentation
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the tests embedded in doc comments
    Test {
        /// Path to a source file or project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only run modules whose package name contains this string
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Print the extracted records as JSON
    Dump {
        /// Path to a source file or project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match &cli.command {
        Commands::Doc { path, output } => {
            let config = load_config(cli.config.as_deref(), path)?;
            generate_documentation(path, output.clone(), &config)?;
        }
        Commands::Test { path, filter } => {
            let config = load_config(cli.config.as_deref(), path)?;
            run_tests(path, filter.clone(), &config)?;
        }
        Commands::Dump { path } => {
            let config = load_config(cli.config.as_deref(), path)?;
            dump(path, &config)?;
        }
    }

    Ok(())
}

/// Load the explicit config file, or `hashdoc.toml` from the project root
fn load_config(explicit: Option<&Path>, path: &Path) -> Result<Config> {
    if let Some(file) = explicit {
        return Config::from_path(file)
            .with_context(|| format!("Failed to load config '{}'", file.display()));
    }

    let root = files::project_root(path);
    Config::load(&root).with_context(|| format!("Failed to load config from '{}'", root.display()))
}

/// Extract the project at `path`, leaving out anything under `skip_dir`
fn collect_project(path: &Path, config: &Config, skip_dir: Option<&Path>) -> Result<Project> {
    let mut inputs = files::resolve(path, &config.extract)?;
    if let Some(dir) = skip_dir {
        files::exclude_dir(&mut inputs.files, dir);
    }
    if inputs.files.is_empty() {
        bail!("No source or document files found in '{}'", path.display());
    }

    debug!(root = %inputs.root.display(), files = inputs.files.len(), "discovered files");
    Ok(Project::collect(inputs.root, &inputs.files, &config.extract))
}

/// Generate one Markdown page per module and document, plus an index
fn generate_documentation(path: &Path, output: Option<PathBuf>, config: &Config) -> Result<()> {
    // earlier output under the project root must not be read back in
    let output_dir =
        output.unwrap_or_else(|| files::project_root(path).join(DEFAULT_OUTPUT_DIR));
    let project = collect_project(path, config, Some(&output_dir))?;

    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            output_dir.display()
        )
    })?;

    let mut generated = 0usize;
    let pages = project
        .modules
        .iter()
        .map(|m| (MarkdownGenerator::module_path(m), MarkdownGenerator::module_page(m)))
        .chain(project.documents.iter().map(|d| {
            (
                MarkdownGenerator::document_path(&project.root, d),
                MarkdownGenerator::document_page(d),
            )
        }));

    for (relative, content) in pages {
        let output_file = output_dir.join(relative);
        if let Some(parent) = output_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create '{}'", parent.display()))?;
        }
        std::fs::write(&output_file, content)
            .with_context(|| format!("Failed to write '{}'", output_file.display()))?;
        println!("Generated: {}", output_file.display());
        generated += 1;
    }

    if generated == 0 {
        bail!("No documentation was generated");
    }

    let title = project
        .root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| String::from("Documentation"));
    let index_file = output_dir.join(INDEX_PAGE);
    let index = project.index();
    std::fs::write(
        &index_file,
        MarkdownGenerator::index_page(&title, &index, &project.root),
    )
    .with_context(|| format!("Failed to write index '{}'", index_file.display()))?;
    println!("Generated: {}", index_file.display());

    println!("\nDocumentation generated in: {}", output_dir.display());
    Ok(())
}

/// Run every module's embedded tests; fails if any module failed or errored
fn run_tests(path: &Path, filter: Option<String>, config: &Config) -> Result<()> {
    let project = collect_project(path, config, None)?;
    let runner = TestRunner::new(&config.test).with_filter(filter);
    let summary = runner.run_all(&project.modules);

    if summary.outcomes.is_empty() && summary.errors.is_empty() {
        println!("No embedded tests found");
        return Ok(());
    }

    for outcome in &summary.outcomes {
        let duration_ms = outcome.duration.as_secs_f64() * 1000.0;
        match outcome.status {
            TestStatus::Passed => println!(
                "  PASS {} ({} subtests) [{:.2}ms]",
                outcome.package, outcome.subtests, duration_ms
            ),
            TestStatus::Failed(Some(code)) => println!(
                "  FAIL {} (exit code {}) [{:.2}ms]",
                outcome.package, code, duration_ms
            ),
            TestStatus::Failed(None) => println!(
                "  FAIL {} (terminated by signal) [{:.2}ms]",
                outcome.package, duration_ms
            ),
        }
    }
    for error in &summary.errors {
        println!("  ERROR {}: {}", error.package, error.error);
    }

    println!();
    println!(
        "Test result: {} passed, {} failed, {} errors, {} without tests (in {:.2}ms)",
        summary.passed(),
        summary.failed(),
        summary.errors.len(),
        summary.untested,
        summary.duration.as_secs_f64() * 1000.0
    );

    if summary.all_passed() {
        Ok(())
    } else {
        bail!("Some tests failed")
    }
}

/// Print extracted modules, documents and failures as JSON
fn dump(path: &Path, config: &Config) -> Result<()> {
    let project = collect_project(path, config, None)?;
    let failures: Vec<_> = project
        .failures
        .iter()
        .map(|f| {
            serde_json::json!({
                "path": f.path,
                "error": f.error.to_string(),
            })
        })
        .collect();

    let json = serde_json::json!({
        "modules": project.modules,
        "documents": project.documents,
        "skipped": project.skipped,
        "failures": failures,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

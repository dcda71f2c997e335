//! Embedded test synthesis and execution
//!
//! Every routine whose doc block carries a fenced test body contributes one
//! `subtest` to a per-module script. The script is written to a temporary
//! `.t` file and handed to an external runner (`prove` by default) with the
//! module's library root on its include path.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{TestConfig, LIB_PLACEHOLDER, SCRIPT_PLACEHOLDER};
use crate::doc::Module;

/// How often a running test process is checked for completion
const POLL_INTERVAL: Duration = Duration::from_millis(20);

const SCRIPT_PREFIX: &str = "hashdoc-";
const SCRIPT_SUFFIX: &str = ".t";

/// Errors that stop a module's tests from producing an exit status
#[derive(Error, Debug)]
pub enum TestError {
    #[error("test runner `{program}` could not be started: {source}")]
    RunnerUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("test run did not finish within {after:?}")]
    Timeout { after: Duration },

    #[error("I/O error while running tests: {0}")]
    Io(#[from] io::Error),
}

/// A synthesized test script for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestScript {
    /// Package the script loads
    pub package: String,
    /// Full script text
    pub source: String,
    /// Sub-test names in script order
    pub subtests: Vec<String>,
    /// Names whose earlier test body was replaced by a later routine's
    pub overwritten: Vec<String>,
}

impl TestScript {
    /// Compose the test script for `module`
    ///
    /// Returns `None` when no routine carries a non-empty test body.
    /// Sub-tests are keyed by routine name; when two routines share a name
    /// the later body wins.
    pub fn synthesize(module: &Module) -> Option<Self> {
        let mut bodies: BTreeMap<&str, &str> = BTreeMap::new();
        let mut overwritten = Vec::new();

        for routine in module.routines() {
            let Some(body) = routine.test_body() else {
                continue;
            };
            let name = routine.name();
            if bodies.insert(name, body).is_some() {
                warn!(
                    package = module.name(),
                    routine = name,
                    line = routine.line,
                    "duplicate test name, earlier test replaced"
                );
                overwritten.push(name.to_string());
            }
        }

        if bodies.is_empty() {
            return None;
        }

        let package = module.name().to_string();
        let mut source = String::new();
        source.push_str("use strict;\nuse warnings;\nuse Test::More;\n");
        source.push_str(&format!("use {package};\n"));
        for (name, body) in &bodies {
            source.push_str(&format!(
                "\nsubtest '{}' => sub {{\n{}\n}};\n",
                quote(name),
                body.trim_end_matches('\n')
            ));
        }
        source.push_str("\ndone_testing();\n");

        Some(Self {
            package,
            source,
            subtests: bodies.keys().map(|name| (*name).to_string()).collect(),
            overwritten,
        })
    }
}

/// Escape a name for a single-quoted Perl string
fn quote(name: &str) -> String {
    name.replace('\\', "\\\\").replace('\'', "\\'")
}

/// How a runner invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    /// Non-zero exit; `None` when the runner was killed by a signal
    Failed(Option<i32>),
}

impl From<ExitStatus> for TestStatus {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            Self::Passed
        } else {
            Self::Failed(status.code())
        }
    }
}

/// Result of running one module's tests
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub package: String,
    pub file_path: PathBuf,
    pub subtests: usize,
    pub status: TestStatus,
    pub duration: Duration,
}

impl TestOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// A module whose tests could not be run to completion
#[derive(Debug)]
pub struct ModuleTestError {
    pub package: String,
    pub file_path: PathBuf,
    pub error: TestError,
}

/// Outcomes across every module of a run
#[derive(Debug, Default)]
pub struct TestSummary {
    pub outcomes: Vec<TestOutcome>,
    pub errors: Vec<ModuleTestError>,
    /// Modules without any test body
    pub untested: usize,
    pub duration: Duration,
}

impl TestSummary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outcome: TestOutcome) {
        self.duration += outcome.duration;
        self.outcomes.push(outcome);
    }

    pub fn add_error(&mut self, error: ModuleTestError) {
        self.errors.push(error);
    }

    /// Number of modules whose runner exited successfully
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of modules whose runner exited with a failure
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// True only when no module failed and no module errored
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0 && self.errors.is_empty()
    }
}

/// Runs synthesized test scripts through the configured external runner
pub struct TestRunner<'c> {
    config: &'c TestConfig,
    /// Only run modules whose package name contains this pattern
    filter: Option<String>,
}

impl<'c> TestRunner<'c> {
    #[must_use]
    pub fn new(config: &'c TestConfig) -> Self {
        Self {
            config,
            filter: None,
        }
    }

    /// Set a filter pattern for package names
    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    fn matches(&self, module: &Module) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |pattern| module.name().contains(pattern))
    }

    /// Run every module's tests in order, never stopping at a failure
    pub fn run_all(&self, modules: &[Module]) -> TestSummary {
        let mut summary = TestSummary::new();
        for module in modules.iter().filter(|m| self.matches(m)) {
            match self.run_module(module) {
                Ok(Some(outcome)) => {
                    if !outcome.passed() {
                        warn!(package = %outcome.package, status = ?outcome.status, "tests failed");
                    }
                    summary.add(outcome);
                }
                Ok(None) => summary.untested += 1,
                Err(error) => {
                    warn!(package = module.name(), %error, "tests could not be run");
                    summary.add_error(ModuleTestError {
                        package: module.name().to_string(),
                        file_path: module.file_path.clone(),
                        error,
                    });
                }
            }
        }
        summary
    }

    /// Synthesize and run one module's tests
    ///
    /// Returns `Ok(None)` without spawning anything when the module has no
    /// test bodies.
    pub fn run_module(&self, module: &Module) -> Result<Option<TestOutcome>, TestError> {
        let Some(script) = TestScript::synthesize(module) else {
            debug!(package = module.name(), "no embedded tests");
            return Ok(None);
        };

        let start = Instant::now();
        let status = self.run_script(&script, &module.library_root())?;
        let outcome = TestOutcome {
            package: script.package,
            file_path: module.file_path.clone(),
            subtests: script.subtests.len(),
            status: status.into(),
            duration: start.elapsed(),
        };
        info!(
            package = %outcome.package,
            subtests = outcome.subtests,
            passed = outcome.passed(),
            "ran embedded tests"
        );
        Ok(Some(outcome))
    }

    /// Write `script` to a temporary file and run it with `lib` on the include path
    ///
    /// The temporary file is removed when this returns, whatever the outcome.
    pub fn run_script(&self, script: &TestScript, lib: &Path) -> Result<ExitStatus, TestError> {
        let mut file = tempfile::Builder::new()
            .prefix(SCRIPT_PREFIX)
            .suffix(SCRIPT_SUFFIX)
            .tempfile()?;
        file.write_all(script.source.as_bytes())?;
        file.flush()?;

        let command = self.command_line(lib, file.path());
        let Some((program, args)) = command.split_first() else {
            return Err(TestError::RunnerUnavailable {
                program: String::new(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty test command"),
            });
        };

        debug!(program = %program, ?args, "spawning test runner");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| TestError::RunnerUnavailable {
                program: program.clone(),
                source,
            })?;

        wait(&mut child, self.config.timeout())
    }

    /// The configured command with placeholders filled in
    fn command_line(&self, lib: &Path, script: &Path) -> Vec<String> {
        let lib = lib.to_string_lossy();
        let script = script.to_string_lossy();
        self.config
            .command
            .iter()
            .map(|arg| {
                arg.replace(LIB_PLACEHOLDER, &lib)
                    .replace(SCRIPT_PLACEHOLDER, &script)
            })
            .collect()
    }
}

/// Wait for `child`, killing it once `timeout` has passed
fn wait(child: &mut Child, timeout: Option<Duration>) -> Result<ExitStatus, TestError> {
    let Some(timeout) = timeout else {
        return Ok(child.wait()?);
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= timeout {
            // the child may exit between try_wait and kill
            let _ = child.kill();
            let _ = child.wait();
            return Err(TestError::Timeout { after: timeout });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

//! Integration tests for test synthesis and the external runner
//!
//! The runner tests use `sh` in place of `prove` and are unix-only.

use std::path::PathBuf;

use hashdoc_core::testing::{TestError, TestScript, TestStatus};
use hashdoc_core::testutil::extract_module;
use hashdoc_core::{TestConfig, TestRunner};

const WITH_TESTS: &str = "\
package X::Y;

### ```
### is(X::Y::f(), 1);
### ```
sub f { 1 }

1;
";

const WITHOUT_TESTS: &str = "package X::Y;\n### Only words.\nsub f { 1 }\n1;\n";

fn config(command: &[&str], timeout_secs: u64) -> TestConfig {
    TestConfig {
        command: command.iter().map(|s| (*s).to_string()).collect(),
        timeout_secs,
    }
}

#[test]
fn test_scenario_c_no_tests_no_process() {
    let module = extract_module("lib/X/Y.pm", WITHOUT_TESTS).unwrap();
    assert!(TestScript::synthesize(&module).is_none());

    // a runner that cannot start proves nothing was spawned
    let config = config(&["/nonexistent/hashdoc-runner", "{script}"], 5);
    let outcome = TestRunner::new(&config).run_module(&module).unwrap();
    assert!(outcome.is_none());

    let summary = TestRunner::new(&config).run_all(std::slice::from_ref(&module));
    assert_eq!(summary.untested, 1);
    assert!(summary.all_passed());
}

#[test]
fn test_script_loads_the_package() {
    let module = extract_module("lib/X/Y.pm", WITH_TESTS).unwrap();
    let script = TestScript::synthesize(&module).unwrap();
    assert!(script.source.starts_with("use strict;\nuse warnings;\nuse Test::More;\nuse X::Y;\n"));
    assert!(script.source.contains("subtest 'f' => sub {\nis(X::Y::f(), 1);\n};"));
    assert!(script.source.ends_with("done_testing();\n"));
}

#[test]
fn test_missing_runner_is_reported() {
    let module = extract_module("lib/X/Y.pm", WITH_TESTS).unwrap();
    let config = config(&["/nonexistent/hashdoc-runner", "{script}"], 5);

    let err = TestRunner::new(&config).run_module(&module).unwrap_err();
    assert!(matches!(err, TestError::RunnerUnavailable { ref program, .. } if program == "/nonexistent/hashdoc-runner"));

    let summary = TestRunner::new(&config).run_all(&[module]);
    assert_eq!(summary.errors.len(), 1);
    assert!(!summary.all_passed());
}

#[test]
fn test_script_is_removed_when_runner_fails_to_start() {
    let module = extract_module("lib/X/Y.pm", WITH_TESTS).unwrap();
    // the script path lands in the program name, and so in the error
    let config = config(&["/nonexistent/{script}"], 5);

    let program = match TestRunner::new(&config).run_module(&module).unwrap_err() {
        TestError::RunnerUnavailable { program, .. } => program,
        other => panic!("unexpected error: {other}"),
    };
    let script = PathBuf::from(program.strip_prefix("/nonexistent/").unwrap());
    assert!(script.to_string_lossy().ends_with(".t"));
    assert!(!script.exists());
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_status_is_passed_through() {
        let module = extract_module("lib/X/Y.pm", WITH_TESTS).unwrap();

        let passing = config(&["sh", "-c", "exit 0", "{script}"], 30);
        let outcome = TestRunner::new(&passing).run_module(&module).unwrap().unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.subtests, 1);

        let failing = config(&["sh", "-c", "exit 3", "{script}"], 30);
        let outcome = TestRunner::new(&failing).run_module(&module).unwrap().unwrap();
        assert_eq!(outcome.status, TestStatus::Failed(Some(3)));
    }

    #[test]
    fn test_runner_sees_script_and_lib() {
        let module = extract_module("lib/X/Y.pm", WITH_TESTS).unwrap();
        let config = config(
            &[
                "sh",
                "-c",
                r#"test "$1" = lib && grep -q "^use X::Y;" "$0" && grep -q "^done_testing();" "$0""#,
                "{script}",
                "{lib}",
            ],
            30,
        );
        let outcome = TestRunner::new(&config).run_module(&module).unwrap().unwrap();
        assert!(outcome.passed(), "status: {:?}", outcome.status);
    }

    #[test]
    fn test_temporary_script_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("script-path");
        let record_arg = record.to_string_lossy().into_owned();

        let module = extract_module("lib/X/Y.pm", WITH_TESTS).unwrap();
        let config = config(
            &["sh", "-c", r#"printf %s "$0" > "$1"; exit 1"#, "{script}", record_arg.as_str()],
            30,
        );
        let outcome = TestRunner::new(&config).run_module(&module).unwrap().unwrap();
        assert!(!outcome.passed());

        let script = PathBuf::from(std::fs::read_to_string(&record).unwrap());
        assert!(script.to_string_lossy().ends_with(".t"));
        assert!(!script.exists());
    }

    #[test]
    fn test_timeout_kills_runner() {
        let module = extract_module("lib/X/Y.pm", WITH_TESTS).unwrap();
        let config = config(&["sh", "-c", "sleep 30", "{script}"], 1);

        let err = TestRunner::new(&config).run_module(&module).unwrap_err();
        assert!(matches!(err, TestError::Timeout { .. }));
    }

    #[test]
    fn test_any_failure_fails_the_run() {
        let passing = extract_module("lib/A.pm", "package A;\n### ```\n### ok(1);\n### ```\nsub a {}\n")
            .unwrap();
        let failing = extract_module("lib/B.pm", "package B;\n### ```\n### FAIL\n### ```\nsub b {}\n")
            .unwrap();
        let config = config(&["sh", "-c", r#"! grep -q FAIL "$0""#, "{script}"], 30);

        // failing module first: later passes must not mask it
        let summary = TestRunner::new(&config).run_all(&[failing, passing]);
        assert_eq!(summary.outcomes.len(), 2);
        assert_eq!(summary.passed(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.all_passed());
    }
}

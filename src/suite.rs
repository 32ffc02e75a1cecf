//! Parallel pass/fail runner for the correctness-test battery.
//!
//! Every discovered test executable runs to completion with a fixed argument
//! list; the aggregate verdict is the AND over all exit statuses. Unlike the
//! comparison harness there is no sweep, no timing, and no pinning.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rayon::prelude::*;
use tracing::debug;

use crate::error::{HarnessError, Result};

/// Valgrind invocation used when memory checking is requested.
const VALGRIND_ARGS: &[&str] = &[
    "--leak-check=full",
    "--show-reachable=yes",
    "--track-origins=yes",
    "--error-exitcode=1",
    "--exit-on-first-error=yes",
];

#[derive(Clone, Debug)]
pub struct SuiteConfig {
    /// Arguments passed to every test executable.
    pub args: Vec<String>,
    /// Wrap each test in valgrind.
    pub valgrind: bool,
    /// Discard test output instead of inheriting the harness's streams.
    pub quiet: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            args: vec!["10".into(), "10".into()],
            valgrind: false,
            quiet: false,
        }
    }
}

/// Outcome of one test executable.
#[derive(Clone, Debug)]
pub struct TestOutcome {
    pub exe: PathBuf,
    pub passed: bool,
}

fn test_command(exe: &Path, cfg: &SuiteConfig) -> Command {
    let mut cmd = if cfg.valgrind {
        let mut cmd = Command::new("valgrind");
        cmd.args(VALGRIND_ARGS).arg(exe);
        cmd
    } else {
        Command::new(exe)
    };
    cmd.args(&cfg.args);
    if cfg.quiet {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }
    cmd
}

fn run_one(exe: &Path, cfg: &SuiteConfig) -> Result<TestOutcome> {
    let status = test_command(exe, cfg)
        .status()
        .map_err(|source| HarnessError::Spawn {
            exe: exe.to_path_buf(),
            source,
        })?;
    debug!(exe = %exe.display(), ?status, "test finished");
    Ok(TestOutcome {
        exe: exe.to_path_buf(),
        passed: status.success(),
    })
}

/// Run every test in parallel. Outcomes keep the submission order of `tests`.
pub fn run_suite(tests: &[PathBuf], cfg: &SuiteConfig) -> Result<Vec<TestOutcome>> {
    tests.par_iter().map(|exe| run_one(exe, cfg)).collect()
}

/// Aggregate verdict over a finished suite.
pub fn verdict(outcomes: &[TestOutcome]) -> bool {
    outcomes.iter().all(|outcome| outcome.passed)
}

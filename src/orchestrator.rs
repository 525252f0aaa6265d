//! Drives one full pass over the catalog.

use anyhow::Result;
use std::io::Write;
use std::time::Duration;

use crate::catalog::TestCase;
use crate::compare::{compare, Comparison};
use crate::fixtures::{Category, FixtureStore};
use crate::process::{self, Subject};
use crate::report;
use crate::verbose;

/// Outcome of one case.
#[derive(Clone, Debug)]
pub struct CaseResult {
    pub name: String,
    pub category: Category,
    pub exit_code: i32,
    pub exit: String,
    pub stdout: Comparison,
    pub stderr: Comparison,
    /// Set when the subject had to be killed.
    pub timed_out: Option<Duration>,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        self.timed_out.is_none() && self.stdout.is_equal() && self.stderr.is_equal()
    }

    /// Everything a reader needs to diagnose a failure, `None` on a pass.
    /// Only the failing streams are listed.
    pub fn detail(&self) -> Option<String> {
        if self.passed() {
            return None;
        }
        let mut parts = Vec::new();
        if let Some(limit) = self.timed_out {
            parts.push(format!("subject did not terminate within {limit:?}"));
        }
        if let Some(d) = self.stdout.detail() {
            parts.push("Output file compare failed: here are the details:".to_string());
            parts.push(report::indented("output compare", d));
        }
        if let Some(d) = self.stderr.detail() {
            parts.push("Errors file compare failed: here are the details:".to_string());
            parts.push(report::indented("errors compare", d));
        }
        Some(parts.join("\n"))
    }
}

#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub cases: Vec<CaseResult>,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|c| !c.passed())
    }

    fn record(&mut self, result: CaseResult) {
        self.total += 1;
        if result.passed() {
            self.passed += 1;
        }
        self.cases.push(result);
    }
}

pub struct Orchestrator<'a> {
    subject: &'a Subject,
    store: &'a FixtureStore,
    timeout: Option<Duration>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(subject: &'a Subject, store: &'a FixtureStore, timeout: Option<Duration>) -> Self {
        Self {
            subject,
            store,
            timeout,
        }
    }

    /// Runs every case in order. Failing cases never stop the pass; only
    /// environment errors (spawn failure, missing fixtures, I/O) do.
    pub fn run_all<W: Write>(&self, cases: &[TestCase], out: &mut W) -> Result<RunSummary> {
        self.store.prepare()?;
        self.store.verify(cases)?;

        report::start(out, cases.len())?;
        let mut summary = RunSummary::default();
        let mut section = None;
        for case in cases {
            if section != Some(case.category) {
                report::section(out, case.category)?;
                section = Some(case.category);
            }
            let result = self.run_one(case, out)?;
            report::case(out, &result)?;
            summary.record(result);
        }
        report::summary(out, &summary)?;
        Ok(summary)
    }

    pub fn run_one<W: Write>(&self, case: &TestCase, out: &mut W) -> Result<CaseResult> {
        writeln!(out, "starting {} ..", case.name)?;
        if verbose() {
            writeln!(
                out,
                "[RUN ] {} {:?}",
                case.name,
                self.subject.argv(&case.invocation.args)
            )?;
        }
        out.flush()?;

        let execution = process::run(
            self.subject,
            &case.invocation.args,
            case.invocation.stdin.as_bytes(),
            self.timeout,
        )?;
        let (output_path, errors_path) = self.store.persist(&case.name, &execution)?;
        let stdout = compare(case.expected_stdout.path(), &output_path)?;
        let stderr = compare(case.expected_stderr.path(), &errors_path)?;

        Ok(CaseResult {
            name: case.name.clone(),
            category: case.category,
            exit_code: execution.exit_code,
            exit: execution.describe_exit(),
            stdout,
            stderr,
            timed_out: if execution.timed_out {
                self.timeout
            } else {
                None
            },
        })
    }
}

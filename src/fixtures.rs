//! Naming and layout of expected fixtures and persisted actual output.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::TestCase;
use crate::config::{Config, Layout, Stream};
use crate::process::Execution;

const USER_OUTPUT_SUFFIX: &str = "_user_output.txt";
const USER_ERRORS_SUFFIX: &str = "_user_errors.txt";
const SOLUTION_OUTPUT_SUFFIX: &str = "_school_solution_output.txt";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    BadArgCount,
    InvalidInput,
    ValidInput,
}

impl Category {
    pub fn title(self) -> &'static str {
        match self {
            Category::BadArgCount => "Invalid number of parameters",
            Category::InvalidInput => "Checking invalid file",
            Category::ValidInput => "Checking good file",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::BadArgCount => "bad-arg-count",
            Category::InvalidInput => "invalid-input",
            Category::ValidInput => "valid-input",
        })
    }
}

/// A read-only reference file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FixtureRef {
    /// Nothing expected on the stream.
    Empty(PathBuf),
    Usage(PathBuf),
    Invalid(PathBuf),
    /// Dedicated expected output of one good input file.
    Solution(PathBuf),
}

impl FixtureRef {
    pub fn path(&self) -> &Path {
        match self {
            FixtureRef::Empty(p)
            | FixtureRef::Usage(p)
            | FixtureRef::Invalid(p)
            | FixtureRef::Solution(p) => p,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FixtureStore {
    layout: Layout,
    usage_stream: Stream,
}

impl FixtureStore {
    pub fn new(config: &Config) -> Self {
        Self {
            layout: config.layout.clone(),
            usage_stream: config.usage_stream,
        }
    }

    pub fn actual_output_path(&self, name: &str) -> PathBuf {
        self.layout
            .actual_dir()
            .join(format!("{name}{USER_OUTPUT_SUFFIX}"))
    }

    pub fn actual_error_path(&self, name: &str) -> PathBuf {
        self.layout
            .actual_dir()
            .join(format!("{name}{USER_ERRORS_SUFFIX}"))
    }

    pub fn expected_output_ref(&self, category: Category, name: &str) -> FixtureRef {
        self.expected_refs(category, name).0
    }

    pub fn expected_error_ref(&self, category: Category, name: &str) -> FixtureRef {
        self.expected_refs(category, name).1
    }

    /// `(stdout, stderr)` fixtures for a case. Pure path construction.
    pub fn expected_refs(&self, category: Category, name: &str) -> (FixtureRef, FixtureRef) {
        let dir = self.layout.expected_dir();
        let empty = FixtureRef::Empty(dir.join(&self.layout.empty_fixture));
        match category {
            Category::BadArgCount => {
                let usage = FixtureRef::Usage(dir.join(&self.layout.usage_fixture));
                match self.usage_stream {
                    Stream::Stdout => (usage, empty),
                    Stream::Stderr => (empty, usage),
                }
            }
            Category::InvalidInput => (
                empty,
                FixtureRef::Invalid(dir.join(&self.layout.invalid_fixture)),
            ),
            Category::ValidInput => (
                FixtureRef::Solution(dir.join(format!("{name}{SOLUTION_OUTPUT_SUFFIX}"))),
                empty,
            ),
        }
    }

    /// Creates the actual-output directory if needed.
    pub fn prepare(&self) -> Result<()> {
        let dir = self.layout.actual_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating output directory {}", dir.display()))
    }

    /// Preflight: every input directory and every fixture the cases refer
    /// to must exist before anything runs.
    pub fn verify(&self, cases: &[TestCase]) -> Result<()> {
        for dir in [
            self.layout.good_input_dir(),
            self.layout.invalid_input_dir(),
            self.layout.expected_dir(),
        ] {
            if !dir.is_dir() {
                bail!("fixture directory {} is missing", dir.display());
            }
        }
        let dir = self.layout.expected_dir();
        for shared in [
            &self.layout.empty_fixture,
            &self.layout.usage_fixture,
            &self.layout.invalid_fixture,
        ] {
            let path = dir.join(shared);
            if !path.is_file() {
                bail!("shared fixture {} is missing", path.display());
            }
        }
        for case in cases {
            for fixture in [&case.expected_stdout, &case.expected_stderr] {
                if !fixture.path().is_file() {
                    bail!(
                        "expected fixture {} for test {} is missing",
                        fixture.path().display(),
                        case.name
                    );
                }
            }
        }
        Ok(())
    }

    /// Writes the captured streams, replacing any previous run's files.
    pub fn persist(&self, name: &str, execution: &Execution) -> Result<(PathBuf, PathBuf)> {
        let output = self.actual_output_path(name);
        let errors = self.actual_error_path(name);
        fs::write(&output, &execution.stdout)
            .with_context(|| format!("writing {}", output.display()))?;
        fs::write(&errors, &execution.stderr)
            .with_context(|| format!("writing {}", errors.display()))?;
        Ok((output, errors))
    }
}

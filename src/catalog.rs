//! Enumerates the cases of one run.
//!
//! Order is fixed by category: malformed argument counts, then every file of
//! the invalid-input directory plus one path that does not exist, then every
//! file of the good-input directory. Within a directory, discovery order is
//! whatever the filesystem yields.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::Config;
use crate::fixtures::{Category, FixtureRef, FixtureStore};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    pub stdin: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub category: Category,
    pub invocation: Invocation,
    pub expected_stdout: FixtureRef,
    pub expected_stderr: FixtureRef,
}

impl TestCase {
    fn new(store: &FixtureStore, category: Category, name: String, args: Vec<String>) -> Self {
        let (expected_stdout, expected_stderr) = store.expected_refs(category, &name);
        Self {
            name,
            category,
            invocation: Invocation {
                args,
                stdin: String::new(),
            },
            expected_stdout,
            expected_stderr,
        }
    }
}

pub fn build(config: &Config, store: &FixtureStore) -> Result<Vec<TestCase>> {
    let layout = &config.layout;
    let mut cases = Vec::new();

    for scenario in config.expanded_scenarios() {
        cases.push(TestCase::new(
            store,
            Category::BadArgCount,
            scenario.name,
            scenario.args,
        ));
    }

    let invalid_dir = layout.invalid_input_dir();
    let mut invalid = discover(&invalid_dir)?;
    invalid.push(layout.missing_input.clone());
    for name in invalid {
        let arg = input_arg(&invalid_dir, &name);
        cases.push(TestCase::new(store, Category::InvalidInput, name, vec![arg]));
    }

    let good_dir = layout.good_input_dir();
    for name in discover(&good_dir)? {
        let arg = input_arg(&good_dir, &name);
        cases.push(TestCase::new(store, Category::ValidInput, name, vec![arg]));
    }

    // actual-output files are keyed by name alone
    let mut seen = HashSet::new();
    for case in &cases {
        if !seen.insert(case.name.as_str()) {
            bail!(
                "duplicate test name {:?} ({}): its output files would collide",
                case.name,
                case.category
            );
        }
    }
    Ok(cases)
}

/// Keeps only the cases whose name contains `filter`. A filter that keeps
/// nothing is an error.
pub fn select(cases: Vec<TestCase>, filter: Option<&str>) -> Result<Vec<TestCase>> {
    let Some(f) = filter else {
        return Ok(cases);
    };
    let picked: Vec<_> = cases.into_iter().filter(|c| c.name.contains(f)).collect();
    if picked.is_empty() {
        bail!("no test matches filter {f:?}");
    }
    Ok(picked)
}

/// Regular files directly inside `dir`, in discovery order.
fn discover(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("listing input directory {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .file_name()
            .to_str()
            .with_context(|| format!("non UTF-8 file name in {}", dir.display()))?;
        names.push(name.to_string());
    }
    Ok(names)
}

fn input_arg(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

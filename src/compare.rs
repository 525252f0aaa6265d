//! Exact comparison of actual output against an expected fixture.
//!
//! Equality means byte-identical: line endings and trailing whitespace are
//! significant. A mismatch carries a line diff listing every removed
//! (expected) and inserted (actual) line, escaped so invisible bytes show.

use anyhow::{Context, Result};
use similar::{ChangeTag, TextDiff};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    Mismatch(String),
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Comparison::Equal => None,
            Comparison::Mismatch(detail) => Some(detail),
        }
    }
}

/// Compares two files. A missing expected fixture is an error, not a mismatch.
pub fn compare(expected: &Path, actual: &Path) -> Result<Comparison> {
    let expected_bytes = fs::read(expected)
        .with_context(|| format!("reading expected fixture {}", expected.display()))?;
    let actual_bytes =
        fs::read(actual).with_context(|| format!("reading actual output {}", actual.display()))?;
    Ok(match compare_bytes(&expected_bytes, &actual_bytes) {
        Comparison::Equal => Comparison::Equal,
        Comparison::Mismatch(diff) => Comparison::Mismatch(format!(
            "{} ({}) vs {} ({})\n{diff}",
            expected.display(),
            size(&expected_bytes),
            actual.display(),
            size(&actual_bytes),
        )),
    })
}

pub fn compare_bytes(expected: &[u8], actual: &[u8]) -> Comparison {
    if expected == actual {
        return Comparison::Equal;
    }
    let diff = TextDiff::from_lines(expected, actual);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let (sign, index) = match change.tag() {
            ChangeTag::Equal => continue,
            ChangeTag::Delete => ('-', change.old_index()),
            ChangeTag::Insert => ('+', change.new_index()),
        };
        let line = index.map_or(0, |i| i + 1);
        let _ = writeln!(out, "{sign}{line:>5} | {}", escape(change.value()));
    }
    Comparison::Mismatch(out)
}

fn escape(line: &[u8]) -> String {
    match std::str::from_utf8(line) {
        Ok(text) => format!("{text:?}"),
        Err(_) => format!("b\"{}\"", line.escape_ascii()),
    }
}

fn size(bytes: &[u8]) -> String {
    let lines = bytes.split_inclusive(|b| *b == b'\n').count();
    format!("{} bytes, {} lines", bytes.len(), lines)
}

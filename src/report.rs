//! Human-readable progress and summary output.

use std::io::{self, Write};

use crate::fixtures::Category;
use crate::orchestrator::{CaseResult, RunSummary};

const RULE: &str = "********************";

const ASCII_ERROR: &str = r"
______  _______  _______  _______  _______
(  ____ \(  ____ )(  ____ )(  ___  )(  ____ )
| (    \/| (    )|| (    )|| (   ) || (    )|
| (__    | (____)|| (____)|| |   | || (____)|
|  __)   |     __)|     __)| |   | ||     __)
| (      | (\ (   | (\ (   | |   | || (\ (
| (____/\| ) \ \__| ) \ \__| (___) || ) \ \__
(_______/|/   \__/|/   \__/(_______)|/   \__/
";

const ASCII_PASSES: &str = r"
  , ; ,   .-'^^^'-.   , ; ,
  \|/  .'         '.  \|//
   \-;-/   ()   ()   \-;-/
   // ;               ; \
  //__; :.         .; ;__\
 `-----'.'-.....-'.'/-----'
        '.'.-.-,_.'.'
          '(  (..-'
            '-'
";

pub fn start<W: Write>(out: &mut W, total: usize) -> io::Result<()> {
    writeln!(out, "start {total} tests!\n")
}

pub fn section<W: Write>(out: &mut W, category: Category) -> io::Result<()> {
    writeln!(out, "\n{RULE}\n{}:\n{RULE}\n", category.title())
}

pub fn case<W: Write>(out: &mut W, result: &CaseResult) -> io::Result<()> {
    if result.passed() {
        return writeln!(out, "[PASS] {}\n", result.name);
    }
    writeln!(out, "[FAIL] {} ({})", result.name, result.exit)?;
    if let Some(detail) = result.detail() {
        writeln!(out, "{detail}")?;
    }
    writeln!(out)
}

pub fn summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(out, "\n{RULE}")?;
    writeln!(
        out,
        "passed {} out of {} tests",
        summary.passed, summary.total
    )?;
    if summary.all_passed() {
        return writeln!(out, "All tests passed!!");
    }
    writeln!(out, "failed:")?;
    for failure in summary.failures() {
        writeln!(out, "  {} [{}]", failure.name, failure.category)?;
    }
    Ok(())
}

pub fn banner<W: Write>(out: &mut W, passed: bool) -> io::Result<()> {
    if passed {
        writeln!(out, "{ASCII_PASSES}")?;
        writeln!(out, "you passed everything!!! \ngo get some sleep")
    } else {
        writeln!(out, "{ASCII_ERROR}")
    }
}

/// Prefixes the first line with `title: ` and aligns the rest under it.
/// Lines are never rewrapped, so diff rows stay intact.
pub fn indented(title: &str, text: &str) -> String {
    let prefix = format!("{title}: ");
    let pad = " ".repeat(prefix.len());
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{prefix}{line}")
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

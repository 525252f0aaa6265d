//! Optional build step run before a pass.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::process::Command;

/// Runs `command` (program followed by its arguments) in the current
/// directory. A non-zero exit is fatal: there is nothing to test.
pub fn run<W: Write>(command: &[String], out: &mut W) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        bail!("build command is empty");
    };
    let program = which::which(program)
        .with_context(|| format!("build tool {program} not found on PATH"))?;
    writeln!(out, "[build] {} {}", program.display(), args.join(" "))?;
    let output = Command::new(&program)
        .args(args)
        .output()
        .with_context(|| format!("spawning {program:?}"))?;
    out.write_all(&output.stdout)?;
    out.write_all(&output.stderr)?;
    if !output.status.success() {
        bail!(
            "problem with compiling ({})\nerror message\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    writeln!(out, "[build] compile OK\n")?;
    Ok(())
}

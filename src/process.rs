//! Spawning the subject and capturing everything it writes.

use anyhow::{anyhow, bail, Context, Result};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::{access, AccessFlags, Pid};
use std::io::{self, Read, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::verbose;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The program under test, resolved once per run.
#[derive(Clone, Debug)]
pub struct Subject {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl Subject {
    /// A path-like `program` must exist and be executable; a bare name is
    /// looked up on `PATH`.
    pub fn resolve(program: &Path, leading_args: Vec<String>) -> Result<Self> {
        let path_like = program.is_absolute() || program.components().count() > 1;
        let program = if path_like {
            if !program.is_file() {
                bail!("subject executable {} not found", program.display());
            }
            access(program, AccessFlags::X_OK)
                .with_context(|| format!("subject {} is not executable", program.display()))?;
            program.to_path_buf()
        } else {
            which::which(program)
                .with_context(|| format!("subject {} not found on PATH", program.display()))?
        };
        Ok(Self {
            program,
            leading_args,
        })
    }

    /// Full argument vector for display purposes.
    pub fn argv(&self, args: &[String]) -> Vec<String> {
        std::iter::once(self.program.display().to_string())
            .chain(self.leading_args.iter().cloned())
            .chain(args.iter().cloned())
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct Execution {
    /// Exit code, or `128 + signal` when the subject was killed by a signal.
    pub exit_code: i32,
    pub signal: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl Execution {
    pub fn describe_exit(&self) -> String {
        match self.signal {
            Some(sig) => match Signal::try_from(sig) {
                Ok(signal) => format!("killed by {}", signal.as_str()),
                Err(_) => format!("killed by signal {sig}"),
            },
            None => format!("exit status {}", self.exit_code),
        }
    }
}

/// Runs the subject once with `args`, feeding `stdin_data`.
///
/// A non-zero exit is a normal result. Only failing to spawn or talk to the
/// child is an error. With a `timeout`, the subject's process group is
/// killed on expiry and the result is flagged `timed_out`.
pub fn run(
    subject: &Subject,
    args: &[String],
    stdin_data: &[u8],
    timeout: Option<Duration>,
) -> Result<Execution> {
    let mut command = Command::new(&subject.program);
    command
        .args(&subject.leading_args)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);

    let started = Instant::now();
    let mut child = command
        .spawn()
        .with_context(|| format!("spawning {:?}", subject.program))?;

    let stdin_writer = child.stdin.take().map(|mut stdin| {
        let owned = stdin_data.to_vec();
        thread::spawn(move || -> io::Result<()> {
            match stdin.write_all(&owned) {
                // the subject is free to never read its input
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        })
    });
    let stdout_reader = child.stdout.take().map(drain);
    let stderr_reader = child.stderr.take().map(drain);

    let (status, mut timed_out) = match timeout {
        Some(limit) => wait_with_deadline(&mut child, started, limit)?,
        None => (child.wait().context("waiting for subject")?, false),
    };
    if let Some(limit) = timeout {
        // background descendants can keep the pipes open after the leader exits
        let settled = || {
            finished(&stdin_writer) && finished(&stdout_reader) && finished(&stderr_reader)
        };
        if !timed_out && !poll_until(settled, started, limit) {
            kill_group(&mut child);
            timed_out = true;
        }
    }
    let elapsed = started.elapsed();

    join(stdin_writer, "stdin")?;
    let stdout = join(stdout_reader, "stdout")?.unwrap_or_default();
    let stderr = join(stderr_reader, "stderr")?.unwrap_or_default();

    let signal = status.signal();
    let execution = Execution {
        exit_code: status.code().or(signal.map(|s| 128 + s)).unwrap_or(-1),
        signal,
        stdout,
        stderr,
        timed_out,
        elapsed,
    };
    if verbose() {
        println!(
            "[CMD ] {:?} -> {}{} in {:?}, stdout {}B, stderr {}B",
            subject.argv(args),
            execution.describe_exit(),
            if timed_out { " (timed out)" } else { "" },
            execution.elapsed,
            execution.stdout.len(),
            execution.stderr.len()
        );
    }
    Ok(execution)
}

fn drain<R: Read + Send + 'static>(mut source: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join<T>(handle: Option<JoinHandle<io::Result<T>>>, stream: &str) -> Result<Option<T>> {
    let Some(handle) = handle else {
        return Ok(None);
    };
    let value = handle
        .join()
        .map_err(|_| anyhow!("{stream} thread panicked"))?
        .with_context(|| format!("subject {stream} pipe"))?;
    Ok(Some(value))
}

fn finished<T>(handle: &Option<JoinHandle<T>>) -> bool {
    handle.as_ref().map_or(true, |h| h.is_finished())
}

/// Polls `done` until it holds or `limit` has passed since `started`.
fn poll_until(mut done: impl FnMut() -> bool, started: Instant, limit: Duration) -> bool {
    loop {
        if done() {
            return true;
        }
        if started.elapsed() >= limit {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn wait_with_deadline(
    child: &mut Child,
    started: Instant,
    limit: Duration,
) -> Result<(ExitStatus, bool)> {
    loop {
        if let Some(status) = child.try_wait().context("polling subject")? {
            return Ok((status, false));
        }
        if started.elapsed() >= limit {
            kill_group(child);
            let status = child.wait().context("reaping timed-out subject")?;
            return Ok((status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn kill_group(child: &mut Child) {
    // the child leads its own group, so descendants holding our pipes die too
    let group = Pid::from_raw(child.id() as i32);
    if killpg(group, Signal::SIGKILL).is_err() {
        let _ = child.kill();
    }
}

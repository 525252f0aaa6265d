use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use outcheck::catalog;
use outcheck::config::{timeout_from_secs, Config, Stream};
use outcheck::fixtures::FixtureStore;
use outcheck::orchestrator::{Orchestrator, RunSummary};
use outcheck::process::Subject;
use outcheck::{build, report, VERBOSE};

#[derive(Parser, Debug)]
#[command(author, version, about = "stdout/stderr conformance runner", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug)]
struct Settings {
    /// TOML file overriding the built-in layout and scenarios
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Program under test (path, or a name looked up on PATH)
    #[arg(long, global = true)]
    subject: Option<PathBuf>,
    /// Argument placed before every case's arguments (repeatable)
    #[arg(long = "subject-arg", global = true, allow_hyphen_values = true)]
    subject_args: Vec<String>,
    /// Fixture root directory
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Per-invocation timeout in seconds, 0 to wait forever
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Stream expected to carry the usage message for bad argument counts
    #[arg(long, global = true, value_enum)]
    usage_stream: Option<Stream>,
}

impl Settings {
    fn resolve(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(subject) = self.subject {
            config.subject = subject;
        }
        if !self.subject_args.is_empty() {
            config.subject_args = self.subject_args;
        }
        if let Some(root) = self.root {
            config.layout.root = root;
        }
        if let Some(secs) = self.timeout {
            config.timeout = timeout_from_secs(secs);
        }
        if let Some(stream) = self.usage_stream {
            config.usage_stream = stream;
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the conformance suite (default)
    Run {
        /// Only run tests whose name contains this filter
        #[arg(short, long)]
        filter: Option<String>,
        /// Print per-test execution details
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
        /// Run the configured build command first
        #[arg(short, long, default_value_t = false)]
        build: bool,
        /// Offer to rerun after each pass until stdin closes
        #[arg(short, long, default_value_t = false)]
        interactive: bool,
    },
    /// Print the test catalog without running anything
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.settings.resolve()?;
    let command = cli.command.unwrap_or(Commands::Run {
        filter: None,
        verbose: false,
        build: false,
        interactive: false,
    });

    match command {
        Commands::Run {
            filter,
            verbose,
            build: rebuild,
            interactive,
        } => {
            VERBOSE.store(verbose, Ordering::Relaxed);
            if interactive {
                run_interactive(&config, filter.as_deref(), rebuild)
            } else {
                if rebuild {
                    build::run(&config.build_command, &mut io::stdout())?;
                }
                let summary = run_once(&config, filter.as_deref())?;
                finish(&summary)
            }
        }
        Commands::List => list(&config),
    }
}

// --------------------- Runs ------------------------------------------------
fn run_once(config: &Config, filter: Option<&str>) -> Result<RunSummary> {
    let subject = Subject::resolve(&config.subject, config.subject_args.clone())?;
    let store = FixtureStore::new(config);
    let cases = catalog::select(catalog::build(config, &store)?, filter)?;
    Orchestrator::new(&subject, &store, config.timeout).run_all(&cases, &mut io::stdout())
}

fn run_interactive(config: &Config, filter: Option<&str>, rebuild: bool) -> Result<()> {
    let stdin = io::stdin();
    loop {
        println!(
            "starting tester version {}\n",
            env!("CARGO_PKG_VERSION")
        );
        if rebuild {
            build::run(&config.build_command, &mut io::stdout())?;
        }
        let summary = run_once(config, filter)?;
        report::banner(&mut io::stdout(), summary.all_passed())?;

        print!("press enter to restart the tester");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return finish(&summary);
        }
        println!("\n\n\nRestarting...");
    }
}

fn finish(summary: &RunSummary) -> Result<()> {
    if summary.all_passed() {
        return Ok(());
    }
    bail!(
        "{} of {} tests failed",
        summary.total - summary.passed,
        summary.total
    );
}

fn list(config: &Config) -> Result<()> {
    let store = FixtureStore::new(config);
    let cases = catalog::build(config, &store)?;
    let mut out = io::stdout().lock();
    for case in &cases {
        writeln!(
            out,
            "{:<14} {:<24} {:?}",
            case.category.to_string(),
            case.name,
            case.invocation.args
        )?;
    }
    writeln!(out, "{} tests", cases.len())?;
    Ok(())
}

//! Run configuration: where the fixtures live, what to run, and the
//! malformed-invocation scenarios.
//!
//! Values come from built-in defaults (the classic `tester_files/` layout),
//! optionally overlaid by a TOML file, then by command-line flags in `main`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Expanded to the resolved good-input directory inside scenario arguments.
pub const GOOD_INPUT_TOKEN: &str = "{good_input}";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Stdout,
    Stderr,
}

/// One malformed-argument-count invocation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Scenario {
    pub fn new(name: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Fixture directory layout. Directories are relative to `root` unless absolute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub good_input: PathBuf,
    pub invalid_input: PathBuf,
    pub expected: PathBuf,
    pub actual: PathBuf,
    pub empty_fixture: String,
    pub usage_fixture: String,
    pub invalid_fixture: String,
    /// File name of the synthetic invalid-input case that must not exist.
    pub missing_input: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("tester_files"),
            good_input: PathBuf::from("good_input"),
            invalid_input: PathBuf::from("invalid_input"),
            expected: PathBuf::from("system_out"),
            actual: PathBuf::from("user_out"),
            empty_fixture: "empty.txt".to_string(),
            usage_fixture: "num_of_parm.txt".to_string(),
            invalid_fixture: "invalid.txt".to_string(),
            missing_input: "no_file.csv".to_string(),
        }
    }
}

impl Layout {
    pub fn good_input_dir(&self) -> PathBuf {
        self.root.join(&self.good_input)
    }

    pub fn invalid_input_dir(&self) -> PathBuf {
        self.root.join(&self.invalid_input)
    }

    pub fn expected_dir(&self) -> PathBuf {
        self.root.join(&self.expected)
    }

    pub fn actual_dir(&self) -> PathBuf {
        self.root.join(&self.actual)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub subject: PathBuf,
    /// Arguments placed before every case's own arguments.
    pub subject_args: Vec<String>,
    pub layout: Layout,
    /// Stream on which bad-argument-count cases expect the usage message.
    pub usage_stream: Stream,
    pub timeout: Option<Duration>,
    pub bad_arg_count: Vec<Scenario>,
    pub build_command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let more = format!("{GOOD_INPUT_TOKEN}/a.txt");
        Self {
            subject: PathBuf::from("./subject"),
            subject_args: Vec::new(),
            layout: Layout::default(),
            usage_stream: Stream::Stdout,
            timeout: Some(DEFAULT_TIMEOUT),
            bad_arg_count: vec![
                Scenario::new("les_parm", &[]),
                Scenario::new("more_parm", &[more.as_str(), "1", "2", "3"]),
                Scenario::new("no_file", &["1", "3"]),
            ],
            build_command: vec!["make".to_string()],
        }
    }
}

/// On-disk form of [`Config`]; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    subject: Option<PathBuf>,
    subject_args: Option<Vec<String>>,
    root: Option<PathBuf>,
    good_input: Option<PathBuf>,
    invalid_input: Option<PathBuf>,
    expected: Option<PathBuf>,
    actual: Option<PathBuf>,
    empty_fixture: Option<String>,
    usage_fixture: Option<String>,
    invalid_fixture: Option<String>,
    missing_input: Option<String>,
    usage_stream: Option<Stream>,
    timeout_secs: Option<u64>,
    bad_arg_count: Option<Vec<Scenario>>,
    build_command: Option<Vec<String>>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(Self::default().overlay(file))
    }

    fn overlay(mut self, file: ConfigFile) -> Self {
        let layout = &mut self.layout;
        if let Some(v) = file.root {
            layout.root = v;
        }
        if let Some(v) = file.good_input {
            layout.good_input = v;
        }
        if let Some(v) = file.invalid_input {
            layout.invalid_input = v;
        }
        if let Some(v) = file.expected {
            layout.expected = v;
        }
        if let Some(v) = file.actual {
            layout.actual = v;
        }
        if let Some(v) = file.empty_fixture {
            layout.empty_fixture = v;
        }
        if let Some(v) = file.usage_fixture {
            layout.usage_fixture = v;
        }
        if let Some(v) = file.invalid_fixture {
            layout.invalid_fixture = v;
        }
        if let Some(v) = file.missing_input {
            layout.missing_input = v;
        }
        if let Some(v) = file.subject {
            self.subject = v;
        }
        if let Some(v) = file.subject_args {
            self.subject_args = v;
        }
        if let Some(v) = file.usage_stream {
            self.usage_stream = v;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from_secs(secs);
        }
        if let Some(v) = file.bad_arg_count {
            self.bad_arg_count = v;
        }
        if let Some(v) = file.build_command {
            self.build_command = v;
        }
        self
    }

    /// Scenarios with [`GOOD_INPUT_TOKEN`] replaced by the good-input directory.
    pub fn expanded_scenarios(&self) -> Vec<Scenario> {
        let good = self.layout.good_input_dir();
        let good = good.to_string_lossy();
        self.bad_arg_count
            .iter()
            .map(|s| Scenario {
                name: s.name.clone(),
                args: s
                    .args
                    .iter()
                    .map(|a| a.replace(GOOD_INPUT_TOKEN, &good))
                    .collect(),
            })
            .collect()
    }
}

/// `0` disables the bound.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

//! End-to-end runs of the `outcheck` binary against a shell-script subject.

#![allow(deprecated)] // Command::cargo_bin is deprecated but still functional

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Behaves like a conforming program: usage on stdout for a wrong argument
/// count, "Invalid input" on stderr for missing or malformed files, and the
/// file's content otherwise.
const SUBJECT: &str = r#"
if [ "$#" -ne 1 ]; then echo "Usage: prog <file>"; exit 1; fi
if [ ! -f "$1" ]; then echo "Invalid input" >&2; exit 1; fi
if grep -q ' ' "$1"; then echo "Invalid input" >&2; exit 1; fi
cat "$1"
"#;

struct Tree {
    dir: TempDir,
}

impl Tree {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let tree = Self { dir };
        for sub in ["good_input", "invalid_input", "system_out"] {
            fs::create_dir_all(tree.path(sub)).unwrap();
        }
        tree.write("system_out/empty.txt", "");
        tree.write("system_out/num_of_parm.txt", "Usage: prog <file>\n");
        tree.write("system_out/invalid.txt", "Invalid input\n");
        tree.good("a.txt", "1,2\n3,4\n");
        tree.good("b.txt", "5,6\n");
        tree.write("invalid_input/spaces.csv", "1, 2\n");
        tree.write("subject.sh", SUBJECT);
        tree
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn write(&self, rel: &str, body: &str) {
        fs::write(self.path(rel), body).unwrap();
    }

    fn good(&self, name: &str, body: &str) {
        self.write(&format!("good_input/{name}"), body);
        self.write(&format!("system_out/{name}_school_solution_output.txt"), body);
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("outcheck").unwrap();
        cmd.arg("--root")
            .arg(self.dir.path())
            .arg("--subject")
            .arg("sh")
            .arg("--subject-arg")
            .arg(self.path("subject.sh"))
            .arg("--timeout")
            .arg("5");
        cmd
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn conforming_subject_exits_zero() {
    let tree = Tree::new();
    tree.cmd()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("start 7 tests!"))
        .stdout(predicate::str::contains("[PASS] les_parm"))
        .stdout(predicate::str::contains("[PASS] spaces.csv"))
        .stdout(predicate::str::contains("passed 7 out of 7 tests"))
        .stdout(predicate::str::contains("All tests passed!!"));
    assert_eq!(read(&tree.path("user_out/a.txt_user_output.txt")), "1,2\n3,4\n");
    assert_eq!(read(&tree.path("user_out/a.txt_user_errors.txt")), "");
}

#[test]
fn run_is_the_default_command() {
    let tree = Tree::new();
    tree.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("passed 7 out of 7 tests"));
}

#[test]
fn mismatch_exits_non_zero_with_detail() {
    let tree = Tree::new();
    tree.write("system_out/b.txt_school_solution_output.txt", "5,6 \n");
    tree.cmd()
        .arg("run")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[FAIL] b.txt"))
        .stdout(predicate::str::contains("Output file compare failed"))
        .stdout(predicate::str::contains("\"5,6 \\n\""))
        .stdout(predicate::str::contains("[PASS] a.txt"))
        .stdout(predicate::str::contains("passed 6 out of 7 tests"))
        .stderr(predicate::str::contains("1 of 7 tests failed"));
}

#[test]
fn usage_on_the_wrong_stream_fails_bad_arg_cases() {
    let tree = Tree::new();
    tree.cmd()
        .args(["--usage-stream", "stderr", "run"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[FAIL] les_parm"))
        .stdout(predicate::str::contains("[PASS] a.txt"))
        .stdout(predicate::str::contains("passed 4 out of 7 tests"));
}

#[test]
fn filter_limits_the_run() {
    let tree = Tree::new();
    tree.write("system_out/b.txt_school_solution_output.txt", "wrong\n");
    tree.cmd()
        .args(["run", "--filter", "parm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start 2 tests!"))
        .stdout(predicate::str::contains("b.txt").not());
}

#[test]
fn filter_matching_nothing_is_fatal() {
    let tree = Tree::new();
    tree.cmd()
        .args(["run", "--filter", "nomatch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no test matches filter \"nomatch\""))
        .stdout(predicate::str::contains("All tests passed").not());
}

#[test]
fn verbose_traces_commands() {
    let tree = Tree::new();
    tree.cmd()
        .args(["run", "--verbose", "--filter", "a.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[RUN ] a.txt"))
        .stdout(predicate::str::contains("[CMD ]"))
        .stdout(predicate::str::is_match(r"-> exit status 0 in [0-9.]+(ns|µs|ms|s),").unwrap());
}

#[test]
fn missing_subject_is_fatal() {
    let tree = Tree::new();
    Command::cargo_bin("outcheck")
        .unwrap()
        .arg("--root")
        .arg(tree.dir.path())
        .args(["--subject", "./no-such-subject", "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"))
        .stdout(predicate::str::contains("[FAIL]").not());
}

#[test]
fn missing_shared_fixture_is_fatal() {
    let tree = Tree::new();
    fs::remove_file(tree.path("system_out/invalid.txt")).unwrap();
    tree.cmd()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid.txt"))
        .stdout(predicate::str::contains("starting").not());
}

#[test]
fn list_prints_catalog_without_running() {
    let tree = Tree::new();
    tree.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("bad-arg-count"))
        .stdout(predicate::str::contains("no_file.csv"))
        .stdout(predicate::str::contains("7 tests"));
    assert!(!tree.path("user_out").exists());
}

#[test]
fn config_file_supplies_scenarios() {
    let tree = Tree::new();
    let config = tree.path("outcheck.toml");
    fs::write(
        &config,
        r#"
        [[bad_arg_count]]
        name = "pair"
        args = ["{good_input}/a.txt", "extra"]
        "#,
    )
    .unwrap();
    tree.cmd()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[PASS] pair"))
        .stdout(predicate::str::contains("les_parm").not())
        .stdout(predicate::str::contains("passed 5 out of 5 tests"));
}

#[test]
fn interactive_mode_stops_at_end_of_input() {
    let tree = Tree::new();
    tree.cmd()
        .args(["run", "--interactive"])
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Restarting..."))
        .stdout(predicate::str::contains("you passed everything!!!"));
}

#[test]
fn build_step_runs_first() {
    let tree = Tree::new();
    let config = tree.path("outcheck.toml");
    fs::write(&config, "build_command = [\"sh\", \"-c\", \"echo building\"]\n").unwrap();
    tree.cmd()
        .arg("--config")
        .arg(&config)
        .args(["run", "--build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("building"))
        .stdout(predicate::str::contains("[build] compile OK"));
}

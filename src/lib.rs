//! Black-box conformance runner: runs a subject program over a catalog of
//! invocations and diffs its stdout/stderr against recorded fixtures.

use std::sync::atomic::{AtomicBool, Ordering};

pub mod build;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod fixtures;
pub mod orchestrator;
pub mod process;
pub mod report;

/// Enables `[RUN ]` / `[CMD ]` trace lines.
pub static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

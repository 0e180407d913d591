//! Scripted playthroughs: a `testcase.json` next to a `story.json` lists the
//! choices to make and the exact display commands the story must produce.

mod case;
mod runner;
mod source;

pub use case::{ExpectedEnd, TestCase, TESTCASE_FILE_NAME, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{find_case_dirs, read_story_source, read_test_case, story_path};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No story.json in {path}.")]
    StoryMissing { path: PathBuf },
    #[error("Failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Engine error: {0}")]
    Engine(#[from] sp_core::SceneplayError),
    #[error("Action missing at command index {command_index}: the story is awaiting a choice.")]
    MissingAction { command_index: usize },
    #[error("Unused actions: used {used} of {total}.")]
    UnusedActions { used: usize, total: usize },
    #[error("Guard exceeded: max_signals={max_signals}.")]
    GuardExceeded { max_signals: usize },
    #[error("Engine stopped in unexpected status {status}.")]
    UnexpectedStatus { status: String },
    #[error("Expected the story to finish {expected:?}, it finished {actual:?}.")]
    EndMismatch {
        expected: ExpectedEnd,
        actual: ExpectedEnd,
    },
    #[error("Expected command count {expected}, actual {actual}. observed={observed}")]
    CommandCountMismatch {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("Command mismatch at index {index}. expected={expected} actual={actual}")]
    CommandMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Failed to serialize command for diff: {0}")]
    CommandSerialize(serde_json::Error),
}

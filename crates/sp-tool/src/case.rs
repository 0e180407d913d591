use serde::{Deserialize, Serialize};
use sp_core::DisplayCommand;

pub const TESTCASE_SCHEMA_V1: &str = "sp-tool-case.v1";
pub const TESTCASE_FILE_NAME: &str = "testcase.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    /// Option indices, consumed one per pending choice.
    #[serde(default)]
    pub actions: Vec<usize>,
    #[serde(default)]
    pub expected_commands: Vec<DisplayCommand>,
    #[serde(default)]
    pub expected_end: ExpectedEnd,
}

/// How the playthrough is expected to finish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedEnd {
    #[default]
    Ended,
    Halted,
}

use std::path::Path;

use log::debug;
use sp_api::{create_engine_from_json, CreateEngineOptions};
use sp_core::RecordingSink;
use sp_runtime::EngineStatus;

use crate::source::{read_story_source, read_test_case};
use crate::{ExpectedEnd, SpToolError, TestCase};

const MAX_SIGNALS: usize = 5_000;

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub observed_commands: Vec<sp_core::DisplayCommand>,
    pub consumed_actions: usize,
    pub signals: usize,
    pub end: ExpectedEnd,
}

/// Plays the story in `story_dir`, advancing through every line and making
/// the case's choices in order.
pub fn run_case(story_dir: &Path, case: &TestCase) -> Result<RunReport, SpToolError> {
    let source = read_story_source(story_dir)?;
    let mut engine =
        create_engine_from_json(&source, RecordingSink::new(), CreateEngineOptions::default())?;
    let mut action_index = 0usize;

    for signal in 0..MAX_SIGNALS {
        match engine.status() {
            EngineStatus::AwaitingAdvance => engine.advance()?,
            EngineStatus::AwaitingChoice => {
                let index = case.actions.get(action_index).copied().ok_or_else(|| {
                    SpToolError::MissingAction {
                        command_index: engine.sink().commands().len().saturating_sub(1),
                    }
                })?;
                debug!("choosing option {} at {:?}", index, engine.current_node());
                engine.choose(index)?;
                action_index += 1;
            }
            EngineStatus::Ended | EngineStatus::Halted => {
                if action_index != case.actions.len() {
                    return Err(SpToolError::UnusedActions {
                        used: action_index,
                        total: case.actions.len(),
                    });
                }
                let end = if engine.status() == EngineStatus::Ended {
                    ExpectedEnd::Ended
                } else {
                    ExpectedEnd::Halted
                };
                return Ok(RunReport {
                    observed_commands: engine.into_sink().take(),
                    consumed_actions: action_index,
                    signals: signal,
                    end,
                });
            }
            status @ (EngineStatus::Idle | EngineStatus::Running) => {
                return Err(SpToolError::UnexpectedStatus {
                    status: format!("{:?}", status),
                })
            }
        }
    }

    Err(SpToolError::GuardExceeded {
        max_signals: MAX_SIGNALS,
    })
}

pub fn assert_case(story_dir: &Path, case_path: &Path) -> Result<(), SpToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(story_dir, &case)?;

    if report.end != case.expected_end {
        return Err(SpToolError::EndMismatch {
            expected: case.expected_end,
            actual: report.end,
        });
    }

    if report.observed_commands.len() != case.expected_commands.len() {
        let observed = serde_json::to_string_pretty(&report.observed_commands)
            .map_err(SpToolError::CommandSerialize)?;
        return Err(SpToolError::CommandCountMismatch {
            expected: case.expected_commands.len(),
            actual: report.observed_commands.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_commands
        .iter()
        .zip(report.observed_commands.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(SpToolError::CommandSerialize)?;
            let actual = serde_json::to_string(actual).map_err(SpToolError::CommandSerialize)?;
            return Err(SpToolError::CommandMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod runner_tests {
    use super::*;
    use sp_core::DisplayCommand;

    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("sp-tool-runner-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    fn story_dir(name: &str, story: &str) -> std::path::PathBuf {
        let root = temp_dir(name);
        write_file(&root.join("story.json"), story);
        root
    }

    fn case(actions: Vec<usize>, expected_commands: Vec<DisplayCommand>) -> TestCase {
        TestCase {
            schema_version: crate::TESTCASE_SCHEMA_V1.to_string(),
            actions,
            expected_commands,
            expected_end: ExpectedEnd::Ended,
        }
    }

    fn line(text: &str) -> DisplayCommand {
        DisplayCommand::SetDialogue {
            speaker: None,
            text: text.to_string(),
        }
    }

    const PICK: &str = r#"{
        "start": "A",
        "variables": {},
        "nodes": {
            "A": [
                { "kind": "choice", "prompt": "Pick", "options": [["Stay", null], ["Go", "B"]] },
                { "kind": "narration", "text": "Stayed." },
                { "kind": "end_story" }
            ],
            "B": [ { "kind": "narration", "text": "Went." }, { "kind": "end_story" } ]
        }
    }"#;

    fn pick_choices() -> DisplayCommand {
        DisplayCommand::ShowChoices {
            prompt: Some("Pick".to_string()),
            labels: vec!["Stay".to_string(), "Go".to_string()],
        }
    }

    #[test]
    fn run_case_advances_and_chooses() {
        let root = story_dir("pick", PICK);
        let report = run_case(&root, &case(vec![1], Vec::new())).expect("run should pass");
        assert_eq!(report.consumed_actions, 1);
        assert_eq!(report.end, ExpectedEnd::Ended);
        assert_eq!(
            report.observed_commands,
            vec![pick_choices(), line("Went."), DisplayCommand::ShowEnded]
        );

        let report = run_case(&root, &case(vec![0], Vec::new())).expect("run should pass");
        assert_eq!(
            report.observed_commands,
            vec![pick_choices(), line("Stayed."), DisplayCommand::ShowEnded]
        );
    }

    #[test]
    fn run_case_reports_missing_and_unused_actions() {
        let root = story_dir("actions", PICK);
        let missing = run_case(&root, &case(Vec::new(), Vec::new())).expect_err("missing");
        assert!(matches!(missing, SpToolError::MissingAction { command_index: 0 }));

        let unused = run_case(&root, &case(vec![0, 1], Vec::new())).expect_err("unused");
        assert!(matches!(unused, SpToolError::UnusedActions { used: 1, total: 2 }));

        let out_of_range = run_case(&root, &case(vec![9], Vec::new())).expect_err("range");
        assert!(matches!(out_of_range, SpToolError::Engine(_)));
    }

    #[test]
    fn run_case_reports_halted_and_guard() {
        let halted = story_dir(
            "halted",
            r#"{"start":"A","variables":{},"nodes":{"A":[{"kind":"narration","text":"x"}]}}"#,
        );
        let report = run_case(&halted, &case(Vec::new(), Vec::new())).expect("run should pass");
        assert_eq!(report.end, ExpectedEnd::Halted);

        let chatter = (0..MAX_SIGNALS + 1)
            .map(|_| r#"{"kind":"narration","text":"tick"}"#)
            .collect::<Vec<_>>()
            .join(",");
        let looping = story_dir(
            "guard",
            &format!(
                r#"{{"start":"A","variables":{{}},"nodes":{{"A":[{},{{"kind":"end_story"}}]}}}}"#,
                chatter
            ),
        );
        let error = run_case(&looping, &case(Vec::new(), Vec::new())).expect_err("guard");
        assert!(matches!(error, SpToolError::GuardExceeded { .. }));
    }

    #[test]
    fn assert_case_reports_end_count_and_value_mismatches() {
        let root = story_dir("assert", PICK);
        let write_case = |name: &str, body: &str| {
            let path = root.join(name);
            write_file(&path, body);
            path
        };

        let ok = write_case(
            "ok.json",
            r#"{"schemaVersion":"sp-tool-case.v1","actions":[1],"expectedCommands":[
                {"kind":"showChoices","prompt":"Pick","labels":["Stay","Go"]},
                {"kind":"setDialogue","speaker":null,"text":"Went."},
                {"kind":"showEnded"}
            ]}"#,
        );
        assert_case(&root, &ok).expect("case should pass");

        let count = write_case(
            "count.json",
            r#"{"schemaVersion":"sp-tool-case.v1","actions":[1],"expectedCommands":[{"kind":"showEnded"}]}"#,
        );
        let error = assert_case(&root, &count).expect_err("count mismatch");
        assert!(matches!(error, SpToolError::CommandCountMismatch { .. }));

        let value = write_case(
            "value.json",
            r#"{"schemaVersion":"sp-tool-case.v1","actions":[1],"expectedCommands":[
                {"kind":"showChoices","prompt":"Pick","labels":["Stay","Go"]},
                {"kind":"setDialogue","speaker":null,"text":"Stayed."},
                {"kind":"showEnded"}
            ]}"#,
        );
        let error = assert_case(&root, &value).expect_err("value mismatch");
        assert!(matches!(error, SpToolError::CommandMismatch { index: 1, .. }));

        let end = write_case(
            "end.json",
            r#"{"schemaVersion":"sp-tool-case.v1","actions":[1],"expectedEnd":"halted"}"#,
        );
        let error = assert_case(&root, &end).expect_err("end mismatch");
        assert!(matches!(error, SpToolError::EndMismatch { .. }));
    }
}

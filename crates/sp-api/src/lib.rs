use std::fmt;
use std::str::FromStr;

use log::info;
use sp_core::{RenderSink, SceneplayError, Story};
use sp_lint::{has_errors, has_warnings, report, validate, Diagnostic};
use sp_loader::load_story_from_str;
use sp_runtime::{StoryEngine, StoryEngineOptions};

/// Which validator findings stop an engine from being created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationGate {
    Off,
    #[default]
    Errors,
    ErrorsAndWarnings,
}

impl ValidationGate {
    pub fn blocks(&self, diagnostics: &[Diagnostic]) -> bool {
        match self {
            Self::Off => false,
            Self::Errors => has_errors(diagnostics),
            Self::ErrorsAndWarnings => has_errors(diagnostics) || has_warnings(diagnostics),
        }
    }
}

impl fmt::Display for ValidationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Errors => f.write_str("errors"),
            Self::ErrorsAndWarnings => f.write_str("warnings"),
        }
    }
}

impl FromStr for ValidationGate {
    type Err = SceneplayError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "off" => Ok(Self::Off),
            "errors" => Ok(Self::Errors),
            "warnings" => Ok(Self::ErrorsAndWarnings),
            _ => Err(SceneplayError::new(
                "API_GATE_INVALID",
                format!(
                    "Unknown validation gate \"{}\"; expected off, errors or warnings.",
                    raw
                ),
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateEngineOptions {
    pub gate: ValidationGate,
    pub engine: StoryEngineOptions,
}

/// Validates `story`, logs every finding and applies `gate`.
///
/// Returns the findings when the gate lets the story through.
pub fn check_story(
    story: &Story,
    gate: ValidationGate,
) -> Result<Vec<Diagnostic>, SceneplayError> {
    let diagnostics = validate(story);
    report(&diagnostics);
    if gate.blocks(&diagnostics) {
        let first = diagnostics
            .iter()
            .find(|diagnostic| diagnostic.is_error())
            .or_else(|| diagnostics.first());
        let summary = first.map(ToString::to_string).unwrap_or_default();
        return Err(SceneplayError::new(
            "API_VALIDATION_BLOCKED",
            format!(
                "Story has {} finding(s) blocked by gate \"{}\"; first: {}",
                diagnostics.len(),
                gate,
                summary
            ),
        ));
    }
    Ok(diagnostics)
}

pub fn create_engine_from_story<S: RenderSink>(
    story: Story,
    sink: S,
    options: CreateEngineOptions,
) -> Result<StoryEngine<S>, SceneplayError> {
    let diagnostics = check_story(&story, options.gate)?;
    info!(
        "starting story at \"{}\" with {} finding(s)",
        story.start,
        diagnostics.len()
    );
    let mut engine = StoryEngine::with_options(story, sink, options.engine);
    engine.start()?;
    Ok(engine)
}

pub fn create_engine_from_json<S: RenderSink>(
    story_json: &str,
    sink: S,
    options: CreateEngineOptions,
) -> Result<StoryEngine<S>, SceneplayError> {
    let story = load_story_from_str(story_json)?;
    create_engine_from_story(story, sink, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_core::builders::{choice, end_story, narration, option};
    use sp_core::{DisplayCommand, NodeTree, RecordingSink};
    use sp_runtime::EngineStatus;

    const LINEAR: &str = r#"{
        "start": "Intro",
        "variables": {},
        "nodes": { "Intro": [
            { "kind": "narration", "text": "Hello." },
            { "kind": "end_story" }
        ] }
    }"#;

    #[test]
    fn create_from_json_starts_engine() {
        let engine = create_engine_from_json(
            LINEAR,
            RecordingSink::new(),
            CreateEngineOptions::default(),
        )
        .expect("engine should be created");
        assert_eq!(engine.status(), EngineStatus::AwaitingAdvance);
        assert_eq!(
            engine.sink().commands(),
            &[DisplayCommand::SetDialogue {
                speaker: None,
                text: "Hello.".to_string(),
            }]
        );
    }

    #[test]
    fn errors_gate_blocks_broken_story() {
        let error = create_engine_from_json(
            r#"{"start":"Missing","variables":{},"nodes":{"A":[{"kind":"end_story"}]}}"#,
            RecordingSink::new(),
            CreateEngineOptions::default(),
        )
        .err()
        .expect("broken story should be blocked");
        assert_eq!(error.code, "API_VALIDATION_BLOCKED");
    }

    #[test]
    fn gate_off_lets_broken_story_fail_at_start() {
        let error = create_engine_from_json(
            r#"{"start":"Missing","variables":{},"nodes":{"A":[{"kind":"end_story"}]}}"#,
            RecordingSink::new(),
            CreateEngineOptions {
                gate: ValidationGate::Off,
                ..CreateEngineOptions::default()
            },
        )
        .err()
        .expect("start should fail");
        assert_eq!(error.code, "ENGINE_START_NOT_FOUND");
    }

    #[test]
    fn warnings_gate_blocks_warning_only_story() {
        let story = Story::new(
            "A",
            NodeTree::group()
                .with_node("A", vec![narration("Hi"), choice("Go?", vec![option("Yes", Some("B"))])])
                .with_node("B", vec![end_story()])
                .with_node("Orphan", vec![end_story()]),
        );
        let warnings_only = validate(&story);
        assert!(!has_errors(&warnings_only));
        assert!(has_warnings(&warnings_only));

        let error = create_engine_from_story(
            story.clone(),
            RecordingSink::new(),
            CreateEngineOptions {
                gate: ValidationGate::ErrorsAndWarnings,
                ..CreateEngineOptions::default()
            },
        )
        .err()
        .expect("warnings should block");
        assert_eq!(error.code, "API_VALIDATION_BLOCKED");

        let engine = create_engine_from_story(story, RecordingSink::new(), CreateEngineOptions::default())
            .expect("errors gate lets warnings through");
        assert_eq!(engine.status(), EngineStatus::AwaitingAdvance);
    }

    #[test]
    fn gate_parses_from_flag_values() {
        assert_eq!("off".parse::<ValidationGate>().expect("off"), ValidationGate::Off);
        assert_eq!(
            "warnings".parse::<ValidationGate>().expect("warnings"),
            ValidationGate::ErrorsAndWarnings
        );
        assert_eq!(ValidationGate::Errors.to_string(), "errors");
        let error = "all".parse::<ValidationGate>().expect_err("unknown gate");
        assert_eq!(error.code, "API_GATE_INVALID");
    }

    #[test]
    fn loader_errors_pass_through() {
        let error = create_engine_from_json("{", RecordingSink::new(), CreateEngineOptions::default())
            .err()
            .expect("invalid json");
        assert_eq!(error.code, "LOADER_JSON_INVALID");
    }
}

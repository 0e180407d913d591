use std::collections::BTreeSet;

use sp_core::resolve::leaves;
use sp_core::{resolve, ResolveError, Story};

use crate::step_checks::{check_step, Findings};
use crate::Diagnostic;

/// Runs every check over `story` and returns the findings in check order:
/// required fields, start node, per-step schema, dangling references,
/// unreachable nodes, nodes without a terminating step.
pub fn validate(story: &Story) -> Vec<Diagnostic> {
    let mut findings = Findings::default();

    let has_start = !story.start.trim().is_empty();
    if !has_start {
        findings.error("start", "story is missing required field \"start\"");
    }
    if story.nodes.is_empty() {
        findings.error("nodes", "story has no nodes");
    }
    if story.variables.is_none() {
        findings.warning(
            "variables",
            "story has no \"variables\"; playback starts with an empty state",
        );
    }

    if has_start {
        if let Err(error) = resolve(&story.nodes, &story.start) {
            findings.error("start", format!("start node cannot be resolved: {}", error));
        }
    }

    let leaves = leaves(&story.nodes);
    let leaf_paths = leaves
        .iter()
        .map(|(path, _)| path.as_str())
        .collect::<BTreeSet<_>>();

    for (path, steps) in &leaves {
        if steps.is_empty() {
            findings.warning(path.as_str(), "node has no steps");
            continue;
        }
        for (index, step) in steps.iter().enumerate() {
            check_step(story, &format!("{}[{}]", path, index), step, &mut findings);
        }
    }

    let references = std::mem::take(&mut findings.references);
    for reference in &references {
        if leaf_paths.contains(reference.target.as_str()) {
            continue;
        }
        let message = match resolve(&story.nodes, &reference.target) {
            Err(ResolveError::NodePathIsGroup { .. }) => format!(
                "referenced node \"{}\" is a group, not a node",
                reference.target
            ),
            _ => format!("referenced node \"{}\" does not exist", reference.target),
        };
        findings.error(reference.location.clone(), message);
    }

    let referenced = references
        .iter()
        .map(|reference| reference.target.as_str())
        .collect::<BTreeSet<_>>();
    for (path, _) in &leaves {
        if *path != story.start && !referenced.contains(path.as_str()) {
            findings.warning(
                path.as_str(),
                "node is unreachable: it is not the start node and nothing jumps to it",
            );
        }
    }

    for (path, steps) in &leaves {
        let Some(last) = steps.last() else {
            continue;
        };
        if !last.is_terminator() {
            findings.warning(
                path.as_str(),
                format!(
                    "node ends with \"{}\" instead of jump_to, conditional_jump, choice or end_story and will stop abruptly",
                    last.kind_name()
                ),
            );
        }
    }

    findings.diagnostics
}

#[cfg(test)]
mod validate_tests {
    use super::*;
    use crate::{has_errors, Severity};
    use sp_core::builders::*;
    use sp_core::{Character, ChoiceOption, NodeTree, Position, Step};

    fn cast(start: &str, nodes: NodeTree) -> Story {
        Story::new(start, nodes)
            .with_variable("score", 0)
            .with_character("bob", Character::new("Bob").with_pose("happy", "bob.png"))
            .with_place("park", "park.png")
    }

    fn at<'a>(diagnostics: &'a [Diagnostic], location: &str) -> Vec<&'a Diagnostic> {
        diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.location == location)
            .collect()
    }

    #[test]
    fn clean_story_has_no_findings() {
        let story = cast(
            "Start",
            NodeTree::group()
                .with_node(
                    "Start",
                    vec![
                        background("park"),
                        show_character("bob", "happy", Position::Left),
                        dialogue("bob", "Hi"),
                        choice(
                            "Where?",
                            vec![option("Park", Some("Park.Gate")), option("Stay", None)],
                        ),
                        end_story(),
                    ],
                )
                .with_group(
                    "Park",
                    NodeTree::group().with_node("Gate", vec![narration("gate"), jump_to("Start")]),
                ),
        );
        assert_eq!(validate(&story), Vec::<Diagnostic>::new());
    }

    #[test]
    fn dangling_jump_is_an_error_at_the_step() {
        let story = cast(
            "Start",
            NodeTree::group().with_node("Start", vec![narration("a"), jump_to("Nowhere")]),
        );
        let diagnostics = validate(&story);
        assert!(has_errors(&diagnostics));
        let found = at(&diagnostics, "Start[1].nodeId");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Error);
        assert!(found[0].message.contains("Nowhere"));
    }

    #[test]
    fn unreferenced_node_is_a_warning() {
        let story = cast(
            "Start",
            NodeTree::group()
                .with_node("Start", vec![end_story()])
                .with_node("Orphan", vec![end_story()]),
        );
        let diagnostics = validate(&story);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::warning(
                "Orphan",
                "node is unreachable: it is not the start node and nothing jumps to it"
            )]
        );
    }

    #[test]
    fn missing_top_level_fields() {
        let diagnostics = validate(&Story::default());
        assert_eq!(
            diagnostics[0],
            Diagnostic::error("start", "story is missing required field \"start\"")
        );
        assert_eq!(diagnostics[1], Diagnostic::error("nodes", "story has no nodes"));
        assert_eq!(diagnostics[2].severity, Severity::Warning);
        assert_eq!(diagnostics[2].location, "variables");
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn start_must_resolve_to_a_leaf() {
        let story = cast(
            "Park",
            NodeTree::group()
                .with_group("Park", NodeTree::group().with_node("Gate", vec![end_story()])),
        );
        let diagnostics = validate(&story);
        let found = at(&diagnostics, "start");
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("group"));
        assert_eq!(at(&diagnostics, "Park.Gate")[0].severity, Severity::Warning);
    }

    #[test]
    fn reference_to_group_is_named_as_group() {
        let story = cast(
            "Start",
            NodeTree::group()
                .with_node("Start", vec![jump_to("Park")])
                .with_group("Park", NodeTree::group().with_node("Gate", vec![end_story()])),
        );
        let diagnostics = validate(&story);
        let found = at(&diagnostics, "Start[0].nodeId");
        assert_eq!(found[0].message, "referenced node \"Park\" is a group, not a node");
    }

    #[test]
    fn per_kind_schema_checks() {
        let story = cast(
            "Start",
            NodeTree::group().with_node(
                "Start",
                vec![
                    Step::Background { place: None },
                    background("moon"),
                    show_character("ghost", "happy", Position::Left),
                    Step::ShowCharacter {
                        character: Some("bob".to_string()),
                        pose: None,
                        position: None,
                    },
                    show_character("bob", "angry", Position::Right),
                    Step::HideCharacter { character: None },
                    Step::Dialogue { speaker: None, text: None },
                    dialogue("stranger", "?"),
                    Step::Narration { text: None },
                    Step::SetVariable { key: None, value: None },
                    set_variable("flag", false),
                    set_variable("count", 0),
                    set_variable("name", ""),
                    Step::JumpTo { target: None },
                    Step::ConditionalJump {
                        test: None,
                        then_target: None,
                        else_target: None,
                    },
                    Step::Choice {
                        prompt: None,
                        options: vec![ChoiceOption {
                            label: Some(String::new()),
                            target: None,
                            effect: None,
                        }],
                    },
                    choice("empty", Vec::new()),
                    Step::Unrecognized {
                        kind: "shake".to_string(),
                    },
                    end_story(),
                ],
            ),
        );
        let diagnostics = validate(&story);
        let expect_one = |location: &str, severity: Severity| {
            let found = at(&diagnostics, location);
            assert_eq!(found.len(), 1, "expected one finding at {}: {:?}", location, diagnostics);
            assert_eq!(found[0].severity, severity, "severity at {}", location);
        };

        expect_one("Start[0].id", Severity::Error);
        expect_one("Start[1].id", Severity::Error);
        expect_one("Start[2].id", Severity::Error);
        assert!(at(&diagnostics, "Start[2].pose").is_empty());
        expect_one("Start[3].pose", Severity::Warning);
        expect_one("Start[3].position", Severity::Warning);
        expect_one("Start[4].pose", Severity::Error);
        expect_one("Start[5].id", Severity::Error);
        expect_one("Start[6].who", Severity::Error);
        expect_one("Start[6].text", Severity::Error);
        expect_one("Start[7].who", Severity::Error);
        expect_one("Start[8].text", Severity::Error);
        expect_one("Start[9].key", Severity::Error);
        expect_one("Start[9].value", Severity::Error);
        for falsy in ["Start[10].value", "Start[11].value", "Start[12].value"] {
            assert!(at(&diagnostics, falsy).is_empty(), "{} counts as present", falsy);
        }
        expect_one("Start[13].nodeId", Severity::Error);
        expect_one("Start[14].test", Severity::Error);
        expect_one("Start[14].thenNodeId", Severity::Error);
        assert!(at(&diagnostics, "Start[14].elseNodeId").is_empty());
        expect_one("Start[15].prompt", Severity::Warning);
        expect_one("Start[15].options[0]", Severity::Error);
        expect_one("Start[16].options", Severity::Error);
        expect_one("Start[17]", Severity::Error);
    }

    #[test]
    fn else_branch_counts_as_reference() {
        let story = cast(
            "Start",
            NodeTree::group()
                .with_node(
                    "Start",
                    vec![conditional_jump(|state| state.flag("x"), "Yes", Some("No"))],
                )
                .with_node("Yes", vec![end_story()])
                .with_node("No", vec![end_story()]),
        );
        assert!(validate(&story).is_empty());
    }

    #[test]
    fn empty_and_open_ended_nodes_are_warnings() {
        let story = cast(
            "Start",
            NodeTree::group()
                .with_node("Start", vec![narration("a"), jump_to("Empty")])
                .with_node("Empty", Vec::new())
                .with_node("Open", vec![narration("b")]),
        );
        let diagnostics = validate(&story);
        assert!(!has_errors(&diagnostics));
        assert_eq!(at(&diagnostics, "Empty"), vec![&Diagnostic::warning("Empty", "node has no steps")]);
        let open = at(&diagnostics, "Open");
        assert_eq!(open.len(), 2);
        assert!(open[0].message.contains("unreachable"));
        assert!(open[1].message.contains("stop abruptly"));
    }
}

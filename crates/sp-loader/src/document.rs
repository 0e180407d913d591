use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use sp_core::{
    collect_leaf_paths, Character, ChoiceOption, NodeTree, Position, SceneplayError, SpValue, Step,
    Story, VariableValue, Variables,
};

use crate::names::{is_node_name, is_variable_name};
use crate::rhai_bridge::ScriptHost;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStory {
    start: Option<String>,
    variables: Option<Variables>,
    nodes: Option<JsonValue>,
    characters: BTreeMap<String, Character>,
    places: BTreeMap<String, String>,
}

/// Parses a JSON story document.
///
/// Missing or empty required fields load as absent so that validation can
/// report them; only documents that cannot be represented at all fail here.
pub fn load_story_from_str(source: &str) -> Result<Story, SceneplayError> {
    let raw: RawStory = serde_json::from_str(source).map_err(|error| {
        SceneplayError::new("LOADER_JSON_INVALID", format!("Invalid story JSON: {}", error))
    })?;

    if let Some(variables) = &raw.variables {
        if let Some(name) = variables.keys().find(|name| !is_variable_name(name)) {
            return Err(SceneplayError::with_location(
                "LOADER_VARIABLE_NAME",
                format!("Variable name \"{}\" is not an identifier.", name),
                "variables",
            ));
        }
    }

    let host = ScriptHost::new();
    let nodes = match &raw.nodes {
        None | Some(JsonValue::Null) => NodeTree::group(),
        Some(JsonValue::Object(children)) => parse_group(&host, "", children)?,
        Some(_) => {
            return Err(SceneplayError::with_location(
                "LOADER_NODE_SHAPE",
                "\"nodes\" must be an object of nodes and groups.",
                "nodes",
            ))
        }
    };

    let story = Story {
        start: raw.start.unwrap_or_default(),
        variables: raw.variables,
        nodes,
        characters: raw.characters,
        places: raw.places,
    };
    debug!(
        "loaded story: start={:?} nodes={} characters={} places={}",
        story.start,
        collect_leaf_paths(&story.nodes).len(),
        story.characters.len(),
        story.places.len()
    );
    Ok(story)
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn parse_group(
    host: &ScriptHost,
    path: &str,
    children: &JsonMap<String, JsonValue>,
) -> Result<NodeTree, SceneplayError> {
    let mut group = BTreeMap::new();
    for (name, child) in children {
        let node_path = child_path(path, name);
        if !is_node_name(name) {
            return Err(SceneplayError::with_location(
                "LOADER_NODE_NAME",
                format!(
                    "Node name \"{}\" must be non-empty and contain no '.' or whitespace.",
                    name
                ),
                node_path,
            ));
        }
        group.insert(name.clone(), parse_tree(host, &node_path, child)?);
    }
    Ok(NodeTree::Group(group))
}

fn parse_tree(host: &ScriptHost, path: &str, value: &JsonValue) -> Result<NodeTree, SceneplayError> {
    match value {
        JsonValue::Object(children) => parse_group(host, path, children),
        JsonValue::Array(items) => {
            let mut steps = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                steps.push(parse_step(host, &format!("{}[{}]", path, index), item)?);
            }
            Ok(NodeTree::Leaf(steps))
        }
        _ => Err(SceneplayError::with_location(
            "LOADER_NODE_SHAPE",
            "A node must be an array of steps or an object of child nodes.",
            path,
        )),
    }
}

fn parse_step(host: &ScriptHost, location: &str, value: &JsonValue) -> Result<Step, SceneplayError> {
    let JsonValue::Object(fields) = value else {
        return Err(SceneplayError::with_location(
            "LOADER_STEP_SHAPE",
            "A step must be an object with a \"kind\" field.",
            location,
        ));
    };
    let Some(kind) = string_field(fields, "kind", location)? else {
        return Ok(Step::Unrecognized {
            kind: String::new(),
        });
    };

    let step = match kind.as_str() {
        "background" => Step::Background {
            place: string_field(fields, "id", location)?,
        },
        "show_character" => Step::ShowCharacter {
            character: string_field(fields, "id", location)?,
            pose: string_field(fields, "pose", location)?,
            position: match string_field(fields, "position", location)? {
                Some(raw) => Some(raw.parse::<Position>().map_err(|error| {
                    SceneplayError::with_location(
                        "LOADER_POSITION_INVALID",
                        error.message,
                        format!("{}.position", location),
                    )
                })?),
                None => None,
            },
        },
        "hide_character" => Step::HideCharacter {
            character: string_field(fields, "id", location)?,
        },
        "dialogue" => Step::Dialogue {
            speaker: string_field(fields, "who", location)?,
            text: string_field(fields, "text", location)?,
        },
        "narration" => Step::Narration {
            text: string_field(fields, "text", location)?,
        },
        "set_variable" => Step::SetVariable {
            key: string_field(fields, "key", location)?,
            value: parse_variable_value(host, fields, location)?,
        },
        "jump_to" => Step::JumpTo {
            target: string_field(fields, "nodeId", location)?,
        },
        "conditional_jump" => Step::ConditionalJump {
            test: match string_field(fields, "test", location)? {
                Some(source) => Some(host.predicate(&source, &format!("{}.test", location))?),
                None => None,
            },
            then_target: string_field(fields, "thenNodeId", location)?,
            else_target: string_field(fields, "elseNodeId", location)?,
        },
        "choice" => Step::Choice {
            prompt: string_field(fields, "prompt", location)?,
            options: parse_options(host, fields, location)?,
        },
        "end_story" => Step::EndStory,
        _ => Step::Unrecognized { kind },
    };
    Ok(step)
}

/// Absent and `null` both read as `None`.
fn string_field(
    fields: &JsonMap<String, JsonValue>,
    name: &str,
    location: &str,
) -> Result<Option<String>, SceneplayError> {
    match fields.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(field_type_error(&format!("{}.{}", location, name), other)),
    }
}

fn field_type_error(location: &str, value: &JsonValue) -> SceneplayError {
    SceneplayError::with_location(
        "LOADER_FIELD_TYPE",
        format!("Expected a string or null, got {}.", value),
        location,
    )
}

/// `compute` takes precedence over a literal `value`.
fn parse_variable_value(
    host: &ScriptHost,
    fields: &JsonMap<String, JsonValue>,
    location: &str,
) -> Result<Option<VariableValue>, SceneplayError> {
    if let Some(source) = string_field(fields, "compute", location)? {
        let compute = host.compute(&source, &format!("{}.compute", location))?;
        return Ok(Some(VariableValue::Computed(compute)));
    }
    match fields.get("value") {
        None | Some(JsonValue::Null) => Ok(None),
        Some(raw) => serde_json::from_value::<SpValue>(raw.clone())
            .map(|value| Some(VariableValue::Literal(value)))
            .map_err(|error| {
                SceneplayError::with_location(
                    "LOADER_FIELD_TYPE",
                    format!("Unsupported variable value: {}", error),
                    format!("{}.value", location),
                )
            }),
    }
}

fn parse_options(
    host: &ScriptHost,
    fields: &JsonMap<String, JsonValue>,
    location: &str,
) -> Result<Vec<ChoiceOption>, SceneplayError> {
    let items = match fields.get("options") {
        None | Some(JsonValue::Null) => return Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items,
        Some(other) => {
            return Err(SceneplayError::with_location(
                "LOADER_FIELD_TYPE",
                format!("Expected an array of options, got {}.", other),
                format!("{}.options", location),
            ))
        }
    };

    let mut options = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let option_location = format!("{}.options[{}]", location, index);
        options.push(parse_option(host, &option_location, item)?);
    }
    Ok(options)
}

fn parse_option(
    host: &ScriptHost,
    location: &str,
    value: &JsonValue,
) -> Result<ChoiceOption, SceneplayError> {
    let parts = match value {
        JsonValue::Array(parts) if (2..=3).contains(&parts.len()) => parts,
        _ => {
            return Err(SceneplayError::with_location(
                "LOADER_OPTION_SHAPE",
                "A choice option must be [label, target-or-null] or [label, target-or-null, effect].",
                location,
            ))
        }
    };

    let part = |index: usize| -> Result<Option<String>, SceneplayError> {
        match parts.get(index) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(field_type_error(&format!("{}[{}]", location, index), other)),
        }
    };

    let effect = match part(2)? {
        Some(source) => Some(host.effect(&source, location)?),
        None => None,
    };
    Ok(ChoiceOption {
        label: part(0)?,
        target: part(1)?,
        effect,
    })
}

#[cfg(test)]
mod document_tests {
    use super::*;
    use sp_core::{resolve, State};

    const PARK: &str = r#"{
        "start": "Intro",
        "variables": { "score": 0 },
        "characters": { "bob": { "displayName": "Bob", "poses": { "happy": "bob_happy.png" } } },
        "places": { "park": "park.png" },
        "nodes": {
            "Intro": [
                { "kind": "background", "id": "park" },
                { "kind": "show_character", "id": "bob", "pose": "happy", "position": "left" },
                { "kind": "dialogue", "who": "bob", "text": "Hi!" },
                { "kind": "set_variable", "key": "score", "compute": "vars.score + 5" },
                { "kind": "conditional_jump", "test": "vars.score >= 5", "thenNodeId": "Park.WithBob" }
            ],
            "Park": {
                "WithBob": [
                    { "kind": "choice", "prompt": "Color?", "options": [
                        ["Red", null, "vars.color = \"red\""],
                        ["Leave", "Park.Alone"]
                    ] },
                    { "kind": "end_story" }
                ],
                "Alone": [ { "kind": "narration", "text": "Quiet." }, { "kind": "end_story" } ]
            }
        }
    }"#;

    #[test]
    fn loads_full_document() {
        let story = load_story_from_str(PARK).expect("story should load");
        assert_eq!(story.start, "Intro");
        assert_eq!(
            collect_leaf_paths(&story.nodes),
            vec!["Intro", "Park.Alone", "Park.WithBob"]
        );
        assert_eq!(story.characters["bob"].display_name, "Bob");
        assert_eq!(story.places["park"], "park.png");

        let intro = resolve(&story.nodes, "Intro").expect("intro");
        assert!(matches!(
            &intro[1],
            Step::ShowCharacter { position: Some(Position::Left), .. }
        ));
        let Step::SetVariable {
            value: Some(VariableValue::Computed(compute)),
            ..
        } = &intro[3]
        else {
            panic!("expected computed set_variable, got {:?}", intro[3]);
        };
        assert_eq!(
            compute.call(&story.initial_state()).expect("compute"),
            SpValue::Number(5.0)
        );
        let Step::ConditionalJump {
            test: Some(test),
            then_target,
            else_target,
        } = &intro[4]
        else {
            panic!("expected conditional_jump, got {:?}", intro[4]);
        };
        assert!(!test.call(&story.initial_state()).expect("test"));
        assert_eq!(then_target.as_deref(), Some("Park.WithBob"));
        assert_eq!(else_target, &None);
    }

    #[test]
    fn choice_options_carry_targets_and_effects() {
        let story = load_story_from_str(PARK).expect("story should load");
        let steps = resolve(&story.nodes, "Park.WithBob").expect("node");
        let Step::Choice { prompt, options } = &steps[0] else {
            panic!("expected choice, got {:?}", steps[0]);
        };
        assert_eq!(prompt.as_deref(), Some("Color?"));
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].target, None);
        assert_eq!(options[1].target.as_deref(), Some("Park.Alone"));
        assert!(options[1].effect.is_none());

        let mut state = State::default();
        options[0]
            .effect
            .as_ref()
            .expect("effect")
            .call(&mut state)
            .expect("effect runs");
        assert_eq!(state.get("color"), Some(&SpValue::from("red")));
    }

    #[test]
    fn missing_fields_and_unknown_kinds_load_as_absent() {
        let story = load_story_from_str(
            r#"{"nodes":{"A":[
                {"kind":"dialogue","text":"no speaker"},
                {"kind":"jump_to"},
                {"kind":"teleport","nodeId":"B"},
                {"text":"no kind"},
                {"kind":"set_variable","key":"x","value":null}
            ]}}"#,
        )
        .expect("story should load");
        assert_eq!(story.start, "");
        assert!(story.variables.is_none());
        let steps = resolve(&story.nodes, "A").expect("node");
        assert!(matches!(&steps[0], Step::Dialogue { speaker: None, text: Some(_) }));
        assert!(matches!(&steps[1], Step::JumpTo { target: None }));
        assert_eq!(steps[2].kind_name(), "teleport");
        assert!(matches!(&steps[3], Step::Unrecognized { kind } if kind.is_empty()));
        assert!(matches!(&steps[4], Step::SetVariable { value: None, .. }));
    }

    #[test]
    fn literal_values_load() {
        let story = load_story_from_str(
            r#"{"start":"A","variables":{},"nodes":{"A":[
                {"kind":"set_variable","key":"met","value":true}
            ]}}"#,
        )
        .expect("story should load");
        let steps = resolve(&story.nodes, "A").expect("node");
        assert!(matches!(
            &steps[0],
            Step::SetVariable { value: Some(VariableValue::Literal(SpValue::Bool(true))), .. }
        ));
    }

    #[test]
    fn hard_failures_have_codes_and_locations() {
        let cases = [
            ("{", "LOADER_JSON_INVALID", None),
            (
                r#"{"nodes":{"A":42}}"#,
                "LOADER_NODE_SHAPE",
                Some("A"),
            ),
            (
                r#"{"nodes":{"P":{"a b":[]}}}"#,
                "LOADER_NODE_NAME",
                Some("P.a b"),
            ),
            (
                r#"{"nodes":{"A":[{"kind":"choice","options":[["only"]]}]}}"#,
                "LOADER_OPTION_SHAPE",
                Some("A[0].options[0]"),
            ),
            (
                r#"{"nodes":{"A":[{"kind":"conditional_jump","test":"vars.x >"}]}}"#,
                "LOADER_SCRIPT_SYNTAX",
                Some("A[0].test"),
            ),
            (
                r#"{"nodes":{"A":[{"kind":"conditional_jump","test":"score >= 5","thenNodeId":"A"}]}}"#,
                "LOADER_SCRIPT_SYNTAX",
                Some("A[0].test"),
            ),
            (
                r#"{"variables":{"has-key":true},"nodes":{}}"#,
                "LOADER_VARIABLE_NAME",
                Some("variables"),
            ),
            (
                r#"{"nodes":{"A":[{"kind":"show_character","id":"bob","position":"top"}]}}"#,
                "LOADER_POSITION_INVALID",
                Some("A[0].position"),
            ),
            (
                r#"{"nodes":{"A":[{"kind":"narration","text":7}]}}"#,
                "LOADER_FIELD_TYPE",
                Some("A[0].text"),
            ),
        ];
        for (source, code, location) in cases {
            let error = load_story_from_str(source).expect_err(source);
            assert_eq!(error.code, code, "{}", source);
            assert_eq!(error.location.as_deref(), location, "{}", source);
        }
    }
}

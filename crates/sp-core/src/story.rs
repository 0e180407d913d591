use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::step::Step;
use crate::value::SpValue;

pub type Variables = BTreeMap<String, SpValue>;

/// Mutable variable state of one playthrough.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub variables: Variables,
}

impl State {
    pub fn new(variables: Variables) -> Self {
        Self { variables }
    }

    pub fn get(&self, key: &str) -> Option<&SpValue> {
        self.variables.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: SpValue) {
        self.variables.insert(key.into(), value);
    }

    /// Numeric value of `key`, `0` when absent or not a number.
    pub fn number(&self, key: &str) -> f64 {
        self.get(key).and_then(SpValue::as_number).unwrap_or(0.0)
    }

    /// Boolean value of `key`, `false` when absent or not a boolean.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(SpValue::as_bool).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub display_name: String,
    #[serde(default)]
    pub poses: BTreeMap<String, String>,
}

impl Character {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            poses: BTreeMap::new(),
        }
    }

    pub fn with_pose(mut self, pose: impl Into<String>, image: impl Into<String>) -> Self {
        self.poses.insert(pose.into(), image.into());
        self
    }
}

/// Nested node namespace. Leaves are executable step sequences, groups only
/// name their children.
#[derive(Debug, Clone)]
pub enum NodeTree {
    Leaf(Vec<Step>),
    Group(BTreeMap<String, NodeTree>),
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::group()
    }
}

impl NodeTree {
    pub fn group() -> Self {
        Self::Group(BTreeMap::new())
    }

    /// Adds a leaf under this group. No-op on a leaf.
    pub fn with_node(self, name: impl Into<String>, steps: Vec<Step>) -> Self {
        self.with_child(name, NodeTree::Leaf(steps))
    }

    /// Adds a nested group under this group. No-op on a leaf.
    pub fn with_group(self, name: impl Into<String>, group: NodeTree) -> Self {
        self.with_child(name, group)
    }

    fn with_child(mut self, name: impl Into<String>, child: NodeTree) -> Self {
        if let Self::Group(children) = &mut self {
            children.insert(name.into(), child);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Leaf(steps) => steps.is_empty(),
            Self::Group(children) => children.is_empty(),
        }
    }
}

/// The authored script. Immutable input to both validation and playback.
#[derive(Debug, Clone, Default)]
pub struct Story {
    pub start: String,
    pub variables: Option<Variables>,
    pub nodes: NodeTree,
    pub characters: BTreeMap<String, Character>,
    pub places: BTreeMap<String, String>,
}

impl Story {
    pub fn new(start: impl Into<String>, nodes: NodeTree) -> Self {
        Self {
            start: start.into(),
            variables: None,
            nodes,
            characters: BTreeMap::new(),
            places: BTreeMap::new(),
        }
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<SpValue>) -> Self {
        self.variables
            .get_or_insert_with(Variables::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_character(mut self, id: impl Into<String>, character: Character) -> Self {
        self.characters.insert(id.into(), character);
        self
    }

    pub fn with_place(mut self, id: impl Into<String>, image: impl Into<String>) -> Self {
        self.places.insert(id.into(), image.into());
        self
    }

    /// Fresh playthrough state; the story's own variables are never touched.
    pub fn initial_state(&self) -> State {
        State::new(self.variables.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod story_tests {
    use super::*;
    use crate::builders::narration;

    #[test]
    fn state_accessors_default_on_missing_or_mistyped() {
        let mut state = State::default();
        state.set("name", SpValue::from("Ada"));
        assert_eq!(state.number("name"), 0.0);
        assert_eq!(state.number("missing"), 0.0);
        assert!(!state.flag("missing"));
        state.set("brave", SpValue::Bool(true));
        assert!(state.flag("brave"));
    }

    #[test]
    fn initial_state_is_a_copy() {
        let story = Story::new("Start", NodeTree::group().with_node("Start", vec![narration("A")]))
            .with_variable("score", 0);
        let mut state = story.initial_state();
        state.set("score", SpValue::Number(9.0));
        assert_eq!(
            story.variables.as_ref().and_then(|vars| vars.get("score")),
            Some(&SpValue::Number(0.0))
        );
    }

    #[test]
    fn with_node_on_leaf_is_ignored() {
        let leaf = NodeTree::Leaf(Vec::new()).with_node("x", vec![narration("A")]);
        assert!(leaf.is_empty());
        let group = NodeTree::group().with_node("x", Vec::new());
        assert!(!group.is_empty());
    }

    #[test]
    fn character_deserializes_camel_case() {
        let character: Character =
            serde_json::from_str(r#"{"displayName":"Bob","poses":{"happy":"bob.png"}}"#)
                .expect("character should deserialize");
        assert_eq!(character, Character::new("Bob").with_pose("happy", "bob.png"));
    }
}

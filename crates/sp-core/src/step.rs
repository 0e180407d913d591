use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SceneplayError;
use crate::story::State;
use crate::value::SpValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Center,
    Right,
}

impl Position {
    pub const ALL: [Position; 3] = [Position::Left, Position::Center, Position::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = SceneplayError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(SceneplayError::new(
                "POSITION_INVALID",
                format!("Unknown stage position \"{}\".", raw),
            )),
        }
    }
}

type ComputeCallback = dyn Fn(&State) -> Result<SpValue, SceneplayError>;
type PredicateCallback = dyn Fn(&State) -> Result<bool, SceneplayError>;
type EffectCallback = dyn Fn(&mut State) -> Result<(), SceneplayError>;

/// Produces the new value of a single variable from the whole current state.
#[derive(Clone)]
pub struct ComputeFn(Rc<ComputeCallback>);

impl ComputeFn {
    pub fn new(callback: impl Fn(&State) -> Result<SpValue, SceneplayError> + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, state: &State) -> Result<SpValue, SceneplayError> {
        (self.0)(state)
    }
}

impl fmt::Debug for ComputeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComputeFn(..)")
    }
}

/// Branch test of a `conditional_jump`.
#[derive(Clone)]
pub struct PredicateFn(Rc<PredicateCallback>);

impl PredicateFn {
    pub fn new(callback: impl Fn(&State) -> Result<bool, SceneplayError> + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, state: &State) -> Result<bool, SceneplayError> {
        (self.0)(state)
    }
}

impl fmt::Debug for PredicateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateFn(..)")
    }
}

/// Side effect attached to a choice option, run before its jump.
#[derive(Clone)]
pub struct EffectFn(Rc<EffectCallback>);

impl EffectFn {
    pub fn new(callback: impl Fn(&mut State) -> Result<(), SceneplayError> + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, state: &mut State) -> Result<(), SceneplayError> {
        (self.0)(state)
    }
}

impl fmt::Debug for EffectFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EffectFn(..)")
    }
}

#[derive(Debug, Clone)]
pub enum VariableValue {
    Literal(SpValue),
    Computed(ComputeFn),
}

#[derive(Debug, Clone)]
pub struct ChoiceOption {
    pub label: Option<String>,
    /// `None` continues with the step after the choice.
    pub target: Option<String>,
    pub effect: Option<EffectFn>,
}

/// One instruction of a node.
///
/// Fields are optional so that stories read from files keep missing fields
/// as absent; the validator reports them and the engine skips such steps.
#[derive(Debug, Clone)]
pub enum Step {
    Background {
        place: Option<String>,
    },
    ShowCharacter {
        character: Option<String>,
        pose: Option<String>,
        position: Option<Position>,
    },
    HideCharacter {
        character: Option<String>,
    },
    Dialogue {
        speaker: Option<String>,
        text: Option<String>,
    },
    Narration {
        text: Option<String>,
    },
    SetVariable {
        key: Option<String>,
        value: Option<VariableValue>,
    },
    JumpTo {
        target: Option<String>,
    },
    ConditionalJump {
        test: Option<PredicateFn>,
        then_target: Option<String>,
        else_target: Option<String>,
    },
    Choice {
        prompt: Option<String>,
        options: Vec<ChoiceOption>,
    },
    EndStory,
    Unrecognized {
        kind: String,
    },
}

impl Step {
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Background { .. } => "background",
            Self::ShowCharacter { .. } => "show_character",
            Self::HideCharacter { .. } => "hide_character",
            Self::Dialogue { .. } => "dialogue",
            Self::Narration { .. } => "narration",
            Self::SetVariable { .. } => "set_variable",
            Self::JumpTo { .. } => "jump_to",
            Self::ConditionalJump { .. } => "conditional_jump",
            Self::Choice { .. } => "choice",
            Self::EndStory => "end_story",
            Self::Unrecognized { kind } => kind.as_str(),
        }
    }

    /// Whether a node ending with this step hands control somewhere explicit.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::JumpTo { .. } | Self::ConditionalJump { .. } | Self::Choice { .. } | Self::EndStory
        )
    }
}

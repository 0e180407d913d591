//! Factory functions for authoring stories in code.
//!
//! Every builder fills all fields, so a story assembled only from these
//! functions never trips the validator's missing-field checks.

use crate::step::{
    ChoiceOption, ComputeFn, EffectFn, PredicateFn, Position, Step, VariableValue,
};
use crate::story::State;
use crate::value::SpValue;

pub fn background(place: impl Into<String>) -> Step {
    Step::Background {
        place: Some(place.into()),
    }
}

pub fn show_character(
    character: impl Into<String>,
    pose: impl Into<String>,
    position: Position,
) -> Step {
    Step::ShowCharacter {
        character: Some(character.into()),
        pose: Some(pose.into()),
        position: Some(position),
    }
}

pub fn hide_character(character: impl Into<String>) -> Step {
    Step::HideCharacter {
        character: Some(character.into()),
    }
}

pub fn dialogue(speaker: impl Into<String>, text: impl Into<String>) -> Step {
    Step::Dialogue {
        speaker: Some(speaker.into()),
        text: Some(text.into()),
    }
}

pub fn narration(text: impl Into<String>) -> Step {
    Step::Narration {
        text: Some(text.into()),
    }
}

pub fn set_variable(key: impl Into<String>, value: impl Into<SpValue>) -> Step {
    Step::SetVariable {
        key: Some(key.into()),
        value: Some(VariableValue::Literal(value.into())),
    }
}

pub fn set_variable_with(
    key: impl Into<String>,
    compute: impl Fn(&State) -> SpValue + 'static,
) -> Step {
    Step::SetVariable {
        key: Some(key.into()),
        value: Some(VariableValue::Computed(ComputeFn::new(move |state| {
            Ok(compute(state))
        }))),
    }
}

pub fn jump_to(target: impl Into<String>) -> Step {
    Step::JumpTo {
        target: Some(target.into()),
    }
}

pub fn conditional_jump(
    test: impl Fn(&State) -> bool + 'static,
    then_target: impl Into<String>,
    else_target: Option<&str>,
) -> Step {
    Step::ConditionalJump {
        test: Some(PredicateFn::new(move |state| Ok(test(state)))),
        then_target: Some(then_target.into()),
        else_target: else_target.map(ToString::to_string),
    }
}

pub fn choice(prompt: impl Into<String>, options: Vec<ChoiceOption>) -> Step {
    Step::Choice {
        prompt: Some(prompt.into()),
        options,
    }
}

pub fn option(label: impl Into<String>, target: Option<&str>) -> ChoiceOption {
    ChoiceOption {
        label: Some(label.into()),
        target: target.map(ToString::to_string),
        effect: None,
    }
}

pub fn option_with_effect(
    label: impl Into<String>,
    target: Option<&str>,
    effect: impl Fn(&mut State) + 'static,
) -> ChoiceOption {
    ChoiceOption {
        label: Some(label.into()),
        target: target.map(ToString::to_string),
        effect: Some(EffectFn::new(move |state| {
            effect(state);
            Ok(())
        })),
    }
}

pub fn end_story() -> Step {
    Step::EndStory
}

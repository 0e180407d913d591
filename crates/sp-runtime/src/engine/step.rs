use log::{trace, warn};
use sp_core::{
    ChoiceOption, DisplayCommand, Position, PredicateFn, RenderSink, SceneplayError, Step,
    VariableValue,
};

use super::{EngineStatus, StepFlow, StoryEngine};

impl<S: RenderSink> StoryEngine<S> {
    /// Runs one step at the cursor. Lookup failures are logged and skipped;
    /// errors from author-supplied functions propagate.
    pub(super) fn execute_step(&mut self, step: &Step) -> Result<StepFlow, SceneplayError> {
        trace!("{}: {}", self.location(), step.kind_name());

        match step {
            Step::Background { place } => {
                self.show_background(place.as_deref());
                Ok(StepFlow::Next)
            }
            Step::ShowCharacter {
                character,
                pose,
                position,
            } => {
                self.show_character(character.as_deref(), pose.as_deref(), *position);
                Ok(StepFlow::Next)
            }
            Step::HideCharacter { character } => {
                self.hide_character(character.as_deref());
                Ok(StepFlow::Next)
            }
            Step::Dialogue { speaker, text } => {
                let Some(text) = text else {
                    warn!("{}: dialogue without text skipped", self.location());
                    return Ok(StepFlow::Next);
                };
                let speaker = self.speaker_name(speaker.as_deref());
                self.await_advance(speaker, text.clone());
                Ok(StepFlow::Suspend)
            }
            Step::Narration { text } => {
                let Some(text) = text else {
                    warn!("{}: narration without text skipped", self.location());
                    return Ok(StepFlow::Next);
                };
                self.await_advance(None, text.clone());
                Ok(StepFlow::Suspend)
            }
            Step::SetVariable { key, value } => {
                self.set_variable(key.as_deref(), value.as_ref())?;
                Ok(StepFlow::Next)
            }
            Step::JumpTo { target } => Ok(self.transfer_flow(target.as_deref())),
            Step::ConditionalJump {
                test,
                then_target,
                else_target,
            } => self.conditional_jump(
                test.as_ref(),
                then_target.as_deref(),
                else_target.as_deref(),
            ),
            Step::Choice { prompt, options } => Ok(self.offer_choice(prompt.as_deref(), options)),
            Step::EndStory => {
                self.sink.display(DisplayCommand::ShowEnded);
                self.status = EngineStatus::Ended;
                Ok(StepFlow::Suspend)
            }
            Step::Unrecognized { kind } => {
                warn!("{}: unknown step kind \"{}\" skipped", self.location(), kind);
                Ok(StepFlow::Next)
            }
        }
    }

    fn show_background(&mut self, place: Option<&str>) {
        let Some(place_id) = place else {
            warn!("{}: background without a place id", self.location());
            return;
        };
        let Some(image) = self.story.places.get(place_id) else {
            warn!("{}: unknown place \"{}\"", self.location(), place_id);
            return;
        };
        let command = DisplayCommand::SetBackground {
            place_id: place_id.to_string(),
            image: image.clone(),
        };
        self.sink.display(command);
    }

    fn show_character(
        &mut self,
        character: Option<&str>,
        pose: Option<&str>,
        position: Option<Position>,
    ) {
        let (Some(character_id), Some(pose), Some(position)) = (character, pose, position) else {
            warn!(
                "{}: show_character needs a character, pose and position",
                self.location()
            );
            return;
        };
        let Some(found) = self.story.characters.get(character_id) else {
            warn!("{}: unknown character \"{}\"", self.location(), character_id);
            return;
        };
        let Some(image) = found.poses.get(pose).cloned() else {
            warn!(
                "{}: character \"{}\" has no pose \"{}\"",
                self.location(),
                character_id,
                pose
            );
            return;
        };

        if let Some(previous) = self.position_of(character_id) {
            if previous != position {
                self.stage.remove(&previous);
                self.sink
                    .display(DisplayCommand::ClearCharacterSprite { position: previous });
            }
        }
        self.stage.insert(position, character_id.to_string());
        self.sink.display(DisplayCommand::SetCharacterSprite {
            position,
            character_id: character_id.to_string(),
            image,
        });
    }

    fn hide_character(&mut self, character: Option<&str>) {
        let Some(character_id) = character else {
            warn!("{}: hide_character without a character id", self.location());
            return;
        };
        let Some(position) = self.position_of(character_id) else {
            trace!("{}: \"{}\" is not on stage", self.location(), character_id);
            return;
        };
        self.stage.remove(&position);
        self.sink
            .display(DisplayCommand::ClearCharacterSprite { position });
    }

    fn position_of(&self, character_id: &str) -> Option<Position> {
        self.stage
            .iter()
            .find(|(_, id)| id.as_str() == character_id)
            .map(|(position, _)| *position)
    }

    fn speaker_name(&self, speaker: Option<&str>) -> Option<String> {
        let Some(speaker_id) = speaker else {
            warn!("{}: dialogue without a speaker", self.location());
            return None;
        };
        match self.story.characters.get(speaker_id) {
            Some(character) => Some(character.display_name.clone()),
            None => {
                warn!("{}: unknown speaker \"{}\"", self.location(), speaker_id);
                Some(speaker_id.to_string())
            }
        }
    }

    fn await_advance(&mut self, speaker: Option<String>, text: String) {
        self.sink
            .display(DisplayCommand::SetDialogue { speaker, text });
        self.status = EngineStatus::AwaitingAdvance;
    }

    fn set_variable(
        &mut self,
        key: Option<&str>,
        value: Option<&VariableValue>,
    ) -> Result<(), SceneplayError> {
        let (Some(key), Some(value)) = (key, value) else {
            warn!("{}: set_variable needs a key and a value", self.location());
            return Ok(());
        };
        let resolved = match value {
            VariableValue::Literal(literal) => literal.clone(),
            VariableValue::Computed(compute) => compute.call(&self.state)?,
        };
        trace!("{}: {} = {}", self.location(), key, resolved);
        self.state.set(key, resolved);
        Ok(())
    }

    fn conditional_jump(
        &mut self,
        test: Option<&PredicateFn>,
        then_target: Option<&str>,
        else_target: Option<&str>,
    ) -> Result<StepFlow, SceneplayError> {
        let Some(test) = test else {
            warn!("{}: conditional_jump without a test", self.location());
            return Ok(StepFlow::Next);
        };
        if test.call(&self.state)? {
            return Ok(self.transfer_flow(then_target));
        }
        match else_target {
            Some(target) => Ok(self.transfer_flow(Some(target))),
            None => Ok(StepFlow::Next),
        }
    }

    fn offer_choice(&mut self, prompt: Option<&str>, options: &[ChoiceOption]) -> StepFlow {
        if options.is_empty() {
            warn!("{}: choice without options skipped", self.location());
            return StepFlow::Next;
        }
        let labels = options
            .iter()
            .map(|option| option.label.clone().unwrap_or_default())
            .collect();
        self.sink.display(DisplayCommand::ShowChoices {
            prompt: prompt.map(ToString::to_string),
            labels,
        });
        self.status = EngineStatus::AwaitingChoice;
        StepFlow::Suspend
    }
}

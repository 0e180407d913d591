use serde::{Deserialize, Serialize};

use crate::step::Position;

/// Commands the engine sends to whatever draws the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DisplayCommand {
    #[serde(rename_all = "camelCase")]
    SetBackground { place_id: String, image: String },
    #[serde(rename_all = "camelCase")]
    SetCharacterSprite {
        position: Position,
        character_id: String,
        image: String,
    },
    ClearCharacterSprite { position: Position },
    /// `speaker` is `None` for narration.
    SetDialogue { speaker: Option<String>, text: String },
    ShowChoices {
        prompt: Option<String>,
        labels: Vec<String>,
    },
    ShowEnded,
}

pub trait RenderSink {
    fn display(&mut self, command: DisplayCommand);
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn display(&mut self, command: DisplayCommand) {
        (**self).display(command);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingSink {
    commands: Vec<DisplayCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DisplayCommand] {
        &self.commands
    }

    pub fn last(&self) -> Option<&DisplayCommand> {
        self.commands.last()
    }

    pub fn take(&mut self) -> Vec<DisplayCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl RenderSink for RecordingSink {
    fn display(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }
}

use sp_core::{DisplayCommand, RenderSink};

/// Renders display commands as plain terminal lines.
///
/// Lines are buffered until the player loop drains them, so that write
/// failures surface there instead of inside the engine.
#[derive(Debug, Default)]
pub(crate) struct LineSink {
    pending: Vec<String>,
}

impl LineSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }
}

pub(crate) fn render_lines(command: &DisplayCommand) -> Vec<String> {
    match command {
        DisplayCommand::SetBackground { place_id, image } => {
            vec![format!("[scene: {} ({})]", place_id, image)]
        }
        DisplayCommand::SetCharacterSprite {
            position,
            character_id,
            image,
        } => vec![format!("[{} enters {} ({})]", character_id, position, image)],
        DisplayCommand::ClearCharacterSprite { position } => {
            vec![format!("[{} clears]", position)]
        }
        DisplayCommand::SetDialogue {
            speaker: Some(speaker),
            text,
        } => vec![String::new(), format!("{}: {}", speaker, text)],
        DisplayCommand::SetDialogue {
            speaker: None,
            text,
        } => vec![String::new(), text.clone()],
        DisplayCommand::ShowChoices { prompt, labels } => {
            let mut lines = vec![String::new()];
            if let Some(prompt) = prompt {
                lines.push(prompt.clone());
            }
            lines.extend(
                labels
                    .iter()
                    .enumerate()
                    .map(|(index, label)| format!("  [{}] {}", index, label)),
            );
            lines
        }
        DisplayCommand::ShowEnded => vec![String::new(), "[END]".to_string()],
    }
}

impl RenderSink for LineSink {
    fn display(&mut self, command: DisplayCommand) {
        self.pending.extend(render_lines(&command));
    }
}
